//! Virtual-method overrides.
//!
//! For every virtual method the wrapper must override, a native override
//! with matching signature marshals its arguments into a generic stack
//! and hands control to the external binding callback. A non-pure method
//! falls through to the native base implementation when the callback
//! reports that no override is installed.
//!
//! Class-valued returns cross the generic boundary as a manufactured
//! heap object: the callback allocates, this side copy-constructs the
//! return value and frees the heap copy. Breaking that pairing leaks the
//! object.

use crate::{GenError, Generator};
use indexmap::IndexSet;
use shimgen_model::{Class, Method, StackField};
use smol_str::SmolStr;

impl<'a> Generator<'a> {
    pub(crate) fn generate_virtual_method(
        &self,
        out: &mut String,
        klass: &Class,
        meth: &Method,
        includes: &mut IndexSet<SmolStr>,
    ) -> Result<(), GenError> {
        let ret = &meth.ret;
        let ret_spelling = ret.spelling();
        if let Some(class) = &ret.class {
            includes.insert(class.header.clone());
        }

        let method_idx =
            self.indexes
                .method(meth.id)
                .ok_or_else(|| GenError::MissingMethodIndex {
                    method: format!("{}::{}", klass.name, meth.name),
                })?;

        let mut marshal = String::new();
        let mut forwards: Vec<String> = Vec::new();

        out.push_str(&format!("    virtual {} {}(", ret_spelling, meth.name));
        for (i, param) in meth.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(class) = &param.class {
                includes.insert(class.header.clone());
            }
            let arg = format!("x{}", i + 1);
            out.push_str(&format!("{} {}", param.spelling(), arg));
            marshal.push_str(&format!(
                "        x[{}].{} = {};\n",
                i + 1,
                param.stack_field(),
                param.assignment(&arg)
            ));
            forwards.push(arg);
        }
        out.push_str(") ");
        if meth.is_const {
            out.push_str("const ");
        }
        if let Some(thrown) = &meth.exception_spec {
            let spellings: Vec<String> = thrown.iter().map(|t| t.spelling()).collect();
            out.push_str(&format!("throw({}) ", spellings.join(", ")));
        }
        out.push_str("{\n");
        out.push_str(&format!(
            "        Shim::StackItem x[{}];\n",
            meth.params.len() + 1
        ));
        out.push_str(&marshal);

        if meth.is_pure_virtual {
            // no native implementation to fall back to
            out.push_str(&format!(
                "        this->_binding->callMethod({}, (void*)this, x, true /*pure virtual*/);\n",
                method_idx
            ));
            if !ret.is_void() {
                if ret.pointer_depth == 0 && ret.stack_field() == StackField::Class {
                    self.reconstruct_value_return(out, "        ", ret, &ret_spelling);
                } else {
                    out.push_str(&format!(
                        "        return ({})x[0].{};\n",
                        ret_spelling,
                        ret.stack_field()
                    ));
                }
            }
        } else {
            out.push_str(&format!(
                "        if (this->_binding->callMethod({}, (void*)this, x)) ",
                method_idx
            ));
            if ret.is_void() {
                out.push_str("return;\n");
            } else if ret.pointer_depth == 0 && ret.stack_field() == StackField::Class {
                out.push_str("{\n");
                self.reconstruct_value_return(out, "            ", ret, &ret_spelling);
                out.push_str("        }\n");
            } else {
                out.push_str(&format!(
                    "return ({})x[0].{};\n",
                    ret_spelling,
                    ret.stack_field()
                ));
            }

            // no override installed: call the native base directly with
            // the original arguments
            let base = meth.declared_in.as_deref().unwrap_or(&klass.name);
            out.push_str("        ");
            if !ret.is_void() {
                out.push_str("return ");
            }
            out.push_str(&format!(
                "this->{}::{}({});\n",
                base,
                meth.name,
                forwards.join(", ")
            ));
        }
        out.push_str("    }\n");
        Ok(())
    }

    /// Reads a class-by-value return back out of slot 0: the callback
    /// left a heap copy there, copy-construct the return value and free
    /// it.
    fn reconstruct_value_return(&self, out: &mut String, indent: &str, ret: &shimgen_model::Type, ret_spelling: &str) {
        let mut tmp = ret_spelling.to_string();
        if ret.is_ref {
            tmp = tmp.replace('&', "");
        }
        tmp.push('*');
        out.push_str(&format!(
            "{}// callback allocated the heap copy; copy it out and free it\n",
            indent
        ));
        out.push_str(&format!("{}{} xptr = ({})x[0].s_class;\n", indent, tmp, tmp));
        out.push_str(&format!("{}{} xret(*xptr);\n", indent, ret_spelling));
        out.push_str(&format!("{}delete xptr;\n", indent));
        out.push_str(&format!("{}return xret;\n", indent));
    }
}

#[cfg(test)]
mod tests {
    use crate::Generator;
    use indexmap::IndexSet;
    use shimgen_model::{Class, Indexes, Method, MethodId, Type};

    fn indexes_with_method(id: u32, idx: i32) -> Indexes {
        let mut indexes = Indexes::default();
        indexes.methods.insert(MethodId(id), idx);
        indexes
    }

    fn emit(indexes: &Indexes, klass: &Class, meth: &Method) -> String {
        let gen = Generator::new(indexes);
        let mut out = String::new();
        let mut includes = IndexSet::new();
        gen.generate_virtual_method(&mut out, klass, meth, &mut includes)
            .unwrap();
        out
    }

    #[test]
    fn pure_virtual_has_no_fallthrough() {
        let indexes = indexes_with_method(9, 120);
        let klass = Class::new("Shape", "shape.h");
        let mut meth = Method::new(9, "perimeter", Type::primitive("double"));
        meth.is_const = true;
        meth.is_virtual = true;
        meth.is_pure_virtual = true;

        let code = emit(&indexes, &klass, &meth);
        assert!(code.contains("virtual double perimeter() const {"));
        assert!(code.contains("this->_binding->callMethod(120, (void*)this, x, true /*pure virtual*/);"));
        assert!(code.contains("return (double)x[0].s_double;"));
        assert!(!code.contains("Shape::perimeter"));
    }

    #[test]
    fn non_pure_virtual_falls_through_to_base() {
        let indexes = indexes_with_method(3, 55);
        let klass = Class::new("Widget", "widget.h");
        let mut meth = Method::new(3, "resize", Type::void());
        meth.is_virtual = true;
        meth.params = vec![Type::primitive("int"), Type::primitive("int")];

        let code = emit(&indexes, &klass, &meth);
        assert!(code.contains("virtual void resize(int x1, int x2) {"));
        assert!(code.contains("Shim::StackItem x[3];"));
        assert!(code.contains("x[1].s_int = x1;"));
        assert!(code.contains("x[2].s_int = x2;"));
        assert!(code.contains("if (this->_binding->callMethod(55, (void*)this, x)) return;"));
        assert!(code.contains("this->Widget::resize(x1, x2);"));
    }

    #[test]
    fn inherited_override_calls_declaring_base() {
        let indexes = indexes_with_method(4, 60);
        let klass = Class::new("Derived", "derived.h");
        let mut meth = Method::new(4, "event", Type::primitive("bool"));
        meth.is_virtual = true;
        meth.declared_in = Some("Base".into());

        let code = emit(&indexes, &klass, &meth);
        assert!(code.contains("return this->Base::event();"));
    }

    #[test]
    fn class_value_return_is_copied_and_freed() {
        let indexes = indexes_with_method(5, 70);
        let klass = Class::new("Widget", "widget.h");
        let mut meth = Method::new(5, "sizeHint", Type::class_value("QSize", "qsize.h"));
        meth.is_const = true;
        meth.is_virtual = true;

        let code = emit(&indexes, &klass, &meth);
        assert!(code.contains("QSize* xptr = (QSize*)x[0].s_class;"));
        assert!(code.contains("QSize xret(*xptr);"));
        assert!(code.contains("delete xptr;"));
        assert!(code.contains("return xret;"));
        // fallthrough still present for the non-pure case
        assert!(code.contains("return this->Widget::sizeHint();"));
    }

    #[test]
    fn exception_spec_is_reproduced() {
        let indexes = indexes_with_method(6, 80);
        let klass = Class::new("Stream", "stream.h");
        let mut meth = Method::new(6, "flush", Type::void());
        meth.is_virtual = true;
        meth.exception_spec = Some(vec![Type::class_value("IOError", "ioerror.h")]);

        let code = emit(&indexes, &klass, &meth);
        assert!(code.contains("virtual void flush() throw(IOError) {"));
    }

    #[test]
    fn missing_method_index_fails_fast() {
        let indexes = Indexes::default();
        let gen = Generator::new(&indexes);
        let klass = Class::new("Widget", "widget.h");
        let mut meth = Method::new(99, "resize", Type::void());
        meth.is_virtual = true;

        let mut out = String::new();
        let mut includes = IndexSet::new();
        let err = gen
            .generate_virtual_method(&mut out, &klass, &meth, &mut includes)
            .unwrap_err();
        assert!(err.to_string().contains("Widget::resize"));
    }
}

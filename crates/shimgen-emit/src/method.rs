//! Method trampolines.
//!
//! Each accessible constructor or method gets one generic entry point
//! `x_N(Shim::Stack x)` that unmarshals arguments from the stack,
//! performs the real native call, and marshals the result back into
//! slot 0.

use crate::{GenError, Generator};
use indexmap::IndexSet;
use shimgen_model::{Class, Method, StackField};
use smol_str::SmolStr;

impl<'a> Generator<'a> {
    /// The body of one trampoline: local for the return value, qualified
    /// call, one cast-and-read per parameter, residual default-argument
    /// literals, and the write-back into slot 0.
    ///
    /// `dynamic_dispatch` selects between an ordinary (virtual) call and
    /// a call forced to this class's own implementation via
    /// `ClassName::`.
    pub(crate) fn method_body(
        &self,
        indent: &str,
        klass: &Class,
        meth: &Method,
        dynamic_dispatch: bool,
        includes: &mut IndexSet<SmolStr>,
    ) -> String {
        let class_name = klass.name.as_str();
        let wrapper = klass.wrapper_name();
        let mut out = String::new();
        out.push_str(indent);

        if meth.is_constructor() {
            out.push_str(&format!("{}* xret = new {}(", wrapper, wrapper));
        } else {
            if let Some(free) = &meth.free_function {
                if !free.header.is_empty() {
                    includes.insert(free.header.clone());
                }
            }
            if let Some(class) = &meth.ret.class {
                includes.insert(class.header.clone());
            }

            if meth.ret.is_function_pointer || meth.ret.is_array {
                out.push_str(&format!("{} = ", meth.ret.spelling_with("xret")));
            } else if !meth.ret.is_void() {
                out.push_str(&format!("{} xret = ", meth.ret.spelling()));
            }

            if !meth.is_static {
                if meth.is_const {
                    out.push_str(&format!("((const {}*)this)->", class_name));
                } else {
                    out.push_str("this->");
                }
            }
            if !dynamic_dispatch && meth.free_function.is_none() {
                // force the call past the vtable, to this class's own
                // implementation
                out.push_str(&format!("{}::", class_name));
            } else if let Some(free) = &meth.free_function {
                if !free.namespace.is_empty() {
                    out.push_str(&format!("{}::", free.namespace));
                }
            }
            out.push_str(&format!("{}(", meth.name));
        }

        for (j, param) in meth.params.iter().enumerate() {
            if let Some(class) = &param.class {
                includes.insert(class.header.clone());
            }
            if j > 0 {
                out.push(',');
            }

            let field = param.stack_field();
            let mut type_name = param.spelling();
            if param.is_array {
                // arrays are marshaled through one extra indirection
                let mut t = param.clone();
                t.pointer_depth += 1;
                t.is_ref = false;
                type_name = t.spelling();
                out.push('*');
            } else if field == StackField::Class
                && (param.pointer_depth == 0 || param.is_ref)
                && !param.is_function_pointer
            {
                // class values and references travel as pointers in the
                // object slot
                type_name.push('*');
                out.push('*');
            }
            // casting to a reference type is invalid here
            if param.is_ref && !param.is_function_pointer {
                type_name = type_name.replace('&', "");
            }
            out.push_str(&format!("({})x[{}].{}", type_name, j + 1, field));
        }

        // residual defaults let one entry point serve the overloads that
        // differ only by trailing default arguments
        if !meth.remaining_defaults.is_empty() {
            if !meth.params.is_empty() {
                out.push(',');
            }
            out.push_str(&meth.remaining_defaults.join(","));
        }

        out.push_str(");\n");
        if !meth.ret.is_void() {
            out.push_str(&format!(
                "{}x[0].{} = {};\n",
                indent,
                meth.ret.stack_field(),
                meth.ret.assignment("xret")
            ));
        } else {
            out.push_str(&format!("{}(void)x; // noop (for compiler warning)\n", indent));
        }

        out
    }

    /// One full `x_N` entry point, plus the forwarding constructor when
    /// the method is a constructor without residual defaults.
    pub(crate) fn generate_method(
        &self,
        out: &mut String,
        klass: &Class,
        meth: &Method,
        index: u32,
        includes: &mut IndexSet<SmolStr>,
    ) -> Result<(), GenError> {
        // a constructor cannot be a renamed free function
        if meth.is_constructor() && meth.free_function.is_some() {
            return Err(GenError::FreeFunctionConstructor {
                method: meth.name.to_string(),
                class: klass.name.to_string(),
            });
        }

        out.push_str("    ");
        if meth.is_static || meth.is_constructor() {
            out.push_str("static ");
        }
        out.push_str(&format!("void x_{}(Shim::Stack x) {{\n", index));
        out.push_str(&format!("        // {}\n", meth.signature(&klass.name)));

        // Without the marker the run-time check can never distinguish a
        // pure wrapper instance from a foreign derived one, so a virtual
        // method must always go through the vtable.
        let dynamic_dispatch = meth.is_pure_virtual
            || meth.force_dynamic_dispatch
            || (meth.is_virtual && !klass.has_marker());

        if dynamic_dispatch || !meth.is_virtual {
            // flagged dynamic already, or a plain method: a single call
            // form suffices
            out.push_str(&self.method_body("        ", klass, meth, dynamic_dispatch, includes));
        } else {
            // Virtual method: whether the call may bypass the vtable is a
            // property of the concrete object, so emit both forms behind
            // a run-time marker check.
            includes.insert(SmolStr::new("typeinfo"));
            out.push_str(&format!(
                "        if (dynamic_cast<__internal_ShimClass*>(static_cast<{}*>(this))) {{\n",
                klass.name
            ));
            out.push_str(&self.method_body("            ", klass, meth, false, includes));
            out.push_str("        } else {\n");
            out.push_str(&self.method_body("            ", klass, meth, true, includes));
            out.push_str("        }\n");
        }

        out.push_str("    }\n");

        // A constructor synthesized from another one's defaults needs no
        // forwarder of its own; the x_* entry appends the defaults and
        // reaches the right native overload.
        if meth.is_constructor() && meth.remaining_defaults.is_empty() {
            out.push_str(&format!("    explicit {}(", klass.wrapper_name()));
            let mut forwards: Vec<String> = Vec::new();
            for (i, param) in meth.params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let pname = format!("x{}", i + 1);
                out.push_str(&param.spelling_with(&pname));
                forwards.push(pname);
            }
            out.push_str(&format!(
                ") : {}({}) {{}}\n",
                klass.base_name(),
                forwards.join(", ")
            ));
        }
        Ok(())
    }
}

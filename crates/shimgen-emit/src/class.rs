//! Wrapper-class assembly and dispatch-table construction.
//!
//! One pass over a class, in declaration order: every accessible
//! non-destructor method, accessor, and enum member gets the next
//! dispatch index, its entry-point body, and a case in the dispatch
//! switch. Index 0 is reserved for the binding-registration slot of
//! instantiable classes; the deletion case comes last when the native
//! class has a public destructor.

use crate::{GenError, Generator};
use indexmap::IndexSet;
use shimgen_model::{Access, Class, ClassKind, MethodKind};
use smol_str::SmolStr;

/// One generated class block, plus the headers it needs.
#[derive(Debug, Clone)]
pub struct ClassArtifact {
    pub class_name: SmolStr,
    pub code: String,
    pub includes: IndexSet<SmolStr>,
}

impl<'a> Generator<'a> {
    pub(crate) fn write_class(&self, klass: &Class) -> Result<ClassArtifact, GenError> {
        let mut includes: IndexSet<SmolStr> = IndexSet::new();
        let mut out = String::new();
        let underscore = klass.underscore_name();
        let wrapper = klass.wrapper_name();
        let class_name = klass.name.as_str();

        tracing::debug!(class = class_name, "emitting wrapper");

        // Unions get no wrapper subclass, no inheritance, no binding
        // slot: only the free dispatch function and, if destructible,
        // its deletion case.
        if klass.kind == ClassKind::Union {
            out.push_str(&format!(
                "void xcall_{}(Shim::Index xi, void *obj, Shim::Stack args) {{\n",
                underscore
            ));
            out.push_str(&format!("    {} *xself = ({}*)obj;\n", class_name, class_name));
            out.push_str("    switch(xi) {\n");
            if klass.has_public_destructor {
                out.push_str(&format!(
                    "        case 1: delete ({}*)xself;\tbreak;\n",
                    class_name
                ));
            }
            out.push_str("    }\n");
            out.push_str("}\n");
            return Ok(ClassArtifact {
                class_name: klass.name.clone(),
                code: out,
                includes,
            });
        }

        let mut switch_code = String::new();

        out.push_str(&format!("class {}", wrapper));
        if !klass.is_namespace() {
            out.push_str(&format!(" : public {}", class_name));
            if klass.has_marker() {
                out.push_str(", public __internal_ShimClass");
            }
        }
        out.push_str(" {\n");

        if klass.can_instantiate {
            out.push_str("    ShimBinding* _binding;\n");
            out.push_str("public:\n");
            out.push_str("    void x_0(Shim::Stack x) {\n");
            out.push_str("        // set the shim binding\n");
            out.push_str("        _binding = (ShimBinding*)x[1].s_class;\n");
            out.push_str("    }\n");
            switch_code.push_str("        case 0: xself->x_0(args);\tbreak;\n");
        } else {
            out.push_str("public:\n");
        }

        let mut index: u32 = 1;
        let mut destructor = None;
        for meth in &klass.methods {
            if meth.access == Access::Private {
                continue;
            }
            if meth.is_destructor() {
                destructor = Some(meth);
                continue;
            }
            let target = if meth.is_static || meth.is_constructor() {
                format!("{}::", wrapper)
            } else {
                "xself->".to_string()
            };
            switch_code.push_str(&format!(
                "        case {}: {}x_{}(args);\tbreak;\n",
                index, target, index
            ));
            match meth.kind {
                MethodKind::FieldGetter(f) => {
                    let field =
                        klass
                            .fields
                            .get(f)
                            .ok_or_else(|| GenError::BadFieldAccessor {
                                method: meth.name.to_string(),
                                class: class_name.to_string(),
                            })?;
                    self.generate_get_accessor(&mut out, klass, field, &meth.ret, index);
                }
                MethodKind::FieldSetter(f) => {
                    let field =
                        klass
                            .fields
                            .get(f)
                            .ok_or_else(|| GenError::BadFieldAccessor {
                                method: meth.name.to_string(),
                                class: class_name.to_string(),
                            })?;
                    let ty = meth.params.first().ok_or_else(|| GenError::BadFieldAccessor {
                        method: meth.name.to_string(),
                        class: class_name.to_string(),
                    })?;
                    self.generate_set_accessor(&mut out, klass, field, ty, index);
                }
                _ => self.generate_method(&mut out, klass, meth, index, &mut includes)?,
            }
            index += 1;
        }

        let mut enum_code = String::new();
        let mut enum_found = false;
        for e in &klass.enums {
            if e.access == Access::Private {
                continue;
            }
            let qualifier = match &e.qualifier {
                None => class_name,
                Some(ns) => ns.as_str(),
            };
            for member in &e.members {
                if member.is_empty() {
                    return Err(GenError::UnnamedEnumMember {
                        spelling: e.spelling.to_string(),
                    });
                }
                switch_code.push_str(&format!(
                    "        case {}: {}::x_{}(args);\tbreak;\n",
                    index, wrapper, index
                ));
                self.generate_enum_member_call(&mut out, qualifier, member, index);
                index += 1;
            }
            // unnamed enums get member entries but no operations case
            if e.name.is_empty() {
                continue;
            }
            enum_found = true;
            self.generate_enum_operation_case(&mut enum_code, e)?;
        }

        for meth in &klass.virtual_overrides {
            self.generate_virtual_method(&mut out, klass, meth, &mut includes)?;
        }

        if enum_found {
            out.push_str("    static void xenum_operation(Shim::EnumOperation xop, Shim::Index xtype, void *&xdata, long &xvalue) {\n");
            out.push_str("        switch(xtype) {\n");
            out.push_str(&enum_code);
            out.push_str("        }\n");
            out.push_str("    }\n");
        }

        // A non-instantiable class never sees a deletion callback, but a
        // private destructor declaration keeps the compiler from trying
        // to synthesize one.
        if klass.can_instantiate {
            let class_idx =
                self.indexes
                    .class(class_name)
                    .ok_or_else(|| GenError::MissingClassIndex {
                        class: class_name.to_string(),
                    })?;
            out.push_str(&format!("    ~{}() ", wrapper));
            if let Some(thrown) = destructor.and_then(|d| d.exception_spec.as_ref()) {
                let spellings: Vec<String> = thrown.iter().map(|t| t.spelling()).collect();
                out.push_str(&format!("throw({}) ", spellings.join(", ")));
            }
            out.push_str(&format!(
                "{{ this->_binding->deleted({}, (void*)this); }}\n",
                class_idx
            ));
        } else {
            out.push_str("private:\n");
            out.push_str(&format!("    ~{}();\n", wrapper));
        }
        out.push_str("};\n");

        if enum_found {
            out.push_str(&format!(
                "void xenum_{}(Shim::EnumOperation xop, Shim::Index xtype, void *&xdata, long &xvalue) {{\n",
                underscore
            ));
            out.push_str(&format!(
                "    {}::xenum_operation(xop, xtype, xdata, xvalue);\n",
                wrapper
            ));
            out.push_str("}\n");
        }

        out.push_str(&format!(
            "void xcall_{}(Shim::Index xi, void *obj, Shim::Stack args) {{\n",
            underscore
        ));
        out.push_str(&format!("    {} *xself = ({}*)obj;\n", wrapper, wrapper));
        out.push_str("    switch(xi) {\n");
        out.push_str(&switch_code);
        if klass.has_public_destructor {
            out.push_str(&format!(
                "        case {}: delete ({}*)xself;\tbreak;\n",
                index, class_name
            ));
        }
        out.push_str("    }\n");
        out.push_str("}\n");

        Ok(ClassArtifact {
            class_name: klass.name.clone(),
            code: out,
            includes,
        })
    }
}

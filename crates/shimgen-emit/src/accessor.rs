//! Field accessors.
//!
//! Exposed fields get a get/set pair of generic entry points. The getter
//! writes the field into slot 0 through the slot-selection rule; the
//! setter reads slot 1 and casts it back, dereferencing when the field
//! travels in the object-pointer slot but is not itself a pointer.

use crate::Generator;
use shimgen_model::{Class, Field, StackField, Type};

impl<'a> Generator<'a> {
    pub(crate) fn generate_get_accessor(
        &self,
        out: &mut String,
        klass: &Class,
        field: &Field,
        ty: &Type,
        index: u32,
    ) {
        out.push_str("    ");
        let mut target = String::new();
        if field.is_static {
            out.push_str("static ");
        } else {
            target.push_str("this->");
        }
        target.push_str(&format!("{}::{}", klass.name, field.name));

        out.push_str(&format!("void x_{}(Shim::Stack x) {{\n", index));
        out.push_str(&format!(
            "        // {} {}::{}\n",
            ty.spelling(),
            klass.name,
            field.name
        ));
        out.push_str(&format!(
            "        x[0].{} = {};\n",
            ty.stack_field(),
            ty.assignment(&target)
        ));
        out.push_str("    }\n");
    }

    pub(crate) fn generate_set_accessor(
        &self,
        out: &mut String,
        klass: &Class,
        field: &Field,
        ty: &Type,
        index: u32,
    ) {
        out.push_str("    ");
        let mut target = String::new();
        if field.is_static {
            out.push_str("static ");
        } else {
            target.push_str("this->");
        }
        target.push_str(&format!("{}::{}", klass.name, field.name));

        out.push_str(&format!("void x_{}(Shim::Stack x) {{\n", index));
        out.push_str(&format!(
            "        // {} {}::{}=\n",
            ty.spelling(),
            klass.name,
            field.name
        ));
        out.push_str(&format!("        {} = ", target));

        let slot = ty.stack_field();
        let mut cast = ty.cast_spelling();
        if slot == StackField::Class && ty.pointer_depth == 0 {
            out.push('*');
            cast.push('*');
        }
        out.push_str(&format!("({})x[1].{};\n", cast, slot));
        out.push_str("    }\n");
    }
}

#[cfg(test)]
mod tests {
    use crate::Generator;
    use shimgen_model::{Class, Field, Indexes, Type};
    use smol_str::SmolStr;

    fn field(name: &str, ty: Type, is_static: bool) -> Field {
        Field {
            name: SmolStr::new(name),
            ty,
            is_static,
        }
    }

    #[test]
    fn instance_getter_reads_through_this() {
        let indexes = Indexes::default();
        let gen = Generator::new(&indexes);
        let klass = Class::new("Widget", "widget.h");
        let f = field("width", Type::primitive("int"), false);

        let mut out = String::new();
        gen.generate_get_accessor(&mut out, &klass, &f, &f.ty.clone(), 4);
        assert!(out.contains("void x_4(Shim::Stack x) {"));
        assert!(out.contains("x[0].s_int = this->Widget::width;"));
        assert!(!out.starts_with("    static"));
    }

    #[test]
    fn static_getter_skips_this() {
        let indexes = Indexes::default();
        let gen = Generator::new(&indexes);
        let klass = Class::new("Widget", "widget.h");
        let f = field("count", Type::primitive("int"), true);

        let mut out = String::new();
        gen.generate_get_accessor(&mut out, &klass, &f, &f.ty.clone(), 5);
        assert!(out.contains("    static void x_5(Shim::Stack x) {"));
        assert!(out.contains("x[0].s_int = Widget::count;"));
    }

    #[test]
    fn setter_dereferences_class_valued_fields() {
        let indexes = Indexes::default();
        let gen = Generator::new(&indexes);
        let klass = Class::new("Widget", "widget.h");
        let f = field("title", Type::class_value("QString", "qstring.h"), false);

        let mut out = String::new();
        gen.generate_set_accessor(&mut out, &klass, &f, &f.ty.clone(), 6);
        assert!(out.contains("this->Widget::title = *(QString*)x[1].s_class;"));
    }

    #[test]
    fn setter_keeps_plain_pointers() {
        let indexes = Indexes::default();
        let gen = Generator::new(&indexes);
        let klass = Class::new("Widget", "widget.h");
        let f = field("buffer", Type::primitive("char").ptr(), false);

        let mut out = String::new();
        gen.generate_set_accessor(&mut out, &klass, &f, &f.ty.clone(), 7);
        assert!(out.contains("this->Widget::buffer = (char*)x[1].s_voidp;"));
    }
}

//! Native type representation and rendering.
//!
//! A [`Type`] knows how to spell itself in the generated source and which
//! slot of the generic argument stack carries a value of that type across
//! the reflective calling boundary. Both sides of a call (marshal and
//! unmarshal) must agree on the slot or memory is misinterpreted, so the
//! selection logic lives here and nowhere else.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// The tagged union field a value occupies on the generic call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackField {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Enum,
    Class,
    VoidP,
}

impl StackField {
    pub fn as_str(self) -> &'static str {
        match self {
            StackField::Bool => "s_bool",
            StackField::Char => "s_char",
            StackField::UChar => "s_uchar",
            StackField::Short => "s_short",
            StackField::UShort => "s_ushort",
            StackField::Int => "s_int",
            StackField::UInt => "s_uint",
            StackField::Long => "s_long",
            StackField::ULong => "s_ulong",
            StackField::Float => "s_float",
            StackField::Double => "s_double",
            StackField::Enum => "s_enum",
            StackField::Class => "s_class",
            StackField::VoidP => "s_voidp",
        }
    }
}

impl fmt::Display for StackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A class referenced inside a type.
///
/// Carries the header that declares the class so emitters can report it
/// for `#include` collection without a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub name: SmolStr,
    #[serde(default)]
    pub header: SmolStr,
}

/// A native type as seen by the generator.
///
/// `base` is the spelling without pointer, reference, or array markers
/// (e.g. `unsigned int`, `QString`). Function pointers are the exception:
/// they carry their full spelling with a `(*)` marker so an identifier
/// can be inserted into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub base: SmolStr,
    #[serde(default)]
    pub pointer_depth: u8,
    #[serde(default)]
    pub is_ref: bool,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_function_pointer: bool,
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub class: Option<ClassRef>,
}

impl Type {
    pub fn void() -> Self {
        Type::primitive("void")
    }

    /// A non-class, non-enum type spelled `base`.
    pub fn primitive(base: &str) -> Self {
        Type {
            base: SmolStr::new(base),
            pointer_depth: 0,
            is_ref: false,
            is_array: false,
            is_function_pointer: false,
            is_enum: false,
            class: None,
        }
    }

    /// A class type passed by value.
    pub fn class_value(name: &str, header: &str) -> Self {
        Type {
            class: Some(ClassRef {
                name: SmolStr::new(name),
                header: SmolStr::new(header),
            }),
            ..Type::primitive(name)
        }
    }

    /// An enum type with its qualified spelling.
    pub fn enum_(spelling: &str) -> Self {
        Type {
            is_enum: true,
            ..Type::primitive(spelling)
        }
    }

    pub fn ptr(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    pub fn ref_(mut self) -> Self {
        self.is_ref = true;
        self
    }

    pub fn is_void(&self) -> bool {
        self.base == "void"
            && self.pointer_depth == 0
            && !self.is_ref
            && !self.is_array
            && !self.is_function_pointer
    }

    /// The native spelling of this type.
    ///
    /// Arrays decay to one level of pointer indirection; the marshaling
    /// code adds a second level on top of this where the calling
    /// convention requires it.
    pub fn spelling(&self) -> String {
        if self.is_function_pointer {
            return self.base.to_string();
        }
        let mut s = String::from(self.base.as_str());
        for _ in 0..self.pointer_depth {
            s.push('*');
        }
        if self.is_array {
            s.push('*');
        }
        if self.is_ref {
            s.push('&');
        }
        s
    }

    /// The spelling with an identifier inserted, e.g. for a declared
    /// local or a named constructor parameter. For function pointers the
    /// identifier goes inside the `(*)` marker.
    pub fn spelling_with(&self, ident: &str) -> String {
        if self.is_function_pointer {
            return self.base.replacen("(*)", &format!("(*{})", ident), 1);
        }
        format!("{} {}", self.spelling(), ident)
    }

    /// The spelling with any reference marker stripped, usable as a cast
    /// target (casting to a reference type is invalid at the wrapper
    /// layer).
    pub fn cast_spelling(&self) -> String {
        self.spelling().replace('&', "")
    }

    /// Selects the generic stack slot for a value of this type.
    ///
    /// Arrays and function pointers always use the void-pointer slot.
    /// Other class-typed values travel in the object-pointer slot
    /// regardless of pointer depth; enums in the integral enum slot; raw
    /// pointers in the void-pointer slot; primitives in their matching
    /// slot. Unknown spellings fall back to the void-pointer slot (the
    /// model is trusted to be valid).
    pub fn stack_field(&self) -> StackField {
        if self.is_function_pointer || self.is_array {
            return StackField::VoidP;
        }
        if self.class.is_some() {
            return StackField::Class;
        }
        if self.pointer_depth > 0 {
            return StackField::VoidP;
        }
        if self.is_enum {
            return StackField::Enum;
        }
        let base = self.base.strip_prefix("const ").unwrap_or(&self.base);
        match base {
            "bool" => StackField::Bool,
            "char" | "signed char" => StackField::Char,
            "unsigned char" => StackField::UChar,
            "short" | "short int" | "signed short" => StackField::Short,
            "unsigned short" | "unsigned short int" => StackField::UShort,
            "int" | "signed int" | "signed" => StackField::Int,
            "unsigned" | "unsigned int" => StackField::UInt,
            "long" | "long int" | "long long" | "long long int" => StackField::Long,
            "unsigned long" | "unsigned long int" | "unsigned long long"
            | "unsigned long long int" => StackField::ULong,
            "float" => StackField::Float,
            "double" | "long double" => StackField::Double,
            _ => StackField::VoidP,
        }
    }

    /// Renders the expression that stores `expr` into this type's stack
    /// slot.
    ///
    /// A class passed by value is copied onto the heap and the slot holds
    /// the pointer; the reading side owns the copy and must free it after
    /// reconstructing the value (manual-ownership protocol of the calling
    /// convention).
    pub fn assignment(&self, expr: &str) -> String {
        match self.stack_field() {
            StackField::Class if self.pointer_depth == 0 && !self.is_ref && !self.is_array => {
                format!("(void*)new {}({})", self.base, expr)
            }
            StackField::Class if self.is_ref => format!("(void*)&{}", expr),
            StackField::Class | StackField::VoidP => format!("(void*){}", expr),
            StackField::Enum => format!("(long){}", expr),
            _ => expr.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_selection_by_category() {
        assert_eq!(Type::primitive("int").stack_field(), StackField::Int);
        assert_eq!(
            Type::primitive("unsigned long").stack_field(),
            StackField::ULong
        );
        assert_eq!(Type::primitive("double").stack_field(), StackField::Double);
        assert_eq!(Type::enum_("Qt::Alignment").stack_field(), StackField::Enum);
        // raw pointers use the void-pointer slot
        assert_eq!(Type::primitive("char").ptr().stack_field(), StackField::VoidP);
        // class values, references, and pointers all use the object slot
        let w = Type::class_value("Widget", "widget.h");
        assert_eq!(w.stack_field(), StackField::Class);
        assert_eq!(w.clone().ref_().stack_field(), StackField::Class);
        assert_eq!(w.ptr().stack_field(), StackField::Class);
    }

    #[test]
    fn spelling_and_ident_insertion() {
        let t = Type::primitive("int").ptr();
        assert_eq!(t.spelling(), "int*");
        assert_eq!(t.spelling_with("xret"), "int* xret");

        let r = Type::class_value("QString", "qstring.h").ref_();
        assert_eq!(r.spelling(), "QString&");
        assert_eq!(r.cast_spelling(), "QString");
    }

    #[test]
    fn function_pointer_ident_goes_inside() {
        let fp = Type {
            is_function_pointer: true,
            ..Type::primitive("void (*)(int, char*)")
        };
        assert_eq!(fp.spelling_with("xret"), "void (*xret)(int, char*)");
        assert_eq!(fp.stack_field(), StackField::VoidP);
    }

    #[test]
    fn arrays_decay_to_a_pointer() {
        let a = Type {
            is_array: true,
            ..Type::primitive("int")
        };
        assert_eq!(a.spelling(), "int*");
        assert_eq!(a.stack_field(), StackField::VoidP);
    }

    #[test]
    fn assignment_follows_value_category() {
        let v = Type::class_value("Widget", "widget.h");
        assert_eq!(v.assignment("xret"), "(void*)new Widget(xret)");
        assert_eq!(v.clone().ref_().assignment("xret"), "(void*)&xret");
        assert_eq!(v.ptr().assignment("xret"), "(void*)xret");
        assert_eq!(Type::enum_("Qt::Key").assignment("xret"), "(long)xret");
        assert_eq!(Type::primitive("int").assignment("xret"), "xret");
    }
}

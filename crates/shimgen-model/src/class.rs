//! The class model consumed by the generator.
//!
//! All of these entities are produced by an external header front-end and
//! arrive as immutable snapshots; the generator only reads them.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Member access level. Private members are excluded from generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Union,
    Namespace,
}

/// Opaque front-end-assigned identity of a method, used to look up its
/// globally assigned numeric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId(pub u32);

/// What a method entry actually is. Field accessors are synthesized
/// methods that reference a field of the owning class by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MethodKind {
    #[default]
    Plain,
    Constructor,
    Destructor,
    FieldGetter(usize),
    FieldSetter(usize),
}

/// Present when a model method maps to a free function rather than a
/// true member; the call is then qualified by `namespace` instead of the
/// class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeFunction {
    #[serde(default)]
    pub namespace: SmolStr,
    #[serde(default)]
    pub header: SmolStr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub id: MethodId,
    pub name: SmolStr,
    /// Constructors carry a pointer to the owning class here so the new
    /// instance lands in the return slot like any other object pointer.
    #[serde(default = "Type::void")]
    pub ret: Type,
    #[serde(default)]
    pub params: Vec<Type>,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    /// Whether calls to this method go through virtual dispatch in the
    /// emitted class (front-end virtuality analysis).
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_pure_virtual: bool,
    #[serde(default)]
    pub force_dynamic_dispatch: bool,
    /// `None` means no exception specification; `Some(vec![])` means
    /// `throw()`.
    #[serde(default)]
    pub exception_spec: Option<Vec<Type>>,
    /// Trailing default-argument literals left over when this entry was
    /// synthesized from another signature's defaults; appended verbatim
    /// after the marshaled arguments.
    #[serde(default)]
    pub remaining_defaults: Vec<SmolStr>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub free_function: Option<FreeFunction>,
    /// Qualified name of the class that declares this method, when it is
    /// not the class being emitted (inherited virtual overrides call
    /// through to this base).
    #[serde(default)]
    pub declared_in: Option<SmolStr>,
}

impl Method {
    pub fn new(id: u32, name: &str, ret: Type) -> Self {
        Method {
            id: MethodId(id),
            name: SmolStr::new(name),
            ret,
            params: Vec::new(),
            kind: MethodKind::Plain,
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_pure_virtual: false,
            force_dynamic_dispatch: false,
            exception_spec: None,
            remaining_defaults: Vec::new(),
            access: Access::Public,
            free_function: None,
            declared_in: None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    pub fn is_destructor(&self) -> bool {
        self.kind == MethodKind::Destructor
    }

    /// Human-readable signature used in generated comments.
    pub fn signature(&self, class_name: &str) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.spelling()).collect();
        let mut s = if self.is_constructor() {
            format!("{}::{}({})", class_name, self.name, params.join(", "))
        } else {
            format!(
                "{} {}::{}({})",
                self.ret.spelling(),
                class_name,
                self.name,
                params.join(", ")
            )
        };
        if self.is_const {
            s.push_str(" const");
        }
        s
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: SmolStr,
    pub ty: Type,
    #[serde(default)]
    pub is_static: bool,
}

/// An enum exposed by a class or namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enum {
    /// Empty for unnamed enums, whose members still get call entries but
    /// no operations-table case.
    #[serde(default)]
    pub name: SmolStr,
    /// Fully qualified spelling, the key into the global type index.
    pub spelling: SmolStr,
    /// `None` when the enum is nested in the emitted class (members are
    /// qualified by the class name); `Some(ns)` when it lives in a
    /// namespace instead, possibly empty for the global scope.
    #[serde(default)]
    pub qualifier: Option<SmolStr>,
    pub members: Vec<SmolStr>,
    #[serde(default)]
    pub access: Access,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    /// Fully qualified name, e.g. `KParts::Part`.
    pub name: SmolStr,
    #[serde(default)]
    pub kind: ClassKind,
    /// Header declaring the native class, included by the output file
    /// that carries this wrapper.
    #[serde(default)]
    pub header: SmolStr,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub enums: Vec<Enum>,
    /// Virtual methods the wrapper must override, as computed by the
    /// front-end's virtuality analysis.
    #[serde(default)]
    pub virtual_overrides: Vec<Method>,
    #[serde(default)]
    pub can_instantiate: bool,
    #[serde(default)]
    pub has_public_destructor: bool,
    #[serde(default)]
    pub has_virtual_destructor: bool,
}

impl Class {
    pub fn new(name: &str, header: &str) -> Self {
        Class {
            name: SmolStr::new(name),
            kind: ClassKind::Class,
            header: SmolStr::new(header),
            methods: Vec::new(),
            fields: Vec::new(),
            enums: Vec::new(),
            virtual_overrides: Vec::new(),
            can_instantiate: false,
            has_public_destructor: false,
            has_virtual_destructor: false,
        }
    }

    pub fn is_namespace(&self) -> bool {
        self.kind == ClassKind::Namespace
    }

    pub fn is_union(&self) -> bool {
        self.kind == ClassKind::Union
    }

    /// Namespace separators replaced for use in emitted identifiers.
    pub fn underscore_name(&self) -> String {
        self.name.replace("::", "__")
    }

    pub fn wrapper_name(&self) -> String {
        format!("x_{}", self.underscore_name())
    }

    /// Last path component, used as the base-class name in constructor
    /// initializer lists.
    pub fn base_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Whether the wrapper multiply-inherits the run-time marker type.
    /// Requires both a virtual and a public destructor on the native
    /// class.
    pub fn has_marker(&self) -> bool {
        self.has_virtual_destructor && self.has_public_destructor
    }

    pub fn destructor(&self) -> Option<&Method> {
        self.methods.iter().find(|m| m.is_destructor())
    }
}

/// The complete input model: every class selected for generation, in the
/// order their wrappers are emitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub classes: Vec<Class>,
}

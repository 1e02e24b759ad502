//! Globally assigned numeric indices.
//!
//! The surrounding toolchain assigns every method, class, and enum type a
//! stable small integer before generation starts; the generated switch
//! tables and callback identifiers depend on these being fixed and
//! globally unique ahead of time. The generator treats them as an
//! injected, immutable lookup table.

use crate::class::MethodId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indexes {
    /// Method identity -> global method index (virtual-override callback
    /// identifier).
    #[serde(default)]
    pub methods: FxHashMap<MethodId, i32>,
    /// Qualified class name -> global class index (deletion-notification
    /// identifier).
    #[serde(default)]
    pub classes: FxHashMap<SmolStr, i32>,
    /// Qualified type spelling -> global type index (enum operations
    /// table key).
    #[serde(default)]
    pub types: FxHashMap<SmolStr, i32>,
}

impl Indexes {
    pub fn method(&self, id: MethodId) -> Option<i32> {
        self.methods.get(&id).copied()
    }

    pub fn class(&self, name: &str) -> Option<i32> {
        self.classes.get(name).copied()
    }

    pub fn type_(&self, spelling: &str) -> Option<i32> {
        self.types.get(spelling).copied()
    }
}

//! Wrapper-class source generation.
//!
//! Takes the immutable class model plus the injected global index tables
//! and produces, per class, one block of C++ source implementing the
//! reflective calling convention: indexed generic entry points, a
//! dispatch switch, virtual-method overrides that call back into the
//! external runtime, and enum operation tables.

mod accessor;
mod class;
mod enums;
mod error;
mod method;
mod virtuals;

pub use class::ClassArtifact;
pub use error::GenError;

use shimgen_model::{Class, Indexes};

/// Generates wrapper-class source, one class at a time.
///
/// Holds only borrowed, read-only state; the per-class dispatch counter
/// and includes set live on the stack of each [`Generator::generate_class`]
/// call, so classes can be emitted in any order or split across shards as
/// long as the index tables were assigned beforehand.
pub struct Generator<'a> {
    indexes: &'a Indexes,
}

impl<'a> Generator<'a> {
    pub fn new(indexes: &'a Indexes) -> Self {
        Self { indexes }
    }

    /// Emit the complete wrapper block for one class: the wrapper class
    /// definition (or just the free dispatch function for unions), the
    /// enum operation function if any named enums are exposed, and the
    /// dispatch function.
    pub fn generate_class(&self, klass: &Class) -> Result<ClassArtifact, GenError> {
        self.write_class(klass)
    }
}

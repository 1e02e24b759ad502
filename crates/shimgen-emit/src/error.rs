//! Fail-fast diagnostics for model contract violations.
//!
//! The generator is a pure transform over a trusted, already-validated
//! model; none of these are recoverable. Generation aborts with an error
//! naming the offending entity rather than emitting partially-correct
//! output.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum GenError {
    #[error("no global method index assigned for `{method}`")]
    #[diagnostic(help("index tables must be assigned before generation starts"))]
    MissingMethodIndex { method: String },

    #[error("no global class index assigned for `{class}`")]
    #[diagnostic(help("index tables must be assigned before generation starts"))]
    MissingClassIndex { class: String },

    #[error("no global type index assigned for enum `{spelling}`")]
    #[diagnostic(help("index tables must be assigned before generation starts"))]
    MissingTypeIndex { spelling: String },

    #[error("enum `{spelling}` has a member with an empty name")]
    UnnamedEnumMember { spelling: String },

    #[error("accessor `{method}` does not reference a valid field of `{class}`")]
    BadFieldAccessor { method: String, class: String },

    #[error("constructor `{method}` of `{class}` carries a free-function mapping")]
    FreeFunctionConstructor { method: String, class: String },
}

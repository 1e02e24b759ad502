//! Output partitioning.
//!
//! Generated class blocks are spread over a fixed number of `.cpp` files
//! so large modules compile in parallel. Classes keep their model order;
//! each file takes `classes / parts` of them and the last file takes the
//! remainder. Every file is self-contained: it carries the headers of the
//! classes it wraps plus whatever headers emission reported.

use indexmap::IndexSet;
use shimgen_emit::{GenError, Generator};
use shimgen_model::{Indexes, Model};
use smol_str::SmolStr;
use std::fs;
use std::path::PathBuf;

/// Where and how to shard the generated sources.
#[derive(Debug, Clone)]
pub struct PartitionOptions {
    pub output_dir: PathBuf,
    /// Number of output files. Clamped to at least 1.
    pub parts: usize,
    /// Module name, used in the runtime header include and the wrapping
    /// namespace.
    pub module: String,
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DriverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Gen(#[from] GenError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs generation over a whole model and writes the sharded output.
pub struct Driver<'a> {
    model: &'a Model,
    indexes: &'a Indexes,
}

impl<'a> Driver<'a> {
    pub fn new(model: &'a Model, indexes: &'a Indexes) -> Self {
        Self { model, indexes }
    }

    /// Generates every class without writing anything. Returns the number
    /// of classes that emitted cleanly; the first contract violation in
    /// the model aborts the run.
    pub fn check(&self) -> Result<usize, DriverError> {
        let gen = Generator::new(self.indexes);
        for klass in &self.model.classes {
            gen.generate_class(klass)?;
        }
        Ok(self.model.classes.len())
    }

    /// Generates and writes all output files, returning their paths in
    /// part order.
    pub fn write_class_files(
        &self,
        opts: &PartitionOptions,
    ) -> Result<Vec<PathBuf>, DriverError> {
        let gen = Generator::new(self.indexes);
        let classes = &self.model.classes;
        let parts = opts.parts.max(1);
        let per_file = classes.len() / parts;

        fs::create_dir_all(&opts.output_dir).map_err(|source| DriverError::CreateDir {
            path: opts.output_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(parts);
        let mut start = 0;
        for part in 0..parts {
            let end = if part == parts - 1 {
                classes.len()
            } else {
                start + per_file
            };
            let chunk = &classes[start..end];
            start = end;

            let mut includes: IndexSet<SmolStr> = IndexSet::new();
            let mut body = String::new();
            for klass in chunk {
                if !klass.header.is_empty() {
                    includes.insert(klass.header.clone());
                }
                let artifact = gen.generate_class(klass)?;
                includes.extend(artifact.includes);
                body.push_str(&artifact.code);
                body.push('\n');
            }

            let path = opts.output_dir.join(format!("x_{}.cpp", part + 1));
            let text = render_file(&opts.module, &includes, &body);
            fs::write(&path, text).map_err(|source| DriverError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(
                path = %path.display(),
                classes = chunk.len(),
                "wrote output file"
            );
            written.push(path);
        }
        Ok(written)
    }
}

/// One complete output file: banner, sorted includes, runtime headers,
/// the marker-class definition, and all class blocks inside the module
/// namespace.
fn render_file(module: &str, includes: &IndexSet<SmolStr>, body: &str) -> String {
    let mut out = String::new();
    out.push_str("//Auto-generated by shimgen. DO NOT EDIT.\n");

    let mut sorted: Vec<&SmolStr> = includes.iter().filter(|h| !h.is_empty()).collect();
    sorted.sort();
    for header in sorted {
        out.push_str(&format!("#include <{}>\n", header));
    }
    out.push('\n');
    out.push_str("#include <shim.h>\n");
    out.push_str(&format!("#include <{}_shim.h>\n", module));
    out.push('\n');
    out.push_str("class __internal_ShimClass { };\n");
    out.push('\n');
    out.push_str(&format!("namespace __shim{} {{\n\n", module));
    out.push_str(body);
    out.push_str("}\n");
    out
}

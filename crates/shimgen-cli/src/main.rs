use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use shimgen_driver::{Driver, PartitionOptions};
use shimgen_model::{Indexes, Model};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// On-disk input: the class model plus the pre-assigned index tables,
/// as one JSON document.
#[derive(Deserialize)]
struct ModelFile {
    #[serde(flatten)]
    model: Model,
    #[serde(default)]
    indexes: Indexes,
}

#[derive(Parser)]
#[command(name = "shimgen")]
#[command(author, version, about = "Generates reflective C++ wrapper classes from a class model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate wrapper sources from a model file
    Generate {
        /// Class model (JSON)
        model: PathBuf,

        /// Directory for the generated .cpp files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of output files to spread the classes over
        #[arg(long, default_value_t = 20)]
        parts: usize,

        /// Module name used in the runtime include and the wrapping
        /// namespace
        #[arg(short, long)]
        module: String,
    },

    /// Validate a model file without writing any output
    Check {
        /// Class model (JSON)
        model: PathBuf,
    },
}

fn load(path: &Path) -> Result<(Model, Indexes)> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let file: ModelFile = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
    Ok((file.model, file.indexes))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            model,
            output_dir,
            parts,
            module,
        } => {
            let (model, indexes) = load(&model)?;
            let driver = Driver::new(&model, &indexes);
            let files = driver.write_class_files(&PartitionOptions {
                output_dir,
                parts,
                module,
            })?;
            println!("Wrote {} files", files.len());
        }

        Commands::Check { model: path } => {
            let (model, indexes) = load(&path)?;
            let driver = Driver::new(&model, &indexes);
            let count = driver.check()?;
            println!("{}: OK ({} classes)", path.display(), count);
        }
    }

    Ok(())
}

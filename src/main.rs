//! Command-line interface for split-reader
//!
//! # Usage Examples
//!
//! ```bash
//! # Whole file, one JSON record per line on stdout
//! split-reader read data.csv
//!
//! # Second 1MB split of a file
//! split-reader read data.csv --start 1048576 --length 1048576
//!
//! # Every .csv file in a directory, 64MB splits, quote-aware
//! split-reader read /data/exports/ --extension csv --split-size 67108864 --quote-aware
//!
//! # Job configuration from YAML
//! split-reader read data.csv --config job.yaml
//!
//! # Planned splits as JSON
//! split-reader plan data.csv --split-size 67108864
//! ```
//!
//! Set `RUST_LOG=debug` for per-split logging on stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use split_reader::file::FileSource;
use split_reader::line::TaskContext;
use split_reader::{plan_files, read_files, ReaderOpts, SplitOpts};

#[derive(Parser)]
#[command(name = "split-reader")]
#[command(about = "Decode byte-range splits of text files into offset-keyed line records")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read records and print them as JSON lines
    Read {
        /// File or directory (ending with /) to read
        source: String,

        #[command(flatten)]
        split_opts: SplitOpts,

        #[command(flatten)]
        reader_opts: ReaderOpts,
    },
    /// Print the splits a source would be cut into
    Plan {
        /// File or directory (ending with /) to plan
        source: String,

        /// Split size in bytes
        #[arg(long)]
        split_size: u64,

        /// Only plan files with this extension when the source is a directory
        #[arg(long)]
        extension: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            source,
            split_opts,
            reader_opts,
        } => {
            let source = FileSource::parse(&source)?;
            let files = reader_opts.select(
                source
                    .resolve()
                    .await
                    .with_context(|| format!("Failed to resolve {}", source.display_name()))?,
            );
            if files.is_empty() {
                tracing::warn!("No files to read in {}", source.display_name());
                return Ok(());
            }

            let ctx = TaskContext::new(reader_opts.job_config()?);
            tokio::task::spawn_blocking(move || {
                let stdout = std::io::stdout();
                let mut out = std::io::BufWriter::new(stdout.lock());
                read_files(&files, &split_opts, &ctx, &mut out)
            })
            .await
            .context("Reader task panicked")??;
        }
        Commands::Plan {
            source,
            split_size,
            extension,
        } => {
            let source = FileSource::parse(&source)?;
            let selector = ReaderOpts {
                extension,
                ..Default::default()
            };
            let files = selector.select(source.resolve().await?);
            let splits = plan_files(&files, split_size, &TaskContext::default())?;
            println!("{}", serde_json::to_string_pretty(&splits)?);
        }
    }

    Ok(())
}

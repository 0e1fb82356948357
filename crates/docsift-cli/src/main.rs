//! docsift command-line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docsift::{ExtractionCategory, ExtractionConfig, ExtractionRequest, ExtractionResponse, ExtractionResult, FileFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategory {
    Text,
    Tables,
    Images,
}

impl From<CliCategory> for ExtractionCategory {
    fn from(category: CliCategory) -> Self {
        match category {
            CliCategory::Text => ExtractionCategory::Text,
            CliCategory::Tables => ExtractionCategory::Tables,
            CliCategory::Images => ExtractionCategory::Images,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Extracted content only
    Text,
    /// Full response as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "docsift", version)]
#[command(about = "Extract text, tables and images from documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract content from a document
    Extract {
        /// Document to extract
        file: PathBuf,

        /// 1-based page selection for PDFs, e.g. "1-3,5"
        #[arg(short, long)]
        pages: Option<String>,

        /// What to extract from PDFs
        #[arg(short, long, value_enum, default_value = "text")]
        category: CliCategory,

        /// Configuration file (TOML or JSON). Defaults to the nearest docsift.toml
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported file extensions
    Formats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "docsift=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Formats => {
            for format in FileFormat::ALL {
                println!("{:<6} {}", format.extensions().join(", "), format.mime_type());
            }
            Ok(())
        }

        Commands::Extract {
            file,
            pages,
            category,
            config,
            format,
            output,
        } => {
            let config = load_config(config.as_deref())?;

            // The OCR engine is loaded once, before any document is touched.
            docsift::ocr::initialize(&config.ocr).context("Failed to initialize the OCR engine")?;

            let mut request = ExtractionRequest::new(category.into());
            if let Some(pages) = pages {
                request = request.with_page_range(pages);
            }

            let response = docsift::extract_file(&file, &request, &config)
                .await
                .with_context(|| format!("Failed to extract {}", file.display()))?;
            tracing::info!("{}", response.message);

            let rendered = render(&response, format)?;
            match output {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", rendered),
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let config = match path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ExtractionConfig::discover()?.unwrap_or_default(),
    }
    .apply_env();
    config.validate()?;
    Ok(config)
}

fn render(response: &ExtractionResponse, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(response)? + "\n"),
        OutputFormat::Text => Ok(match &response.result {
            ExtractionResult::Text(text) => text.clone(),
            ExtractionResult::TableSet(tables) => {
                let mut out = String::new();
                for table in tables {
                    out.push_str(&format!("## Table {}\n\n{}\n\n", table.table_index, table.context));
                    out.push_str(&docsift::extraction::rows_to_markdown(table.table_data.rows()));
                    out.push('\n');
                }
                out
            }
            ExtractionResult::ImageSet(images) => images
                .iter()
                .map(|image| format!("{}\t{}\n", image.image_index, image.image_url))
                .collect(),
            ExtractionResult::NotFound { message, .. } => format!("{}\n", message),
        }),
    }
}

//! Conceptmap CLI: build concept hierarchies from paper corpora.
//!
//! Usage:
//!   conceptmap build --papers <file|dir> [--config file.yaml] [--output file] [--seed N]
//!   conceptmap config
//!   conceptmap schema
//!
//! Logs go to stderr (filter with `CONCEPTMAP_LOG`); stdout carries only the
//! requested document.

use clap::{Parser, Subcommand};
use conceptmap::{
    ConceptPipeline, Embedder, HashingEmbedder, HierarchyDocument, Paper, PipelineConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "conceptmap",
    version,
    about = "Evidence-grounded concept hierarchies from academic papers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a concept hierarchy and print it as JSON
    Build {
        /// JSON array, JSON-lines file, or directory of .json/.jsonl files
        #[arg(long)]
        papers: PathBuf,
        /// YAML configuration (defaults to the user config file if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the embedding seed
        #[arg(long)]
        seed: Option<u64>,
        /// Use the fastembed ONNX model instead of the hashing embedder
        #[cfg(feature = "embeddings")]
        #[arg(long)]
        fastembed: bool,
    },
    /// Print the default configuration as YAML
    Config,
    /// Print the JSON schema of the output document
    Schema,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CONCEPTMAP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Get the default config path (~/.config/conceptmap/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("conceptmap").join("config.yaml"))
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig, String> {
    let path = match path {
        Some(p) => p,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(p) => p,
            None => return Ok(PipelineConfig::default()),
        },
    };
    PipelineConfig::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parse one file: a JSON array, a single JSON object, or JSON lines
fn parse_papers(path: &Path) -> Result<Vec<Paper>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| format!("{}: {}", path.display(), e));
    }
    if let Ok(paper) = serde_json::from_str::<Paper>(trimmed) {
        return Ok(vec![paper]);
    }

    let mut papers = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let paper = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: {}", path.display(), n + 1, e))?;
        papers.push(paper);
    }
    Ok(papers)
}

fn load_papers(path: &Path) -> Result<Vec<Paper>, String> {
    if !path.is_dir() {
        return parse_papers(path);
    }

    let mut papers = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| format!("Failed to walk {}: {}", path.display(), e))?;
        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "json" || ext == "jsonl");
        if entry.file_type().is_file() && is_json {
            papers.extend(parse_papers(entry.path())?);
        }
    }
    Ok(papers)
}

#[cfg(feature = "embeddings")]
fn select_embedder(fastembed: bool, seed: u64) -> Result<Arc<dyn Embedder>, String> {
    if fastembed {
        let model = conceptmap::FastEmbedEmbedder::default_model()
            .map_err(|e| format!("Failed to load embedding model: {}", e))?;
        return Ok(Arc::new(model));
    }
    Ok(Arc::new(HashingEmbedder::with_seed(seed)))
}

#[cfg(not(feature = "embeddings"))]
fn select_embedder(_fastembed: bool, seed: u64) -> Result<Arc<dyn Embedder>, String> {
    Ok(Arc::new(HashingEmbedder::with_seed(seed)))
}

fn cmd_build(
    papers: &Path,
    config: Option<PathBuf>,
    output: Option<&Path>,
    seed: Option<u64>,
    fastembed: bool,
) -> Result<(), String> {
    let mut config = load_config(config)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let papers = load_papers(papers)?;
    let embedder = select_embedder(fastembed, config.random_seed)?;
    let pipeline = ConceptPipeline::new(config, embedder).map_err(|e| e.to_string())?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
    let hierarchy = rt.block_on(pipeline.run(&papers)).map_err(|e| e.to_string())?;
    let json = hierarchy
        .to_json_pretty()
        .map_err(|e| format!("Failed to serialize hierarchy: {}", e))?;

    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn cmd_config() -> Result<(), String> {
    let yaml = PipelineConfig::default()
        .to_yaml_string()
        .map_err(|e| e.to_string())?;
    print!("{}", yaml);
    Ok(())
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(HierarchyDocument);
    let json = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        #[cfg(feature = "embeddings")]
        Commands::Build {
            papers,
            config,
            output,
            seed,
            fastembed,
        } => cmd_build(&papers, config, output.as_deref(), seed, fastembed),
        #[cfg(not(feature = "embeddings"))]
        Commands::Build {
            papers,
            config,
            output,
            seed,
        } => cmd_build(&papers, config, output.as_deref(), seed, false),
        Commands::Config => cmd_config(),
        Commands::Schema => cmd_schema(),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stretch_rs::{ClientConfig, Server};

mod commands;
mod telemetry;

/// Command line client for a document-search server
#[derive(Debug, Parser)]
#[command(name = "stretch", version)]
pub struct Cli {
    /// Server base URL (overrides the config file)
    #[arg(long, env = "STRETCH_URL", global = true)]
    url: Option<String>,

    /// JSON client configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug logging for the client crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Server banner
    Info,
    /// Cluster health
    Health,
    /// Exit with status 1 unless the server answers
    Up,
    /// Index administration
    #[command(subcommand)]
    Index(IndexCommand),
    /// Search an index (or one type in it)
    Search(SearchArgs),
    /// Fetch one document
    Get(GetArgs),
    /// Index one document under an id
    Put(DocArgs),
    /// Delete one document
    Delete {
        index: String,
        doc_type: String,
        id: String,
    },
    /// Bulk index a JSON array of documents read from FILE
    Bulk { index: String, file: PathBuf },
    /// Run text through an analyzer
    Analyze {
        text: String,
        #[arg(long)]
        index: Option<String>,
        #[arg(long)]
        analyzer: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum IndexCommand {
    /// Create an index, optionally with a settings/mappings body
    Create {
        name: String,
        #[arg(long)]
        body: Option<String>,
    },
    Delete { name: String },
    Exists { name: String },
    Stats { name: String },
    Mapping { name: String },
    Settings { name: String },
    Refresh { name: String },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub index: String,

    #[arg(long = "type")]
    pub doc_type: Option<String>,

    /// Query DSL body; defaults to match_all
    #[arg(long)]
    pub query: Option<String>,

    /// Query-string parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub index: String,
    pub doc_type: String,
    pub id: String,

    /// Comma separated stored fields to load instead of the source
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Print the whole response, not just the document
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct DocArgs {
    pub index: String,
    pub doc_type: String,
    pub id: String,
    /// Document source as JSON
    pub source: String,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            ClientConfig::load(path_str)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = telemetry::init_telemetry(cli.log_file.as_deref(), cli.verbose)?;

    let config = load_config(&cli)?;
    tracing::debug!("Connecting to {}", config.url);
    let server = Server::from_config(config).context("building client")?;

    commands::run(&server, cli.command).await
}

mod diff;
mod index;
mod schema;
mod update;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use symgraph_core::util::path_to_uri;
use symgraph_core::{IndexerConfig, StaleEdgePolicy};
use symgraph_lsp::config::{DEFAULT_CONNECTION_RETRIES, DEFAULT_HOST, DEFAULT_PORT};
use symgraph_lsp::{LspSession, SessionConfig};
use tracing::warn;

/// Graph file used when `--out` is not given, relative to the project root.
pub const DEFAULT_GRAPH_FILE: &str = ".symgraph/graph.json";

#[derive(Parser)]
#[command(
    name = "symgraph",
    version,
    about = "Builds a typed code graph from a language server",
    long_about = "Symgraph talks to a language server over a websocket, turns the symbols, \
                  declarations and references it reports into a graph of files, types and \
                  functions, and keeps that graph current as files change."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a whole project and save the graph
    Index {
        /// Path to the project root directory to index
        #[arg(value_name = "PROJECT_PATH")]
        root: PathBuf,
        /// Graph file (defaults to PROJECT_PATH/.symgraph/graph.json)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Only index files with these extensions
        #[arg(long, value_delimiter = ',', value_name = "EXT")]
        ext: Vec<String>,
        #[command(flatten)]
        lsp: LspArgs,
        #[command(flatten)]
        indexer: IndexerArgs,
    },
    /// Re-index changed files against a saved graph
    #[command(
        long_about = "Evicts everything the given files contributed to the saved graph, indexes \
                      them again and saves the result. Files that no longer exist are only evicted."
    )]
    Update {
        #[arg(value_name = "PROJECT_PATH")]
        root: PathBuf,
        /// Changed files, absolute or relative to the project root
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[command(flatten)]
        lsp: LspArgs,
        #[command(flatten)]
        indexer: IndexerArgs,
    },
    /// Preview what re-indexing changed files would do to a saved graph
    #[command(
        long_about = "Re-indexes the given files on top of the saved graph and reports the nodes \
                      and relationships that would be added, modified or removed, labelled with \
                      the base and change environments. The saved graph is left untouched."
    )]
    Diff {
        #[arg(value_name = "PROJECT_PATH")]
        root: PathBuf,
        /// Changed files, absolute or relative to the project root
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Environment the saved graph describes
        #[arg(long, default_value = "main")]
        base: String,
        /// Environment the changes come from, e.g. a branch or pull request
        #[arg(long = "env", default_value = "head")]
        environment: String,
        /// Write the diff here instead of stdout
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
        #[command(flatten)]
        lsp: LspArgs,
        #[command(flatten)]
        indexer: IndexerArgs,
    },
    /// Print the JSON schema of saved node and relationship records
    Schema,
}

#[derive(Args, Debug, Clone)]
pub struct LspArgs {
    #[arg(long = "lsp-host", env = "SYMGRAPH_LSP_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    #[arg(long = "lsp-port", env = "SYMGRAPH_LSP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Backend name passed to the server as `?name=`
    #[arg(long = "lsp-name", env = "SYMGRAPH_LSP_NAME")]
    pub name: Option<String>,
    #[arg(
        long = "lsp-retries",
        env = "SYMGRAPH_LSP_RETRIES",
        default_value_t = DEFAULT_CONNECTION_RETRIES
    )]
    pub retries: u32,
    /// Fail a request that gets no response in time
    #[arg(long = "request-timeout-ms", env = "SYMGRAPH_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
    /// Do not log `window/logMessage` notifications
    #[arg(long)]
    pub quiet_server: bool,
}

impl LspArgs {
    pub fn session_config(&self, root_uri: String) -> SessionConfig {
        let mut config = SessionConfig::new(root_uri)
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_connection_retries(self.retries)
            .with_request_timeout(self.request_timeout_ms.map(Duration::from_millis))
            .with_server_messages(!self.quiet_server);
        if let Some(name) = &self.name {
            config = config.with_server_name(name.clone());
        }
        config
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleEdges {
    Prune,
    Reject,
}

impl From<StaleEdges> for StaleEdgePolicy {
    fn from(value: StaleEdges) -> Self {
        match value {
            StaleEdges::Prune => StaleEdgePolicy::Prune,
            StaleEdges::Reject => StaleEdgePolicy::Reject,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexerArgs {
    /// JSON file with indexer settings; flags below override it
    #[arg(long = "indexer-config", value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Retry empty declaration lookups with textDocument/definition
    #[arg(long)]
    pub declaration_fallback: bool,
    /// Skip reference lookups (no CALLS/USES edges)
    #[arg(long)]
    pub no_references: bool,
    /// Ignore document links between files
    #[arg(long)]
    pub no_links: bool,
    /// What to do with edges left dangling by an update
    #[arg(long, value_enum)]
    pub stale_edges: Option<StaleEdges>,
}

impl IndexerArgs {
    pub fn indexer_config(&self) -> Result<IndexerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => IndexerConfig::default(),
        };
        if self.declaration_fallback {
            config.declaration_fallback = true;
        }
        if self.no_references {
            config.collect_references = false;
        }
        if self.no_links {
            config.link_documents = false;
        }
        if let Some(policy) = self.stale_edges {
            config.stale_edges = policy.into();
        }
        Ok(config)
    }
}

pub(crate) fn graph_file(root: &Path, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| root.join(DEFAULT_GRAPH_FILE))
}

/// Connected and initialized session rooted at `root`.
pub(crate) async fn open_session(
    root: &Path,
    lsp: &LspArgs,
) -> Result<LspSession, Box<dyn std::error::Error>> {
    let mut session = LspSession::new(lsp.session_config(path_to_uri(root)?));
    session.connect().await?;
    if let Err(e) = session.initialize().await {
        warn!(error = %e, "initialize failed");
        session.shutdown_exit_close().await;
        return Err(e.into());
    }
    Ok(session)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Schema = cli.command {
        return schema::run();
    }

    let _guard = symgraph_core::logging::init_logging("cli", true);
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index {
            root,
            out,
            ext,
            lsp,
            indexer,
        } => rt.block_on(index::run(root, out, ext, lsp, indexer)),
        Commands::Update {
            root,
            files,
            out,
            lsp,
            indexer,
        } => rt.block_on(update::run(root, files, out, lsp, indexer)),
        Commands::Diff {
            root,
            files,
            out,
            base,
            environment,
            report,
            lsp,
            indexer,
        } => {
            let args = diff::DiffArgs {
                root,
                files,
                out,
                base,
                environment,
                report,
            };
            rt.block_on(diff::run(args, lsp, indexer))
        }
        Commands::Schema => schema::run(),
    }
}

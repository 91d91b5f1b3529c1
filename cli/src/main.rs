mod logging;
mod process;
mod tree_file;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap_derive::{Parser, Subcommand};
use commands::{
    CommandTree, Completer, CompositeCompleter, Document, EngineOptions, NodeId, Suggestion,
};
use config::{PathManager, Settings, load_env_file};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::process::ProcessCompletable;
use crate::tree_file::{RemoteSource, TreeFile};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Shell-style completion over a declarative command tree",
    long_about = None
)]
struct Args {
    /// Command tree file (TOML)
    #[arg(long, env = "TREECOMPLETE_TREE")]
    tree: Option<PathBuf>,

    /// Settings file, instead of the one in the config directory
    #[arg(long, env = "TREECOMPLETE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Use this directory instead of the platform config directory
    #[arg(long, env = "TREECOMPLETE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Write logs to this file instead of the platform log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log to stderr instead of a file
    #[arg(long, conflicts_with = "log_file")]
    stderr: bool,

    #[arg(long, short)]
    tracing: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Print the suggestions for one input line
    Complete {
        line: String,

        /// Ask again after this many milliseconds so background fetches can land
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
    },
    /// Read lines from stdin and print suggestions for each
    Interactive,
    /// Print every visible command path with its description
    Tree,
}

fn print_suggestions(suggestions: &[Suggestion]) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for s in suggestions {
        let _ = writeln!(out, "{}\t{}", s.text, s.description);
    }
    let _ = out.flush();
}

fn print_tree(tree: &CommandTree, id: NodeId) {
    for child in tree.node(id).children() {
        let node = tree.node(*child);
        if node.is_hidden() {
            continue;
        }
        println!("{}\t{}", tree.path(*child), node.short());
        print_tree(tree, *child);
    }
}

/// Where logs go: stderr (None), an explicit file, or the platform log file
fn log_destination(log_file: Option<PathBuf>, stderr: bool) -> Option<PathBuf> {
    if stderr {
        return None;
    }
    if log_file.is_some() {
        return log_file;
    }
    if let Err(e) = PathManager::ensure_dirs_exist() {
        eprintln!("[treecomplete] Failed to create app directories: {}", e);
    }
    PathManager::log_file_path()
}

/// Resolve a source's completable children. Each must sit below the source,
/// since only the ancestors of a matched command are consulted.
fn completable_children(
    tree: &CommandTree,
    node: NodeId,
    source: &RemoteSource,
) -> Result<Vec<NodeId>> {
    let mut children = Vec::with_capacity(source.children.len());
    for path in &source.children {
        let child = tree
            .find(path)
            .with_context(|| format!("unknown completable child '{}' of '{}'", path, source.path))?;
        if child == node || !tree.ancestry(child).any(|a| a == node) {
            bail!("completable child '{}' is not a subcommand of '{}'", path, source.path);
        }
        children.push(child);
    }
    Ok(children)
}

async fn build_completer(
    tree_file: TreeFile,
    options: EngineOptions,
) -> Result<CompositeCompleter> {
    let tree = Arc::new(CommandTree::from_spec(tree_file.root));
    let completer = CompositeCompleter::for_tree(Arc::clone(&tree), options);

    for source in tree_file.remote {
        let node = tree
            .find(&source.path)
            .with_context(|| format!("remote source for unknown command '{}'", source.path))?;
        let children = completable_children(&tree, node, &source)
            .with_context(|| format!("invalid remote source '{}'", source.path))?;

        tracing::debug!(
            path = %source.path,
            program = %source.program,
            "registering remote source"
        );
        let descriptor = ProcessCompletable::new(node, source.program, source.args)
            .with_children(children);
        completer.remote().register(&source.path, Arc::new(descriptor)).await;
    }

    Ok(completer)
}

async fn run_interactive(completer: &CompositeCompleter) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line == "/quit" {
            break;
        }
        let suggestions = completer.complete(&Document::new(line)).await;
        print_suggestions(&suggestions);
        println!();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    let args = Args::parse();

    if let Some(dir) = &args.config_dir {
        PathManager::set_config_dir(dir.clone());
    }

    let settings = match &args.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    let filter = if args.tracing {
        "debug".to_string()
    } else {
        settings.log_filter.clone().unwrap_or_else(|| "warn".to_string())
    };
    let log_file = log_destination(args.log_file.clone(), args.stderr);
    let _guard = logging::init_logging(log_file.as_deref(), &filter);

    let tree_path = args
        .tree
        .clone()
        .or_else(|| settings.command_tree_path())
        .context("no command tree file given and no config directory available")?;
    let tree_file = TreeFile::load(&tree_path)?;
    tracing::info!(
        path = %tree_path.display(),
        sources = tree_file.remote.len(),
        "loaded command tree"
    );

    let options = EngineOptions {
        arity_probe_limit: settings.arity_probe_limit,
        max_in_flight_fetches: settings.max_in_flight_fetches,
    };
    let completer = build_completer(tree_file, options).await?;

    match args.command {
        Mode::Complete { line, wait_ms } => {
            let document = Document::new(line);
            let mut suggestions = completer.complete(&document).await;
            if wait_ms > 0 {
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                suggestions = completer.complete(&document).await;
            }
            print_suggestions(&suggestions);
        }
        Mode::Interactive => run_interactive(&completer).await?,
        Mode::Tree => {
            let tree = completer.structural().tree();
            print_tree(tree, CommandTree::ROOT);
        }
    }

    Ok(())
}

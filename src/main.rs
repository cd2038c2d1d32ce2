use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use verdant::{
    CompletionApi, CompletionClientBuilder, Config, ConfigError, Dataset, FollowupAnswerer,
    NdviStore, QueryExtractor, Session,
};

/// verdant - natural-language NDVI lookup over a reference dataset
#[derive(Parser)]
#[command(name = "verdant")]
#[command(about = "Query NDVI and climate records in natural language")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a natural-language query: extract selectors, look up records
    Query(QueryCommand),
    /// Print the raw selector JSON extracted from a question
    Extract(ExtractCommand),
    /// Answer a follow-up question over context read from stdin
    Ask(AskCommand),
    /// Look up a single record directly in the local store
    Lookup(LookupCommand),
    /// Import a dataset JSON file into the local store
    Import(ImportCommand),
    /// Start the interactive terminal interface
    Tui(TuiCommand),
}

/// Run a one-shot natural-language query
#[derive(Parser)]
struct QueryCommand {
    /// The natural-language question
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Path to the dataset JSON file
    #[arg(short, long, value_name = "PATH")]
    dataset: PathBuf,

    /// Path to the store database (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

/// Print extracted selectors without looking anything up
#[derive(Parser)]
struct ExtractCommand {
    /// The natural-language question
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Path to the dataset JSON file
    #[arg(short, long, value_name = "PATH")]
    dataset: PathBuf,
}

/// Answer a follow-up question over piped-in context
#[derive(Parser)]
struct AskCommand {
    /// The follow-up question
    #[arg(value_name = "QUESTION")]
    question: String,
}

/// Look up one record by exact state, year, and month
#[derive(Parser)]
struct LookupCommand {
    /// State name (case and spacing are normalized)
    #[arg(short, long)]
    state: String,

    /// Four-digit year
    #[arg(short, long)]
    year: i64,

    /// Month name, e.g. "March"
    #[arg(short, long)]
    month: String,

    /// Path to the store database (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

/// Import dataset records into the local store
#[derive(Parser)]
struct ImportCommand {
    /// Path to the dataset JSON file
    #[arg(short, long, value_name = "PATH")]
    dataset: PathBuf,

    /// Path to the store database (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

/// Start the interactive TUI
#[derive(Parser)]
struct TuiCommand {
    /// Path to the dataset JSON file
    #[arg(short, long, value_name = "PATH")]
    dataset: PathBuf,

    /// Path to the store database (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Query(cmd) => handle_query(cmd),
        Commands::Extract(cmd) => handle_extract(cmd),
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Lookup(cmd) => handle_lookup(cmd),
        Commands::Import(cmd) => handle_import(cmd),
        Commands::Tui(cmd) => handle_tui(cmd),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include empty questions and missing configuration such as
/// the API key. Internal errors include transport and store failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error.downcast_ref::<ConfigError>().is_some() {
        return true;
    }
    let error_msg = error.to_string();
    error_msg.contains("cannot be empty")
}

/// Builds the extractor, answerer, and store from environment configuration.
fn build_session(dataset_path: &Path, db_override: Option<&Path>) -> Result<Session> {
    let config = Config::from_env()?;

    let client = CompletionClientBuilder::new()
        .from_config(&config)
        .build()
        .context("Failed to build completion client")?;
    let client: Arc<dyn CompletionApi> = Arc::new(client);

    let extractor = QueryExtractor::new(Arc::clone(&client), config.query_model.clone());
    let answerer = FollowupAnswerer::new(client, config.answer_model.clone());

    let dataset = Dataset::load(dataset_path)?;
    let mut store = open_store(db_override)?;
    store
        .import_dataset(&dataset)
        .context("Failed to import dataset into store")?;

    Ok(Session::new(extractor, answerer, store, dataset))
}

/// Opens the store at the given path, or at the default data-directory
/// location when no override is provided.
fn open_store(db_override: Option<&Path>) -> Result<NdviStore> {
    let db_path = match db_override {
        Some(p) => p.to_path_buf(),
        None => get_store_path()?,
    };
    ensure_store_directory(&db_path)?;
    NdviStore::open(&db_path).context("Failed to open store")
}

/// Handles the query command: extract selectors, look up each record, and
/// print the results.
fn handle_query(cmd: &QueryCommand) -> Result<()> {
    if cmd.question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let mut session = build_session(&cmd.dataset, cmd.db.as_deref())?;
    let outcome = session.run_query(&cmd.question)?;

    for notice in &outcome.notices {
        eprintln!("{notice}");
    }

    if outcome.added == 0 {
        println!("No matching records.");
        return Ok(());
    }

    for entry in session.history() {
        if let verdant::HistoryEntry::Observation { record, .. } = entry {
            println!("{}", record.summary());
            println!("  NDVI image: {}", record.ndvi_url);
        }
    }

    Ok(())
}

/// Handles the extract command by printing the parsed selector list as JSON.
fn handle_extract(cmd: &ExtractCommand) -> Result<()> {
    if cmd.question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let config = Config::from_env()?;
    let client = CompletionClientBuilder::new()
        .from_config(&config)
        .build()
        .context("Failed to build completion client")?;
    let extractor = QueryExtractor::new(Arc::new(client), config.query_model);

    let dataset = Dataset::load(&cmd.dataset)?;
    let selectors = extractor
        .extract(&cmd.question, &dataset)
        .context("Selector extraction failed")?;

    let json = serde_json::to_string_pretty(&selectors)
        .context("Failed to serialize selectors")?;
    println!("{json}");

    Ok(())
}

/// Handles the ask command: reads context from stdin, then answers the
/// follow-up question over it.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let mut context = String::new();
    std::io::stdin()
        .read_to_string(&mut context)
        .context("Failed to read context from stdin")?;

    let config = Config::from_env()?;
    let client = CompletionClientBuilder::new()
        .from_config(&config)
        .build()
        .context("Failed to build completion client")?;
    let answerer = FollowupAnswerer::new(Arc::new(client), config.answer_model);

    let answer = answerer
        .answer(&cmd.question, &context)
        .context("Follow-up answering failed")?;
    println!("{answer}");

    Ok(())
}

/// Handles the lookup command with a direct store query.
fn handle_lookup(cmd: &LookupCommand) -> Result<()> {
    let store = open_store(cmd.db.as_deref())?;

    match store.lookup(&cmd.state, cmd.year, &cmd.month)? {
        Some(record) => {
            println!("{}", record.summary());
            println!("  NDVI image: {}", record.ndvi_url);
        }
        None => println!(
            "No data for {} ({} {})",
            cmd.state, cmd.month, cmd.year
        ),
    }

    Ok(())
}

/// Handles the import command: loads dataset JSON and upserts it into the
/// store.
fn handle_import(cmd: &ImportCommand) -> Result<()> {
    let dataset = Dataset::load(&cmd.dataset)?;
    let mut store = open_store(cmd.db.as_deref())?;

    let imported = store
        .import_dataset(&dataset)
        .context("Failed to import dataset into store")?;
    println!("Imported {imported} record(s)");

    Ok(())
}

/// Handles the tui command by building a session and starting the event
/// loop.
fn handle_tui(cmd: &TuiCommand) -> Result<()> {
    let session = build_session(&cmd.dataset, cmd.db.as_deref())?;
    verdant::tui::run(session)
}

/// Gets the cross-platform store path.
///
/// Returns `{data_dir}/verdant/ndvi.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn get_store_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("verdant").join("ndvi.db"))
}

/// Ensures the parent directory of the store file exists.
fn ensure_store_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_question_is_rejected_before_any_io() {
        let cmd = QueryCommand {
            question: "   \n\t  ".to_string(),
            dataset: PathBuf::from("/nonexistent.json"),
            db: None,
        };
        let result = handle_query(&cmd);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn empty_question_errors_are_user_errors() {
        let err = anyhow::anyhow!("Question cannot be empty");
        assert!(is_user_error(&err));
    }

    #[test]
    fn config_errors_are_user_errors() {
        let err = anyhow::Error::from(ConfigError::MissingKey(verdant::config::API_KEY_VAR));
        assert!(is_user_error(&err));
    }

    #[test]
    fn transport_failures_are_internal_errors() {
        let err = anyhow::anyhow!("Failed to open store");
        assert!(!is_user_error(&err));
    }

    #[test]
    fn store_path_ends_with_app_directory() {
        if let Ok(path) = get_store_path() {
            assert!(path.ends_with("verdant/ndvi.db") || path.ends_with("verdant\\ndvi.db"));
        }
    }
}

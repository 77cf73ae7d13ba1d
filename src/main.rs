// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use user_migration::config::{DB_ENV, DEFAULT_DB_PATH};
use user_migration::{
    fetch_payload, load_user_rows, open_database, render_listing, ConsoleMessenger, Messenger,
    Migrator, Source, SourceFetcher, SqliteStore,
};

#[derive(Parser)]
#[command(name = "user-migration", version, about = "Migrate user and company records from JSON")]
struct Cli {
    /// SQLite database holding the migrated entities
    #[arg(long, global = true, env = DB_ENV, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a JSON payload and migrate it
    Migrate(MigrateArgs),
    /// Print every migrated user with its company
    List,
    /// Browse migrated users in the terminal UI (default)
    Ui,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["endpoint", "file"])))]
struct MigrateArgs {
    /// Endpoint to migrate from
    endpoint: Option<String>,

    /// Local .json file to migrate from instead of an endpoint
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout is for migration output
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Migrate(args)) => run_migration(&cli.db, args).await?,
        Some(Command::List) => run_list(&cli.db)?,
        Some(Command::Ui) | None => run_ui_mode(&cli.db)?,
    }

    Ok(())
}

async fn run_migration(db_path: &Path, args: MigrateArgs) -> Result<()> {
    let messenger = ConsoleMessenger;

    let source = match Source::choose(args.file.map(Source::File), args.endpoint.as_deref()) {
        Ok(Some(source)) => source,
        Ok(None) => anyhow::bail!("an endpoint or --file is required"),
        Err(e) => {
            messenger.add_warning(e.to_string());
            return Ok(());
        }
    };

    let Some(payload) = fetch_payload(&SourceFetcher::new(), &source, &messenger).await else {
        return Ok(());
    };

    let conn = open_database(db_path)?;
    let store = SqliteStore::new(&conn);
    Migrator::new(&store, &messenger).migrate_payload(&payload);

    Ok(())
}

fn run_list(db_path: &Path) -> Result<()> {
    let conn = open_database(db_path)?;
    let rows = load_user_rows(&SqliteStore::new(&conn))?;

    println!("{}", render_listing(&rows));

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(db_path: &Path) -> Result<()> {
    let conn = open_database(db_path)?;
    let rows = load_user_rows(&SqliteStore::new(&conn))?;

    let mut app = ui::App::new(rows);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_db_path: &Path) -> Result<()> {
    anyhow::bail!(
        "TUI mode not available. Rebuild with --features tui, or use `user-migration list`"
    )
}

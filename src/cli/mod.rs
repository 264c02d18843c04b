use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, SERVER_ENV};
use crate::store::HttpItemStore;

pub mod commands;

use self::commands::{CountArgs, RenameArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sujets",
    version,
    about = "Terminal reviewer for a sujets item store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over SUJETS_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the item store (takes precedence over SUJETS_SERVER)
    #[arg(long)]
    pub server: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive reviewer (default)
    Tui,
    /// Print one sujet
    Show {
        /// Sujet identifier
        id: i64,
    },
    /// Print the filtered and total sujet counts
    Count(CountArgs),
    /// Print a random sujet
    Random,
    /// Create a sujet with the given title
    Add {
        /// Title of the new sujet
        title: String,
    },
    /// Change the title of a sujet
    Rename(RenameArgs),
    /// List the tags and people known to the store
    Vocab,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(server) = &cli.server {
        env::set_var(SERVER_ENV, server);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = matches!(command, Commands::Tui).then(|| loader.paths().log_file());
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    let store = HttpItemStore::new(&config.server)?;
    tracing::debug!(server = store.base_url(), "using item store");

    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), store);
            commands::run_tui(&mut app)
        }
        Commands::Show { id } => commands::print(commands::show_item(&store, id)),
        Commands::Count(args) => commands::print(commands::count_items(&store, &args)),
        Commands::Random => commands::print(commands::random_item(&store)),
        Commands::Add { title } => commands::print(commands::add_item(&store, &title)),
        Commands::Rename(args) => commands::print(commands::rename_item(&store, &args)),
        Commands::Vocab => commands::print(commands::vocabulary(&store)),
    }
}

/// Installs the global subscriber. The TUI owns the terminal, so it logs to
/// `log_file`; one-shot commands log to stderr.
fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}

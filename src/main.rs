//! Entry point for **gridded**.
//!
//! Connects to X, sets up the container, spawns the commands and hands the
//! main thread to the [`Embedder`](gridded::embedder::Embedder).  The X11
//! event stream and one watcher per child run on background threads and
//! feed a single channel.

use clap::Parser;
use gridded::bindings::KeyTable;
use gridded::cli::Cli;
use gridded::command::Notification;
use gridded::config::{Config, ConfigError};
use gridded::embedder::{Embedder, EmbedderError};
use gridded::registry::{self, RegistryError};
use gridded::supervisor::{ProcessTable, SpawnError, Supervisor};
use gridded::traits::NotificationSource;
use gridded::x11::conn::X11WindowSystem;
use gridded::x11::X11Error;
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc;

/// Anything that stops gridded before the main loop starts.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    X11(#[from] X11Error),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("{count} commands given: {source}")]
    TooManyCommands {
        count: usize,
        #[source]
        source: RegistryError,
    },
    #[error(transparent)]
    Embedder(#[from] EmbedderError),
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/gridded`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("gridded")
}

/// Load the config named on the command line, which must exist, or the
/// default one, falling back to compiled-in defaults.
fn load_config(explicit: Option<&PathBuf>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        let cfg = Config::load(path)?;
        info!("loaded config from {}", path.display());
        return Ok(cfg);
    }
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Ok(Config::default())
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("gridded: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32, StartupError> {
    let config = load_config(cli.config.as_ref())?;
    let layout = cli.apply(config.layout);

    registry::check_capacity(cli.commands.len()).map_err(|source| {
        StartupError::TooManyCommands {
            count: cli.commands.len(),
            source,
        }
    })?;

    let ws = X11WindowSystem::connect()?;
    let container = match cli.parent {
        Some(win) => ws.adopt_container(win)?,
        None => ws.create_container(cli.embed)?,
    };

    let (tx, rx) = mpsc::channel::<Notification>();
    {
        let tx = tx.clone();
        let mut source = ws.event_source(container.id);
        std::thread::spawn(move || {
            if let Err(e) = source.run(tx) {
                error!("X11 event source error: {}", e);
            }
        });
    }

    let keys = KeyTable::grab(&ws, container.id, &config.bindings)?;
    let mut embedder = Embedder::new(
        ws,
        container,
        layout.grid(),
        keys,
        ProcessTable::new(config.exit_policy),
    );
    embedder.set_consume_bound_keys(config.consume_bound_keys);

    let supervisor = Supervisor::new(container.id, tx);
    let pids = cli
        .commands
        .iter()
        .map(|command| supervisor.spawn(command))
        .collect::<Result<Vec<_>, _>>()?;
    // Only the source threads and child watchers hold senders now.
    drop(supervisor);

    embedder.start(pids, layout.mirror)?;

    Ok(embedder.run(rx))
}

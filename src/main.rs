//! tunetui - terminal client for networked audio
//!
//! Browse and search a speaker's radio, podcast and media-server content,
//! pick items interactively, reorder the play queue and search an offline
//! index of your library.
//!
//! # Usage
//!
//! ```bash
//! # Pick a station interactively
//! tunetui pick radio
//!
//! # Scriptable commands (JSON when piped)
//! tunetui browse upnp --server NAS "Music/Albums"
//! tunetui queue move "Yesterday" before "Help"
//! tunetui index search coltrane --json
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tunetui::cli::{Cli, Command, ExitCode, Output};
use tunetui::commands;
use tunetui::config::Config;
use tunetui::session::Session;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // the TUI owns the terminal, so logs only ever go to a file
    let guard = match init_logging(cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            if cli.verbose {
                eprintln!("logging disabled: {}", e);
            }
            None
        }
    };

    let exit_code = run_cli(cli).await;

    drop(guard);
    std::process::exit(exit_code.into());
}

/// Daily rolling log file under the cache directory
fn init_logging(verbose: bool) -> Result<Option<WorkerGuard>> {
    let Some(log_dir) = Config::cache_dir().map(|dir| dir.join("logs")) else {
        return Ok(None);
    };
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "tunetui.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if verbose { "info,tunetui=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(Some(guard))
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = load_config(cli.config.as_deref());
    debug!(command = ?cli.command, "starting");

    let session = Session::from_config(config.clone(), cli.device.as_deref());

    match (cli.command, session) {
        // offline index commands work without a device
        (Command::Index(cmd), session) => {
            let mut session = session.ok();
            commands::index_cmd(cmd.action, &config, session.as_mut(), &output).await
        }

        // completion never fails, a missing device just yields no candidates
        (Command::Complete(cmd), session) => {
            let mut session = session.ok();
            commands::complete_cmd(cmd, session.as_mut()).await
        }

        (_, Err(e)) => output.fail(&e),

        (Command::Browse(cmd), Ok(mut session)) => {
            commands::browse_cmd(cmd, &mut session, &output).await
        }

        (Command::Search(cmd), Ok(mut session)) => {
            commands::search_cmd(cmd, &mut session, &output).await
        }

        (Command::Category(cmd), Ok(mut session)) => {
            commands::category_cmd(cmd, &mut session, &output).await
        }

        (Command::Pick(cmd), Ok(mut session)) => commands::pick_cmd(cmd, &mut session, &output).await,

        (Command::Queue(cmd), Ok(mut session)) => {
            commands::queue_cmd(cmd.action, &mut session, &output).await
        }

        (Command::Watch(cmd), Ok(mut session)) => {
            commands::watch_cmd(cmd, &mut session, &output).await
        }
    }
}

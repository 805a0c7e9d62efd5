use clap::{Parser, Subcommand};
use git_glance::commands::*;
use git_glance::core::{
    config::{apply_log_level, Settings, GIT_BINARY_ENV},
    error::StatusError,
    print_error, print_error_with_hint,
};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-glance")]
#[command(about = "Asynchronous git status for status bars and prompts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect and print the status line for a directory
    Status {
        /// Directory to inspect (defaults to the current directory)
        path: Option<PathBuf>,
        /// Print the snapshot as JSON instead of rendering it
        #[arg(long)]
        json: bool,
        /// Print every truncated candidate, shortest first
        #[arg(long, conflicts_with = "json")]
        all: bool,
        /// Fetch from the remote first and wait for the refreshed counts
        #[arg(long)]
        fetch: bool,
    },
    /// Serve status lines for many targets over stdin/stdout
    Watch,
    /// Print a sample status line with the configured icons
    Exemplar,
    /// Print the effective settings as JSON
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

fn report(e: &StatusError) {
    if matches!(e, StatusError::GitBinaryNotFound { .. }) {
        print_error_with_hint(
            &e.to_string(),
            &format!("Set git_binary in the settings file or {GIT_BINARY_ENV}"),
        );
    } else {
        print_error(&e.to_string());
    }
}

fn init_logging(debug: bool) {
    // Filtering happens through the global max level, which host knobs adjust
    env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
    apply_log_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut settings = match Settings::load_or_default() {
        Ok(settings) => settings,
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    };
    if cli.debug {
        settings.debug = true;
    }
    apply_log_level(settings.log_level());

    let result = match cli.command {
        Commands::Status {
            path,
            json,
            all,
            fetch,
        } => {
            let options = StatusOptions {
                path,
                json,
                all,
                fetch,
            };
            execute_status(options, settings).await
        }
        Commands::Watch => execute_watch(settings).await,
        Commands::Exemplar => {
            execute_exemplar(&settings);
            Ok(())
        }
        Commands::Config { save } => execute_config(&settings, save),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }

    Ok(())
}

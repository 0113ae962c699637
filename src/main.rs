//! Edge server configuration tool.
//!
//! ```text
//!     Edgefile ──▶ directive ──▶ options::global ──▶ options::server
//!                                        │
//!     servers.toml ──▶ config::schema    ▼
//!                           │     GlobalOptions
//!                           ▼            │
//!                    HttpServer map ◀────┘ options::apply
//!                           │
//!                           ▼
//!                 JSON on stdout + warnings
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_config::config::{adapt, Adapted, ConfigWatcher};
use edge_config::modules::{ModuleRegistry, LISTENER_NAMESPACE};

#[derive(Parser)]
#[command(name = "edge-config")]
#[command(about = "Apply directive-file server options to HTTP servers", long_about = None)]
struct Cli {
    /// Log filter, e.g. "edge_config=debug"; overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Adapt a directive file and print the resulting servers as JSON
    Adapt {
        #[arg(short, long)]
        config: PathBuf,

        /// Servers manifest (TOML); defaults to one server on :443 and one on :80
        #[arg(short, long)]
        servers: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
    /// Adapt, then adapt again whenever the directive file changes
    Watch {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        servers: Option<PathBuf>,
    },
    /// List registered listener wrapper modules
    Modules,
}

fn print_adapted(adapted: &Adapted, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(adapted)?
    } else {
        serde_json::to_string(adapted)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "edge_config=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = Arc::new(ModuleRegistry::with_standard_modules());

    match cli.command {
        Commands::Adapt { config, servers, pretty } => {
            let adapted = adapt(&config, servers.as_deref(), &registry)?;
            print_adapted(&adapted, pretty)?;
        }
        Commands::Watch { config, servers } => {
            let initial = adapt(&config, servers.as_deref(), &registry)?;
            print_adapted(&initial, false)?;

            let (watcher, mut updates) =
                ConfigWatcher::new(&config, servers.as_deref(), Arc::clone(&registry), initial);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    update = updates.recv() => match update {
                        Some(adapted) => print_adapted(&adapted, false)?,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping watcher");
                        break;
                    }
                }
            }
        }
        Commands::Modules => {
            for info in registry.modules_in(LISTENER_NAMESPACE) {
                println!("{}", info.id());
            }
        }
    }

    Ok(())
}

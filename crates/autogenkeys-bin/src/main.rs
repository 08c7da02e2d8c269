//! autogenkeys - inspect and provision auto-generated machine keys.

mod commands;

use std::path::PathBuf;

use autogenkeys_config_and_utils::{init_logging, Config, Paths, RegistryBackend};
use autogenkeys_storage::{create_key_store, KeyKind};
use clap::{Parser, Subcommand};

use commands::KeyFormat;

/// autogenkeys command-line interface.
#[derive(Parser)]
#[command(name = "autogenkeys")]
#[command(about = "Retrieve, locate and inspect auto-generated machine keys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and the file registry. Defaults to ~/.autogenkeys
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Hosting application name
    #[arg(long, global = true, env = "AUTOGENKEYS_APP_NAME")]
    app_name: Option<String>,

    /// Runtime version segment of the registry path
    #[arg(long, global = true)]
    runtime_version: Option<String>,

    /// Registry backend (auto, file, windows_registry)
    #[arg(long, global = true)]
    backend: Option<RegistryBackend>,

    /// Root directory of the file registry
    #[arg(long, global = true)]
    registry_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the key for a kind, generating and storing it if needed
    Retrieve {
        /// validation or encryption
        kind: KeyKind,

        /// Output encoding
        #[arg(short, long, value_enum, default_value_t = KeyFormat::Hex)]
        format: KeyFormat,
    },
    /// Print where keys are stored
    Locate {
        /// Only this kind (default: both)
        kind: Option<KeyKind>,
    },
    /// Describe the stored record for a kind without printing the key
    Inspect {
        /// validation or encryption
        kind: KeyKind,
    },
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(name) = &self.app_name {
            config.application_name = Some(name.clone());
        }
        if let Some(version) = &self.runtime_version {
            config.runtime_version = version.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(root) = &self.registry_root {
            config.registry_root = Some(root.clone());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match &cli.base_dir {
        Some(base) => Paths::with_base_dir(base.clone()),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    cli.apply_to(&mut config);

    init_logging(&config.log_level);
    tracing::debug!(
        backend = ?config.backend,
        runtime_version = %config.runtime_version,
        "Configuration loaded"
    );

    let store = create_key_store(&config, &paths)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Retrieve { kind, format } => commands::retrieve(&store, kind, format, &mut stdout)?,
        Commands::Locate { kind } => commands::locate(&store, kind, &mut stdout)?,
        Commands::Inspect { kind } => commands::inspect(&store, kind, &mut stdout)?,
    }

    Ok(())
}

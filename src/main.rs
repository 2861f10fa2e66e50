use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use sealed_prefs::cli::{
    handle_change_passphrase, handle_init, handle_pref_command, handle_status, open_store,
    PrefCommands,
};
use sealed_prefs::config::{PrefsPaths, Settings};

#[derive(Parser)]
#[command(
    name = "sealed-prefs",
    version,
    about = "Encrypted local preference store",
    long_about = "sealed-prefs stores typed preferences under string keys, \
                  encrypting every value with AES-256-GCM before it is written \
                  to disk."
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store key
    Init {
        /// Derive the key from a passphrase instead of a key file
        #[arg(long)]
        passphrase: bool,
    },

    #[command(flatten)]
    Pref(PrefCommands),

    /// Re-encrypt all preferences under a new passphrase
    #[command(alias = "change")]
    ChangePassphrase,

    /// Show key and storage status
    Status,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let paths = PrefsPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init { passphrase }) => handle_init(&paths, passphrase)?,
        Some(Commands::Pref(cmd)) => {
            let store = open_store(&paths, &settings)?;
            handle_pref_command(&store, cmd).await?;
        }
        Some(Commands::ChangePassphrase) => {
            handle_change_passphrase(&paths, &mut settings).await?;
        }
        Some(Commands::Status) => handle_status(&paths, &settings).await?,
        None => {
            println!("sealed-prefs - Encrypted local preference store");
            println!();
            println!("Run 'sealed-prefs --help' for usage information.");
            println!("Run 'sealed-prefs init' to get started.");
        }
    }

    Ok(())
}

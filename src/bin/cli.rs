//! pagemirror CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagemirror::{
    error::Result,
    models::{CONFIG_FILE, ChannelId, Config, Workspace},
    pipeline,
    services::{collect_seeds, execute},
};

/// pagemirror - Gallery Mirror Maintenance
#[derive(Parser, Debug)]
#[command(
    name = "pagemirror",
    version,
    about = "Turns seed pages into downloader scripts and audits the local mirror"
)]
struct Cli {
    /// Work directory holding pagemirror.toml, conf/ and the mirror
    #[arg(short, long, env = "PAGEMIRROR_WORKDIR", default_value = ".")]
    work_dir: PathBuf,

    /// Downloader config file passed as --config-location
    #[arg(long, env = "PAGEMIRROR_DOWNLOADER_CONFIG")]
    downloader_config: Option<String>,

    /// Run generated downloader scripts with bash
    #[arg(short = 'x', long, env = "PAGEMIRROR_EXE_SCRIPTS")]
    execute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Defaults to `recent`
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve URLs, or .txt files of URLs, into downloader scripts
    Sync {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Rebuild playlists and re-sync the newest pages of every known list
    Recent,

    /// Rebuild playlists and re-sync every known list in full
    Full,

    /// Sync the latest photo listings
    Photo,

    /// Rebuild playlist archives
    Playlist {
        /// Channel id (xc_p, xc_v, xbbs); all channels when omitted
        channel: Option<String>,
    },

    /// Audit the photo mirror and emit the next repair stage
    Scan,

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.work_dir.join(CONFIG_FILE);
    let mut config = Config::load_or_default(&config_path);
    if let Some(location) = cli.downloader_config.as_deref() {
        config = config.with_downloader_config(location);
    }
    let workspace = Workspace::new(&cli.work_dir, &config);
    log::info!("Work dir: {}", workspace.work_dir().display());

    let scripts = match cli.command.unwrap_or(Command::Recent) {
        Command::Sync { inputs } => {
            let seeds = collect_seeds(&inputs)?;
            pipeline::run_sync(&config, &workspace, &seeds, false)?
        }

        Command::Recent => pipeline::run_lists(&config, &workspace, true)?,

        Command::Full => pipeline::run_lists(&config, &workspace, false)?,

        Command::Photo => pipeline::run_photo(&config, &workspace)?,

        Command::Playlist { channel } => {
            let only = channel.as_deref().map(str::parse::<ChannelId>).transpose()?;
            let total = pipeline::run_playlist(&workspace, only)?;
            log::info!("Playlist archives hold {} urls", total);
            Vec::new()
        }

        Command::Scan => {
            let outcome = pipeline::run_scan(&config, &workspace)?;
            for path in &outcome.fix_scripts {
                log::warn!("Review and run by hand: {}", path.display());
            }
            outcome.download_scripts
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = pipeline::run_validate(&config, &workspace) {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            Vec::new()
        }
    };

    if cli.execute && !scripts.is_empty() {
        execute(&scripts)?;
    }

    log::info!("Done!");

    Ok(())
}

//! trustroot: entry point.
//!
//! Loads the persisted trustroot state from a directory, bootstrapping a new
//! CA on first run, and prints a short summary.  Useful to provision a state
//! directory ahead of time or to check what an application will see.
//!
//! # Usage
//!
//! ```text
//! trustroot [OPTIONS]
//!
//! Options:
//!   --dir <DIR>                  State directory [env: TRUSTROOT_DIR]
//!                                [default: platform config dir + /trustroot]
//!   --print-cert                 Print the CA certificate PEM to stdout
//!   --ca-common-name <NAME>      Subject CN of a newly generated CA
//!   --ca-organization <ORG>      Subject O of a newly generated CA
//!   --ca-key-bits <BITS>         RSA modulus size of a newly generated CA
//!   --ca-validity-days <DAYS>    Lifetime of a newly generated CA
//! ```
//!
//! The `--ca-*` options only matter when no valid CA exists yet; an existing
//! CA is always loaded as it is.
//!
//! Logging goes to stderr; the level is controlled with `RUST_LOG`
//! (default `info`).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trustroot_core::ca::rsa_ca::{
    DEFAULT_COMMON_NAME, DEFAULT_KEY_BITS, DEFAULT_ORGANIZATION, DEFAULT_VALIDITY_DAYS,
};
use trustroot_core::RsaCaProvider;
use trustroot_store::{HistoryStore, SettingsOutcome, SettingsStore, StoreLayout};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect trustroot state, creating the CA on first run.
#[derive(Debug, Parser)]
#[command(
    name = "trustroot",
    about = "Load (and on first run, bootstrap) the trustroot CA and project state",
    version
)]
struct Cli {
    /// Directory holding `global_settings` and `history`.
    ///
    /// Created with owner-only permissions if it does not exist.
    #[arg(long, env = "TRUSTROOT_DIR")]
    dir: Option<PathBuf>,

    /// Print the CA certificate PEM to stdout after loading.
    #[arg(long)]
    print_cert: bool,

    /// Subject common name used if a new CA has to be generated.
    #[arg(long, default_value = DEFAULT_COMMON_NAME)]
    ca_common_name: String,

    /// Subject organization used if a new CA has to be generated.
    #[arg(long, default_value = DEFAULT_ORGANIZATION)]
    ca_organization: String,

    /// RSA key size used if a new CA has to be generated (at least 2048).
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    ca_key_bits: usize,

    /// Validity in days used if a new CA has to be generated.
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    ca_validity_days: i64,
}

impl Cli {
    fn ca_provider(&self) -> RsaCaProvider {
        RsaCaProvider::new()
            .with_common_name(self.ca_common_name.clone())
            .with_organization(self.ca_organization.clone())
            .with_key_bits(self.ca_key_bits)
            .with_validity_days(self.ca_validity_days)
    }
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let layout = match &cli.dir {
        Some(dir) => StoreLayout::new(dir),
        None => StoreLayout::platform_default().context("resolving state directory")?,
    };
    info!(dir = %layout.dir().display(), "trustroot starting");

    let settings = SettingsStore::new(layout, cli.ca_provider());
    let load = settings
        .load_with_report()
        .context("bootstrapping CA material")?;

    match &load.outcome {
        SettingsOutcome::Reloaded => info!("existing CA loaded"),
        SettingsOutcome::Adopted => info!("CA created by a concurrent process adopted"),
        SettingsOutcome::Bootstrapped { reason } if reason.is_anomalous() => {
            warn!(?reason, "previous settings were unusable; a new CA was generated")
        }
        SettingsOutcome::Bootstrapped { .. } => info!("new CA generated"),
    }
    if let Some(e) = &load.save_error {
        error!(error = %e, "CA could not be saved; it will be regenerated next run");
    }

    let history = HistoryStore::new(settings.layout().clone()).load_with_report();
    if history.outcome.lost_data() {
        warn!(outcome = ?history.outcome, "project history was discarded");
    }

    let config = &load.configuration;
    println!("settings: {}", settings.settings_path().display());
    match &config.project {
        Some(project) => println!("active project: {} ({})", project.title, project.path.display()),
        None => println!("active project: none"),
    }
    println!("history: {} project(s)", history.history.len());
    for project in &history.history {
        println!("  {} ({})", project.title, project.path.display());
    }

    if cli.print_cert {
        let pem = std::str::from_utf8(&config.ca_certificate)
            .context("CA certificate is not valid UTF-8")?;
        print!("{pem}");
    }

    Ok(())
}

//! `statline`: command-line access to a statline SQLite store.
//!
//! Reads `statline.toml` (or the path given with `--config`), layered with
//! `STATLINE_*` environment variables, opens the SQLite store and runs one
//! command. Results are printed as JSON, one value per line.
//!
//! ```text
//! statline entity add --kind contract
//! statline status add <ENTITY_ID> --from 2020-01-01 --payload '{"state":"active"}'
//! statline status as-of <ENTITY_ID> --date 2020-01-15
//! ```

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use serde::Deserialize;
use statline_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::Command;

#[derive(Parser)]
#[command(author, version, about = "Temporal status tracking over SQLite")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "statline.toml")]
  config: PathBuf,

  /// Entity kind to operate on; overrides `default_kind` from the config.
  #[arg(short, long, global = true)]
  kind: Option<String>,

  #[command(subcommand)]
  command: Command,
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `statline.toml` and the
/// environment.
#[derive(Deserialize, Clone, Debug)]
pub struct CliConfig {
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  #[serde(default = "default_kind")]
  pub default_kind: String,
}

fn default_store_path() -> PathBuf { PathBuf::from("statline.db") }

fn default_kind() -> String { "default".to_owned() }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("STATLINE"))
    .build()
    .context("failed to read config file")?;

  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let kind = cli.kind.unwrap_or(cfg.default_kind);
  tracing::debug!(%kind, ?store_path, "running command");

  commands::run(&store, &kind, cli.command).await
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

//! congvan-web server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `CONGVAN_*` environment variables, opens the SQLite register, seeds the
//! default accounts and serves the site over HTTP.
//!
//! # Password hash generation
//!
//! ```
//! cargo run -p congvan-web --bin server -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use congvan_store_sqlite::SqliteStore;
use congvan_web::{AppState, ServerConfig, auth};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Công văn register web server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = auth::hash_password(&password).context("failed to hash password")?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CONGVAN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig (is secret_key set?)")?;

  let database_path = expand_tilde(&server_cfg.database_path);
  let store = if database_path == Path::new(":memory:") {
    SqliteStore::open_in_memory().await
  } else {
    SqliteStore::open(&database_path).await
  }
  .with_context(|| format!("failed to open database at {database_path:?}"))?;

  auth::seed_users(&store, &server_cfg)
    .await
    .context("failed to seed default accounts")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = congvan_web::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
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

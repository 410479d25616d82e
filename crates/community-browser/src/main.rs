//! Community browser command-line entry point.
//!
//! Wires the HTTP workers, the TOML-backed source store, and the
//! [`ServerBrowser`] orchestrator together, then drives the orchestrator's
//! tick loop for one command.
//!
//! ```text
//! main()
//!  └─ load_config_from()      -- config file (or defaults)
//!  └─ spawn_blocking(run)
//!       ├─ HttpDirectoryAggregator (worker thread)
//!       ├─ AuthWorker              (worker thread)
//!       ├─ DetailsWorker           (worker thread)
//!       └─ ServerBrowser::tick()   (this thread, every TICK)
//! ```
//!
//! The tick loop is blocking by nature (the HTTP client is
//! `reqwest::blocking`), so it runs on Tokio's blocking pool while the async
//! side only watches for Ctrl-C.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use community_browser::application::browser::{BrowserAction, BrowserPorts, ServerBrowser};
use community_browser::application::ports::{ConnectRequest, ServerConnector};
use community_browser::application::status::Severity;
use community_browser::infrastructure::network::{
    AuthWorker, DetailsWorker, DirectoryApi, HttpDirectoryAggregator, HttpDirectoryApi,
};
use community_browser::infrastructure::storage::config::{
    config_file_path, load_config_from, AppConfig, ConfigSourceStore,
};
use community_browser::infrastructure::ui_bridge::BrowserSnapshot;
use community_core::{is_lan_token, normalize_host};

/// Interval between orchestrator ticks.
const TICK: Duration = Duration::from_millis(50);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Browse community game-server directories and join a server.
#[derive(Debug, Parser)]
#[command(name = "community-browser", version)]
struct Cli {
    /// Path of the configuration file (defaults to the platform config dir).
    #[arg(long, global = true, env = "COMMUNITY_BROWSER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List configured directories.
    Sources,

    /// Add a community directory and check that it answers.
    AddSource {
        /// Base URL of the directory, e.g. `https://servers.example.org`.
        host: String,
        /// Display name; the directory's own name replaces it once learned.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Remove a configured directory.
    RemoveSource { host: String },

    /// Refresh a source and print its servers.
    List {
        /// Directory host or `LAN`; defaults to the configured default.
        #[arg(long)]
        source: Option<String>,
        /// Print a JSON snapshot instead of a table.
        #[arg(long)]
        json: bool,
        /// Upper bound on how long to wait for the listing, in seconds.
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },

    /// Log in (if the directory knows the user) and connect to a server.
    Join {
        /// `host:port` as shown by `list`.
        address: String,
        #[arg(long, env = "COMMUNITY_BROWSER_USERNAME")]
        username: String,
        #[arg(long, env = "COMMUNITY_BROWSER_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,
        /// Directory host or `LAN`; defaults to the configured default.
        #[arg(long)]
        source: Option<String>,
        /// World name to report when the server does not advertise one.
        #[arg(long)]
        world: Option<String>,
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },
}

// ── Connector ─────────────────────────────────────────────────────────────────

/// Records the connection request; the game transport is not part of this
/// binary.
#[derive(Clone, Default)]
struct LoggingConnector {
    last: Arc<Mutex<Option<ConnectRequest>>>,
}

impl LoggingConnector {
    fn take(&self) -> Option<ConnectRequest> {
        self.last.lock().ok().and_then(|mut last| last.take())
    }
}

impl ServerConnector for LoggingConnector {
    fn connect(&mut self, request: ConnectRequest) {
        info!(
            "connecting to {} as {} (registered: {})",
            request.entry.key(),
            request.username,
            request.registered
        );
        if let Ok(mut last) = self.last.lock() {
            *last = Some(request);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match cli.config.clone() {
        Some(path) => path,
        None => config_file_path().context("locating config file")?,
    };
    let config = load_config_from(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.browser.log_level)),
        )
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; stopping");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    tokio::task::spawn_blocking(move || run(cli.command, config, path, &running))
        .await
        .context("browser loop panicked")?
}

/// Executes one command on the blocking pool.
fn run(command: Command, config: AppConfig, path: PathBuf, running: &AtomicBool) -> anyhow::Result<()> {
    let connector = LoggingConnector::default();

    match command {
        Command::Sources => {
            // No browser: building one activates the default source.
            print_sources(&config);
            Ok(())
        }
        Command::AddSource { host, name } => {
            let mut browser = build_browser(config, path, connector);
            browser.push_action(BrowserAction::AddSource { host, name });
            tick_until(&mut browser, running, Duration::from_secs(10), |b| {
                !b.is_checking_sources()
            });
            report_status(&browser)
        }
        Command::RemoveSource { host } => {
            let mut browser = build_browser(config, path, connector);
            let index = option_index(&browser, &host)
                .with_context(|| format!("directory {host} is not configured"))?;
            browser.push_action(BrowserAction::RemoveSource(index));
            browser.tick();
            report_status(&browser)
        }
        Command::List {
            source,
            json,
            wait_secs,
        } => {
            let mut browser = build_browser(config, path, connector);
            activate(&mut browser, source.as_deref())?;
            tick_until(&mut browser, running, Duration::from_secs(wait_secs), |b| {
                !b.is_fetching()
            });
            if json {
                let snapshot = BrowserSnapshot::capture(&browser);
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_entries(&browser);
            }
            Ok(())
        }
        Command::Join {
            address,
            username,
            password,
            source,
            world,
            wait_secs,
        } => {
            let mut browser = build_browser(config, path, connector.clone());
            activate(&mut browser, source.as_deref())?;
            let wait = Duration::from_secs(wait_secs);
            tick_until(&mut browser, running, wait, |b| !b.is_fetching());

            let address = address.trim();
            let Some(index) = browser.entries().iter().position(|e| e.key() == address) else {
                bail!("server {address} is not in the listing");
            };
            browser.set_username(username);
            browser.set_password(password);
            browser.set_world(world);
            browser.push_action(BrowserAction::Join(Some(index)));
            tick_until(&mut browser, running, wait, |b| !b.is_joining());

            if let Some(request) = connector.take() {
                println!(
                    "connect {} as {}{}{}",
                    request.entry.key(),
                    request.username,
                    if request.registered { " (registered)" } else { " (anonymous)" },
                    if request.community_admin || request.local_admin { " [admin]" } else { "" }
                );
                return Ok(());
            }
            if browser.is_joining() {
                bail!("timed out waiting for the community server");
            }
            report_status(&browser)?;
            bail!("join did not complete")
        }
    }
}

fn build_browser(config: AppConfig, path: PathBuf, connector: LoggingConnector) -> ServerBrowser {
    let api: Arc<dyn DirectoryApi> = Arc::new(HttpDirectoryApi::new(
        config.network.timeout(),
        config.network.user_agent.clone(),
    ));
    let settings = config.browser_settings();
    let ports = BrowserPorts {
        aggregator: Box::new(HttpDirectoryAggregator::new(Arc::clone(&api))),
        lan: None,
        auth: Box::new(AuthWorker::new(Arc::clone(&api))),
        details: Box::new(DetailsWorker::new(api)),
        connector: Box::new(connector),
        store: Box::new(ConfigSourceStore::new(config, path)),
    };
    ServerBrowser::new(ports, settings)
}

/// Source option index for a host or the LAN token.
fn option_index(browser: &ServerBrowser, source: &str) -> Option<usize> {
    let host = normalize_host(source);
    browser.options().iter().position(|option| {
        if is_lan_token(source) {
            option.is_lan()
        } else {
            option.host() == Some(host.as_str())
        }
    })
}

fn activate(browser: &mut ServerBrowser, source: Option<&str>) -> anyhow::Result<()> {
    if let Some(source) = source {
        let index = option_index(browser, source)
            .with_context(|| format!("source {source} is not configured"))?;
        browser.push_action(BrowserAction::SelectSource(index));
    }
    browser.tick();
    Ok(())
}

/// Ticks until `done` holds, the deadline passes, or Ctrl-C is pressed.
fn tick_until(
    browser: &mut ServerBrowser,
    running: &AtomicBool,
    limit: Duration,
    done: impl Fn(&ServerBrowser) -> bool,
) {
    let deadline = Instant::now() + limit;
    loop {
        browser.tick();
        if done(browser) || Instant::now() >= deadline || !running.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(TICK);
    }
    debug!("tick loop finished");
}

fn report_status(browser: &ServerBrowser) -> anyhow::Result<()> {
    match browser.status() {
        Some(status) if status.severity == Severity::Error => bail!("{}", status.message),
        Some(status) => {
            println!("{}: {}", status.severity.as_str(), status.message);
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_sources(config: &AppConfig) {
    if config.sources.is_empty() {
        println!("no directories configured");
        return;
    }
    for source in &config.sources {
        println!("{:<40} {}", source.host, source.label());
    }
}

fn print_entries(browser: &ServerBrowser) {
    if let Some(option) = browser.options().get(browser.active_index()) {
        println!("source: {}", option.label());
    }
    for (i, entry) in browser.entries().iter().enumerate() {
        println!(
            "{:<28} {:>3}/{:<3} {:<32} {}",
            entry.key(),
            entry.active_players,
            entry.max_players,
            entry.name,
            browser.entry_description(i).unwrap_or_default()
        );
    }
    if let Some(status) = browser.status() {
        println!("{}: {}", status.severity.as_str(), status.message);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

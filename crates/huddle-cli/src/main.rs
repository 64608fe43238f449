//! huddle - terminal client for the meeting assistant

mod commands;
mod config;
mod identity;
mod notify;
mod repl;
mod splash;
mod ui;
mod utils;

use std::sync::Arc;

use clap::Parser;
use huddle_api::ChatClient;
use huddle_chat::{ChatSession, HttpBackend, SessionConfig};
use tracing_subscriber::EnvFilter;

use crate::config::{CliOverrides, Config, Settings};
use crate::identity::{CliCredentials, TokenStore, mask_token};

/// huddle - chat with your meeting assistant
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (default: http://localhost:8000)
    #[arg(long)]
    base_url: Option<String>,

    /// Meeting template id sent with every message
    #[arg(short, long = "template")]
    template: Option<String>,

    /// Bearer token for this run (overrides saved login)
    #[arg(long)]
    token: Option<String>,

    /// Send a single message and print the reply
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Save a bearer token for later runs
    #[arg(long, value_name = "TOKEN")]
    login: Option<String>,

    /// Remove the saved bearer token
    #[arg(long)]
    logout: bool,

    /// Show which token would be used
    #[arg(long)]
    auth_status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let Some(token) = args.login {
        return handle_login(&token);
    }

    if args.logout {
        return handle_logout();
    }

    // Load config file
    let cfg = Config::load();

    if args.auth_status {
        return show_auth_status(args.token, &cfg);
    }

    let settings = Settings::resolve(
        CliOverrides {
            base_url: args.base_url,
            template_id: args.template,
            no_tui: args.no_tui,
        },
        |key| std::env::var(key).ok(),
        &cfg,
    );
    let tui_mode = settings.use_tui && args.command.is_none();

    init_tracing(args.verbose, tui_mode);
    tracing::info!(
        base_url = %settings.base_url,
        template = ?settings.template_id,
        tui = tui_mode,
        timeout_secs = settings.request_timeout.as_secs(),
        "settings resolved"
    );

    let client = ChatClient::with_timeout(&settings.base_url, settings.request_timeout)?;
    let credentials = CliCredentials::new(args.token, TokenStore::default_location(), cfg.token);
    let session = ChatSession::new(Arc::new(HttpBackend::new(client)))
        .with_credentials(Arc::new(credentials))
        .with_config(SessionConfig {
            template_id: settings.template_id.clone(),
        });

    // Non-interactive mode
    if let Some(command) = args.command {
        let mut session = session.with_notifier(Arc::new(notify::StderrNotifier));
        return repl::run_command(&mut session, &command, &mut std::io::stdout()).await;
    }

    if tui_mode {
        let (notifier, toasts) = notify::ToastNotifier::channel();
        let session = session.with_notifier(Arc::new(notifier));
        let title = settings
            .template_id
            .clone()
            .unwrap_or_else(|| settings.base_url.clone());
        return ui::run_tui(session, toasts, title).await;
    }

    // Interactive mode (simple stdin/stdout)
    splash::print_intro(&settings.base_url);
    let mut session = session.with_notifier(Arc::new(notify::StderrNotifier));
    repl::run_lines(&mut session, std::io::stdin().lock(), &mut std::io::stdout()).await
}

/// Set up logging when asked for with `--verbose` or `RUST_LOG`.
///
/// The TUI owns the terminal, so its logs go to a file in the config dir.
fn init_tracing(verbose: bool, tui_mode: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    if !verbose && !from_env {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("huddle=debug,huddle_chat=debug,huddle_api=debug,huddle_tui=debug")
    });

    if tui_mode {
        let path = Config::config_dir().join("huddle.log");
        let file = std::fs::create_dir_all(Config::config_dir()).and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
        });
        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .init();
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {}", path.display(), e),
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn handle_login(token: &str) -> anyhow::Result<()> {
    if token.trim().is_empty() {
        eprintln!("Token must not be empty");
        std::process::exit(1);
    }

    let store = TokenStore::default_location();
    match store.save(token) {
        Ok(_) => {
            println!("Logged in.");
            println!("Token saved to {}", store.path().display());
        }
        Err(e) => {
            eprintln!("Login failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn handle_logout() -> anyhow::Result<()> {
    match TokenStore::default_location().remove() {
        Ok(true) => println!("Logged out."),
        Ok(false) => println!("No saved token."),
        Err(e) => {
            eprintln!("Logout failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn show_auth_status(flag: Option<String>, cfg: &Config) -> anyhow::Result<()> {
    println!("Authentication Status");
    println!("{}", "-".repeat(40));

    let store = TokenStore::default_location();
    let credentials = CliCredentials::new(flag, store.clone(), cfg.token.clone());

    match credentials.lookup() {
        Some((token, source)) => {
            println!("{:<15} {}", "Token", mask_token(&token));
            println!("{:<15} {}", "Source", source.describe());
        }
        None => println!("Not logged in; requests are sent without a token."),
    }

    if let Some(saved_at) = store.load().and_then(|s| s.saved_at()) {
        println!(
            "{:<15} {}",
            "Saved login",
            saved_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    println!();
    println!("Login with: huddle --login <token>");
    println!("Logout with: huddle --logout");

    Ok(())
}

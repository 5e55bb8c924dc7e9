//!
//! commission-desk binary
//! ----------------------
//! Logs in against the commissions backend (or resumes a token) and runs one command, or
//! starts the interactive interpreter with `--repl`.

use std::env;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use commission_desk::cli::{execute, print_usage, run_repl, CliArgs, Command};
use commission_desk::config::{parse_base_url, parse_timeout_ms, ClientConfig};
use commission_desk::api::ApiClient;
use commission_desk::identity::{Credential, SessionCell, SessionStore};

fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut argv: Vec<String> = env::args().collect();
    let program = argv.remove(0);
    let args = match CliArgs::parse(&argv) {
        Ok(a) => a.with_env_fallback(|k| env::var(k).ok()),
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&program);
            std::process::exit(2);
        }
    };
    if args.help || (!args.repl && args.command.is_empty()) {
        print_usage(&program);
        return Ok(());
    }

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = args.connect.as_deref() {
        config.base_url = parse_base_url(url)?;
    }
    if let Some(ms) = args.timeout_ms.as_deref() {
        config.timeout = parse_timeout_ms(ms)?;
    }

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "commission_desk",
        "commission-desk starting: RUST_LOG='{}', api='{}', timeout_ms={}, repl={}",
        rust_log, config.base_url, config.timeout.as_millis(), args.repl
    );

    let cell = match args.token.as_deref() {
        Some(t) if !t.is_empty() => SessionCell::resuming(Credential::new(t)),
        _ => SessionCell::new(),
    };
    let api = ApiClient::with_session(&config, cell)?;
    let store = SessionStore::new(api);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(async {
        store.check_session().await;
        if !store.is_authenticated() {
            if let (Some(email), Some(password)) = (args.email.as_deref(), args.password.as_deref()) {
                store.login(email, password).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    if args.repl {
        return run_repl(&rt, &store);
    }

    let cmd = Command::parse(&args.command)?;
    if let Err(err) = rt.block_on(execute(&cmd, &store)) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

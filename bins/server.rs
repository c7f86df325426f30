use std::process::ExitCode;

use clap::Parser;
use configs::{AppConfig, LogFormat};
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

/// Serve a JSON file as a REST API of collections.
#[derive(Debug, Parser)]
#[command(name = "json-mock", version)]
struct Cli {
    /// JSON database file
    #[arg(long, value_name = "PATH")]
    db: Option<String>,
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
    /// Interface to bind
    #[arg(long)]
    host: Option<String>,
    /// TOML config file (otherwise CONFIG_PATH or ./config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,
    /// Serve /healthz and /metrics on this address
    #[arg(long, value_name = "ADDR")]
    admin_addr: Option<String>,
}

impl Cli {
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(db) = &self.db {
            cfg.database.path = db.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(addr) = &self.admin_addr {
            cfg.admin.addr = Some(addr.clone());
        }
    }
}

/// Defaults, then config file, then environment, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::load_layered(cli.config.as_deref())?;
    cli.apply(&mut cfg);
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn main() -> ExitCode {
    // .env first so RUST_LOG and the config variables are visible
    dotenv().ok();
    let cli = Cli::parse();
    let cfg = load_config(&cli);

    let json_logs = matches!(&cfg, Ok(c) if c.log.format == LogFormat::Json);
    common::utils::logging::init_logging(json_logs);
    info!(service = "json-mock", event = "logger_init", "tracing subscriber initialized");

    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "json-mock", event = "config_invalid", error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "json-mock",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "json-mock", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "json-mock",
        event = "start",
        %service_id,
        pid,
        version,
        db = %cfg.database.path,
        threads = worker_threads.unwrap_or_default(),
        "json-mock starting"
    );

    rt.block_on(async move {
        match server::run(cfg).await {
            Ok(()) => {
                info!(service = "json-mock", event = "stop", %service_id, pid, "json-mock stopped");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "json-mock", event = "run_failed", error = %e, "json-mock could not run");
                ExitCode::FAILURE
            }
        }
    })
}

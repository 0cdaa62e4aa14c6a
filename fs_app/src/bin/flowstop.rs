use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use fs_app::cli;
use fs_app::cli::Command;
use fs_app::config_loader;
use fs_app::shutdown_handler::ShutdownSignal;
use fs_app::watch;
use fs_limiter::Limiter;
use fs_limiter::MemoryStore;
use fs_limiter::RedisStore;
use fs_limiter::Store;
use fs_limiter::SystemClock;
use tracing::info;
use tracing::warn;

type AppLimiter = Limiter<Arc<dyn Store>, SystemClock>;

/// Exit status for a rejected `pass`
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let invocation = match cli::from_env() {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("error: {err}\n\n{}", cli::USAGE);
            return Ok(ExitCode::FAILURE);
        }
    };

    let loaded = config_loader::load_app_config(&invocation.config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // CRITICAL: Keep guard alive for entire application lifetime
    let _guard = fs_app::tracing_setup::init("flowstop", &config.log_dir, tracing::Level::INFO, matches!(invocation.command, Command::Watch { .. }));
    match loaded {
        Ok(_) => info!("Loaded config from {} (if present) and {}_* variables", invocation.config_path, config_loader::ENV_PREFIX),
        Err(err) => warn!("Failed to load config from {}: {}. Using defaults.", invocation.config_path, err),
    }
    info!(namespace = %config.namespace, interval_ms = config.interval_ms, limit = config.limit, memory = invocation.memory, "Starting flowstop");

    let store: Arc<dyn Store> = if invocation.memory {
        Arc::new(MemoryStore::new())
    } else {
        let store = RedisStore::connect(&config.redis_url).await.with_context(|| format!("failed to connect to {}", config.redis_url))?;
        Arc::new(store)
    };

    let limiter: AppLimiter = Limiter::new(config.limiter_config(), store, SystemClock).context("invalid limiter configuration")?;

    match invocation.command {
        Command::Pass { item } => {
            if limiter.pass(&item).await? {
                println!("allowed");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("rejected");
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        }
        Command::Peek { item } => {
            println!("{}", limiter.peek(&item).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch { item, period } => {
            let shutdown = ShutdownSignal::install().context("failed to install Ctrl+C handler")?;
            let summary = watch::run(&limiter, &item, period, &shutdown).await;
            println!("allowed={} rejected={} failed={}", summary.allowed, summary.rejected, summary.failed);
            Ok(ExitCode::SUCCESS)
        }
    }
}

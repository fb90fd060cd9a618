mod candidates;
mod cli;
mod cycle;
mod error;
mod fastloop;
mod fastpath;
mod observation;
mod platforms;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use error::AgentError;
use fastloop::ObservationTrigger;
use observation::{MetarObservationSource, PwsObservationSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;
use tokio::time;
use weather_config::EngineConfig;
use weather_executor::FastPathDedup;
use weather_notification::{Alert, AlertQueue, AlertType, DiscordWebhookNotifier, NotificationChannel};
use weather_platform::PlatformClient;
use weather_storage::StorageGateway;

struct PendingScan {
    city_name: String,
    trigger: ObservationTrigger,
    observation_high: f64,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("fatal: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<(), AgentError> {
    tracing::info!("starting weather-agent");

    let cfg = EngineConfig::from_env().map_err(AgentError::Config)?;
    tracing::info!(cities = cfg.cities.len(), "configuration loaded");

    let storage = StorageGateway::connect(&cfg.database_url, cfg.database_max_connections).await?;
    tracing::info!("storage connected");

    let platform_clients = platforms::build_platform_clients(&cfg);

    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
    if let Some(webhook) = cfg.discord_webhook_url.clone() {
        channels.push(Box::new(DiscordWebhookNotifier::new(webhook)));
    }
    let alerts = AlertQueue::new(channels, Duration::from_secs(2));

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { city } => {
            let summary = cycle::run_full_cycle(&storage, &platform_clients, &cfg, &alerts, city.as_deref()).await.map_err(AgentError::Config)?;
            tracing::info!(?summary, "scan complete");
        }
        Command::Status { city } => {
            print_status(&storage, &cfg, city.as_deref()).await.map_err(AgentError::Config)?;
        }
        Command::Resolve => {
            let summary = cycle::run_full_cycle(&storage, &platform_clients, &cfg, &alerts, city_only_resolve(&cfg)).await.map_err(AgentError::Config)?;
            tracing::info!(?summary, "resolve pass complete");
        }
        Command::Start => {
            start_agent(storage, platform_clients, cfg, alerts).await?;
        }
    }

    Ok(())
}

fn city_only_resolve(_cfg: &EngineConfig) -> Option<&str> {
    None
}

async fn print_status(storage: &StorageGateway, cfg: &EngineConfig, city: Option<&str>) -> anyhow::Result<()> {
    for c in &cfg.cities {
        if let Some(only) = city {
            if c.name != only {
                continue;
            }
        }
        let today = chrono::Utc::now().date_naive();
        let open = storage.get_open_trades_for_city_date(&c.name, today).await?;
        let obs = storage.latest_observation(&c.name, today).await?;
        println!(
            "{}: {} open trades today, running_high={:?}, wu_high={:?}",
            c.name,
            open.len(),
            obs.as_ref().map(|o| o.running_high),
            obs.as_ref().map(|o| o.wu_high),
        );
    }
    Ok(())
}

/// Three independent loops: the main scan/execute/monitor/resolve cycle,
/// one observation-poll task per city, and one guaranteed-win scan task
/// fed by the poll tasks over an mpsc channel. Fast-path latency never
/// waits on the slower cycle, and a stalled scan never delays detection
/// of a boundary crossing.
async fn start_agent(
    storage: StorageGateway,
    platform_clients: Vec<Box<dyn PlatformClient>>,
    cfg: EngineConfig,
    alerts: AlertQueue,
) -> Result<(), AgentError> {
    let storage = Arc::new(storage);
    let platform_clients = Arc::new(platform_clients);
    let cfg = Arc::new(cfg);
    let alerts = Arc::new(alerts);
    let dedup = Arc::new(FastPathDedup::new());

    let (tx, mut rx) = mpsc::unbounded_channel::<PendingScan>();

    let mut poll_handles = Vec::new();
    for city in cfg.cities.clone() {
        let storage = Arc::clone(&storage);
        let tx = tx.clone();
        let interval_secs = cfg.scheduling.observation_poll_interval_seconds;
        poll_handles.push(tokio::spawn(async move {
            let metar = MetarObservationSource;
            let pws = PwsObservationSource;
            let mut tick = time::interval(Duration::from_secs(interval_secs));
            loop {
                tick.tick().await;
                match fastloop::poll_observations(&storage, &city, &metar, &pws).await {
                    Ok(triggers) => {
                        for (trigger, observation_high) in triggers {
                            let _ = tx.send(PendingScan { city_name: city.name.clone(), trigger, observation_high });
                        }
                    }
                    Err(e) => tracing::warn!(city = %city.name, error = %e, "observation poll failed"),
                }
            }
        }));
    }
    drop(tx);

    let scan_task = {
        let storage = Arc::clone(&storage);
        let platform_clients = Arc::clone(&platform_clients);
        let cfg = Arc::clone(&cfg);
        let alerts = Arc::clone(&alerts);
        let dedup = Arc::clone(&dedup);
        tokio::spawn(async move {
            while let Some(pending) = rx.recv().await {
                let Some(city) = cfg.city_by_name(&pending.city_name) else { continue };
                match fastloop::scan_guaranteed_win(&storage, &platform_clients, &dedup, city, &cfg, pending.trigger, pending.observation_high, &alerts).await {
                    Ok(n) if n > 0 => tracing::info!(city = %pending.city_name, entered = n, "guaranteed-win fast path entered trades"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(city = %pending.city_name, error = %e, "guaranteed-win scan failed"),
                }
            }
        })
    };

    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate()).map_err(|e| AgentError::Signal(e))?;
    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { tracing::info!("received SIGINT"); }
            _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
        }
    };
    tokio::pin!(shutdown);

    let mut cycle_interval = time::interval(Duration::from_secs(cfg.scheduling.scan_interval_minutes * 60));
    let mut cycles_run: u64 = 0;
    let heartbeat_interval_cycles: u64 = std::env::var("HEARTBEAT_INTERVAL_CYCLES").ok().and_then(|v| v.parse().ok()).unwrap_or(6);

    tracing::info!(
        scan_interval_minutes = cfg.scheduling.scan_interval_minutes,
        observation_poll_interval_seconds = cfg.scheduling.observation_poll_interval_seconds,
        "agent running, press Ctrl+C to stop"
    );

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                match cycle::run_full_cycle(&storage, &platform_clients, &cfg, &alerts, None).await {
                    Ok(summary) => {
                        cycles_run += 1;
                        tracing::info!(cycle = cycles_run, ?summary, "cycle complete");
                    }
                    Err(e) => {
                        tracing::error!("cycle failed: {}", e);
                        alerts.send(Alert::new(
                            AlertType::AgentError { context: "cycle".to_string(), detail: e.to_string() },
                            "Cycle error",
                            format!("cycle #{}: {}", cycles_run + 1, e),
                        )).await;
                    }
                }

                if heartbeat_interval_cycles > 0 && cycles_run > 0 && cycles_run % heartbeat_interval_cycles == 0 {
                    tracing::info!(cycle = cycles_run, "heartbeat");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    for handle in poll_handles {
        handle.abort();
    }
    scan_task.abort();

    match Arc::try_unwrap(alerts) {
        Ok(alerts) => alerts.shutdown().await,
        Err(alerts) => {
            alerts.send(Alert::new(AlertType::AgentError { context: "shutdown".to_string(), detail: "alert queue still shared".to_string() }, "Shutdown", "queue could not be drained cleanly")).await;
        }
    }

    tracing::info!("weather-agent shut down");
    Ok(())
}

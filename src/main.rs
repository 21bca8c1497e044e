use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use riskr::api::routes::{create_router, AppState};
use riskr::bus::Bus;
use riskr::config::Config;
use riskr::observability::{init_tracing, MetricsRegistry};
use riskr::policy::{load_policy, PolicyLoader, PolicyPlane};
use riskr::state::RollingView;
use riskr::{sim, streamer};

#[derive(Parser, Debug)]
#[command(name = "riskr")]
#[command(about = "Real-time transaction risk decision engine")]
struct Cli {
    /// Path to a config file (overrides RISKR_CONFIG and the default search path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a long-lived service process.
    Run {
        #[command(subcommand)]
        service: RunService,
    },
    /// Inspect or publish policy documents.
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
    /// Publish a canned scenario to the bus for end-to-end testing.
    Sim {
        /// One of: clean, ofac, daily, structuring
        scenario: String,
    },
}

#[derive(Subcommand, Debug)]
enum RunService {
    /// Serve the inline HTTP decision API.
    Gateway,
    /// Run the streaming rule evaluator against the transaction event bus.
    Streamer,
}

#[derive(Subcommand, Debug)]
enum PolicyAction {
    /// Print the currently configured policy file as canonical JSON with its hash.
    Print,
    /// Publish the currently configured policy file to `policies.apply`.
    Apply,
    /// Stub: no remote policy store exists in this design.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    init_tracing(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting riskr decision engine"
    );

    match cli.command {
        Command::Run { service } => match service {
            RunService::Gateway => run_gateway(config).await,
            RunService::Streamer => run_streamer(config).await,
        },
        Command::Policy { action } => run_policy(config, action).await,
        Command::Sim { scenario } => run_sim(config, &scenario).await,
    }
}

fn policy_loader(config: &Config) -> PolicyLoader {
    PolicyLoader::new(
        config.policy.file.to_string_lossy(),
        config.sanctions.file.to_string_lossy(),
    )
}

async fn connect_bus(config: &Config) -> anyhow::Result<Arc<Bus>> {
    let bus = Bus::connect(&config.nats.urls).await?;
    if config.nats.ensure_streams {
        bus.ensure_streams().await?;
    }
    Ok(Arc::new(bus))
}

async fn run_gateway(config: Config) -> anyhow::Result<()> {
    let bus = connect_bus(&config).await?;

    let plane = PolicyPlane::new(policy_loader(&config));
    let (policy, ruleset_tx, ruleset_rx) = plane.bootstrap();
    info!(policy_version = %policy.version, "initial policy loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let plane_handle = tokio::spawn(plane.spawn(Arc::clone(&bus), ruleset_tx, shutdown_rx));

    let state = Arc::new(AppState {
        ruleset_rx,
        bus: Some(bus),
        metrics: Arc::new(MetricsRegistry::new()),
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        latency_budget_ms: config.latency_budget_ms,
    });

    let app = create_router(state);
    let addr: SocketAddr = config.http.listen_addr.parse()?;

    info!(addr = %addr, "starting HTTP server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down gateway");
    let _ = shutdown_tx.send(true);
    let _ = plane_handle.await;

    Ok(())
}

async fn run_streamer(config: Config) -> anyhow::Result<()> {
    let bus = connect_bus(&config).await?;
    let view = Arc::new(RollingView::new());

    let plane = PolicyPlane::new(policy_loader(&config));
    let (policy, ruleset_tx, ruleset_rx) = plane.bootstrap();
    info!(policy_version = %policy.version, "initial policy loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let plane_handle = tokio::spawn(plane.spawn(Arc::clone(&bus), ruleset_tx, shutdown_rx.clone()));
    let streamer_handle = tokio::spawn(streamer::run(Arc::clone(&bus), view, ruleset_rx, shutdown_rx));

    shutdown_signal().await;

    info!("shutting down streamer");
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(plane_handle, streamer_handle);

    Ok(())
}

async fn run_policy(config: Config, action: PolicyAction) -> anyhow::Result<()> {
    match action {
        PolicyAction::Print => {
            let mut policy = load_policy(&config.policy.file)?;
            policy.hash = policy.compute_hash();
            println!("{}", policy.pretty());
        }
        PolicyAction::Apply => {
            let mut policy = load_policy(&config.policy.file)?;
            policy.hash = policy.compute_hash();
            let bus = connect_bus(&config).await?;
            bus.publish_durable(riskr::bus::SUBJ_POLICY_APPLY, &policy)
                .await?;
            info!(policy_version = %policy.version, hash = %policy.hash, "published policy");
        }
        PolicyAction::List => {
            tracing::warn!("policy list is a stub: no remote policy store exists in this design");
        }
    }

    Ok(())
}

async fn run_sim(config: Config, scenario: &str) -> anyhow::Result<()> {
    let bus = connect_bus(&config).await?;
    sim::run(&bus, scenario).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("received shutdown signal");
}

//! `labelcheck`: shipping label inspection station.

mod console;
mod feedback;
mod settings;

use anyhow::Context;
use clap::Parser;
use labelcheck_core::constants::EVENT_CHANNEL_CAPACITY;
use labelcheck_hardware::{AnyKeySource, KeyboardBus, WedgeListener, pump_keys};
use labelcheck_network::{HttpValidationClient, ScannerTransport};
use labelcheck_orchestrator::{Runtime, RuntimeInputs, ScanOrchestrator};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::feedback::TerminalFeedback;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = env_file {
        debug!(path = %path.display(), "Loaded .env file");
    }

    let settings = Settings::parse();
    run(settings).await
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    info!(
        scanner_url = %settings.scanner_url,
        api_base_url = %settings.api_base_url,
        "Starting labelcheck"
    );

    let validator = HttpValidationClient::new(settings.validation_config())
        .context("invalid validation service configuration")?;
    let (transport, transport_events) = ScannerTransport::spawn(settings.transport_config())
        .context("invalid scanner hub configuration")?;

    let shutdown = CancellationToken::new();
    let bus = KeyboardBus::new();
    let (mut listener, decoded) = WedgeListener::with_debounce(settings.debounce());
    listener.mount(&bus);

    if let Some(path) = &settings.wedge_device {
        let device = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("cannot open wedge device {}", path.display()))?;
        let source = AnyKeySource::reader(path.display().to_string(), device);
        let bus = bus.clone();
        tokio::spawn(async move {
            if let Err(e) = pump_keys(source, bus).await {
                error!(error = %e, "Wedge device stopped");
            }
        });
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted");
                shutdown.cancel();
            }
        });
    }

    let (operator_tx, operator_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let runtime = Runtime::new(
        ScanOrchestrator::new(settings.orchestrator_config(), TerminalFeedback::new()),
        validator,
    );
    tokio::spawn(console::print_session(runtime.subscribe()));
    tokio::spawn(console::run_console(
        console::spawn_stdin_reader(),
        bus.clone(),
        operator_tx,
        shutdown.clone(),
    ));

    let orchestrator = runtime
        .run(
            &transport,
            RuntimeInputs {
                transport: transport_events,
                decoded,
                operator: operator_rx,
            },
            shutdown.clone(),
        )
        .await;

    shutdown.cancel();
    listener.unmount().await;
    if let Err(e) = transport.shutdown().await {
        warn!(error = %e, "Scanner transport did not stop cleanly");
    }

    info!(
        state = %orchestrator.state(),
        scanners = orchestrator.roster().len(),
        "Stopped"
    );
    Ok(())
}

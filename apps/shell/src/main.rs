use anyhow::{Context, bail};
use portal::Session;
use portal::bootstrap::{Bootstrap, BootstrapEvent, EventReceiver};
use portal::domain::subsystem::FlagState;
use portal::kernel::config::load_portal_config;
use portal::logger::Logger;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_portal_config(config_path.as_deref())
        .context("Critical: Configuration is malformed")?;

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &config.logging)?.init()?;

    let Session { bootstrap: session, events } =
        portal::start(&config).context("Failed to start the bootstrap")?;
    tokio::spawn(report_events(events));

    let ready = tokio::select! {
        ready = session.wait_ready() => ready,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted before the portal became ready");
            false
        },
    };

    summarize(&session);
    if !ready {
        bail!("Portal did not become ready");
    }
    Ok(())
}

async fn report_events(mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(BootstrapEvent::Degraded { id, reason, required: false }) => {
                warn!(subsystem = %id, reason = %reason, "Running degraded");
            },
            Ok(BootstrapEvent::Degraded { id, reason, required: true }) => {
                error!(subsystem = %id, reason = %reason, "Blocked on a required subsystem");
            },
            Ok(BootstrapEvent::Stalled { pending }) => {
                warn!(pending = ?pending, "Still waiting for required subsystems");
            },
            Ok(BootstrapEvent::Ready) => info!("Portal ready"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event reporter lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn summarize(session: &Bootstrap) {
    for flag in session.flags_snapshot() {
        match &flag.state {
            FlagState::Succeeded => info!(subsystem = %flag.id, "ok"),
            FlagState::Pending => warn!(subsystem = %flag.id, required = flag.required, "pending"),
            FlagState::Failed(reason) => {
                warn!(subsystem = %flag.id, required = flag.required, reason = %reason, "failed");
            },
        }
    }

    if let Some(settings) = session.current_settings() {
        info!(
            version = %settings.version,
            services = settings.services.len(),
            asr_languages = settings.languages.asr.len(),
            maus_languages = settings.languages.maus.len(),
            mode = ?session.mode(),
            "Settings summary"
        );
    }
}

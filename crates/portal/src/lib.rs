//! Facade crate for the portal startup core.
//! Re-exports domain/kernel primitives and the bootstrap pieces an application needs.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Load a [`domain::config::PortalConfig`] with [`kernel::config::load_portal_config`].
//! - Install logging with [`logger::Logger::from_config`].
//! - Call [`start`] and observe readiness through the returned [`Session`].

use std::sync::Arc;

pub use portal_bootstrap as bootstrap;
pub use portal_domain as domain;
pub use portal_fetcher as fetcher;
pub use portal_kernel as kernel;
pub use portal_logger as logger;
pub use portal_settings as settings;

use bootstrap::{Bootstrap, BootstrapError, EventReceiver};
use domain::config::PortalConfig;
use fetcher::{HttpTransport, Transport};

/// Errors raised while wiring a session against the real endpoints.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Transport(#[from] fetcher::FetchError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// A running session and an event stream opened before it started.
///
/// `events` sees every event of the session, including failures of
/// subsystems that finish right after start.
#[derive(Debug)]
pub struct Session {
    pub bootstrap: Bootstrap,
    pub events: EventReceiver,
}

/// Builds the standard session over HTTP and starts it.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built, the session is
/// inconsistent, or no Tokio runtime is running.
pub fn start(config: &PortalConfig) -> Result<Session, StartError> {
    let transport = HttpTransport::new(&config.fetch)?;
    start_with(config, Arc::new(transport))
}

/// Builds the standard session over `transport`, subscribes, then starts it.
///
/// # Errors
/// Returns an error if the session is inconsistent or no Tokio runtime is running.
pub fn start_with<T: Transport>(config: &PortalConfig, transport: Arc<T>) -> Result<Session, StartError> {
    let bootstrap = Bootstrap::from_config(config, transport)?;
    let events = bootstrap.subscribe();
    bootstrap.start()?;
    Ok(Session { bootstrap, events })
}

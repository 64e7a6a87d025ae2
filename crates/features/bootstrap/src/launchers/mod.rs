//! The eight portal subsystems.

mod capabilities;
mod compatibility;
mod languages;
mod logging;
mod mode;
mod quota;
mod settings;

pub use capabilities::CapabilitiesLauncher;
pub use compatibility::CompatibilityLauncher;
pub use languages::LanguagesLauncher;
pub use logging::LoggingLauncher;
pub use mode::ModeLauncher;
pub use quota::QuotaLauncher;
pub use settings::SettingsLauncher;

use crate::launcher::Launcher;
use portal_domain::config::PortalConfig;
use portal_domain::settings::LanguageFeed;
use portal_fetcher::{RetryPolicy, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Wires every standard subsystem against `transport`.
///
/// The configured retry delay is applied on top of each feed's own bound.
pub fn standard_launchers<T: Transport>(
    config: &PortalConfig,
    transport: Arc<T>,
) -> Vec<Arc<dyn Launcher>> {
    let delay = Duration::from_millis(config.fetch.retry_delay_ms);
    let standard = RetryPolicy::STANDARD.with_delay(delay);

    vec![
        Arc::new(CompatibilityLauncher::new(
            config.client.clone(),
            config.compatibility.allowed_clients.clone(),
        )),
        Arc::new(LoggingLauncher::new(config.client.name.clone(), config.logging.directory.clone())),
        Arc::new(ModeLauncher::new(config.mode.clone())),
        Arc::new(
            SettingsLauncher::new(Arc::clone(&transport), config.settings.source.clone())
                .with_policy(standard),
        ),
        Arc::new(QuotaLauncher::new(Arc::clone(&transport)).with_policy(standard)),
        Arc::new(CapabilitiesLauncher::new(Arc::clone(&transport)).with_policy(standard)),
        Arc::new(
            LanguagesLauncher::new(Arc::clone(&transport), LanguageFeed::Asr).with_policy(standard),
        ),
        Arc::new(
            LanguagesLauncher::new(transport, LanguageFeed::Maus)
                .with_policy(RetryPolicy::MAUS.with_delay(delay)),
        ),
    ]
}

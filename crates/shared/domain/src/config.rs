use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level portal configuration shared across subsystems.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfigInner {
    pub client: ClientConfig,
    pub mode: String,
    pub settings: SettingsSourceConfig,
    pub fetch: FetchConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
    pub compatibility: CompatibilityConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(flatten, default)]
    inner: Arc<PortalConfigInner>,
}

impl Deref for PortalConfig {
    type Target = PortalConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PortalConfig {
    fn deref_mut(&mut self) -> &mut PortalConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Identity of the client the portal runs in, checked by the compatibility subsystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub version: u32,
}

/// Location of the base settings document (`http(s)://`, `file://` or a plain path).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsSourceConfig {
    pub source: String,
}

/// Network knobs for external fetches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    /// Fixed pause between attempts; zero retries immediately.
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

/// Readiness coordination knobs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Report a stall when required subsystems are still pending after this many seconds.
    pub readiness_timeout_seconds: Option<u64>,
    /// Subsystem ids whose failure must not block readiness.
    pub optional: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console: bool,
    pub json: bool,
    pub directory: Option<PathBuf>,
    pub env_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompatibilityConfig {
    pub allowed_clients: Vec<ClientRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientRule {
    pub name: String,
    #[serde(default)]
    pub min_version: u32,
}

// --- Default ---

impl Default for PortalConfigInner {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            mode: "online".to_owned(),
            settings: SettingsSourceConfig::default(),
            fetch: FetchConfig::default(),
            bootstrap: BootstrapConfig::default(),
            logging: LoggingConfig::default(),
            compatibility: CompatibilityConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { name: "portal-shell".to_owned(), version: 1 }
    }
}

impl Default for SettingsSourceConfig {
    fn default() -> Self {
        Self { source: "config/settings.json".to_owned() }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30, retry_delay_ms: 0, user_agent: "portal/0.0".to_owned() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            console: true,
            json: false,
            directory: None,
            env_filter: None,
        }
    }
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            allowed_clients: vec![
                ClientRule { name: "portal-shell".to_owned(), min_version: 1 },
                ClientRule { name: "chrome".to_owned(), min_version: 90 },
                ClientRule { name: "firefox".to_owned(), min_version: 90 },
                ClientRule { name: "edge".to_owned(), min_version: 90 },
                ClientRule { name: "safari".to_owned(), min_version: 15 },
            ],
        }
    }
}

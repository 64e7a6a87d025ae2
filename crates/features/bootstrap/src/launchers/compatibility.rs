use crate::channel::Payload;
use crate::launcher::{LaunchContext, LaunchFuture, Launcher};
use portal_domain::config::{ClientConfig, ClientRule};
use portal_domain::subsystem::SubsystemId;
use tracing::{debug, warn};

/// Checks the running client against the configured allow-list.
#[derive(Debug, Clone)]
pub struct CompatibilityLauncher {
    client: ClientConfig,
    rules: Vec<ClientRule>,
}

impl CompatibilityLauncher {
    #[must_use]
    pub fn new(client: ClientConfig, rules: Vec<ClientRule>) -> Self {
        Self { client, rules }
    }

    /// Client names compare case-insensitively; the version must reach the rule's minimum.
    pub fn check(client: &ClientConfig, rules: &[ClientRule]) -> Result<(), String> {
        let Some(rule) = rules.iter().find(|r| r.name.eq_ignore_ascii_case(client.name.trim())) else {
            return Err(format!("client '{}' is not supported", client.name));
        };
        if client.version < rule.min_version {
            return Err(format!(
                "client '{}' version {} is below the supported minimum {}",
                client.name, client.version, rule.min_version
            ));
        }
        Ok(())
    }
}

impl Launcher for CompatibilityLauncher {
    fn id(&self) -> SubsystemId {
        SubsystemId::COMPATIBILITY
    }

    fn required(&self) -> bool {
        false
    }

    fn launch(&self, _ctx: LaunchContext) -> LaunchFuture {
        let result = Self::check(&self.client, &self.rules);
        let client = self.client.name.clone();
        Box::pin(async move {
            match result {
                Ok(()) => {
                    debug!(client = %client, "Client is supported");
                    Ok(Payload::None)
                },
                Err(reason) => {
                    warn!(client = %client, reason = %reason, "Unsupported client");
                    Err(reason)
                },
            }
        })
    }
}

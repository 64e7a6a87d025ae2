use crate::coordinator::{Coordinator, Publishers};
use crate::error::BootstrapError;
use crate::events::{BootstrapEvent, EventReceiver, Phase};
use crate::launcher::{Launcher, Stage};
use crate::launchers::standard_launchers;
use fxhash::FxHashSet;
use parking_lot::Mutex;
use portal_domain::config::{BootstrapConfig, PortalConfig};
use portal_domain::settings::CanonicalSettings;
use portal_domain::subsystem::{AppMode, SubsystemFlag, SubsystemId};
use portal_fetcher::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct Shared {
    session: Mutex<Option<Coordinator>>,
    phase: watch::Receiver<Phase>,
    settings: watch::Receiver<Option<Arc<CanonicalSettings>>>,
    flags: watch::Receiver<Vec<SubsystemFlag>>,
    mode: watch::Receiver<Option<AppMode>>,
    events: broadcast::Sender<BootstrapEvent>,
}

/// Observer-facing handle of one bootstrap session.
///
/// Clones share the same session. The coordinator runs on the Tokio runtime
/// that was current when [`Bootstrap::start`] was called.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    shared: Arc<Shared>,
}

impl Bootstrap {
    #[must_use]
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::default()
    }

    /// A session running the standard portal subsystems.
    pub fn from_config<T: Transport>(
        config: &PortalConfig,
        transport: Arc<T>,
    ) -> Result<Self, BootstrapError> {
        Self::builder()
            .launchers(standard_launchers(config, transport))
            .with_config(&config.bootstrap)
            .build()
    }

    /// Starts the session.
    ///
    /// Returns `Ok(true)` if this call started it and `Ok(false)` if it was
    /// already started. The phase is `Running` when this returns.
    pub fn start(&self) -> Result<bool, BootstrapError> {
        let runtime = RuntimeHandle::try_current().map_err(|e| BootstrapError::NoRuntime {
            message: e.to_string().into(),
            context: Some("start".into()),
        })?;

        let Some(coordinator) = self.shared.session.lock().take() else {
            debug!("Bootstrap already started");
            return Ok(false);
        };
        coordinator.start(&runtime);
        Ok(true)
    }

    /// Runs `callback` once the application is ready.
    ///
    /// Runs it inline if the session is already ready, otherwise from a task
    /// that waits for readiness. The callback never runs if readiness never
    /// comes.
    pub fn on_ready<F>(&self, callback: F) -> Result<(), BootstrapError>
    where
        F: FnOnce() + Send + 'static,
    {
        if *self.shared.phase.borrow() == Phase::Ready {
            callback();
            return Ok(());
        }

        let runtime = RuntimeHandle::try_current().map_err(|e| BootstrapError::NoRuntime {
            message: e.to_string().into(),
            context: Some("on_ready".into()),
        })?;
        let mut phase = self.shared.phase.clone();
        runtime.spawn(async move {
            if phase.wait_for(|p| *p == Phase::Ready).await.is_ok() {
                callback();
            } else {
                trace!("Session ended without readiness; ready callback dropped");
            }
        });
        Ok(())
    }

    /// Waits for readiness. Returns `false` once the session has settled
    /// without becoming ready.
    pub async fn wait_ready(&self) -> bool {
        let mut phase = self.shared.phase.clone();
        phase.wait_for(|p| *p == Phase::Ready).await.is_ok()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.shared.phase.borrow()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// The latest merged settings, once the base document is loaded.
    #[must_use]
    pub fn current_settings(&self) -> Option<Arc<CanonicalSettings>> {
        self.shared.settings.borrow().clone()
    }

    /// Every subsystem flag, sorted by id.
    #[must_use]
    pub fn flags_snapshot(&self) -> Vec<SubsystemFlag> {
        self.shared.flags.borrow().clone()
    }

    #[must_use]
    pub fn mode(&self) -> Option<AppMode> {
        *self.shared.mode.borrow()
    }

    /// Receives events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.shared.events.subscribe()
    }

    /// Receiver that observes every settings snapshot.
    #[must_use]
    pub fn watch_settings(&self) -> watch::Receiver<Option<Arc<CanonicalSettings>>> {
        self.shared.settings.clone()
    }
}

/// Collects launchers and requiredness overrides for a [`Bootstrap`].
#[derive(Debug, Default)]
pub struct BootstrapBuilder {
    launchers: Vec<Arc<dyn Launcher>>,
    optional: Option<Vec<SubsystemId>>,
    readiness_timeout: Option<Duration>,
}

impl BootstrapBuilder {
    #[must_use]
    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launchers.push(launcher);
        self
    }

    #[must_use]
    pub fn launchers(mut self, launchers: impl IntoIterator<Item = Arc<dyn Launcher>>) -> Self {
        self.launchers.extend(launchers);
        self
    }

    /// Replaces each launcher's own requiredness: exactly these ids become optional.
    #[must_use]
    pub fn optional<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubsystemId>,
    {
        self.optional = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Emit [`BootstrapEvent::Stalled`] once if the session is not ready after `timeout`.
    #[must_use]
    pub fn readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: &BootstrapConfig) -> Self {
        if let Some(seconds) = config.readiness_timeout_seconds {
            self = self.readiness_timeout(Duration::from_secs(seconds));
        }
        if let Some(optional) = &config.optional {
            self = self.optional(optional.iter().cloned());
        }
        self
    }

    pub fn build(self) -> Result<Bootstrap, BootstrapError> {
        let mut seen = FxHashSet::default();
        for launcher in &self.launchers {
            let id = launcher.id();
            if !seen.insert(id.clone()) {
                return Err(BootstrapError::DuplicateSubsystem { id });
            }
        }
        if let Some(optional) = &self.optional
            && let Some(id) = optional.iter().find(|id| !seen.contains(*id))
        {
            return Err(BootstrapError::UnknownSubsystem {
                id: id.clone(),
                context: Some("optional".into()),
            });
        }
        if self
            .launchers
            .iter()
            .any(|l| l.id() == SubsystemId::SETTINGS && l.stage() == Stage::AfterSettings)
        {
            return Err(BootstrapError::InvalidStage {
                id: SubsystemId::SETTINGS,
                message: "the settings launcher cannot wait for itself".into(),
            });
        }
        let needs_settings = self.launchers.iter().any(|l| l.stage() == Stage::AfterSettings);
        if needs_settings && !seen.contains(&SubsystemId::SETTINGS) {
            return Err(BootstrapError::MissingSettings {
                message: "dependent launchers registered without a settings launcher".into(),
            });
        }

        let registrations: Vec<(Arc<dyn Launcher>, bool)> = self
            .launchers
            .into_iter()
            .map(|launcher| {
                let required = match &self.optional {
                    Some(optional) => !optional.contains(&launcher.id()),
                    None => launcher.required(),
                };
                (launcher, required)
            })
            .collect();

        let (phase_tx, phase) = watch::channel(Phase::Idle);
        let (settings_tx, settings) = watch::channel(None);
        let (flags_tx, flags) = watch::channel(Vec::new());
        let (mode_tx, mode) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let publishers = Publishers {
            phase: phase_tx,
            settings: settings_tx,
            flags: flags_tx,
            mode: mode_tx,
            events: events.clone(),
        };
        let coordinator = Coordinator::new(registrations, publishers, self.readiness_timeout);
        coordinator.publish_flags();

        Ok(Bootstrap {
            shared: Arc::new(Shared {
                session: Mutex::new(Some(coordinator)),
                phase,
                settings,
                flags,
                mode,
                events,
            }),
        })
    }
}

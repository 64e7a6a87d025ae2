use crate::channel::Outcome;
use portal_domain::settings::CanonicalSettings;
use portal_domain::subsystem::SubsystemId;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The unit of work behind one subsystem.
pub type LaunchFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// When the coordinator starts a launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Together with `start()`.
    Immediate,
    /// Once the base settings are available; never if they fail.
    AfterSettings,
}

/// What a launcher gets to work with.
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    settings: Option<Arc<CanonicalSettings>>,
}

impl LaunchContext {
    #[must_use]
    pub const fn immediate() -> Self {
        Self { settings: None }
    }

    #[must_use]
    pub fn with_settings(settings: Arc<CanonicalSettings>) -> Self {
        Self { settings: Some(settings) }
    }

    /// Base settings snapshot. Only set for [`Stage::AfterSettings`] launchers.
    #[must_use]
    pub fn settings(&self) -> Option<&CanonicalSettings> {
        self.settings.as_deref()
    }

    /// Base settings, or the failure reason to report when they are absent.
    pub fn require_settings(&self) -> Result<&CanonicalSettings, String> {
        self.settings().ok_or_else(|| "base settings unavailable".to_owned())
    }
}

/// A startable subsystem.
///
/// `launch` is called at most once per session. The returned future is
/// spawned on the runtime and its output becomes the subsystem's single
/// terminal outcome.
pub trait Launcher: Send + Sync + 'static {
    fn id(&self) -> SubsystemId;

    /// Whether a failure of this subsystem blocks readiness.
    fn required(&self) -> bool {
        true
    }

    fn stage(&self) -> Stage {
        Stage::Immediate
    }

    fn launch(&self, ctx: LaunchContext) -> LaunchFuture;
}

impl fmt::Debug for dyn Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("id", &self.id())
            .field("required", &self.required())
            .field("stage", &self.stage())
            .finish()
    }
}

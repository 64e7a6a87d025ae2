use portal_domain::subsystem::SubsystemId;
use tokio::sync::broadcast;

/// Coordinator lifecycle. `Ready` is terminal.
///
/// A session whose required subsystem fails or never finishes stays in
/// `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Ready,
}

/// Notifications published to observers while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    /// Every required subsystem succeeded. Sent once per session.
    Ready,
    /// A subsystem failed. Optional failures are a non-blocking banner;
    /// required failures keep the application from becoming ready.
    Degraded { id: SubsystemId, reason: String, required: bool },
    /// The readiness timeout elapsed while these required subsystems were pending.
    Stalled { pending: Vec<SubsystemId> },
}

/// Stream of [`BootstrapEvent`]s opened with [`crate::Bootstrap::subscribe`].
pub type EventReceiver = broadcast::Receiver<BootstrapEvent>;

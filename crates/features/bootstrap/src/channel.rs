use portal_domain::batch::ExternalBatch;
use portal_domain::settings::CanonicalSettings;
use portal_domain::subsystem::{AppMode, SubsystemId};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// What a successful subsystem hands to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Nothing beyond the fact of success.
    None,
    /// The base settings document.
    Settings(CanonicalSettings),
    /// Normalized external data to merge into the settings.
    Batch(ExternalBatch),
    /// The resolved application mode.
    Mode(AppMode),
}

/// Terminal outcome of one subsystem: the payload, or a failure reason.
pub type Outcome = Result<Payload, String>;

/// One message on the coordinator's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: SubsystemId,
    pub outcome: Outcome,
}

pub(crate) type CompletionSender = mpsc::UnboundedSender<Completion>;
pub(crate) type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

pub(crate) fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::unbounded_channel()
}

/// Write end of a subsystem's result channel.
///
/// Reporting consumes the reporter, so a launcher can emit at most one
/// outcome. A reporter dropped without reporting (e.g. its task panicked)
/// reports a failure on its own, so the subsystem never stays `Pending`
/// because of a lost task.
#[derive(Debug)]
pub struct TaskReporter {
    id: SubsystemId,
    tx: Option<CompletionSender>,
}

impl TaskReporter {
    pub(crate) fn new(id: SubsystemId, tx: CompletionSender) -> Self {
        Self { id, tx: Some(tx) }
    }

    #[must_use]
    pub const fn id(&self) -> &SubsystemId {
        &self.id
    }

    /// Sends the terminal outcome. Returns `false` if the coordinator is gone.
    pub fn report(mut self, outcome: Outcome) -> bool {
        self.send(outcome)
    }

    pub fn succeed(self, payload: Payload) -> bool {
        self.report(Ok(payload))
    }

    pub fn fail(self, reason: impl Into<String>) -> bool {
        self.report(Err(reason.into()))
    }

    fn send(&mut self, outcome: Outcome) -> bool {
        let Some(tx) = self.tx.take() else { return false };
        trace!(subsystem = %self.id, ok = outcome.is_ok(), "Reporting completion");
        tx.send(Completion { id: self.id.clone(), outcome }).is_ok()
    }
}

impl Drop for TaskReporter {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(subsystem = %self.id, "Launcher ended without reporting an outcome");
            self.send(Err("launcher ended without reporting an outcome".to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_emits_exactly_once() {
        let (tx, mut rx) = completion_channel();
        let reporter = TaskReporter::new(SubsystemId::MODE, tx);

        assert!(reporter.succeed(Payload::Mode(AppMode::Local)));

        let completion = rx.try_recv().expect("one completion");
        assert_eq!(completion.id, SubsystemId::MODE);
        assert_eq!(completion.outcome, Ok(Payload::Mode(AppMode::Local)));
        assert!(rx.try_recv().is_err(), "no second emission");
    }

    #[test]
    fn dropped_reporter_reports_failure() {
        let (tx, mut rx) = completion_channel();
        drop(TaskReporter::new(SubsystemId::QUOTA, tx));

        let completion = rx.try_recv().expect("synthesized failure");
        assert_eq!(completion.id, SubsystemId::QUOTA);
        assert!(completion.outcome.is_err());
    }

    #[test]
    fn report_after_coordinator_is_gone() {
        let (tx, rx) = completion_channel();
        drop(rx);
        assert!(!TaskReporter::new(SubsystemId::LOGGING, tx).fail("late"));
    }
}

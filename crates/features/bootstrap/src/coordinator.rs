use crate::channel::{
    Completion, CompletionReceiver, CompletionSender, Payload, TaskReporter, completion_channel,
};
use crate::events::{BootstrapEvent, Phase};
use crate::launcher::{LaunchContext, Launcher, Stage};
use fxhash::FxHashMap;
use portal_domain::settings::CanonicalSettings;
use portal_domain::subsystem::{AppMode, FlagState, SubsystemFlag, SubsystemId};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, trace, warn};

/// Reason given to dependents when the base settings fail.
pub(crate) const SETTINGS_UNAVAILABLE: &str = "base settings unavailable";

/// Failure recorded when the settings subsystem succeeds without a document.
pub(crate) const SETTINGS_WITHOUT_DOCUMENT: &str = "settings subsystem delivered no document";

/// Side effects of one accepted completion, in the order they must be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Degraded { id: SubsystemId, reason: String, required: bool },
    SettingsChanged,
    ModeResolved,
    LaunchDependents,
    Ready,
}

/// Everything the coordinator knows about a session.
#[derive(Debug, Default)]
pub(crate) struct CoordinatorState {
    flags: FxHashMap<SubsystemId, SubsystemFlag>,
    dependents: Vec<SubsystemId>,
    ready_fired: bool,
    settings: Option<Arc<CanonicalSettings>>,
    mode: Option<AppMode>,
    stalled_reported: bool,
}

impl CoordinatorState {
    pub(crate) fn new(
        flags: impl IntoIterator<Item = SubsystemFlag>,
        dependents: Vec<SubsystemId>,
    ) -> Self {
        Self {
            flags: flags.into_iter().map(|f| (f.id.clone(), f)).collect(),
            dependents,
            ..Self::default()
        }
    }

    /// Applies one completion. Only the first terminal signal per id counts.
    pub(crate) fn apply(&mut self, completion: Completion) -> Vec<Effect> {
        let Completion { id, outcome } = completion;
        let mut effects = Vec::new();

        let Some(flag) = self.flags.get_mut(&id) else {
            warn!(subsystem = %id, "Completion for an unregistered subsystem ignored");
            return effects;
        };
        if flag.state.is_terminal() {
            warn!(
                subsystem = %id,
                state = ?flag.state,
                "Anomalous duplicate signal ignored"
            );
            return effects;
        }

        let outcome = match outcome {
            Ok(payload) if id == SubsystemId::SETTINGS && !matches!(payload, Payload::Settings(_)) => {
                Err(SETTINGS_WITHOUT_DOCUMENT.to_owned())
            },
            other => other,
        };

        match outcome {
            Ok(payload) => {
                flag.state = FlagState::Succeeded;
                trace!(subsystem = %id, "Subsystem succeeded");
                self.accept(&id, payload, &mut effects);
            },
            Err(reason) => {
                flag.state = FlagState::Failed(reason.clone());
                effects.push(Effect::Degraded { id: id.clone(), reason, required: flag.required });
                if id == SubsystemId::SETTINGS {
                    self.fail_dependents(&mut effects);
                }
            },
        }

        if self.check_ready() {
            effects.push(Effect::Ready);
        }
        effects
    }

    fn accept(&mut self, id: &SubsystemId, payload: Payload, effects: &mut Vec<Effect>) {
        match payload {
            Payload::None => {},
            Payload::Settings(_) if *id != SubsystemId::SETTINGS => {
                warn!(subsystem = %id, "Settings document from a non-settings subsystem dropped");
            },
            Payload::Settings(settings) => {
                self.settings = Some(Arc::new(settings));
                effects.push(Effect::SettingsChanged);
                effects.push(Effect::LaunchDependents);
            },
            Payload::Batch(batch) => {
                let Some(current) = &self.settings else {
                    warn!(subsystem = %id, batch = batch.label(), "Batch before base settings dropped");
                    return;
                };
                let merged = portal_settings::merge(current, &batch);
                debug!(subsystem = %id, batch = batch.label(), entries = batch.len(), "Batch merged");
                self.settings = Some(Arc::new(merged));
                effects.push(Effect::SettingsChanged);
            },
            Payload::Mode(mode) => {
                self.mode = Some(mode);
                effects.push(Effect::ModeResolved);
            },
        }
    }

    fn fail_dependents(&mut self, effects: &mut Vec<Effect>) {
        for id in &self.dependents {
            let Some(flag) = self.flags.get_mut(id) else { continue };
            if flag.state.is_terminal() {
                continue;
            }
            flag.state = FlagState::Failed(SETTINGS_UNAVAILABLE.to_owned());
            effects.push(Effect::Degraded {
                id: id.clone(),
                reason: SETTINGS_UNAVAILABLE.to_owned(),
                required: flag.required,
            });
        }
    }

    /// Fires at most once: the first time every required flag has succeeded.
    pub(crate) fn check_ready(&mut self) -> bool {
        if self.ready_fired {
            return false;
        }
        let ready = self.flags.values().filter(|f| f.required).all(|f| f.state.is_succeeded());
        self.ready_fired = ready;
        ready
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.flags.values().all(|f| f.state.is_terminal())
    }

    /// Required subsystems still pending, sorted by id.
    pub(crate) fn pending_required(&self) -> Vec<SubsystemId> {
        let mut pending: Vec<SubsystemId> = self
            .flags
            .values()
            .filter(|f| f.required && !f.state.is_terminal())
            .map(|f| f.id.clone())
            .collect();
        pending.sort();
        pending
    }

    /// All flags, sorted by id.
    pub(crate) fn flags(&self) -> Vec<SubsystemFlag> {
        let mut flags: Vec<SubsystemFlag> = self.flags.values().cloned().collect();
        flags.sort_by(|a, b| a.id.cmp(&b.id));
        flags
    }

    pub(crate) const fn ready_fired(&self) -> bool {
        self.ready_fired
    }

    pub(crate) fn settings(&self) -> Option<Arc<CanonicalSettings>> {
        self.settings.clone()
    }

    pub(crate) const fn mode(&self) -> Option<AppMode> {
        self.mode
    }
}

/// Write ends of everything observers can see.
#[derive(Debug)]
pub(crate) struct Publishers {
    pub(crate) phase: watch::Sender<Phase>,
    pub(crate) settings: watch::Sender<Option<Arc<CanonicalSettings>>>,
    pub(crate) flags: watch::Sender<Vec<SubsystemFlag>>,
    pub(crate) mode: watch::Sender<Option<AppMode>>,
    pub(crate) events: broadcast::Sender<BootstrapEvent>,
}

/// The actor owning a session's [`CoordinatorState`].
///
/// Launchers report through [`TaskReporter`]s into a single inbox; the actor
/// applies completions one at a time, so no lock guards the state.
#[derive(Debug)]
pub(crate) struct Coordinator {
    state: CoordinatorState,
    launchers: Vec<Arc<dyn Launcher>>,
    tx: Option<CompletionSender>,
    rx: CompletionReceiver,
    publishers: Publishers,
    readiness_timeout: Option<Duration>,
}

impl Coordinator {
    pub(crate) fn new(
        launchers: Vec<(Arc<dyn Launcher>, bool)>,
        publishers: Publishers,
        readiness_timeout: Option<Duration>,
    ) -> Self {
        let flags = launchers.iter().map(|(l, required)| SubsystemFlag::pending(l.id(), *required));
        let dependents = launchers
            .iter()
            .filter(|(l, _)| l.stage() == Stage::AfterSettings)
            .map(|(l, _)| l.id())
            .collect();
        let state = CoordinatorState::new(flags, dependents);
        let (tx, rx) = completion_channel();
        Self {
            state,
            launchers: launchers.into_iter().map(|(l, _)| l).collect(),
            tx: Some(tx),
            rx,
            publishers,
            readiness_timeout,
        }
    }

    /// Launches the immediate stage and spawns the actor loop.
    pub(crate) fn start(mut self, runtime: &RuntimeHandle) {
        self.publishers.phase.send_replace(Phase::Running);
        self.publish_flags();
        info!(subsystems = self.launchers.len(), "Bootstrap started");

        self.launch_stage(runtime, Stage::Immediate, &LaunchContext::immediate());
        if !self.launchers.iter().any(|l| l.stage() == Stage::AfterSettings) {
            self.tx = None;
        }
        if self.state.check_ready() {
            self.apply_effect(runtime, Effect::Ready);
        }

        let handle = runtime.clone();
        runtime.spawn(async move { self.run(&handle).await });
    }

    async fn run(mut self, runtime: &RuntimeHandle) {
        let deadline = self.readiness_timeout.map(|timeout| Instant::now() + timeout);

        while !self.state.is_settled() {
            let stall_at =
                deadline.filter(|_| !self.state.stalled_reported && !self.state.ready_fired());
            tokio::select! {
                completion = self.rx.recv() => match completion {
                    Some(completion) => self.handle(runtime, completion),
                    None => {
                        debug!("All reporters gone");
                        break;
                    },
                },
                () = sleep_until_opt(stall_at) => self.report_stall(),
            }
        }

        info!(ready = self.state.ready_fired(), "Bootstrap coordinator finished");
    }

    fn handle(&mut self, runtime: &RuntimeHandle, completion: Completion) {
        let effects = self.state.apply(completion);
        self.publish_flags();
        for effect in effects {
            self.apply_effect(runtime, effect);
        }
    }

    fn apply_effect(&mut self, runtime: &RuntimeHandle, effect: Effect) {
        match effect {
            Effect::Degraded { id, reason, required } => {
                if required {
                    error!(subsystem = %id, reason = %reason, "Required subsystem failed");
                } else {
                    warn!(subsystem = %id, reason = %reason, "Optional subsystem failed");
                }
                if id == SubsystemId::SETTINGS {
                    self.tx = None;
                }
                let _ = self.publishers.events.send(BootstrapEvent::Degraded { id, reason, required });
            },
            Effect::SettingsChanged => {
                self.publishers.settings.send_replace(self.state.settings());
            },
            Effect::ModeResolved => {
                self.publishers.mode.send_replace(self.state.mode());
            },
            Effect::LaunchDependents => {
                if let Some(settings) = self.state.settings() {
                    self.launch_stage(runtime, Stage::AfterSettings, &LaunchContext::with_settings(settings));
                }
                self.tx = None;
            },
            Effect::Ready => {
                info!("Application ready");
                self.publishers.phase.send_replace(Phase::Ready);
                let _ = self.publishers.events.send(BootstrapEvent::Ready);
            },
        }
    }

    fn launch_stage(&self, runtime: &RuntimeHandle, stage: Stage, ctx: &LaunchContext) {
        let Some(tx) = &self.tx else { return };
        for launcher in self.launchers.iter().filter(|l| l.stage() == stage) {
            let reporter = TaskReporter::new(launcher.id(), tx.clone());
            let work = launcher.launch(ctx.clone());
            debug!(subsystem = %reporter.id(), stage = ?stage, "Launching subsystem");
            runtime.spawn(async move {
                let outcome = work.await;
                reporter.report(outcome);
            });
        }
    }

    fn report_stall(&mut self) {
        self.state.stalled_reported = true;
        let pending = self.state.pending_required();
        warn!(pending = ?pending, "Readiness timeout elapsed with required subsystems pending");
        let _ = self.publishers.events.send(BootstrapEvent::Stalled { pending });
    }

    /// Republishes the flags, notifying watchers only when a state changed.
    pub(crate) fn publish_flags(&self) {
        let flags = self.state.flags();
        self.publishers.flags.send_if_modified(|current| {
            if *current == flags {
                return false;
            }
            *current = flags;
            true
        });
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

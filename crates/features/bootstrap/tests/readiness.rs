use portal_bootstrap::{
    Bootstrap, BootstrapError, BootstrapEvent, LaunchContext, LaunchFuture, Launcher, Payload,
    Phase, Stage,
};
use portal_domain::batch::{ExternalBatch, QuotaInfo};
use portal_domain::settings::{CanonicalSettings, ServiceDescriptor, ServiceKind};
use portal_domain::subsystem::{AppMode, FlagState, SubsystemId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

#[derive(Debug, Clone)]
enum Script {
    Succeed(Payload),
    Fail(&'static str),
    NeedsSettings,
    Delayed(Duration, Payload),
    Hang,
}

#[derive(Debug)]
struct Fake {
    id: SubsystemId,
    required: bool,
    stage: Stage,
    script: Script,
    launches: Arc<AtomicUsize>,
}

impl Launcher for Fake {
    fn id(&self) -> SubsystemId {
        self.id.clone()
    }

    fn required(&self) -> bool {
        self.required
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn launch(&self, ctx: LaunchContext) -> LaunchFuture {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let script = self.script.clone();
        Box::pin(async move {
            match script {
                Script::Succeed(payload) => Ok(payload),
                Script::Fail(reason) => Err(reason.to_owned()),
                Script::NeedsSettings => ctx.require_settings().map(|_| Payload::None),
                Script::Delayed(delay, payload) => {
                    tokio::time::sleep(delay).await;
                    Ok(payload)
                },
                Script::Hang => std::future::pending().await,
            }
        })
    }
}

fn fake(id: SubsystemId, required: bool, stage: Stage, script: Script) -> (Arc<dyn Launcher>, Arc<AtomicUsize>) {
    let launches = Arc::new(AtomicUsize::new(0));
    let launcher = Fake { id, required, stage, script, launches: Arc::clone(&launches) };
    (Arc::new(launcher), launches)
}

fn base_settings() -> CanonicalSettings {
    let mut settings = CanonicalSettings::default();
    let service = ServiceDescriptor {
        provider: "X".to_owned(),
        kind: ServiceKind::Asr,
        ..ServiceDescriptor::default()
    };
    settings.services.insert(service.provider.clone(), service);
    settings
}

fn settings_ok() -> (Arc<dyn Launcher>, Arc<AtomicUsize>) {
    fake(SubsystemId::SETTINGS, true, Stage::Immediate, Script::Succeed(Payload::Settings(base_settings())))
}

fn mode_ok() -> (Arc<dyn Launcher>, Arc<AtomicUsize>) {
    fake(SubsystemId::MODE, true, Stage::Immediate, Script::Succeed(Payload::Mode(AppMode::Local)))
}

fn quota(script: Script) -> (Arc<dyn Launcher>, Arc<AtomicUsize>) {
    fake(SubsystemId::QUOTA, false, Stage::AfterSettings, script)
}

async fn settled(bootstrap: &Bootstrap) {
    timeout(Duration::from_secs(5), async {
        while !bootstrap.flags_snapshot().iter().all(|f| f.state.is_terminal()) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("session settles");
}

fn drain(rx: &mut broadcast::Receiver<BootstrapEvent>) -> Vec<BootstrapEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn ready_fires_once_when_required_subsystems_succeed() {
    let bootstrap = Bootstrap::builder()
        .launcher(settings_ok().0)
        .launcher(mode_ok().0)
        .launcher(fake(SubsystemId::ASR_LANGUAGES, true, Stage::AfterSettings, Script::NeedsSettings).0)
        .launcher(quota(Script::Succeed(Payload::None)).0)
        .build()
        .expect("valid session");
    let mut events = bootstrap.subscribe();

    assert_eq!(bootstrap.phase(), Phase::Idle);
    assert!(bootstrap.start().expect("runtime present"));
    assert_eq!(bootstrap.phase(), Phase::Running);

    assert!(bootstrap.wait_ready().await);
    settled(&bootstrap).await;

    let ready = drain(&mut events).into_iter().filter(|e| *e == BootstrapEvent::Ready).count();
    assert_eq!(ready, 1);
    assert_eq!(bootstrap.mode(), Some(AppMode::Local));
    assert!(bootstrap.flags_snapshot().iter().all(|f| f.state == FlagState::Succeeded));
}

#[tokio::test]
async fn optional_failure_degrades_without_blocking() {
    let bootstrap = Bootstrap::builder()
        .launchers([settings_ok().0, mode_ok().0, quota(Script::Fail("quota endpoint down")).0])
        .build()
        .expect("valid session");
    let mut events = bootstrap.subscribe();
    bootstrap.start().expect("runtime present");

    assert!(bootstrap.wait_ready().await);
    settled(&bootstrap).await;

    let events = drain(&mut events);
    assert!(events.contains(&BootstrapEvent::Degraded {
        id: SubsystemId::QUOTA,
        reason: "quota endpoint down".to_owned(),
        required: false,
    }));
    let quota = bootstrap
        .flags_snapshot()
        .into_iter()
        .find(|f| f.id == SubsystemId::QUOTA)
        .expect("quota flag");
    assert!(quota.is_degraded());
}

#[tokio::test]
async fn required_failure_keeps_the_session_running() {
    let bootstrap = Bootstrap::builder()
        .launchers([
            settings_ok().0,
            fake(SubsystemId::MODE, true, Stage::Immediate, Script::Fail("unknown mode")).0,
        ])
        .build()
        .expect("valid session");
    let mut events = bootstrap.subscribe();
    bootstrap.start().expect("runtime present");

    assert!(!bootstrap.wait_ready().await, "settled without readiness");
    assert_eq!(bootstrap.phase(), Phase::Running);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        BootstrapEvent::Degraded { id, required: true, .. } if *id == SubsystemId::MODE
    )));
}

#[tokio::test]
async fn settings_failure_fails_dependents_without_launching_them() {
    let (languages, launches) =
        fake(SubsystemId::ASR_LANGUAGES, true, Stage::AfterSettings, Script::NeedsSettings);
    let bootstrap = Bootstrap::builder()
        .launchers([
            fake(SubsystemId::SETTINGS, true, Stage::Immediate, Script::Fail("404")).0,
            languages,
        ])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    assert!(!bootstrap.wait_ready().await);
    assert_eq!(launches.load(Ordering::SeqCst), 0);
    let flags = bootstrap.flags_snapshot();
    assert_eq!(flags[0].id, SubsystemId::ASR_LANGUAGES);
    assert_eq!(flags[0].state, FlagState::Failed("base settings unavailable".to_owned()));
    assert_eq!(flags[1].state, FlagState::Failed("404".to_owned()));
    assert!(bootstrap.current_settings().is_none());
}

#[tokio::test]
async fn batches_are_merged_into_published_settings() {
    let batch = ExternalBatch::Quota(vec![QuotaInfo {
        provider: "X".to_owned(),
        monthly_quota: Some(500),
        used_quota: Some(125),
    }]);
    let bootstrap = Bootstrap::builder()
        .launchers([settings_ok().0, quota(Script::Succeed(Payload::Batch(batch))).0])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");
    settled(&bootstrap).await;

    let settings = bootstrap.current_settings().expect("settings published");
    let x = settings.service("X").expect("provider kept");
    assert_eq!(x.quota_per_month, Some(500));
    assert_eq!(x.used_quota, Some(125));
}

#[tokio::test]
async fn second_start_is_a_no_op() {
    let (settings, launches) = settings_ok();
    let bootstrap = Bootstrap::builder().launcher(settings).build().expect("valid session");

    assert!(bootstrap.start().expect("runtime present"));
    assert!(!bootstrap.clone().start().expect("runtime present"));
    settled(&bootstrap).await;
    assert_eq!(launches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn on_ready_runs_inline_once_ready_and_later_otherwise() {
    let bootstrap = Bootstrap::builder().launcher(mode_ok().0).build().expect("valid session");

    let early = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&early);
    bootstrap.on_ready(move || flag.store(true, Ordering::SeqCst)).expect("runtime present");
    assert!(!early.load(Ordering::SeqCst));

    bootstrap.start().expect("runtime present");
    assert!(bootstrap.wait_ready().await);
    timeout(Duration::from_secs(1), async {
        while !early.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("callback registered before start runs");

    let late = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&late);
    bootstrap.on_ready(move || flag.store(true, Ordering::SeqCst)).expect("runtime present");
    assert!(late.load(Ordering::SeqCst), "already ready: runs inline");
}

#[tokio::test(start_paused = true)]
async fn stalled_is_reported_once_and_never_forces_ready() {
    let bootstrap = Bootstrap::builder()
        .launchers([mode_ok().0, fake(SubsystemId::LOGGING, true, Stage::Immediate, Script::Hang).0])
        .readiness_timeout(Duration::from_secs(5))
        .build()
        .expect("valid session");
    let mut events = bootstrap.subscribe();
    bootstrap.start().expect("runtime present");

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(drain(&mut events), vec![BootstrapEvent::Stalled { pending: vec![SubsystemId::LOGGING] }]);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(drain(&mut events).is_empty());
    assert_eq!(bootstrap.phase(), Phase::Running);
}

#[tokio::test(start_paused = true)]
async fn without_timeout_a_hanging_subsystem_blocks_forever() {
    let bootstrap = Bootstrap::builder()
        .launcher(fake(SubsystemId::SETTINGS, true, Stage::Immediate, Script::Hang).0)
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    assert!(timeout(Duration::from_secs(86_400), bootstrap.wait_ready()).await.is_err());
    assert_eq!(bootstrap.phase(), Phase::Running);
}

#[tokio::test]
async fn optional_override_replaces_launcher_defaults() {
    let bootstrap = Bootstrap::builder()
        .launchers([
            mode_ok().0,
            fake(SubsystemId::LOGGING, true, Stage::Immediate, Script::Fail("read-only disk")).0,
        ])
        .optional(["logging"])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    assert!(bootstrap.wait_ready().await);
}

#[test]
fn builder_rejects_inconsistent_registrations() {
    let duplicate = Bootstrap::builder().launchers([mode_ok().0, mode_ok().0]).build();
    assert!(matches!(duplicate, Err(BootstrapError::DuplicateSubsystem { id }) if id == SubsystemId::MODE));

    let unknown = Bootstrap::builder().launcher(mode_ok().0).optional(["plugins"]).build();
    assert!(matches!(unknown, Err(BootstrapError::UnknownSubsystem { .. })));

    let orphan = Bootstrap::builder().launcher(quota(Script::NeedsSettings).0).build();
    assert!(matches!(orphan, Err(BootstrapError::MissingSettings { .. })));

    let late_settings = Bootstrap::builder()
        .launcher(fake(SubsystemId::SETTINGS, true, Stage::AfterSettings, Script::NeedsSettings).0)
        .build();
    assert!(matches!(late_settings, Err(BootstrapError::InvalidStage { id, .. }) if id == SubsystemId::SETTINGS));
}

#[test]
fn start_needs_a_runtime() {
    let bootstrap = Bootstrap::builder().launcher(mode_ok().0).build().expect("valid session");
    assert!(matches!(bootstrap.start(), Err(BootstrapError::NoRuntime { .. })));
    assert_eq!(bootstrap.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn flags_follow_silent_successes_after_ready() {
    let bootstrap = Bootstrap::builder()
        .launchers([
            mode_ok().0,
            fake(
                SubsystemId::COMPATIBILITY,
                false,
                Stage::Immediate,
                Script::Delayed(Duration::from_millis(100), Payload::None),
            )
            .0,
        ])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    assert!(bootstrap.wait_ready().await);
    tokio::time::sleep(Duration::from_millis(500)).await;

    let flags = bootstrap.flags_snapshot();
    assert_eq!(flags[0].id, SubsystemId::COMPATIBILITY);
    assert_eq!(flags[0].state, FlagState::Succeeded);
    assert_eq!(flags[1].state, FlagState::Succeeded);
}

#[tokio::test]
async fn settings_success_without_a_document_fails_dependents() {
    let (languages, launches) =
        fake(SubsystemId::ASR_LANGUAGES, true, Stage::AfterSettings, Script::NeedsSettings);
    let bootstrap = Bootstrap::builder()
        .launchers([fake(SubsystemId::SETTINGS, true, Stage::Immediate, Script::Succeed(Payload::None)).0, languages])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    let ready = timeout(Duration::from_secs(5), bootstrap.wait_ready()).await;
    assert_eq!(ready, Ok(false));
    settled(&bootstrap).await;
    assert_eq!(launches.load(Ordering::SeqCst), 0);

    let flags = bootstrap.flags_snapshot();
    assert_eq!(flags[0].state, FlagState::Failed("base settings unavailable".to_owned()));
    assert_eq!(flags[1].state, FlagState::Failed("settings subsystem delivered no document".to_owned()));
}

#[tokio::test]
async fn only_the_settings_subsystem_publishes_the_document() {
    let mut bogus = base_settings();
    bogus.version = "bogus".to_owned();
    let bootstrap = Bootstrap::builder()
        .launchers([
            fake(SubsystemId::MODE, true, Stage::Immediate, Script::Succeed(Payload::Settings(bogus))).0,
            settings_ok().0,
        ])
        .build()
        .expect("valid session");
    bootstrap.start().expect("runtime present");

    assert!(bootstrap.wait_ready().await);
    settled(&bootstrap).await;
    let settings = bootstrap.current_settings().expect("settings published");
    assert_ne!(settings.version, "bogus");
}

use portal::bootstrap::BootstrapEvent;
use portal::domain::config::{ClientRule, PortalConfig};
use portal::domain::subsystem::SubsystemId;
use portal::fetcher::{FetchError, Transport};
use portal::{Session, start_with};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Every request fails, as if the machine were offline.
struct Offline;

impl Transport for Offline {
    async fn get(&self, _url: &str) -> Result<String, FetchError> {
        Err(FetchError::transport("offline"))
    }
}

fn unsupported_client() -> PortalConfig {
    let mut config = PortalConfig::default();
    config.settings.source = "https://services.example.org/settings.json".to_owned();
    config.compatibility.allowed_clients = vec![ClientRule { name: "other-shell".to_owned(), min_version: 0 }];
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_of_immediate_subsystems_reach_the_session_stream() {
    for _ in 0..50 {
        let Session { bootstrap, mut events } =
            start_with(&unsupported_client(), Arc::new(Offline)).expect("session starts");

        let degraded = timeout(Duration::from_secs(5), async {
            loop {
                match events.recv().await {
                    Ok(BootstrapEvent::Degraded { id, required, .. }) if id == SubsystemId::COMPATIBILITY => {
                        break required;
                    },
                    Ok(_) => {},
                    Err(e) => panic!("event stream ended early: {e}"),
                }
            }
        })
        .await
        .expect("compatibility failure is observed");

        assert!(!degraded, "compatibility is optional");
        assert!(!bootstrap.is_ready());
    }
}

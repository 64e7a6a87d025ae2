use portal_domain::batch::ExternalBatch;
use portal_domain::settings::{LanguageFeed, ServiceDescriptor};
use portal_fetcher::feeds::{fetch_base_settings, fetch_capabilities, fetch_languages, fetch_quota};
use portal_fetcher::{FetchError, RetryPolicy, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Serves scripted bodies per URL and records every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn script(self, url: &str, responses: Vec<Result<&str, FetchError>>) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_owned(),
            responses.into_iter().map(|r| r.map(str::to_owned)).collect(),
        );
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_owned());
        self.responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(FetchError::transport("404")))
    }
}

#[tokio::test]
async fn base_settings_recover_from_a_garbled_first_response() {
    let transport = ScriptedTransport::default().script(
        "settings.json",
        vec![Ok("<html>proxy error</html>"), Ok(r#"{"services":[{"provider":"X"}]}"#)],
    );

    let settings = fetch_base_settings(&transport, RetryPolicy::STANDARD, "settings.json")
        .await
        .expect("second attempt parses");

    assert!(settings.service("X").is_some());
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn quota_uses_external_name_in_url_and_provider_as_key() {
    let transport = ScriptedTransport::default().script(
        "https://quota.example.org/?type=callXASR",
        vec![Ok(r#"{"monthlyQuota":1000,"usedQuota":250}"#)],
    );
    let descriptor = ServiceDescriptor {
        provider: "X".to_owned(),
        external_name: Some("callXASR".to_owned()),
        ..ServiceDescriptor::default()
    };

    let info = fetch_quota(
        &transport,
        RetryPolicy::STANDARD,
        Some("https://quota.example.org/?type={provider}"),
        &descriptor,
    )
    .await
    .expect("quota");

    assert_eq!(info.provider, "X");
    assert_eq!(info.monthly_quota, Some(1000));
    assert_eq!(info.used_quota, Some(250));
}

#[tokio::test]
async fn maus_languages_give_up_after_two_attempts() {
    let transport = ScriptedTransport::default().script(
        "maus.xml",
        vec![
            Err(FetchError::transport("reset")),
            Err(FetchError::transport("reset")),
            Ok("<ParameterValues/>"),
        ],
    );

    let result =
        fetch_languages(&transport, RetryPolicy::MAUS, LanguageFeed::Maus, Some("maus.xml")).await;

    assert!(matches!(result, Err(FetchError::Transport { .. })));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn asr_languages_are_tagged_with_their_feed() {
    let transport = ScriptedTransport::default().script(
        "asr.xml",
        vec![Ok("<ParameterValues><ParameterValue><Value>eng-GB</Value>\
                 <Description>English (GB)</Description></ParameterValue></ParameterValues>")],
    );

    let batch = fetch_languages(&transport, RetryPolicy::STANDARD, LanguageFeed::Asr, Some("asr.xml"))
        .await
        .expect("languages");

    let ExternalBatch::Languages { feed, entries } = batch else { panic!("unexpected batch") };
    assert_eq!(feed, LanguageFeed::Asr);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, "eng-GB");
}

#[tokio::test]
async fn missing_urls_short_circuit_without_requests() {
    let transport = ScriptedTransport::default();

    let capabilities = fetch_capabilities(&transport, RetryPolicy::STANDARD, None).await;
    let languages = fetch_languages(&transport, RetryPolicy::STANDARD, LanguageFeed::Asr, None).await;

    assert!(capabilities.is_err_and(|e| e.is_config_missing()));
    assert!(languages.is_err_and(|e| e.is_config_missing()));
    assert!(transport.requests().is_empty());
}

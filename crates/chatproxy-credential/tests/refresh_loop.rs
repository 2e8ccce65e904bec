use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatproxy_credential::{
    AuthError, CredentialRefresher, CredentialState, CredentialStore, PuidSource, REFRESH_INTERVAL,
    RefreshStatus, TokenSource,
};

struct ScriptedTokens {
    calls: AtomicUsize,
    results: Mutex<VecDeque<Result<String, AuthError>>>,
}

impl ScriptedTokens {
    fn new(results: Vec<Result<String, AuthError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            results: Mutex::new(results.into()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for ScriptedTokens {
    fn label(&self) -> &'static str {
        "scripted"
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AuthError::MissingAccessToken))
    }
}

struct ScriptedPuid(Mutex<VecDeque<String>>);

#[async_trait]
impl PuidSource for ScriptedPuid {
    async fn puid(&self, _access_token: &str) -> String {
        self.0.lock().unwrap().pop_front().unwrap_or_default()
    }
}

fn store() -> Arc<CredentialStore> {
    Arc::new(CredentialStore::new(CredentialState {
        access_token: "stale".to_string(),
        puid: "old-puid".to_string(),
        device_id: "device".to_string(),
    }))
}

fn puids(values: &[&str]) -> Arc<ScriptedPuid> {
    Arc::new(ScriptedPuid(Mutex::new(
        values.iter().map(|v| v.to_string()).collect(),
    )))
}

#[tokio::test(start_paused = true)]
async fn failed_first_attempt_stops_the_loop_for_good() {
    let store = store();
    let tokens = ScriptedTokens::new(vec![Err(AuthError::MissingAccessToken)]);
    let handle = CredentialRefresher::new(store.clone(), tokens.clone(), puids(&[])).spawn();

    let mut status = handle.subscribe();
    status
        .wait_for(|s| matches!(s, RefreshStatus::Terminated { .. }))
        .await
        .unwrap();

    tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(tokens.calls(), 1);
    assert!(handle.is_terminated());

    // The proxy keeps whatever it had.
    let snap = store.snapshot();
    assert_eq!(snap.access_token, "stale");
    assert_eq!(snap.puid, "old-puid");
}

#[tokio::test(start_paused = true)]
async fn empty_token_is_treated_as_failure() {
    let tokens = ScriptedTokens::new(vec![Ok(String::new())]);
    let handle = CredentialRefresher::new(store(), tokens.clone(), puids(&[])).spawn();

    let mut status = handle.subscribe();
    let terminated = status
        .wait_for(|s| matches!(s, RefreshStatus::Terminated { .. }))
        .await
        .unwrap()
        .clone();
    assert_eq!(
        terminated,
        RefreshStatus::Terminated {
            reason: "empty access token".to_string()
        }
    );
    tokio::time::sleep(REFRESH_INTERVAL * 2).await;
    assert_eq!(tokens.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn refreshes_weekly_and_keeps_puid_on_derivation_failure() {
    let store = store();
    let tokens = ScriptedTokens::new(vec![Ok("t1".to_string()), Ok("t2".to_string())]);
    let handle =
        CredentialRefresher::new(store.clone(), tokens.clone(), puids(&["p1", ""])).spawn();
    let mut status = handle.subscribe();

    status
        .wait_for(|s| *s == RefreshStatus::Running { cycles: 1 })
        .await
        .unwrap();
    assert_eq!(store.snapshot().access_token, "t1");
    assert_eq!(store.snapshot().puid, "p1");

    // Just short of a week nothing happens.
    tokio::time::sleep(REFRESH_INTERVAL - Duration::from_secs(60)).await;
    assert_eq!(tokens.calls(), 1);

    status
        .wait_for(|s| *s == RefreshStatus::Running { cycles: 2 })
        .await
        .unwrap();
    assert_eq!(tokens.calls(), 2);
    let snap = store.snapshot();
    assert_eq!(snap.access_token, "t2");
    assert_eq!(snap.puid, "p1");
    assert_eq!(snap.device_id, "device");
}

#[tokio::test(start_paused = true)]
async fn later_failure_terminates_after_successful_cycles() {
    let store = store();
    let tokens = ScriptedTokens::new(vec![Ok("t1".to_string())]);
    let handle = CredentialRefresher::new(store.clone(), tokens.clone(), puids(&["p1"]))
        .with_interval(Duration::from_secs(60))
        .spawn();

    let mut status = handle.subscribe();
    status
        .wait_for(|s| matches!(s, RefreshStatus::Terminated { .. }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(tokens.calls(), 2);
    assert_eq!(store.snapshot().access_token, "t1");
}

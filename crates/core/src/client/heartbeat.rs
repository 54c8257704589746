use crate::config::Settings;
use anyhow::Context;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const PROBE_TIMEOUT_SECS: u64 = 5;

#[async_trait::async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// `GET <base>/`; any 2xx is online, everything else (errors included) is offline.
#[derive(Debug, Clone)]
pub struct HttpLivenessProbe {
    http: reqwest::Client,
    url: String,
}

impl HttpLivenessProbe {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.analysis_api_url,
            Duration::from_secs(PROBE_TIMEOUT_SECS),
        )
    }

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build liveness probe http client")?;

        Ok(Self {
            http,
            url: format!("{}/", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait::async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn is_online(&self) -> bool {
        match self.http.get(&self.url).send().await {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                tracing::debug!(url = %self.url, error = %err, "liveness probe failed");
                false
            }
        }
    }
}

/// Background connectivity poller.
///
/// Probes once immediately, then every `interval`, and publishes the outcome
/// into a watch cell. The first probe always notifies subscribers, even when
/// it confirms the initial offline value; later probes notify on change only.
/// Dropping the handle stops the task.
pub struct Heartbeat {
    status: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl Heartbeat {
    pub fn spawn<P>(probe: P, interval: Duration) -> Self
    where
        P: LivenessProbe + 'static,
    {
        let (tx, status) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut first = true;
            loop {
                ticker.tick().await;
                let online = probe.is_online().await;
                let changed = tx.send_if_modified(|current| {
                    let changed = *current != online;
                    *current = online;
                    changed || std::mem::take(&mut first)
                });
                if changed {
                    tracing::info!(online, "backend connectivity changed");
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        Self { status, task }
    }

    pub fn is_online(&self) -> bool {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.clone()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedProbe {
        answers: Mutex<VecDeque<bool>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProbe {
        fn new(answers: &[bool], calls: Arc<AtomicUsize>) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
                calls,
            }
        }
    }

    #[async_trait::async_trait]
    impl LivenessProbe for ScriptedProbe {
        async fn is_online(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            if answers.len() > 1 {
                answers.pop_front().unwrap_or(false)
            } else {
                answers.front().copied().unwrap_or(false)
            }
        }
    }

    async fn until_changed(rx: &mut watch::Receiver<bool>) -> bool {
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("heartbeat did not publish in time")
            .unwrap();
        *rx.borrow_and_update()
    }

    #[tokio::test]
    async fn http_probe_maps_status_codes() {
        let app = Router::new().route("/", get(|| async { "ok" }));
        let base = spawn_server(app).await;
        let probe = HttpLivenessProbe::new(&base, Duration::from_secs(2)).unwrap();
        assert!(probe.is_online().await);

        let app = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = spawn_server(app).await;
        let probe = HttpLivenessProbe::new(&base, Duration::from_secs(2)).unwrap();
        assert!(!probe.is_online().await);
    }

    #[tokio::test]
    async fn http_probe_is_offline_when_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe =
            HttpLivenessProbe::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        assert!(!probe.is_online().await);
    }

    #[tokio::test]
    async fn publishes_transitions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = ScriptedProbe::new(&[true, true, false], calls.clone());
        let heartbeat = Heartbeat::spawn(probe, Duration::from_millis(10));
        let mut rx = heartbeat.subscribe();

        assert!(until_changed(&mut rx).await);
        assert!(!until_changed(&mut rx).await);
        assert!(!heartbeat.is_online());
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn first_probe_notifies_even_when_offline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = ScriptedProbe::new(&[false], calls.clone());
        let heartbeat = Heartbeat::spawn(probe, Duration::from_secs(60));
        let mut rx = heartbeat.subscribe();

        assert!(!until_changed(&mut rx).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = ScriptedProbe::new(&[true], calls.clone());
        let heartbeat = Heartbeat::spawn(probe, Duration::from_millis(5));
        let mut rx = heartbeat.subscribe();
        assert!(until_changed(&mut rx).await);

        drop(heartbeat);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }
}

//! Backend readiness probing
//!
//! A probe is a GET against the target URL; any successful status means the
//! backend is accepting connections. The retry loop is cooperative: every
//! retry is an awaited sleep on the runtime, never a blocking wait.

use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::config::RetryPolicy;
use crate::error::ShellError;
use crate::session::CancelFlag;
use crate::Result;

pub struct ReadinessProbe {
    client: reqwest::Client,
    url: Url,
}

impl ReadinessProbe {
    pub fn new(url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "probe client lost its timeout, using defaults");
                reqwest::Client::new()
            });

        Self { client, url }
    }

    /// Single readiness check. No payload contract: any 2xx response counts.
    pub async fn check(&self) -> bool {
        match self.client.get(self.url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Poll until the backend responds, honoring the retry policy and the
    /// session's cancellation flag. Returns the number of attempts used.
    pub async fn wait_until_ready(&self, policy: &RetryPolicy, cancel: &CancelFlag) -> Result<u32> {
        poll_until_ready(|| self.check(), policy, cancel).await
    }
}

/// Generic readiness loop. The cancellation flag is checked both before each
/// probe and before acting on its result: a probe scheduled before the
/// session shut down must not open a window afterwards.
pub async fn poll_until_ready<F, Fut>(
    mut probe: F,
    policy: &RetryPolicy,
    cancel: &CancelFlag,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(ShellError::Cancelled);
        }

        attempts += 1;
        let ready = probe().await;

        if cancel.is_cancelled() {
            return Err(ShellError::Cancelled);
        }

        if ready {
            return Ok(attempts);
        }

        tracing::debug!(attempts, "readiness probe failed, retrying");

        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                return Err(ShellError::BackendNeverReady { attempts });
            }
        }

        tokio::time::sleep(policy.delay_for(attempts)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
        }
    }

    /// Serves one plain HTTP 200 per connection until dropped.
    fn serve_ok() -> (Url, std::thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming().take(4) {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                );
            }
        });
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        (url, handle)
    }

    #[tokio::test]
    async fn test_check_against_live_server() {
        let (url, _server) = serve_ok();
        let probe = ReadinessProbe::new(url, Duration::from_secs(5));
        assert!(probe.check().await);
    }

    #[tokio::test]
    async fn test_check_against_closed_port() {
        // Bind to learn a free port, then drop the listener
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let probe = ReadinessProbe::new(url, Duration::from_secs(1));
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn test_ready_after_failures_counts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancelFlag::new();

        let calls_in_probe = Arc::clone(&calls);
        let attempts = poll_until_ready(
            move || {
                let n = calls_in_probe.fetch_add(1, Ordering::SeqCst) + 1;
                async move { n > 3 }
            },
            &fast_policy(None),
            &cancel,
        )
        .await
        .unwrap();

        // Becomes reachable on the fourth probe
        assert_eq!(attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_ceiling() {
        let cancel = CancelFlag::new();
        let err = poll_until_ready(|| async { false }, &fast_policy(Some(5)), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ShellError::BackendNeverReady { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_probe() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancelFlag::new();
        cancel.cancel();

        let calls_in_probe = Arc::clone(&calls);
        let err = poll_until_ready(
            move || {
                calls_in_probe.fetch_add(1, Ordering::SeqCst);
                async { true }
            },
            &fast_policy(None),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ShellError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_in_flight_result_ignored_after_cancel() {
        // The probe succeeds, but the session is torn down while it is in
        // flight; the result must not be acted on.
        let cancel = CancelFlag::new();
        let cancel_in_probe = cancel.clone();

        let err = poll_until_ready(
            move || {
                cancel_in_probe.cancel();
                async { true }
            },
            &fast_policy(None),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ShellError::Cancelled));
    }
}

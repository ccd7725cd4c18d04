use std::time::Duration;

use reqwest::{Method, StatusCode};

use crate::{context::Interruption, executor::is_error_status};

/// How a single attempt ended.
#[derive(Debug)]
pub enum AttemptOutcome<'a> {
    /// A response arrived; any status, including >= 400.
    Response(StatusCode),
    /// No response: connection, DNS, TLS or timeout failure.
    TransportFailed(&'a reqwest::Error),
    /// The call context ended while the request was in flight.
    Interrupted(Interruption),
}

/// Summary passed to [`AttemptObserver::on_attempt_end`].
#[derive(Debug)]
pub struct AttemptReport<'a> {
    pub method: &'a Method,
    pub url: &'a str,
    /// Zero-based attempt index; 0 is the initial try.
    pub attempt: u32,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome<'a>,
}

impl AttemptReport<'_> {
    /// True for transport failures, interruptions and status >= 400.
    pub fn is_failure(&self) -> bool {
        match self.outcome {
            AttemptOutcome::Response(status) => is_error_status(status),
            AttemptOutcome::TransportFailed(_) | AttemptOutcome::Interrupted(_) => true,
        }
    }
}

/// Callback invoked at attempt boundaries.
///
/// Observers never influence control flow.
pub trait AttemptObserver: Send + Sync {
    fn on_attempt_start(&self, _method: &Method, _url: &str, _attempt: u32) {}

    fn on_attempt_end(&self, _report: &AttemptReport<'_>) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl AttemptObserver for NoopObserver {}

/// Logs every attempt with `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_attempt_start(&self, method: &Method, url: &str, attempt: u32) {
        tracing::info!(%method, url, attempt, "outgoing request");
    }

    fn on_attempt_end(&self, report: &AttemptReport<'_>) {
        let elapsed_ms = report.elapsed.as_millis() as u64;
        match &report.outcome {
            AttemptOutcome::Response(status) if report.is_failure() => tracing::warn!(
                method = %report.method,
                url = report.url,
                attempt = report.attempt,
                status = status.as_u16(),
                elapsed_ms,
                "outgoing request failed"
            ),
            AttemptOutcome::Response(status) => tracing::info!(
                method = %report.method,
                url = report.url,
                attempt = report.attempt,
                status = status.as_u16(),
                elapsed_ms,
                "outgoing request completed"
            ),
            AttemptOutcome::TransportFailed(err) => tracing::warn!(
                method = %report.method,
                url = report.url,
                attempt = report.attempt,
                error = %err,
                elapsed_ms,
                "outgoing request failed without response"
            ),
            AttemptOutcome::Interrupted(reason) => tracing::warn!(
                method = %report.method,
                url = report.url,
                attempt = report.attempt,
                reason = ?reason,
                elapsed_ms,
                "outgoing request interrupted"
            ),
        }
    }
}

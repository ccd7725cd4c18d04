use std::{fmt, sync::Arc, time::Duration};

use reqwest::{header::HeaderMap, Method, StatusCode};
use serde::Serialize;
use tokio::time::Instant;

use crate::{
    context::Interruption,
    error::{BodyFailure, TransportFailure},
    observer::{AttemptObserver, AttemptOutcome, AttemptReport},
    request::OutgoingRequest,
    retry::{Attempt, RetryError, RetryPolicy},
    CallContext, ClientError, Result,
};

/// A response that passed status classification (status < 400).
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

/// Why one attempt did not produce a usable response.
#[derive(Debug)]
enum AttemptError {
    Transport(reqwest::Error),
    Status { status: StatusCode, body: String },
    Read(reqwest::Error),
    Interrupted(Interruption),
}

/// Sends requests through the retry loop and classifies their outcome.
#[derive(Clone)]
pub struct Executor {
    http: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
    headers: HeaderMap,
    observer: Arc<dyn AttemptObserver>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(|name| name.as_str()).collect();
        f.debug_struct("Executor")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("default_headers", &header_names)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub(crate) fn new(
        http: reqwest::Client,
        timeout: Duration,
        retry: RetryPolicy,
        headers: HeaderMap,
        observer: Arc<dyn AttemptObserver>,
    ) -> Self {
        Self {
            http,
            timeout,
            retry,
            headers,
            observer,
        }
    }

    pub(crate) fn set_observer(&mut self, observer: Arc<dyn AttemptObserver>) {
        self.observer = observer;
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the request, runs it through the retry loop, and returns the
    /// raw response once a status below 400 is received.
    ///
    /// Transport failures and 5xx responses are retried; 4xx responses,
    /// context interruptions and body read failures on a successful status
    /// are not. An error status whose body cannot be read is classified by
    /// status alone, with an empty body.
    pub async fn send<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let request = OutgoingRequest::build(method, url, body, &self.headers)?;

        let outcome = self
            .retry
            .execute(ctx, |attempt| self.attempt(ctx, &request, attempt))
            .await;

        match outcome {
            Ok((status, body)) => Ok(RawResponse {
                url: request.url,
                status,
                body,
            }),
            Err(RetryError::Interrupted { reason, .. }) => Err(ClientError::Transport {
                url: request.url,
                source: reason.into(),
            }),
            Err(RetryError::Failed(err)) => Err(into_client_error(request.url, err)),
        }
    }

    async fn attempt(
        &self,
        ctx: &CallContext,
        request: &OutgoingRequest,
        attempt: u32,
    ) -> std::result::Result<(StatusCode, String), Attempt<AttemptError>> {
        if let Some(reason) = ctx.interruption() {
            return Err(Attempt::Permanent(AttemptError::Interrupted(reason)));
        }

        self.observer
            .on_attempt_start(&request.method, &request.url, attempt);
        let started = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let sent = tokio::select! {
            sent = builder.send() => sent,
            reason = ctx.done() => {
                self.report(request, attempt, started, AttemptOutcome::Interrupted(reason));
                return Err(Attempt::Permanent(AttemptError::Interrupted(reason)));
            }
        };

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                self.report(request, attempt, started, AttemptOutcome::TransportFailed(&err));
                return Err(Attempt::Retryable(AttemptError::Transport(err)));
            }
        };

        let status = response.status();
        let read = tokio::select! {
            read = response.text() => read,
            reason = ctx.done() => {
                self.report(request, attempt, started, AttemptOutcome::Interrupted(reason));
                return Err(Attempt::Permanent(AttemptError::Interrupted(reason)));
            }
        };
        self.report(request, attempt, started, AttemptOutcome::Response(status));

        match read {
            Ok(body) => classify(status, body),
            // An error status decides the attempt even when its body is lost.
            Err(err) if is_error_status(status) => {
                tracing::debug!(
                    status = status.as_u16(),
                    error = %err,
                    "discarding unreadable error body"
                );
                classify(status, String::new())
            }
            Err(err) => Err(Attempt::Permanent(AttemptError::Read(err))),
        }
    }

    fn report(
        &self,
        request: &OutgoingRequest,
        attempt: u32,
        started: Instant,
        outcome: AttemptOutcome<'_>,
    ) {
        self.observer.on_attempt_end(&AttemptReport {
            method: &request.method,
            url: &request.url,
            attempt,
            elapsed: started.elapsed(),
            outcome,
        });
    }
}

fn classify(
    status: StatusCode,
    body: String,
) -> std::result::Result<(StatusCode, String), Attempt<AttemptError>> {
    if status.as_u16() >= 500 {
        Err(Attempt::Retryable(AttemptError::Status { status, body }))
    } else if is_error_status(status) {
        Err(Attempt::Permanent(AttemptError::Status { status, body }))
    } else {
        Ok((status, body))
    }
}

pub(crate) fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

fn into_client_error(url: String, err: AttemptError) -> ClientError {
    match err {
        AttemptError::Transport(err) => ClientError::Transport {
            url,
            source: TransportFailure::Request(err),
        },
        AttemptError::Status { status, body } => ClientError::Http { url, status, body },
        AttemptError::Read(err) => ClientError::Body {
            url,
            source: BodyFailure::Read(err),
        },
        AttemptError::Interrupted(reason) => ClientError::Transport {
            url,
            source: reason.into(),
        },
    }
}

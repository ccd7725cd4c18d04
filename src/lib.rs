//! `resilient-http` is an async JSON HTTP client that decorates every call
//! with a timeout, retries with exponential backoff, and a single error type.
//!
//! The caller-facing operations live on [`HttpClient`]:
//! - [`HttpClient::get`]
//! - [`HttpClient::post`]
//! - [`HttpClient::put`]
//! - [`HttpClient::delete`]
//!
//! Transport failures and `5xx` responses are retried according to
//! [`RetryPolicy`]; `4xx` responses and body errors are surfaced at once.
//! Every call takes a [`CallContext`] that can cancel it or bound it by a
//! deadline, including while it waits between retries.

mod backoff;
mod client;
mod context;
mod decode;
mod error;
mod executor;
mod observer;
mod options;
mod request;
mod retry;

pub use backoff::backoff_delay;
pub use client::HttpClient;
pub use context::{CallContext, CancelHandle, Interruption};
pub use error::{BodyFailure, ClientError, ConfigError, TransportFailure};
pub use executor::{Executor, RawResponse};
pub use observer::{AttemptObserver, AttemptOutcome, AttemptReport, NoopObserver, TracingObserver};
pub use options::ClientOptions;
pub use retry::{Attempt, RetryError, RetryPolicy};
pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, ClientError>;

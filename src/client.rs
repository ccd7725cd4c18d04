use std::{fmt, sync::Arc};

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    decode::decode_json,
    observer::{AttemptObserver, NoopObserver, TracingObserver},
    request::default_header_map,
    retry::RetryPolicy,
    CallContext, ClientOptions, ConfigError, Executor, Result,
};

#[derive(Clone)]
/// JSON HTTP client with timeouts, retries and unified errors.
///
/// Cloning is cheap and clones share the connection pool.
pub struct HttpClient {
    executor: Executor,
    options: Arc<ClientOptions>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .options
            .default_headers
            .keys()
            .map(|name| (name.as_str(), "<redacted>"))
            .collect();
        f.debug_struct("HttpClient")
            .field("timeout", &self.options.timeout)
            .field("retry", self.executor.retry_policy())
            .field("default_headers", &headers)
            .field("logging", &self.options.logging)
            .finish()
    }
}

impl HttpClient {
    /// Creates a client, validating every option.
    ///
    /// Fails with [`ConfigError`] (wrapped in [`crate::ClientError::Config`])
    /// when the timeout, retry settings or default headers are invalid.
    pub fn new(options: ClientOptions) -> Result<Self> {
        if options.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout.into());
        }
        let retry = RetryPolicy::new(options.max_attempts, options.base_delay, options.factor)?;
        let headers = default_header_map(&options.default_headers)?;
        let observer: Arc<dyn AttemptObserver> = if options.logging {
            Arc::new(TracingObserver)
        } else {
            Arc::new(NoopObserver)
        };

        Ok(Self {
            executor: Executor::new(
                reqwest::Client::new(),
                options.timeout,
                retry,
                headers,
                observer,
            ),
            options: Arc::new(options),
        })
    }

    /// Creates a client from `HTTP_CLIENT_*` environment variables.
    ///
    /// See [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }

    /// Replaces the attempt observer, including the logging one.
    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.executor.set_observer(observer);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The underlying executor, for callers that want the raw response.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Sends `GET url` and decodes the JSON response.
    pub async fn get<T>(&self, ctx: &CallContext, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request::<(), T>(ctx, Method::GET, url, None).await
    }

    /// Sends `POST url` with `body` encoded as JSON and decodes the response.
    pub async fn post<B, T>(&self, ctx: &CallContext, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ctx, Method::POST, url, Some(body)).await
    }

    pub async fn put<B, T>(&self, ctx: &CallContext, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ctx, Method::PUT, url, Some(body)).await
    }

    /// Sends `DELETE url`. Use `()` as `T` when the response has no body.
    pub async fn delete<T>(&self, ctx: &CallContext, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request::<(), T>(ctx, Method::DELETE, url, None).await
    }

    /// Sends an arbitrary method with an optional JSON body.
    pub async fn request<B, T>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.executor.send(ctx, method, url, body).await?;
        decode_json(response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::HttpClient;
    use crate::{ClientError, ClientOptions, ConfigError};

    fn config_error(options: ClientOptions) -> ConfigError {
        match HttpClient::new(options) {
            Err(ClientError::Config(err)) => err,
            Err(other) => panic!("expected config error, got {other:?}"),
            Ok(client) => panic!("expected config error, got {client:?}"),
        }
    }

    #[test]
    fn default_options_build_a_client() {
        assert!(HttpClient::new(ClientOptions::default()).is_ok());
    }

    #[test]
    fn each_invalid_field_has_distinct_error() {
        let base = ClientOptions::default();

        let timeout = ClientOptions {
            timeout: Duration::ZERO,
            ..base.clone()
        };
        assert_eq!(config_error(timeout), ConfigError::InvalidTimeout);

        let attempts = ClientOptions {
            max_attempts: 0,
            ..base.clone()
        };
        assert_eq!(config_error(attempts), ConfigError::InvalidMaxAttempts);

        let delay = ClientOptions {
            base_delay: Duration::ZERO,
            ..base.clone()
        };
        assert_eq!(config_error(delay), ConfigError::InvalidBaseDelay);

        let factor = ClientOptions {
            factor: -2.0,
            ..base
        };
        assert_eq!(config_error(factor), ConfigError::InvalidFactor);
    }

    #[test]
    fn timeout_is_validated_first() {
        let options = ClientOptions {
            timeout: Duration::ZERO,
            max_attempts: 0,
            ..ClientOptions::default()
        };
        assert_eq!(config_error(options), ConfigError::InvalidTimeout);
    }

    #[test]
    fn debug_redacts_header_values() {
        let client = HttpClient::new(
            ClientOptions::default().with_header("Authorization", "Bearer secret-token"),
        )
        .expect("valid options");
        let debug = format!("{client:?}");
        assert!(debug.contains("Authorization"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}

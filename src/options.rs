use std::{collections::BTreeMap, str::FromStr, time::Duration};

use crate::ConfigError;

pub const ENV_TIMEOUT_MS: &str = "HTTP_CLIENT_TIMEOUT_MS";
pub const ENV_MAX_ATTEMPTS: &str = "HTTP_CLIENT_MAX_ATTEMPTS";
pub const ENV_BASE_DELAY_MS: &str = "HTTP_CLIENT_BASE_DELAY_MS";
pub const ENV_FACTOR: &str = "HTTP_CLIENT_FACTOR";
pub const ENV_LOGGING: &str = "HTTP_CLIENT_LOGGING";

/// Configures timeout, retry, header and logging behavior.
///
/// Values are validated by [`crate::HttpClient::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout, applied to every attempt.
    pub timeout: Duration,
    /// Maximum number of retries after the initial attempt.
    pub max_attempts: u32,
    /// Base retry backoff (`base * (factor^n - 1)` before retry `n`).
    pub base_delay: Duration,
    /// Backoff growth factor.
    pub factor: f64,
    /// Headers set on every outgoing request.
    pub default_headers: BTreeMap<String, String>,
    /// Logs every attempt through `tracing` when enabled.
    pub logging: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            factor: 2.0,
            default_headers: BTreeMap::new(),
            logging: false,
        }
    }
}

impl ClientOptions {
    /// Reads options from `HTTP_CLIENT_*` environment variables.
    ///
    /// Unset variables keep their default value:
    /// - `HTTP_CLIENT_TIMEOUT_MS`
    /// - `HTTP_CLIENT_MAX_ATTEMPTS`
    /// - `HTTP_CLIENT_BASE_DELAY_MS`
    /// - `HTTP_CLIENT_FACTOR`
    /// - `HTTP_CLIENT_LOGGING` (`true`/`false`/`1`/`0`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_TIMEOUT_MS)? {
            options.timeout = Duration::from_millis(ms);
        }
        if let Some(max_attempts) = parse_var(&lookup, ENV_MAX_ATTEMPTS)? {
            options.max_attempts = max_attempts;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_BASE_DELAY_MS)? {
            options.base_delay = Duration::from_millis(ms);
        }
        if let Some(factor) = parse_var(&lookup, ENV_FACTOR)? {
            options.factor = factor;
        }
        if let Some(raw) = lookup(ENV_LOGGING) {
            options.logging = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" | "" => false,
                _ => return Err(env_error(ENV_LOGGING, raw)),
            };
        }
        Ok(options)
    }

    /// Adds a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| env_error(name, raw)),
    }
}

fn env_error(name: &str, value: String) -> ConfigError {
    ConfigError::Env {
        name: name.to_owned(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{ClientOptions, ENV_FACTOR, ENV_LOGGING, ENV_MAX_ATTEMPTS, ENV_TIMEOUT_MS};
    use crate::ConfigError;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let options = ClientOptions::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(options, ClientOptions::default());
    }

    #[test]
    fn reads_overrides() {
        let options = ClientOptions::from_lookup(lookup(&[
            (ENV_TIMEOUT_MS, "1500"),
            (ENV_MAX_ATTEMPTS, " 5 "),
            (ENV_FACTOR, "1.3"),
            (ENV_LOGGING, "TRUE"),
        ]))
        .expect("overrides must parse");

        assert_eq!(options.timeout, Duration::from_millis(1_500));
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.factor, 1.3);
        assert!(options.logging);
    }

    #[test]
    fn rejects_unparsable_value() {
        let err = ClientOptions::from_lookup(lookup(&[(ENV_MAX_ATTEMPTS, "many")]))
            .expect_err("must reject non-numeric attempts");
        assert_eq!(
            err,
            ConfigError::Env {
                name: ENV_MAX_ATTEMPTS.to_owned(),
                value: "many".to_owned(),
            }
        );
    }

    #[test]
    fn with_header_collects_headers() {
        let options = ClientOptions::default().with_header("X-Request-Source", "inventory");
        assert_eq!(
            options.default_headers.get("X-Request-Source").map(String::as_str),
            Some("inventory")
        );
    }
}

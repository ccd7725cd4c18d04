use std::collections::BTreeMap;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{error::BodyFailure, ClientError, ConfigError};

const APPLICATION_JSON: &str = "application/json";

/// A request built for one call and re-sent unchanged on every attempt.
#[derive(Clone, Debug)]
pub(crate) struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub headers: HeaderMap,
}

impl OutgoingRequest {
    /// Serializes `body` and merges the JSON headers over `defaults`.
    ///
    /// Encoding failures are permanent: the request is never sent.
    pub fn build<B>(
        method: Method,
        url: &str,
        body: Option<&B>,
        defaults: &HeaderMap,
    ) -> Result<Self, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| ClientError::Body {
                url: url.to_owned(),
                source: BodyFailure::Encode(err),
            })?;

        let mut headers = defaults.clone();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(header::ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        Ok(Self {
            method,
            url: url.to_owned(),
            body,
            headers,
        })
    }
}

/// Validates configured default headers once, at client construction.
pub(crate) fn default_header_map(
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || ConfigError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;

        let reserved = header_name == header::CONTENT_TYPE || header_name == header::ACCEPT;
        if reserved && !value.trim().eq_ignore_ascii_case(APPLICATION_JSON) {
            return Err(ConfigError::ReservedHeader { name: name.clone() });
        }
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use reqwest::{header, Method};
    use serde::Serialize;

    use super::{default_header_map, OutgoingRequest};
    use crate::{error::BodyFailure, ClientError, ConfigError};

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[derive(Serialize)]
    struct NewItem<'a> {
        name: &'a str,
    }

    #[test]
    fn json_headers_are_always_set() {
        let defaults = default_header_map(&headers(&[("X-Api-Client", "tests")]))
            .expect("headers must be valid");
        let request = OutgoingRequest::build(
            Method::POST,
            "http://svc/items",
            Some(&NewItem { name: "Kit" }),
            &defaults,
        )
        .expect("request must build");

        assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.headers[header::ACCEPT], "application/json");
        assert_eq!(request.headers["x-api-client"], "tests");
        assert_eq!(request.body.as_deref(), Some(&br#"{"name":"Kit"}"#[..]));
    }

    #[test]
    fn absent_body_sends_nothing() {
        let request = OutgoingRequest::build::<()>(Method::GET, "http://svc", None, &Default::default())
            .expect("request must build");
        assert!(request.body.is_none());
    }

    #[test]
    fn unserializable_body_is_body_error() {
        // JSON object keys must be strings.
        let mut payload = HashMap::new();
        payload.insert(vec![1u8], "value");

        let err = OutgoingRequest::build(Method::POST, "http://svc", Some(&payload), &Default::default())
            .expect_err("non-string keys cannot be encoded");
        assert!(matches!(
            err,
            ClientError::Body {
                source: BodyFailure::Encode(_),
                ..
            }
        ));
    }

    #[test]
    fn json_defaults_for_reserved_headers_are_accepted() {
        let map = default_header_map(&headers(&[
            ("Content-Type", "application/json"),
            ("Accept", "Application/JSON"),
        ]))
        .expect("matching JSON headers are allowed");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn conflicting_reserved_header_is_rejected() {
        let err = default_header_map(&headers(&[("Accept", "text/html")]))
            .expect_err("must not override Accept");
        assert_eq!(
            err,
            ConfigError::ReservedHeader {
                name: "Accept".to_owned()
            }
        );
    }

    #[test]
    fn malformed_header_is_rejected() {
        let err = default_header_map(&headers(&[("Bad Header", "x")]))
            .expect_err("spaces are not allowed in header names");
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }
}

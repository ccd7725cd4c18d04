use serde::de::DeserializeOwned;

use crate::{error::BodyFailure, ClientError, RawResponse, Result};

/// Decodes a JSON response body into `T`.
///
/// An empty (or whitespace-only) body is decoded as `null`, so `()` and
/// `Option<_>` targets accept `204 No Content` style responses.
pub(crate) fn decode_json<T: DeserializeOwned>(response: RawResponse) -> Result<T> {
    let body = response.body.trim();
    let json = if body.is_empty() { "null" } else { body };

    serde_json::from_str(json).map_err(|err| ClientError::Body {
        url: response.url,
        source: BodyFailure::Decode(err),
    })
}

//! Clusteer response envelope and the read-only view over its `data` payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

use crate::clusteer::ClusteerError;

/// Raw JSON body returned by the Clusteer service.
///
/// Only `data` is read; any other top-level field is ignored.
#[derive(Debug)]
pub struct ClusteerEnvelope {
    pub data: Option<Value>,
}

impl From<Map<String, Value>> for ClusteerEnvelope {
    fn from(mut body: Map<String, Value>) -> Self {
        Self { data: body.remove("data") }
    }
}

/// Crawl results returned by the Clusteer service.
///
/// The payload is kept verbatim as untyped JSON. Accessors cover the fields
/// the service fills for the `html`, `triggered_requests` and `cookies`
/// flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteerResponse {
    data: Map<String, Value>,
    #[serde(skip)]
    elapsed: Option<Duration>,
}

impl TryFrom<ClusteerEnvelope> for ClusteerResponse {
    type Error = ClusteerError;

    fn try_from(raw: ClusteerEnvelope) -> Result<Self, Self::Error> {
        match raw.data {
            Some(Value::Object(data)) => Ok(Self::new(data)),
            None | Some(Value::Null) => Err(ClusteerError::MissingData),
            Some(other) => Err(ClusteerError::Decode(format!("`data` is not an object: {other}"))),
        }
    }
}

impl ClusteerResponse {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data, elapsed: None }
    }

    /// Decode a response body.
    ///
    /// Fails with `ClusteerError::Decode` on malformed JSON or a body that is
    /// not a JSON object, and with `ClusteerError::MissingData` when the
    /// envelope has no `data` field.
    pub fn from_slice(body: &[u8]) -> Result<Self, ClusteerError> {
        let body: Map<String, Value> =
            serde_json::from_slice(body).map_err(|e| ClusteerError::Decode(e.to_string()))?;
        Self::try_from(ClusteerEnvelope::from(body))
    }

    /// Record the round-trip time of the call that produced this response.
    pub fn with_timing(mut self, start: Instant) -> Self {
        self.elapsed = Some(start.elapsed());
        self
    }

    /// Rendered HTML, present when the crawl asked for it.
    pub fn html(&self) -> Option<&str> {
        self.data.get("html").and_then(Value::as_str)
    }

    /// Requests the page triggered while loading.
    pub fn triggered_requests(&self) -> Option<&[Value]> {
        self.data.get("triggered_requests").and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Cookies set by the page.
    pub fn cookies(&self) -> Option<&[Value]> {
        self.data.get("cookies").and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    /// Deserialize the payload into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ClusteerError> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| ClusteerError::Decode(e.to_string()))
    }

    /// Round-trip time of the call, if recorded.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const FIXTURE_JSON: &str = r#"{
        "status": "success",
        "data": {
            "html": "<html><body>Hello</body></html>",
            "triggered_requests": [
                {"type": "document", "method": "GET", "url": "https://example.com/"},
                {"type": "image", "method": "GET", "url": "https://example.com/logo.png"}
            ],
            "cookies": [
                {"name": "session", "value": "abc", "domain": "example.com"}
            ]
        }
    }"#;

    #[test]
    fn test_decode_full_response() {
        let response = ClusteerResponse::from_slice(FIXTURE_JSON.as_bytes()).unwrap();

        assert_eq!(response.html(), Some("<html><body>Hello</body></html>"));
        assert_eq!(response.triggered_requests().map(<[Value]>::len), Some(2));
        assert_eq!(response.cookies().unwrap()[0]["name"], "session");
        assert!(response.get("status").is_none());
        assert!(response.elapsed().is_none());
    }

    #[test]
    fn test_missing_fields_are_none() {
        let response = ClusteerResponse::from_slice(br#"{"data": {}}"#).unwrap();
        assert!(response.html().is_none());
        assert!(response.triggered_requests().is_none());
        assert!(response.cookies().is_none());
        assert!(response.data().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let result = ClusteerResponse::from_slice(b"<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(ClusteerError::Decode(_))));
    }

    #[test]
    fn test_missing_data() {
        let result = ClusteerResponse::from_slice(br#"{"status": "error"}"#);
        assert!(matches!(result, Err(ClusteerError::MissingData)));

        let result = ClusteerResponse::from_slice(br#"{"data": null}"#);
        assert!(matches!(result, Err(ClusteerError::MissingData)));
    }

    #[test]
    fn test_top_level_array_rejected() {
        let result = ClusteerResponse::from_slice(br#"[{"html":"<p>x</p>"}]"#);
        assert!(matches!(result, Err(ClusteerError::Decode(_))));

        let result = ClusteerResponse::from_slice(b"[]");
        assert!(matches!(result, Err(ClusteerError::Decode(_))));
    }

    #[test]
    fn test_data_not_an_object() {
        let result = ClusteerResponse::from_slice(br#"{"data": "oops"}"#);
        assert!(matches!(result, Err(ClusteerError::Decode(_))));
    }

    #[test]
    fn test_typed_view() {
        #[derive(Deserialize)]
        struct Page {
            html: String,
        }

        let response = ClusteerResponse::from_slice(br#"{"data": {"html": "<p>hi</p>", "extra": 1}}"#).unwrap();
        let page: Page = response.deserialize().unwrap();
        assert_eq!(page.html, "<p>hi</p>");

        let result = response.deserialize::<Vec<String>>();
        assert!(matches!(result, Err(ClusteerError::Decode(_))));
    }

    #[test]
    fn test_with_timing() {
        let response = ClusteerResponse::new(Map::new()).with_timing(Instant::now());
        assert!(response.elapsed().is_some());
    }

    #[test]
    fn test_into_data() {
        let response = ClusteerResponse::from_slice(br#"{"data": {"html": "x"}}"#).unwrap();
        let data = response.into_data();
        assert_eq!(data.get("html"), Some(&Value::String("x".to_string())));
    }
}

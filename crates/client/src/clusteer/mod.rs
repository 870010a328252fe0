//! Clusteer crawl client.
//!
//! Builds a crawl request for a Clusteer service and decodes its answer.
//!
//! ### Protocol
//!
//! - **Endpoint**: configured base URL (`CLUSTEER_ENDPOINT`), called with a
//!   single `GET {endpoint}?{query}`.
//! - **Query**: parameters in insertion order, `url` always serialized last.
//!   Flags are sent as `1`, lists comma-joined, header maps as JSON.
//! - **Response**: JSON object whose `data` field holds the crawl results.
//! - **Errors**: invalid arguments are recorded by the builder and reported
//!   before any I/O. Non-2xx statuses are network errors, never decode errors.

pub mod error;
pub mod request;
pub mod response;

pub use error::ClusteerError;
pub use request::{Device, ParamValue, Parameters};
pub use response::{ClusteerEnvelope, ClusteerResponse};

use clusteer_core::ClusteerConfig;
use reqwest::{StatusCode, header};
use serde_json::{Map, Value};
use std::time::Instant;
use url::Url;

/// Builder for a single crawl request.
///
/// Every configuration method consumes and returns the builder, so calls
/// chain. Nothing touches the network until [`Clusteer::get`] or
/// [`Clusteer::send`].
///
/// ```no_run
/// use clusteer_client::Clusteer;
///
/// let page = Clusteer::to("https://example.com")
///     .set_device(Clusteer::DESKTOP_DEVICE)
///     .timeout(30)
///     .with_html()
///     .get()?;
///
/// println!("{}", page.html().unwrap_or_default());
/// # Ok::<(), clusteer_client::ClusteerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Clusteer {
    url: String,
    parameters: Parameters,
    config: Option<ClusteerConfig>,
    invalid: Option<String>,
}

impl Clusteer {
    pub const DESKTOP_DEVICE: &'static str = "desktop";
    pub const TABLET_DEVICE: &'static str = "tablet";
    pub const MOBILE_DEVICE: &'static str = "mobile";

    /// Start a crawl request for the given page.
    pub fn to(url: impl Into<String>) -> Self {
        Self { url: url.into().trim().to_string(), parameters: Parameters::new(), config: None, invalid: None }
    }

    /// Replace the page to crawl.
    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().trim().to_string();
        self
    }

    /// Use an explicit configuration instead of loading one at call time.
    pub fn with_config(mut self, config: ClusteerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Viewport size in pixels, sent as `{width}x{height}`.
    pub fn set_viewport(self, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return self.reject(format!("viewport must be positive, got {width}x{height}"));
        }
        self.set_parameter("viewport", format!("{width}x{height}"))
    }

    /// Device to emulate. See [`Device`] for the identifiers the service knows.
    pub fn set_device(self, device: impl AsRef<str>) -> Self {
        self.set_parameter("device", device.as_ref())
    }

    /// User agent for the crawl. The service prefers it over `device` when
    /// both are sent.
    pub fn set_user_agent(self, user_agent: impl Into<String>) -> Self {
        self.set_parameter("user_agent", user_agent.into())
    }

    /// Extra headers for the crawl, sent as a JSON object in insertion order.
    pub fn set_extra_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers: Map<String, Value> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();

        self.set_parameter("extra_headers", Value::Object(headers).to_string())
    }

    /// Resource extensions the crawler should not load, e.g. `["png", "jpg"]`.
    pub fn block_extensions<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = extensions
            .into_iter()
            .map(|ext| ext.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");

        self.set_parameter("blocked_extensions", joined)
    }

    /// Crawl timeout in seconds, enforced by the service.
    pub fn timeout(self, seconds: u32) -> Self {
        if seconds == 0 {
            return self.reject("timeout must be a positive number of seconds".to_string());
        }
        self.set_parameter("timeout", seconds)
    }

    /// Wait until the page has no pending requests.
    pub fn wait_until_all_requests_finish(self) -> Self {
        self.set_parameter("until_idle", true)
    }

    /// Include the requests the page triggered.
    pub fn with_triggered_requests(self) -> Self {
        self.set_parameter("triggered_requests", true)
    }

    /// Include the cookies the page set.
    pub fn with_cookies(self) -> Self {
        self.set_parameter("cookies", true)
    }

    /// Include the rendered HTML.
    pub fn with_html(self) -> Self {
        self.set_parameter("html", true)
    }

    /// Set a raw query parameter, overwriting any previous value for `key`.
    ///
    /// A `url` parameter set here is always replaced by the target URL when
    /// the request is built.
    pub fn set_parameter(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.set(key, value);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Keep the first rejected argument; later ones are usually consequences.
    fn reject(mut self, reason: String) -> Self {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
        self
    }

    /// Check the recorded arguments and the target URL.
    pub fn validate(&self) -> Result<(), ClusteerError> {
        if let Some(reason) = &self.invalid {
            return Err(ClusteerError::InvalidInput(reason.clone()));
        }

        if self.url.is_empty() {
            return Err(ClusteerError::InvalidInput("url cannot be empty".to_string()));
        }

        let parsed = Url::parse(&self.url).map_err(|e| ClusteerError::InvalidInput(format!("invalid url: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ClusteerError::InvalidInput(format!("unsupported url scheme: {scheme}"))),
        }
    }

    /// Query pairs in wire order, with `url` forced to the target and last.
    fn query_pairs(&self) -> Result<Vec<(String, String)>, ClusteerError> {
        self.validate()?;

        let mut parameters = self.parameters.clone();
        parameters.remove("url");
        parameters.set("url", self.url.as_str());

        Ok(parameters.wire_pairs())
    }

    /// The urlencoded query string sent to the service.
    pub fn query_string(&self) -> Result<String, ClusteerError> {
        let pairs = self.query_pairs()?;
        Ok(url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish())
    }

    /// Build the callable URL against an endpoint.
    pub fn callable_url(&self, endpoint: &Url) -> Result<Url, ClusteerError> {
        Ok(with_query(endpoint, self.query_pairs()?))
    }

    fn resolve_config(&self) -> Result<ClusteerConfig, ClusteerError> {
        match &self.config {
            Some(config) => {
                config.validate()?;
                Ok(config.clone())
            }
            None => Ok(ClusteerConfig::load()?),
        }
    }

    /// Validate, resolve the endpoint and build the callable URL.
    fn prepare(&self) -> Result<(ClusteerConfig, Url), ClusteerError> {
        let pairs = self.query_pairs()?;

        let config = self.resolve_config()?;
        let url = with_query(&config.endpoint_url()?, pairs);

        tracing::debug!(
            endpoint = %config.endpoint,
            page = %self.url,
            parameters = self.parameters.len(),
            "sending Clusteer crawl request"
        );

        Ok((config, url))
    }

    /// Run the crawl, blocking until the response is read and decoded.
    ///
    /// Must not be called from inside an async runtime; use [`Clusteer::send`]
    /// there instead.
    pub fn get(self) -> Result<ClusteerResponse, ClusteerError> {
        let (config, url) = self.prepare()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;

        let start = Instant::now();
        let response = http.get(url).header(header::ACCEPT, "application/json").send()?;

        check_status(response.status())?;

        let bytes = response.bytes()?;
        finish(&bytes, start)
    }

    /// Run the crawl on the caller's async runtime.
    pub async fn send(self) -> Result<ClusteerResponse, ClusteerError> {
        let (config, url) = self.prepare()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;

        let start = Instant::now();
        let response = http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        check_status(response.status())?;

        let bytes = response.bytes().await?;
        finish(&bytes, start)
    }
}

/// Append crawl parameters to the endpoint.
///
/// Endpoint query pairs whose key is also a crawl parameter are dropped, so
/// every key appears once.
fn with_query(endpoint: &Url, pairs: Vec<(String, String)>) -> Url {
    let kept: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(key, _)| !pairs.iter().any(|(k, _)| k == key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = endpoint.clone();
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(kept).extend_pairs(pairs);
    url
}

fn check_status(status: StatusCode) -> Result<(), ClusteerError> {
    tracing::debug!("Clusteer response status: {}", status);

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Clusteer service returned an error status");
        return Err(ClusteerError::HttpError { status: status.as_u16() });
    }

    Ok(())
}

fn finish(body: &[u8], start: Instant) -> Result<ClusteerResponse, ClusteerError> {
    let response = ClusteerResponse::from_slice(body)?.with_timing(start);

    tracing::debug!("crawl completed in {:?}, {} data fields", start.elapsed(), response.data().len());

    Ok(response)
}

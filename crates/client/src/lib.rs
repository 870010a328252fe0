//! Client for the Clusteer crawling service.
//!
//! [`Clusteer`] accumulates crawl options into a query string, calls the
//! configured Clusteer endpoint once and wraps the returned `data` payload in
//! a [`ClusteerResponse`].

pub mod clusteer;

pub use clusteer::{Clusteer, ClusteerError, ClusteerResponse, Device, ParamValue, Parameters};
pub use clusteer_core::{ClusteerConfig, ConfigError};

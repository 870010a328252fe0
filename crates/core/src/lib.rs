//! Core types shared by the Clusteer client.
//!
//! This crate provides:
//! - Layered configuration for the Clusteer endpoint
//! - Configuration validation errors

pub mod config;

pub use config::{ClusteerConfig, ConfigError};

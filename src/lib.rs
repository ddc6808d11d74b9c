//! Shortener - a multi-tenant URL shortener core
//!
//! Turns long URLs into short deterministic codes, resolves them back,
//! tracks which anonymous owner created each one and lets owners soft-delete
//! their own codes.
//!
//! # Architecture
//! - `shortcode`: deterministic code generation
//! - `identity`: HMAC-signed owner cookies
//! - `storage`: one backend contract, memory / file-journaled / relational
//! - `services`: shortener business logic and the background deletion queue
//! - `api`: actix-web handlers over the service
//! - `config`: static configuration (TOML + env + flags)
//! - `runtime`: server start-up and graceful shutdown
//! - `system`: logging

pub mod api;
pub mod config;
pub mod errors;
pub mod identity;
pub mod runtime;
pub mod services;
pub mod shortcode;
pub mod storage;
pub mod system;
pub mod utils;

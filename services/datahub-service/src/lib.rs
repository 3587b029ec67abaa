//! DataHub-compatible service library crate.
//!
//! # Purpose
//! Exposes the project/topic/subscription HTTP API, request authentication,
//! configuration, and the in-memory store for use by the binary and by test
//! harnesses that need a hermetic endpoint.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;

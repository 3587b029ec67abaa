//! Functional test harness for DataHub subscription APIs.
//!
//! # Purpose
//! Provides the pieces the subscription suite is built from: environment
//! resolution (a remote endpoint from configuration, or an in-process service),
//! unique resource naming, best-effort cleanup, the topic fixture that guarantees
//! teardown, and the scenarios themselves.
pub mod cleanup;
pub mod env;
pub mod fixture;
pub mod naming;
pub mod scenarios;

pub use env::{LocalService, TestEnv};
pub use fixture::{TopicFixture, with_topic};

#![doc = "spec-publish-core: core logic library for spec-publish."]

//! Locates a generated OpenAPI spec, stages it under "latest" and versioned
//! names, keeps the `versions.json` manifest of published versions current,
//! and pushes the result to a documentation branch.
//!
//! # Usage
//! Build a [`config::PublishConfig`], locate the spec with
//! [`spec::SpecDescriptor::locate`], then drive [`pipeline::run_publish`] with
//! a [`contract::ManifestFetcher`] and a [`contract::Publisher`].

pub mod config;
pub mod contract;
pub mod error;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod spec;
pub mod staging;

pub use error::PublishError;

//! Core orchestration for webdigest.
//!
//! This crate ties together crawling, per-page transformation and PDF
//! rendering into the end-to-end [`pipeline::run_digest`] workflow.

pub mod pipeline;

pub use pipeline::{DigestConfig, DigestResult, ProgressReporter, SilentProgress, run_digest};

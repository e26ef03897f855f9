//! # chronolex-llm
//!
//! AI-assisted classification for the Chronolex engine.
//!
//! Defines [`provider::ClassificationProvider`] — one batched,
//! bounded-timeout structured-classification request per run — and an
//! HTTP implementation in [`http`]. Failures here never fail an
//! analysis run; the engine falls back to its heuristic tier.

#![deny(unsafe_code)]

pub mod http;
pub mod provider;

pub use http::{HttpClassifier, HttpClassifierConfig};
pub use provider::{Classification, ClassificationProvider, ClassifyError, ClassifyResult, SessionDigest};

//! Orchestration layer for publishing
//!
//! This module provides the high-level publish workflow on top of the
//! toolkit collaborator traits.

pub mod publish_orchestrator;

pub use publish_orchestrator::{PublishOptions, PublishOrchestrator, PublishResult};

//! vtui-backend - Secrets backend collaborator for vault-tui
//!
//! Defines the [`Backend`] trait the orchestration engine calls, and a
//! [`FixtureBackend`] that serves a JSON fixture from memory with realistic
//! latency and timeout behaviour.

pub mod client;
pub mod fixture;

pub use client::{Backend, LocalBackend};
pub use fixture::{Fixture, FixtureBackend, DEFAULT_TIMEOUT};

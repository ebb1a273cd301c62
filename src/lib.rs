//! vault-tui Library
//!
//! Terminal client for browsing a secrets backend. The engine lives in
//! `vtui-app`; this crate wires it to a backend and exposes the headless
//! runner used by the binary and the integration tests.

pub mod headless;

pub use headless::{run_headless, HeadlessOptions, OutputFormat};

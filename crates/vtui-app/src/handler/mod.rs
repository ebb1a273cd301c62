//! Handler module - TEA update function and input routing
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `keys`: Global key bindings and focus-based input routing

pub mod keys;
pub mod update;

#[cfg(test)]
mod tests;

pub use keys::route_input;
pub use update::update;

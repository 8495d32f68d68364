// LobbyScout - core/mod.rs
//
// Core business logic layer: data model, session log location, line
// interpretation.
// Must NOT depend on: app, platform, or any network crate.

pub mod interpreter;
pub mod locator;
pub mod model;

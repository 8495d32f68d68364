// LobbyScout - platform/mod.rs
//
// Platform abstraction layer: config discovery and shared-access file reads.
// Dependencies: standard library, directories crate, util, core::model.
// Must NOT depend on: app.

pub mod config;
pub mod fs;

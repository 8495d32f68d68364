// LobbyScout - lib.rs
//
// Library entry point, exposing all modules for integration testing and for
// the binary in main.rs.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

// LobbyScout - app/mod.rs
//
// Application layer: the tail loop and its downstream collaborators.
// Dependencies: core, platform, util.

pub mod geo;
pub mod http;
pub mod notify;
pub mod pipeline;
pub mod tail;

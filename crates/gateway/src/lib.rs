pub mod api;
pub mod backend;
pub mod bootstrap;
pub mod bridge;
pub mod cli;
pub mod cors;
pub mod reconnect;
pub mod state;

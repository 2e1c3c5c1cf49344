//! Terminal revenue dashboard for hotel channel-management backends

pub mod api;
pub mod cli;
pub mod config;
pub mod services;
pub mod tui;
pub mod types;

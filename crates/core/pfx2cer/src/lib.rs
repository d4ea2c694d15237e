//! Command line and HTTP front-ends of the PFX to CER converter.
pub mod cli;
pub mod command;
pub mod config;
pub mod http_server;
pub mod logging;

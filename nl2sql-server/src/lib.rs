//! NL2SQL server - HTTP API and command line front end.
//!
//! The library half exists so the router and configuration can be driven
//! from integration tests; `main.rs` only wires them to a socket.

pub mod api;
pub mod config;
pub mod logging;

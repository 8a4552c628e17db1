//! Shared library surface for the flightmap server and its tests.

pub mod api;
pub mod config;
pub mod state;

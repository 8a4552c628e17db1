//! Flightmap Lookup - airport coordinate service client
//!
//! Implements the core `AirportLookup` trait over HTTP.

pub mod client;
pub mod config;

pub use client::{parse_rows, AirportLookupClient, AirportRecord};
pub use config::LookupConfig;

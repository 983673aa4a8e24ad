// src/lib.rs
// Library interface for certlookup
pub mod cert_parser;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod lookup;
pub mod output;
pub mod signal;
pub mod types;

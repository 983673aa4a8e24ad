// src/output/mod.rs
//! Output handling for looked up certificates
//!
//! Handlers own their writer; nothing here touches process-global logging
//! state, so `main` decides where rows go and passes the handler down.

use crate::cert_parser::DecodedCertificate;
use crate::error::Result;
use crate::types::IdentityRow;
use async_trait::async_trait;

pub mod human;
pub mod json;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per row on stderr (default)
    Human,
    /// JSON Lines on stdout
    Json,
}

/// Options shared by every output handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Also emit the certificate as a PEM block
    pub pem: bool,
    /// Prefix human-readable lines with the current time
    pub timestamps: bool,
}

/// Trait for output handlers that print looked up rows
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Emit a certificate decoded from a direct query row
    async fn emit_certificate(&self, cert: &DecodedCertificate) -> Result<()>;

    /// Emit one row of the aggregated query
    async fn emit_identity(&self, row: &IdentityRow) -> Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> Result<()>;
}

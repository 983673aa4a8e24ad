// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LookupError, Result};

/// One lookup: which domain to search for and how many rows to return at most
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    domain_name: String,
    limit: u32,
}

impl QueryRequest {
    pub fn new(domain_name: impl Into<String>, limit: u32) -> Result<Self> {
        let domain_name = domain_name.into();
        if domain_name.trim().is_empty() {
            return Err(LookupError::Usage("domain name is empty".to_string()));
        }
        if limit == 0 {
            return Err(LookupError::Usage("limit must be at least 1".to_string()));
        }

        Ok(Self { domain_name, limit })
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Row of the aggregated identity query, every column already rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRow {
    pub issuer_ca_id: String,
    pub issuer_name: String,
    /// Distinct identities of the certificate, newline separated
    pub name_value: String,
    pub id: String,
    /// Earliest CT log entry; absent when the certificate was never logged
    pub entry_timestamp: Option<String>,
    pub not_before: String,
    pub not_after: String,
    pub serial_number: String,
}

impl IdentityRow {
    /// Columns in the order they were selected
    pub fn fields(&self) -> [&str; 8] {
        [
            self.issuer_ca_id.as_str(),
            self.issuer_name.as_str(),
            self.name_value.as_str(),
            self.id.as_str(),
            self.entry_timestamp.as_deref().unwrap_or("-"),
            self.not_before.as_str(),
            self.not_after.as_str(),
            self.serial_number.as_str(),
        ]
    }
}

impl fmt::Display for IdentityRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields().join(" "))
    }
}

/// A row as returned by either query shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRow {
    /// DER bytes of a logged certificate
    Certificate(Vec<u8>),
    Identity(IdentityRow),
}

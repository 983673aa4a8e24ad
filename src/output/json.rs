// src/output/json.rs
//! JSON Lines (JSONL) output handler

use crate::cert_parser::{DecodedCertificate, to_pem};
use crate::error::Result;
use crate::output::{OutputHandler, OutputOptions};
use crate::types::IdentityRow;
use async_trait::async_trait;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

/// JSON Lines output handler
///
/// Outputs one JSON object per row (JSONL/NDJSON format)
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    options: OutputOptions,
}

#[derive(Serialize)]
struct CertificateRecord<'a> {
    #[serde(flatten)]
    cert: &'a DecodedCertificate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pem: Option<String>,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn stdout(options: OutputOptions) -> Self {
        Self::to_writer(io::stdout(), options)
    }

    pub fn to_writer(writer: impl Write + Send + 'static, options: OutputOptions) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_line<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).map_err(io::Error::from)?;

        let mut writer = self.lock();
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit_certificate(&self, cert: &DecodedCertificate) -> Result<()> {
        let record = CertificateRecord {
            cert,
            pem: self.options.pem.then(|| to_pem(&cert.raw)),
        };
        self.write_line(&record)
    }

    async fn emit_identity(&self, row: &IdentityRow) -> Result<()> {
        self.write_line(row)
    }

    async fn flush(&self) -> Result<()> {
        self.lock().flush()?;
        Ok(())
    }
}

// src/output/human.rs
//! Human-readable terminal output

use crate::cert_parser::{DecodedCertificate, to_pem};
use crate::error::Result;
use crate::output::{OutputHandler, OutputOptions};
use crate::types::IdentityRow;
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

/// Line-per-row output, written to stderr next to the diagnostics by default
pub struct HumanOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    options: OutputOptions,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stderr
    pub fn stderr(options: OutputOptions) -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stderr())),
            options,
            use_colors: is_terminal::is_terminal(io::stderr()),
        }
    }

    /// Create a new HumanOutput over any writer, without colors
    pub fn to_writer(writer: impl Write + Send + 'static, options: OutputOptions) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            options,
            use_colors: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prefix(&self) -> String {
        if self.options.timestamps {
            format!("[{}] ", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit_certificate(&self, cert: &DecodedCertificate) -> Result<()> {
        let prefix = self.prefix();
        let mut writer = self.lock();

        if self.use_colors {
            writeln!(
                writer,
                "{}CommonName: ({}) Issued On: ({})",
                prefix.dimmed(),
                cert.common_name.cyan().bold(),
                cert.not_before
            )?;
        } else {
            writeln!(
                writer,
                "{}CommonName: ({}) Issued On: ({})",
                prefix, cert.common_name, cert.not_before
            )?;
        }

        if self.options.pem {
            writer.write_all(to_pem(&cert.raw).as_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }

    async fn emit_identity(&self, row: &IdentityRow) -> Result<()> {
        let prefix = self.prefix();
        let mut writer = self.lock();

        if self.use_colors {
            writeln!(writer, "{}{}", prefix.dimmed(), row)?;
        } else {
            writeln!(writer, "{}{}", prefix, row)?;
        }

        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.lock().flush()?;
        Ok(())
    }
}

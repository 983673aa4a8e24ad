// src/cli.rs
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::database::QueryShape;
use crate::error::LookupError;
use crate::output::{OutputFormat, OutputOptions};
use crate::types::QueryRequest;

#[derive(Parser, Debug, Clone)]
#[command(name = "certlookup")]
#[command(author, version, long_about = None)]
#[command(about = "Print certificates of a domain name by querying crt.sh")]
#[command(override_usage = "certlookup [OPTIONS] <DOMAIN NAME>")]
#[command(after_help = "Ex: certlookup github.com    print the newest certificate logged for github.com")]
pub struct Cli {
    /// Domain name to look up
    #[arg(value_name = "DOMAIN NAME")]
    pub domains: Vec<String>,

    /// Be verbose (timestamps and source locations in log lines)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Number of entries to return
    #[arg(short = 'n', long = "limit", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Print PEM encoded certificate (direct query only)
    #[arg(short = 'p', long = "pem")]
    pub pem: bool,

    /// Query shape to run against the database
    #[arg(short = 'q', long = "query", value_enum, default_value_t = QueryShape::Direct)]
    pub query: QueryShape,

    /// Output rows as JSON lines on stdout
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Path to TOML config file (defaults to the public crt.sh database)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse `args`, accepting the single-dash `-pem` spelling as `--pem`
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(normalize_args(args))
    }

    /// Validate positional arguments and flag combinations
    pub fn validate(&self) -> Result<(), LookupError> {
        if self.domains.len() != 1 {
            return Err(LookupError::Usage(format!(
                "expected 1 argument: domain name, got {}",
                self.domains.len()
            )));
        }

        if self.pem && self.query == QueryShape::Aggregated {
            return Err(LookupError::Usage(
                "--pem only applies to the direct query".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the query request from the validated arguments
    pub fn query_request(&self) -> Result<QueryRequest, LookupError> {
        self.validate()?;
        QueryRequest::new(self.domains[0].clone(), self.limit)
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            pem: self.pem,
            timestamps: self.verbose,
        }
    }

    /// Log level: debug when verbose, otherwise the configured level
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.verbose { "debug" } else { configured }
    }

    /// Full usage text as printed on invalid invocations
    pub fn usage_text() -> String {
        Self::command().render_help().to_string()
    }
}

/// Rewrite `-pem` to `--pem` so clap does not read it as `-p -e -m`
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if arg == "-pem" { OsString::from("--pem") } else { arg }
        })
        .collect()
}

// src/error.rs
//! Error kinds for the lookup pipeline

use std::fmt;
use thiserror::Error;

/// Everything that can go wrong between argument parsing and output
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("{0}")]
    Usage(String),

    #[error("could not open SQL connection to postgres at {host}")]
    Connection {
        host: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not execute SQL on postgres for finding certificates of {domain}")]
    Query {
        domain: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not scan row {row}")]
    Scan {
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not parse x509 certificate ({0})")]
    CertificateParse(String),

    #[error("could not encode output")]
    Encoding(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Multiple(MultiError),
}

pub type Result<T> = std::result::Result<T, LookupError>;

impl LookupError {
    /// True when this error, or any error aggregated inside it, is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            LookupError::Cancelled => true,
            LookupError::Multiple(multi) => multi.errors().iter().any(|e| e.is_cancelled()),
            _ => false,
        }
    }
}

/// Ordered collection of errors reported as a single failure
///
/// Built when releasing a resource fails after (or while) another operation
/// failed, so neither outcome is lost.
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<LookupError>,
}

impl MultiError {
    /// Append `next` to `current`, flattening nested aggregates
    pub fn append(current: Option<LookupError>, next: LookupError) -> LookupError {
        let mut errors = Vec::new();
        for err in current.into_iter().chain(std::iter::once(next)) {
            match err {
                LookupError::Multiple(multi) => errors.extend(multi.errors),
                other => errors.push(other),
            }
        }

        if errors.len() == 1 {
            return errors.remove(0);
        }
        LookupError::Multiple(MultiError { errors })
    }

    /// Merge the outcome of an operation with the outcome of its cleanup
    pub fn combine<T>(primary: Result<T>, cleanup: Result<()>) -> Result<T> {
        match (primary, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
            (Err(primary_err), Ok(())) => Err(primary_err),
            (Err(primary_err), Err(cleanup_err)) => {
                Err(Self::append(Some(primary_err), cleanup_err))
            }
        }
    }

    pub fn errors(&self) -> &[LookupError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
            let mut cause = std::error::Error::source(err);
            while let Some(inner) = cause {
                write!(f, ": {}", inner)?;
                cause = inner.source();
            }
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error(msg: &str) -> LookupError {
        LookupError::Encoding(std::io::Error::other(msg.to_string()))
    }

    #[test]
    fn test_combine_both_ok() {
        let result = MultiError::combine(Ok(7), Ok(()));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_combine_keeps_primary_error() {
        let result: Result<()> = MultiError::combine(Err(LookupError::Cancelled), Ok(()));
        assert!(matches!(result, Err(LookupError::Cancelled)));
    }

    #[test]
    fn test_combine_reports_cleanup_error_on_success() {
        let result = MultiError::combine(Ok(1), Err(io_error("close failed")));
        assert!(matches!(result, Err(LookupError::Encoding(_))));
    }

    #[test]
    fn test_combine_aggregates_both_errors() {
        let result: Result<()> =
            MultiError::combine(Err(LookupError::Cancelled), Err(io_error("close failed")));

        match result {
            Err(LookupError::Multiple(multi)) => {
                assert_eq!(multi.len(), 2);
                assert!(matches!(multi.errors()[0], LookupError::Cancelled));
                assert!(matches!(multi.errors()[1], LookupError::Encoding(_)));
            }
            other => panic!("expected aggregated error, got {:?}", other),
        }
    }

    #[test]
    fn test_append_flattens_nested_aggregates() {
        let first = MultiError::append(Some(io_error("a")), io_error("b"));
        let second = MultiError::append(Some(first), io_error("c"));

        match second {
            LookupError::Multiple(multi) => assert_eq!(multi.len(), 3),
            other => panic!("expected aggregated error, got {:?}", other),
        }
    }

    #[test]
    fn test_display_lists_every_error() {
        let err = MultiError::append(Some(LookupError::Cancelled), io_error("close failed"));
        let text = err.to_string();
        assert!(text.starts_with("2 errors occurred:"));
        assert!(text.contains("operation cancelled"));
        assert!(text.contains("close failed"));
    }

    #[test]
    fn test_is_cancelled_looks_inside_aggregates() {
        let err = MultiError::append(Some(LookupError::Cancelled), io_error("close failed"));
        assert!(err.is_cancelled());
        assert!(!io_error("x").is_cancelled());
    }

    #[test]
    fn test_source_reported_once_in_chain() {
        let err = LookupError::Scan {
            row: 1,
            source: sqlx::Error::ColumnNotFound("certificate".to_string()),
        };
        assert_eq!(err.to_string(), "could not scan row 1");

        let chained = format!("{:#}", anyhow::Error::new(err).context("could not look up"));
        assert_eq!(
            chained,
            "could not look up: could not scan row 1: no column found for name: certificate"
        );
    }

    #[test]
    fn test_display_includes_sources_of_aggregated_errors() {
        let err = MultiError::append(
            Some(LookupError::Cancelled),
            LookupError::Connection {
                host: "crt.sh".to_string(),
                source: sqlx::Error::ColumnNotFound("x".to_string()),
            },
        );
        assert_eq!(
            err.to_string(),
            "2 errors occurred:\n\t* operation cancelled\n\t* could not open SQL connection to postgres at crt.sh: no column found for name: x"
        );
    }

    #[test]
    fn test_cancellation_survives_context() {
        let err = anyhow::Error::new(LookupError::Cancelled).context("could not look up");
        assert!(
            err.downcast_ref::<LookupError>()
                .is_some_and(LookupError::is_cancelled)
        );

        let err = anyhow::Error::new(io_error("broken pipe")).context("could not look up");
        assert!(
            !err.downcast_ref::<LookupError>()
                .is_some_and(LookupError::is_cancelled)
        );
    }
}

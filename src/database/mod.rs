// src/database/mod.rs
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{LookupError, MultiError, Result};
use crate::types::{QueryRequest, ResultRow};

pub mod postgres;

pub use postgres::{PostgresConnector, PostgresSession};

/// The two query shapes the tool can run against the CT database
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryShape {
    /// Raw DER certificates whose identities contain the domain, newest first
    Direct,
    /// Full-text identity search, one text row per certificate with issuer
    /// and earliest log entry
    Aggregated,
}

// `%` and `_` in the domain are escaped so LIKE matches them literally
const DIRECT_QUERY: &str = r#"
SELECT certificate
    FROM certificate_and_identities
    WHERE name_value LIKE ('%' || replace(replace(replace($1, '\', '\\'), '%', '\%'), '_', '\_') || '%')
    ORDER BY certificate_id DESC
    LIMIT $2
"#;

const AGGREGATED_QUERY: &str = r#"
WITH ci AS (
    SELECT min(sub.certificate_id) id,
           min(sub.issuer_ca_id) issuer_ca_id,
           array_agg(DISTINCT sub.name_value) name_values,
           x509_notBefore(sub.certificate) not_before,
           x509_notAfter(sub.certificate) not_after,
           encode(x509_serialNumber(sub.certificate), 'hex') serial_number
        FROM (SELECT *
                  FROM certificate_and_identities cai
                  WHERE plainto_tsquery('certwatch', $1) @@ identities(cai.certificate)
                      AND cai.name_value ILIKE ('%' || replace(replace(replace($1, '\', '\\'), '%', '\%'), '_', '\_') || '%')
                  LIMIT 10000
             ) sub
        GROUP BY sub.certificate
)
SELECT ci.issuer_ca_id::text AS issuer_ca_id,
       ca.name AS issuer_name,
       array_to_string(ci.name_values, chr(10)) AS name_value,
       ci.id::text AS id,
       le.entry_timestamp::text AS entry_timestamp,
       ci.not_before::text AS not_before,
       ci.not_after::text AS not_after,
       ci.serial_number AS serial_number
    FROM ci
        LEFT JOIN LATERAL (
            SELECT min(ctle.entry_timestamp) entry_timestamp
                FROM ct_log_entry ctle
                WHERE ctle.certificate_id = ci.id
        ) le ON TRUE,
        ca
    WHERE ci.issuer_ca_id = ca.id
    ORDER BY le.entry_timestamp DESC NULLS LAST
    LIMIT $2
"#;

impl QueryShape {
    /// Parameterized SQL; `$1` is the domain name, `$2` the row limit
    pub fn sql(&self) -> &'static str {
        match self {
            QueryShape::Direct => DIRECT_QUERY,
            QueryShape::Aggregated => AGGREGATED_QUERY,
        }
    }
}

/// Opens sessions against the certificate database
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: CertificateSession;

    /// Open one connection
    async fn connect(&self) -> Result<Self::Session>;
}

/// One open connection to the certificate database
#[async_trait]
pub trait CertificateSession: Send {
    /// Execute `shape` for `request` and stream the decoded rows.
    ///
    /// The statement and its cursor live as long as the returned stream and
    /// are released when it is dropped.
    fn rows<'a>(
        &'a mut self,
        shape: QueryShape,
        request: &'a QueryRequest,
    ) -> BoxStream<'a, Result<ResultRow>>;

    /// Release the connection
    async fn close(self) -> Result<()>;
}

/// Run one query and collect at most `request.limit()` rows.
///
/// Connecting and every row fetch race against `cancel`. The cursor is
/// dropped and the connection closed on every path once connected; a close
/// failure is aggregated with whatever the query produced.
pub async fn fetch_rows<C: Connector>(
    connector: &C,
    shape: QueryShape,
    request: &QueryRequest,
    cancel: &CancellationToken,
) -> Result<Vec<ResultRow>> {
    let mut session = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(LookupError::Cancelled),
        session = connector.connect() => session?,
    };

    let collected = collect_rows(&mut session, shape, request, cancel).await;

    let closed = session.close().await;
    if let Err(ref e) = closed {
        debug!("Failed to close database connection: {}", e);
    }

    MultiError::combine(collected, closed)
}

async fn collect_rows<S: CertificateSession>(
    session: &mut S,
    shape: QueryShape,
    request: &QueryRequest,
    cancel: &CancellationToken,
) -> Result<Vec<ResultRow>> {
    let limit = request.limit() as usize;
    let mut rows = session.rows(shape, request);
    let mut collected = Vec::new();

    while collected.len() < limit {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LookupError::Cancelled),
            next = rows.next() => next,
        };

        match next {
            Some(row) => collected.push(row?),
            None => break,
        }
    }

    debug!(
        "Collected {} rows for {} ({:?} query)",
        collected.len(),
        request.domain_name(),
        shape
    );

    Ok(collected)
}

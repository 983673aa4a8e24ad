// src/database/postgres.rs
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};
use tracing::debug;

use super::{CertificateSession, Connector, QueryShape};
use crate::config::DatabaseConfig;
use crate::error::{LookupError, Result};
use crate::types::{IdentityRow, QueryRequest, ResultRow};

/// Opens single PostgreSQL connections to the CT database
pub struct PostgresConnector {
    host: String,
    options: PgConnectOptions,
}

impl PostgresConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        // One statement per run, nothing worth caching server side
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.dbname)
            .application_name(&config.application_name)
            .statement_cache_capacity(0);

        Self {
            host: config.host.clone(),
            options,
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Session = PostgresSession;

    async fn connect(&self) -> Result<PostgresSession> {
        debug!("Connecting to PostgreSQL at {}", self.host);

        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|source| LookupError::Connection {
                host: self.host.clone(),
                source,
            })?;

        debug!("Connected to PostgreSQL at {}", self.host);

        Ok(PostgresSession {
            host: self.host.clone(),
            conn,
        })
    }
}

/// Open connection to the CT database
pub struct PostgresSession {
    host: String,
    conn: PgConnection,
}

#[async_trait]
impl CertificateSession for PostgresSession {
    fn rows<'a>(
        &'a mut self,
        shape: QueryShape,
        request: &'a QueryRequest,
    ) -> BoxStream<'a, Result<ResultRow>> {
        debug!(
            "Executing {:?} query for {} (limit {})",
            shape,
            request.domain_name(),
            request.limit()
        );

        sqlx::query(shape.sql())
            .bind(request.domain_name().to_string())
            .bind(i64::from(request.limit()))
            .fetch(&mut self.conn)
            .enumerate()
            .map(move |(index, row)| {
                let row = row.map_err(|source| LookupError::Query {
                    domain: request.domain_name().to_string(),
                    source,
                })?;
                decode_row(shape, &row, index)
            })
            .boxed()
    }

    async fn close(self) -> Result<()> {
        debug!("Closing connection to {}", self.host);
        self.conn
            .close()
            .await
            .map_err(|source| LookupError::Connection {
                host: self.host,
                source,
            })
    }
}

/// Decode one row according to the columns `shape` selects
fn decode_row(shape: QueryShape, row: &PgRow, index: usize) -> Result<ResultRow> {
    let scan = |source: sqlx::Error| LookupError::Scan { row: index, source };

    match shape {
        QueryShape::Direct => {
            let der: Vec<u8> = row.try_get("certificate").map_err(scan)?;
            Ok(ResultRow::Certificate(der))
        }
        QueryShape::Aggregated => Ok(ResultRow::Identity(IdentityRow {
            issuer_ca_id: row.try_get("issuer_ca_id").map_err(scan)?,
            issuer_name: row.try_get("issuer_name").map_err(scan)?,
            name_value: row.try_get("name_value").map_err(scan)?,
            id: row.try_get("id").map_err(scan)?,
            entry_timestamp: row.try_get("entry_timestamp").map_err(scan)?,
            not_before: row.try_get("not_before").map_err(scan)?,
            not_after: row.try_get("not_after").map_err(scan)?,
            serial_number: row.try_get("serial_number").map_err(scan)?,
        })),
    }
}

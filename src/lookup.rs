// src/lookup.rs
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cert_parser::CertificateParser;
use crate::cli::Cli;
use crate::database::{Connector, QueryShape, fetch_rows};
use crate::error::Result;
use crate::output::OutputHandler;
use crate::types::{QueryRequest, ResultRow};

/// Query the CT database for `request` and print every returned row.
///
/// Either every row is printed or the first failure is returned; rows
/// already printed before a failure are not reported as a partial result.
/// Returns the number of rows printed.
pub async fn run_lookup<C: Connector>(
    connector: &C,
    shape: QueryShape,
    request: &QueryRequest,
    output: &dyn OutputHandler,
    cancel: &CancellationToken,
) -> Result<usize> {
    let rows = fetch_rows(connector, shape, request, cancel).await?;
    debug!("Fetched {} rows for {}", rows.len(), request.domain_name());

    for row in &rows {
        match row {
            ResultRow::Certificate(der) => {
                let cert = CertificateParser::parse_der(der)?;
                output.emit_certificate(&cert).await?;
            }
            ResultRow::Identity(identity) => output.emit_identity(identity).await?,
        }
    }

    output.flush().await?;
    Ok(rows.len())
}

/// Validate `cli` and run the lookup it describes against `connector`.
///
/// A usage error is returned before `connector` is asked for a connection.
pub async fn run_cli_lookup<C: Connector>(
    cli: &Cli,
    connector: &C,
    output: &dyn OutputHandler,
    cancel: &CancellationToken,
) -> Result<usize> {
    let request = cli.query_request()?;
    run_lookup(connector, cli.query, &request, output, cancel).await
}

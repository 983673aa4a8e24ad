// src/main.rs
use anyhow::Context;
use certlookup::cli::Cli;
use certlookup::config::Config;
use certlookup::database::PostgresConnector;
use certlookup::error::LookupError;
use certlookup::lookup::run_cli_lookup;
use certlookup::output::{OutputFormat, OutputHandler, human, json};
use certlookup::signal::spawn_signal_listener;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args(std::env::args_os());

    // Bad invocations never reach the network
    if let Err(e) = cli.validate() {
        eprintln!("{}\n", e);
        eprint!("{}", Cli::usage_text());
        return ExitCode::from(2);
    }

    // Load config file
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("could not load config: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.log_level(&config.logging.level), cli.verbose);

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cancelled = e
                .downcast_ref::<LookupError>()
                .is_some_and(LookupError::is_cancelled);
            if cancelled {
                tracing::warn!("lookup interrupted: {:#}", e);
            } else {
                tracing::error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if verbose {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder
            .without_time()
            .with_target(false)
            .with_level(false)
            .init();
    }
}

async fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let domain = cli.domains.first().map(String::as_str).unwrap_or_default();

    let cancel = CancellationToken::new();
    // Stops the signal listener on every exit path
    let _cancel_on_exit = cancel.clone().drop_guard();
    spawn_signal_listener(cancel.clone());

    let connector = PostgresConnector::new(&config.database);

    let output: Box<dyn OutputHandler> = match cli.output_format() {
        OutputFormat::Human => Box::new(human::HumanOutput::stderr(cli.output_options())),
        OutputFormat::Json => Box::new(json::JsonOutput::stdout(cli.output_options())),
    };

    let printed = run_cli_lookup(cli, &connector, output.as_ref(), &cancel)
        .await
        .with_context(|| format!("could not look up certificates of ({})", domain))?;

    tracing::debug!("Printed {} entries for {}", printed, domain);

    Ok(())
}

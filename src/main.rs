use anyhow::{Context, Result};
use clap::Parser;
use obsterm::{
    CliArgs, Config, InteractiveApp,
    backend::{Backend, DemoBackend, JsonlBackend},
    telemetry,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    if cli.help_query {
        print_query_help();
        return Ok(());
    }

    let config = Config::load(&cli).context("Invalid configuration")?;
    telemetry::init_tracing(config.log_file.as_deref())?;

    let backend: Arc<dyn Backend> = if config.demo {
        let demo = DemoBackend::default();
        match config.demo_login.clone() {
            Some(login) => Arc::new(demo.with_required_login(login)),
            None => Arc::new(demo),
        }
    } else {
        Arc::new(JsonlBackend::new(config.sources.clone()))
    };
    info!(backend = backend.name(), signal = ?config.signal, "starting obsterm");

    let mut app = InteractiveApp::new(&config, backend);
    app.run().await
}

fn print_query_help() {
    println!(
        r#"obsterm Query Syntax

BASIC QUERIES:
  timeout                 Literal search over message and fields (case-insensitive)
  "connection reset"      Quoted literal (preserves spaces)
  /5\d\d/                 Regular expression
  /Timeout/i              Regular expression with flags

FIELDS:
  service:checkout        Field contains value (case-insensitive)
  level:error             Works for any field present on the record
  trace_id:"abc 123"      Quoted values may contain spaces

OPERATORS:
  error AND checkout      Both terms must be present
  error OR warn           Either term must be present
  NOT health              Term must not be present
  (db OR cache) AND slow  Parentheses for grouping

REGEX FLAGS:
  i - Case insensitive
  m - Multi-line mode
  s - Dot matches newline

An empty search clears the query and matches every record."#
    );
}

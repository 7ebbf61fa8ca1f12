pub mod backend;
pub mod config;
pub mod interactive;
pub mod query;
pub mod telemetry;

pub use config::{CliArgs, Config};
pub use interactive::InteractiveApp;
pub use query::{QueryCondition, parse_filter, parse_query};

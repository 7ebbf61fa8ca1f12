pub mod condition;
pub mod parser;
mod regex_cache;

pub use condition::*;
pub use parser::{parse_filter, parse_query};

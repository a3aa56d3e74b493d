//! CLI module
//!
//! Command-line interface for walking paginated APIs.
//!
//! # Commands
//!
//! - `items` - Print every item as one JSON line
//! - `pages` - Print one summary line per page
//! - `validate` - Check a paging definition and print it resolved

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{parse_header, Runner};

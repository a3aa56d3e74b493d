// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]

//! # pagewalk
//!
//! Client-side pagination for HTTP listing APIs.
//!
//! A listing operation returns its results one page at a time, with a
//! continuation token pointing at the next page. pagewalk hides that behind a
//! lazy sequence of items (or pages) that fetches on demand, and that can be
//! resumed from any token it has handed out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewalk::{ContinuationStrategy, HttpClient, ItemPaged, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HttpClient::new()?;
//!     let request = client.get("https://api.example.com/products")?;
//!
//!     let mut products = ItemPaged::<serde_json::Value>::builder(client, request)
//!         .strategy(ContinuationStrategy::next_link())
//!         .build();
//!
//!     while let Some(product) = products.next_item().await {
//!         match product {
//!             Ok(product) => println!("{product}"),
//!             Err(e) => {
//!                 // Resume later with `.continuation_token(token)`
//!                 eprintln!("stopped at {:?}: {e}", e.continuation_token());
//!                 break;
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ItemPaged::next_item()          PageIterator::next_page()   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!               PagingMethodHandler (get_next + extract_data)
//!                               │
//! ┌────────────────────┬────────┴─────────┬─────────────────────┐
//! │ Strategy           │ Transport        │ Extraction          │
//! ├────────────────────┼──────────────────┼─────────────────────┤
//! │ Next link          │ HttpClient       │ Items at a path     │
//! │ Request header     │ transport_fn     │ Token in body       │
//! │ Callback           │                  │ Header / Link header│
//! └────────────────────┴──────────────────┴─────────────────────┘
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Request and response types
pub mod types;

/// Transport trait and reqwest-backed client
pub mod http;

/// Continuation strategies, page and item iterators
pub mod paging;

/// Declarative paging definitions
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_definition, load_definition_from_str, PagingDefinition};
pub use http::{transport_fn, HttpClient, HttpClientConfig, Transport};
pub use paging::{
    ContinuationStrategy, InitialState, ItemPaged, Page, PageIterator, PagingMethodHandler,
    PagingOptions, TokenLocation,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

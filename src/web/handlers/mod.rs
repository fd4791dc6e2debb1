//! HTML handlers for the proxy front end.

mod go;
mod index;
mod proxy;

pub use go::{go_handler, proxy_location};
pub use index::index_handler;
pub use proxy::{failure_status, gemini_handler, gemini_query, noslash_handler};

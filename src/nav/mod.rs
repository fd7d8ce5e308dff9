//! The browsing core: view states, scrolling, filtering, content routing
//! and incremental loading. Nothing in here performs I/O.

pub mod chunk;
pub mod filter;
pub mod model;
pub mod pagination;
pub mod router;
pub mod state;
pub mod viewport;

//! cr-store: JSON-file record stores for the video catalog, the watch-record
//! log and the grade list.
//!
//! Every collection is one flat JSON array rewritten wholesale on each
//! mutation. There is no cross-request locking; concurrent writers to the
//! same file are last-writer-wins.

pub mod collection;
pub mod models;
pub mod queries;

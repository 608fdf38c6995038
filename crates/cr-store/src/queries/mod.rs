//! Store operations grouped by collection.

pub mod grades;
pub mod stats;
pub mod videos;
pub mod watch_records;

//! Coordination of long-running submission jobs.

pub mod state;

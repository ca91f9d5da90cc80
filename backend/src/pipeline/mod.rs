//! The ingestion pipeline: file parsing, row validation, asynchronous
//! submission and progress derivation.

pub mod parser;
pub mod progress;
pub mod validator;
pub mod worker;

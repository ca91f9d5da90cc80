pub mod progress;
pub mod schema;
pub mod session;

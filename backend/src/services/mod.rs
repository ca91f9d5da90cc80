//! HTTP service modules, one scope per feature area.

pub mod bulk_uploads;

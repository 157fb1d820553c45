//! Data models for scanned accounting documents.

pub mod aggregate;
pub mod config;
pub mod file;
pub mod record;

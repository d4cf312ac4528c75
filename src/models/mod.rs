//! Core data models for backup rotation.
//!
//! A `Catalog` is rebuilt from the live object listing on every run and is
//! never persisted. Retention settings and removal decisions live beside it.

pub mod backup;
pub mod retention;

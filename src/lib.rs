//! relsnap - portable, dependency-ordered JSON snapshots of a relational
//! database
//!
//! Export reads the allow-listed tables inside one read transaction,
//! orders them so referenced tables come first, and writes a single JSON
//! document. Restore validates that document against the live schema and
//! replaces the table contents inside one transaction, or changes nothing.

pub mod backup;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod observability;
pub mod order;
pub mod restore;
pub mod snapshot;
pub mod sqlite;

//! # pg-curator API
//!
//! This crate exposes the types shared between the pg-curator engine and its
//! callers: the error taxonomy, connection and tooling configuration, the
//! discovered schema graph, dynamic SQL values, predicates and the
//! backup/archive bookkeeping records.
//!
//! You can import all the useful types by using the prelude module:
//!
//! ```rust
//! use pg_curator_api::prelude::*;
//! ```

mod archive;
mod backup;
mod config;
mod error;
mod export;
mod mutation;
mod predicate;
pub mod prelude;
mod result_set;
mod schema;
mod value;

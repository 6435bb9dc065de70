//! Grading checks for the SpotifyClone database exercise.
//!
//! A submission is a SQL dump, a role mapping (which table holds plans,
//! users, songs, ...) and a handful of analytical scripts. This crate:
//! - Imports the dump into a fresh schema
//! - Checks normalization through catalog metadata: single-column foreign
//!   keys and composite primary keys
//! - Runs the analytical scripts and compares their views against fixed
//!   result sets
//!
//! # Example
//!
//! ```ignore
//! let db = Database::connect(&config.database).await?;
//! db.reset_schema().await?;
//! db.import(Utf8Path::new("desafio1.sql")).await?;
//!
//! let verifier = db.verifier();
//! assert!(verifier.has_foreign_key("usuario", "plano").await?);
//! assert!(verifier.has_composite_primary_key("historico_reproducao").await?);
//!
//! db.teardown().await?;
//! ```
//!
//! [`grade`] does all of the above for the full challenge and returns a
//! [`Report`].

mod catalog;
mod compare;
mod db;
mod error;
mod report;
mod roles;
mod sql;
pub mod suite;
mod traced;
mod value;

pub use catalog::{TableRef, Verifier};
pub use compare::{RowMismatch, diff_rows, missing_columns};
pub use db::Database;
pub use error::Error;
pub use report::{CheckOutcome, Report};
pub use roles::{Role, RoleMapping};
pub use sql::{Ident, quote_ident};
pub use suite::grade;
pub use traced::{Connection, ConnectionExt, TracedConn};
pub use value::{Record, Value, from_row};

pub use spotcheck_config as config;

/// Result type for spotcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

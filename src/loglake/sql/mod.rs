//! SQL statement construction for the column store.
//!
//! Pure string builders with up-front validation: DDL for source tables,
//! join compilation for multi-table views, and materialized-view statements.
//! Nothing here talks to the network; the sink layer executes what these
//! builders produce.

pub mod ddl;
pub mod error;
pub mod join;
pub mod view;

pub use error::SqlBuildError;
pub use join::{compile_join, derive_alias, JoinEdge, ViewSpec, DEFAULT_REFRESH_MINUTES};

//! Core library for the dpfc-tools command line application.
//!
//! The library turns Data Portal for Cities survey workbooks into one wide
//! row per city and aggregates a directory of them into a single table. IO
//! adapters live under [`io`], the label tables under [`tables`], the long to
//! wide fold in [`reshape`], column ordering in [`merge`] and [`schema`], and
//! the per-collection orchestration under [`batch`].

pub mod batch;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod reshape;
pub mod schema;
pub mod tables;

pub use error::{Result, ToolError};

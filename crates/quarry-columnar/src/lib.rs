//! Columnar batches and cursors for the Quarry query engine.
//!
//! This crate focuses on:
//! - Dense, typed column batches with an optional validity mask.
//! - Forward-only cursors over one or more batches, optionally restricted to a row-id subset.

#![forbid(unsafe_code)]

mod batch;
mod bitmap;
mod cursor;
mod error;
mod row_ids;

pub use crate::batch::{ColumnBatch, ColumnBatchBuilder};
pub use crate::bitmap::BitVec;
pub use crate::cursor::{BatchCursor, RowIdAdapter, ValueAccessor};
pub use crate::error::{ColumnarError, ColumnarResult};
pub use crate::row_ids::RowIdSet;

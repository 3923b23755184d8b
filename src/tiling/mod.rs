//! The tiling/windowing engine.
//!
//! Three pieces, composed by the pipeline:
//!
//! - [`TileSchema`]: validated window/overlap/step configuration.
//! - [`estimate_schema`]: picks the first workable candidate window for the
//!   observed label sizes (the selector).
//! - [`tiles`] / [`generate_offsets`]: the deterministic, gap-free grid of
//!   tile windows over a parent extent.

mod schema;
mod selector;
mod window;

pub use schema::{SchemaError, TileSchema};
pub use selector::{
    estimate_label_bounds, estimate_schema, DEFAULT_QUANTILE, DEFAULT_WINDOW_CANDIDATES,
};
pub use window::{generate_offsets, tiles, TileGrid, Window};

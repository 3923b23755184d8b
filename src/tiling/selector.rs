//! Schema selection from the observed label-size distribution.
//!
//! The overlap between adjacent tiles must be at least the size of a
//! "typical" label, so a label spanning a tile boundary is still fully
//! contained within the overlap margin of at least one tile. Typical is the
//! configured quantile of the per-axis bounding-box extents; candidate
//! window sizes are tried in caller-ranked order and the first workable one
//! wins.

use crate::error::CocotileError;
use crate::labels::LabelCollection;

use super::schema::TileSchema;

/// Quantile of the label-extent distribution treated as the typical label.
pub const DEFAULT_QUANTILE: f64 = 0.9;

/// Candidate window sizes, cheapest first.
pub const DEFAULT_WINDOW_CANDIDATES: &[(u32, u32)] = &[(256, 256), (512, 512)];

/// Per-axis quantile of the label bounding-box extents, in map units.
///
/// Returns `(0.0, 0.0)` for an empty collection, which degrades to a
/// zero-overlap schema downstream.
pub fn estimate_label_bounds(labels: &LabelCollection, quantile: f64) -> (f64, f64) {
    let mut widths: Vec<f64> = Vec::with_capacity(labels.len());
    let mut heights: Vec<f64> = Vec::with_capacity(labels.len());
    for label in labels.iter() {
        let bounds = label.geometry.bounds();
        widths.push(bounds.width());
        heights.push(bounds.height());
    }
    (quantile_of(&mut widths, quantile), quantile_of(&mut heights, quantile))
}

/// Linear-interpolated quantile over an unsorted sample.
fn quantile_of(values: &mut [f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("label extents are finite"));
    let q = quantile.clamp(0.0, 1.0);
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        let frac = pos - lo as f64;
        values[lo] * (1.0 - frac) + values[hi] * frac
    }
}

/// Picks the first candidate window able to carry the overlap the labels
/// require at the given raster resolution.
///
/// The overlap per axis is the quantile label extent converted to pixels,
/// rounded up; the ceil is what later forces all-touched rasterization so
/// boundary pixels are never lost. When every candidate fails, the last
/// schema error is chained as the cause.
pub fn estimate_schema(
    labels: &LabelCollection,
    resolution: (f64, f64),
    quantile: f64,
    candidates: &[(u32, u32)],
) -> Result<TileSchema, CocotileError> {
    let candidates = if candidates.is_empty() {
        DEFAULT_WINDOW_CANDIDATES
    } else {
        candidates
    };

    let (avg_w, avg_h) = estimate_label_bounds(labels, quantile);
    let overlap_w = (avg_w / resolution.0).ceil() as u32;
    let overlap_h = (avg_h / resolution.1).ceil() as u32;

    let mut last_err = None;
    for &(window_w, window_h) in candidates {
        match TileSchema::new(window_w, window_h, overlap_w, overlap_h) {
            Ok(schema) => return Ok(schema),
            Err(err) => last_err = Some(err),
        }
    }

    Err(CocotileError::NoViableSchema {
        candidates: candidates.to_vec(),
        source: last_err.expect("candidate list is non-empty"),
    })
}

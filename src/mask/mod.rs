//! Per-tile label masking.
//!
//! [`rasterize`] burns a map-space geometry onto a tile's pixel grid using
//! the all-touched rule: any pixel whose square is touched by the geometry
//! counts as covered, not just pixels whose center falls inside. The overlap
//! margin is sized with a `ceil`, so boundary-aligned and sub-pixel features
//! must not be dropped by center sampling.
//!
//! Implementation: even-odd scanline fill at pixel centers for the
//! interior, plus a grid traversal of every ring segment for the boundary.

pub mod rle;

use crate::geom::{Geometry, Polygon};
use crate::raster::GeoTransform;

/// A binary mask over a tile's pixel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, col: u32, row: u32) -> bool {
        self.data[row as usize * self.width as usize + col as usize]
    }

    #[inline]
    pub fn set(&mut self, col: u32, row: u32, value: bool) {
        self.data[row as usize * self.width as usize + col as usize] = value;
    }

    /// Bounds-checked set accepting signed cell coordinates.
    #[inline]
    fn mark(&mut self, col: i64, row: i64) {
        if col >= 0 && row >= 0 && col < self.width as i64 && row < self.height as i64 {
            self.set(col as u32, row as u32, true);
        }
    }

    /// True if any pixel is set.
    pub fn any(&self) -> bool {
        self.data.iter().any(|&v| v)
    }

    /// Foreground pixel count.
    pub fn count(&self) -> u64 {
        self.data.iter().filter(|&&v| v).count() as u64
    }
}

/// Rasterizes `geometry` against a `width`×`height` pixel grid whose pixel
/// (0, 0) is georeferenced by `transform`.
///
/// Returns an all-false mask when the geometry misses the grid entirely;
/// that is the expected majority case over a sparse label set, not an
/// error.
pub fn rasterize(
    geometry: &Geometry,
    transform: &GeoTransform,
    width: u32,
    height: u32,
) -> Mask {
    let mut mask = Mask::new(width, height);
    for polygon in geometry.polygons() {
        burn_polygon(polygon, transform, &mut mask);
    }
    mask
}

/// One ring, already projected into fractional pixel coordinates.
type PixelRing = Vec<(f64, f64)>;

fn burn_polygon(polygon: &Polygon, transform: &GeoTransform, mask: &mut Mask) {
    let rings: Vec<PixelRing> = std::iter::once(&polygon.exterior)
        .chain(polygon.interiors.iter())
        .map(|ring| {
            ring.iter()
                .map(|p| transform.map_to_pixel(p.x, p.y))
                .collect()
        })
        .collect();

    fill_interior(&rings, mask);
    for ring in &rings {
        trace_boundary(ring, mask);
    }
}

/// Even-odd scanline fill at pixel centers across all rings, so holes are
/// left unfilled.
fn fill_interior(rings: &[PixelRing], mask: &mut Mask) {
    let mut crossings: Vec<f64> = Vec::new();
    for row in 0..mask.height {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            let n = ring.len();
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if (y0 > yc) != (y1 > yc) {
                    crossings.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).expect("finite pixel coordinates"));
        for span in crossings.chunks_exact(2) {
            // pixel centers inside [span.0, span.1)
            let first = (span[0] - 0.5).ceil().max(0.0) as i64;
            let last = ((span[1] - 0.5).floor() as i64).min(mask.width as i64 - 1);
            for col in first..=last {
                // center exactly on the right crossing stays outside
                if (col as f64 + 0.5) < span[1] {
                    mask.mark(col, row as i64);
                }
            }
        }
    }
}

/// Marks every grid cell a ring segment passes through (Amanatides-Woo
/// traversal), which is what turns center sampling into all-touched.
fn trace_boundary(ring: &PixelRing, mask: &mut Mask) {
    let n = ring.len();
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        trace_segment(x0, y0, x1, y1, mask);
    }
}

fn trace_segment(x0: f64, y0: f64, x1: f64, y1: f64, mask: &mut Mask) {
    let mut cx = x0.floor() as i64;
    let mut cy = y0.floor() as i64;
    let end_cx = x1.floor() as i64;
    let end_cy = y1.floor() as i64;

    mask.mark(cx, cy);

    let dx = x1 - x0;
    let dy = y1 - y0;
    let step_x: i64 = if dx > 0.0 { 1 } else { -1 };
    let step_y: i64 = if dy > 0.0 { 1 } else { -1 };

    // Parametric distance to the next vertical/horizontal cell boundary.
    let mut t_max_x = if dx == 0.0 {
        f64::INFINITY
    } else {
        let next = if dx > 0.0 { cx as f64 + 1.0 } else { cx as f64 };
        (next - x0) / dx
    };
    let mut t_max_y = if dy == 0.0 {
        f64::INFINITY
    } else {
        let next = if dy > 0.0 { cy as f64 + 1.0 } else { cy as f64 };
        (next - y0) / dy
    };
    let t_delta_x = if dx == 0.0 { f64::INFINITY } else { (1.0 / dx).abs() };
    let t_delta_y = if dy == 0.0 { f64::INFINITY } else { (1.0 / dy).abs() };

    // Cell count along the segment bounds the walk against float edge
    // cases at shared corners.
    let mut remaining = (end_cx - cx).abs() + (end_cy - cy).abs() + 1;
    while (cx != end_cx || cy != end_cy) && remaining > 0 {
        if t_max_x <= t_max_y {
            t_max_x += t_delta_x;
            cx += step_x;
        } else {
            t_max_y += t_delta_y;
            cy += step_y;
        }
        mask.mark(cx, cy);
        remaining -= 1;
    }
}

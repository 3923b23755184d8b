//! Deterministic tile windows over a parent pixel extent.
//!
//! Offsets are the cartesian product of two clamped arithmetic sequences,
//! ordered row-major (all columns for a row before advancing the row). The
//! grid is a pure function of the parent extent and the schema: no
//! randomness, no historical state, restartable at will.

use super::schema::TileSchema;

/// An integer pixel rectangle relative to the raster's pixel grid.
///
/// Offsets may be negative for boundless tiles hanging off the parent's
/// edge; dimensions are always non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    col_off: i64,
    row_off: i64,
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(col_off: i64, row_off: i64, width: u32, height: u32) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    #[inline]
    pub fn col_off(&self) -> i64 {
        self.col_off
    }

    #[inline]
    pub fn row_off(&self) -> i64 {
        self.row_off
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The rectangle shared with `other`; zero-sized when disjoint.
    pub fn intersection(&self, other: &Window) -> Window {
        let col_off = self.col_off.max(other.col_off);
        let row_off = self.row_off.max(other.row_off);
        let col_end = (self.col_off + self.width as i64).min(other.col_off + other.width as i64);
        let row_end = (self.row_off + self.height as i64).min(other.row_off + other.height as i64);
        Window {
            col_off,
            row_off,
            width: (col_end - col_off).max(0) as u32,
            height: (row_end - row_off).max(0) as u32,
        }
    }
}

/// The clamped arithmetic sequence of tile origins along one axis.
///
/// Starts at `max(0, off − overlap)` and steps below `off + extent −
/// overlap`. When the window dwarfs the parent the open range would be
/// empty; the clamped start is still emitted so the axis gets its single
/// covering tile.
fn axis_offsets(off: i64, extent: u32, overlap: u32, step: u32) -> Vec<i64> {
    let start = (off - overlap as i64).max(0);
    let end = off + extent as i64 - overlap as i64;
    let mut offsets = Vec::new();
    let mut v = start;
    while v < end {
        offsets.push(v);
        v += step as i64;
    }
    if offsets.is_empty() {
        offsets.push(start);
    }
    offsets
}

/// All `(col_off, row_off)` pairs for tiles of `schema` bound by `parent`,
/// row-major.
pub fn generate_offsets(parent: &Window, schema: &TileSchema) -> Vec<(i64, i64)> {
    let cols = axis_offsets(
        parent.col_off(),
        parent.width(),
        schema.overlap_w(),
        schema.step_w(),
    );
    let rows = axis_offsets(
        parent.row_off(),
        parent.height(),
        schema.overlap_h(),
        schema.step_h(),
    );
    let mut offsets = Vec::with_capacity(cols.len() * rows.len());
    for &row in &rows {
        for &col in &cols {
            offsets.push((col, row));
        }
    }
    offsets
}

/// Lazily yields one tile [`Window`] per offset pair.
///
/// With `boundless = false` each tile is clipped to the parent; with
/// `boundless = true` tiles may extend past it (consumers pad out-of-range
/// reads with nodata). The iterator is `Clone`, finite, and exact-sized.
pub fn tiles(parent: &Window, schema: &TileSchema, boundless: bool) -> TileGrid {
    TileGrid {
        cols: axis_offsets(
            parent.col_off(),
            parent.width(),
            schema.overlap_w(),
            schema.step_w(),
        ),
        rows: axis_offsets(
            parent.row_off(),
            parent.height(),
            schema.overlap_h(),
            schema.step_h(),
        ),
        window_w: schema.window_w(),
        window_h: schema.window_h(),
        parent: *parent,
        boundless,
        next: 0,
    }
}

/// Iterator over the tile grid. See [`tiles`].
#[derive(Clone, Debug)]
pub struct TileGrid {
    cols: Vec<i64>,
    rows: Vec<i64>,
    window_w: u32,
    window_h: u32,
    parent: Window,
    boundless: bool,
    next: usize,
}

impl Iterator for TileGrid {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.next >= self.cols.len() * self.rows.len() {
            return None;
        }
        let row = self.rows[self.next / self.cols.len()];
        let col = self.cols[self.next % self.cols.len()];
        self.next += 1;

        let tile = Window::new(col, row, self.window_w, self.window_h);
        if self.boundless {
            Some(tile)
        } else {
            Some(tile.intersection(&self.parent))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cols.len() * self.rows.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileGrid {}

//! The raster collaborator interface.
//!
//! Raster pixel I/O is external to cocotile: the pipeline only requires the
//! small [`RasterSource`] contract below: pixel reads over an arbitrary
//! window (boundless, padded with the declared nodata value), an affine
//! georeferencing transform, and a CRS identifier. [`MemoryRaster`] is the
//! in-memory implementation used by tests and small inputs; GeoTIFF-backed
//! sources live outside this crate.

use std::path::{Path, PathBuf};

use crate::error::CocotileError;
use crate::geom::{MapRect, Point};
use crate::tiling::Window;

/// Affine pixel-to-map transform with rasterio-style coefficients:
/// `x = a·col + b·row + c`, `y = d·col + e·row + f`.
///
/// For the common north-up raster, `b = d = 0`, `a > 0` and `e < 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from an origin (upper-left corner) and per-axis
    /// pixel sizes. `pixel_h` is the positive pixel height; the row
    /// coefficient is negated internally.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_w: f64, pixel_h: f64) -> Self {
        Self::new(pixel_w, 0.0, origin_x, 0.0, -pixel_h, origin_y)
    }

    /// Map coordinates of a (fractional) pixel position.
    #[inline]
    pub fn pixel_to_map(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Inverse mapping: map coordinates to fractional pixel position.
    ///
    /// The 2×2 linear part must be invertible, which holds for any raster
    /// with nonzero pixel sizes.
    #[inline]
    pub fn map_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.a * self.e - self.b * self.d;
        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (self.a * dy - self.d * dx) / det;
        (col, row)
    }

    /// Absolute pixel size per axis `(x, y)`.
    #[inline]
    pub fn resolution(&self) -> (f64, f64) {
        (
            (self.a * self.a + self.d * self.d).sqrt(),
            (self.b * self.b + self.e * self.e).sqrt(),
        )
    }

    /// Shift the transform so pixel (0, 0) maps to where `(col_off, row_off)`
    /// mapped before. Used to georeference tile windows.
    pub fn for_window(&self, col_off: i64, row_off: i64) -> GeoTransform {
        let origin = self.pixel_to_map(col_off as f64, row_off as f64);
        GeoTransform {
            c: origin.x,
            f: origin.y,
            ..*self
        }
    }

    /// Map-space bounds of a `width`×`height` pixel grid under this
    /// transform.
    pub fn grid_bounds(&self, width: u32, height: u32) -> MapRect {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_map(0.0, 0.0),
            self.pixel_to_map(w, 0.0),
            self.pixel_to_map(0.0, h),
            self.pixel_to_map(w, h),
        ];
        let mut rect = MapRect::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for p in corners {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        rect
    }
}

/// A block of pixels read from a raster, band-major
/// (`data[band][row][col]` flattened).
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub bands: u32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
}

impl PixelBuffer {
    pub fn new(bands: u32, width: u32, height: u32, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            (bands as usize) * (width as usize) * (height as usize),
            "pixel buffer length must equal bands*width*height"
        );
        Self {
            bands,
            width,
            height,
            data,
        }
    }

    /// A buffer filled with a constant value.
    pub fn filled(bands: u32, width: u32, height: u32, value: f64) -> Self {
        let n = (bands as usize) * (width as usize) * (height as usize);
        Self::new(bands, width, height, vec![value; n])
    }

    #[inline]
    pub fn get(&self, band: u32, row: u32, col: u32) -> f64 {
        let idx = (band as usize * self.height as usize + row as usize) * self.width as usize
            + col as usize;
        self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, band: u32, row: u32, col: u32, value: f64) {
        let idx = (band as usize * self.height as usize + row as usize) * self.width as usize
            + col as usize;
        self.data[idx] = value;
    }

    /// Min-max normalization of the whole buffer into the u8 range, the COCO
    /// artifact dtype. A constant buffer maps to all zeros.
    pub fn to_u8_normalized(&self) -> Vec<u8> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() || max <= min {
            return vec![0u8; self.data.len()];
        }
        let scale = 255.0 / (max - min);
        self.data
            .iter()
            .map(|&v| ((v - min) * scale).round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

/// The contract an ingestible raster must satisfy.
///
/// Reads are boundless: the requested window may extend past the raster's
/// own extent and out-of-range pixels are filled with the declared nodata
/// value (0 when none is declared).
pub trait RasterSource {
    /// Identity of the raster, the `Source.file_name` key in the dataset.
    fn file_name(&self) -> &Path;

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn band_count(&self) -> u32;

    fn transform(&self) -> GeoTransform;

    /// Coordinate reference identifier, e.g. `"EPSG:32631"`.
    fn crs(&self) -> &str;

    fn nodata(&self) -> Option<f64>;

    /// Read a pixel window. Out-of-bounds pixels are nodata-filled.
    fn read(&self, window: &Window) -> Result<PixelBuffer, CocotileError>;

    /// Absolute pixel size per axis `(x, y)`.
    fn resolution(&self) -> (f64, f64) {
        self.transform().resolution()
    }

    /// Map-space bounds of the full extent.
    fn bounds(&self) -> MapRect {
        self.transform().grid_bounds(self.width(), self.height())
    }

    /// The window covering the full extent.
    fn full_window(&self) -> Window {
        Window::new(0, 0, self.width(), self.height())
    }
}

/// In-memory raster, the reference [`RasterSource`] implementation.
#[derive(Clone, Debug)]
pub struct MemoryRaster {
    file_name: PathBuf,
    bands: u32,
    width: u32,
    height: u32,
    data: Vec<f64>,
    transform: GeoTransform,
    crs: String,
    nodata: Option<f64>,
    closed: bool,
}

impl MemoryRaster {
    pub fn new(
        file_name: impl Into<PathBuf>,
        bands: u32,
        width: u32,
        height: u32,
        data: Vec<f64>,
        transform: GeoTransform,
        crs: impl Into<String>,
        nodata: Option<f64>,
    ) -> Self {
        assert_eq!(
            data.len(),
            (bands as usize) * (width as usize) * (height as usize),
            "raster data length must equal bands*width*height"
        );
        Self {
            file_name: file_name.into(),
            bands,
            width,
            height,
            data,
            transform,
            crs: crs.into(),
            nodata,
            closed: false,
        }
    }

    /// Release the raster. Subsequent reads fail with
    /// [`CocotileError::RasterClosed`].
    pub fn close(&mut self) {
        self.closed = true;
        self.data = Vec::new();
    }

    fn fill_value(&self) -> f64 {
        self.nodata.unwrap_or(0.0)
    }
}

impl RasterSource for MemoryRaster {
    fn file_name(&self) -> &Path {
        &self.file_name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn band_count(&self) -> u32 {
        self.bands
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn crs(&self) -> &str {
        &self.crs
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn read(&self, window: &Window) -> Result<PixelBuffer, CocotileError> {
        if self.closed {
            return Err(CocotileError::RasterClosed(
                self.file_name.display().to_string(),
            ));
        }
        let mut out = PixelBuffer::filled(self.bands, window.width(), window.height(), self.fill_value());
        for band in 0..self.bands {
            for row in 0..window.height() {
                let src_row = window.row_off() + row as i64;
                if src_row < 0 || src_row >= self.height as i64 {
                    continue;
                }
                for col in 0..window.width() {
                    let src_col = window.col_off() + col as i64;
                    if src_col < 0 || src_col >= self.width as i64 {
                        continue;
                    }
                    let idx = (band as usize * self.height as usize + src_row as usize)
                        * self.width as usize
                        + src_col as usize;
                    out.set(band, row, col, self.data[idx]);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_raster() -> MemoryRaster {
        // 4x4 single band, values 0..16 row-major, 1m pixels anchored at
        // (100, 200) going north-up.
        let data: Vec<f64> = (0..16).map(f64::from).collect();
        MemoryRaster::new(
            "test.tif",
            1,
            4,
            4,
            data,
            GeoTransform::north_up(100.0, 200.0, 1.0, 1.0),
            "EPSG:32631",
            Some(-1.0),
        )
    }

    #[test]
    fn transform_roundtrip() {
        let t = GeoTransform::north_up(100.0, 200.0, 0.5, 0.5);
        let p = t.pixel_to_map(10.0, 20.0);
        assert_eq!(p, Point::new(105.0, 190.0));
        let (col, row) = t.map_to_pixel(p.x, p.y);
        assert!((col - 10.0).abs() < 1e-9);
        assert!((row - 20.0).abs() < 1e-9);
    }

    #[test]
    fn resolution_from_transform() {
        let t = GeoTransform::north_up(0.0, 0.0, 0.25, 0.5);
        assert_eq!(t.resolution(), (0.25, 0.5));
    }

    #[test]
    fn bounds_are_min_max_ordered() {
        let src = small_raster();
        let b = src.bounds();
        assert_eq!(b, MapRect::new(100.0, 196.0, 104.0, 200.0));
    }

    #[test]
    fn read_within_bounds() {
        let src = small_raster();
        let buf = src.read(&Window::new(1, 1, 2, 2)).unwrap();
        assert_eq!(buf.get(0, 0, 0), 5.0);
        assert_eq!(buf.get(0, 1, 1), 10.0);
    }

    #[test]
    fn boundless_read_pads_with_nodata() {
        let src = small_raster();
        let buf = src.read(&Window::new(-1, -1, 3, 3)).unwrap();
        assert_eq!(buf.get(0, 0, 0), -1.0);
        assert_eq!(buf.get(0, 1, 1), 0.0);
        assert_eq!(buf.get(0, 2, 2), 5.0);
    }

    #[test]
    fn read_after_close_fails() {
        let mut src = small_raster();
        src.close();
        let err = src.read(&Window::new(0, 0, 2, 2)).unwrap_err();
        assert!(matches!(err, CocotileError::RasterClosed(_)));
    }

    #[test]
    fn normalize_constant_buffer_is_zero() {
        let buf = PixelBuffer::filled(1, 2, 2, 7.0);
        assert_eq!(buf.to_u8_normalized(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn normalize_spans_full_u8_range() {
        let buf = PixelBuffer::new(1, 2, 2, vec![0.0, 50.0, 100.0, 25.0]);
        let out = buf.to_u8_normalized();
        assert_eq!(out[0], 0);
        assert_eq!(out[2], 255);
        assert_eq!(out[1], 128);
    }
}

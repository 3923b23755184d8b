//! Map-space geometry for label footprints and tile extents.
//!
//! Labels arrive as polygons (optionally with holes) or multipolygons in the
//! raster's coordinate reference system. This module provides just enough
//! geometry to drive the tiling pipeline: bounding boxes, even-odd point
//! containment, and polygon/rectangle intersection tests. Coordinates are
//! `f64` map units throughout; pixel-space work happens in [`crate::mask`].

use serde::{Deserialize, Serialize};

/// A point in map coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in map coordinates.
///
/// Used for raster bounds, label bounds, and tile footprints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MapRect {
    #[inline]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &MapRect) -> MapRect {
        MapRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns true if the rectangles share any area or boundary.
    #[inline]
    pub fn intersects(&self, other: &MapRect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns true if `p` lies inside or on the boundary.
    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// The four corners, counter-clockwise from the minimum corner.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// The four edges as closed segments.
    pub fn edges(&self) -> [(Point, Point); 4] {
        let c = self.corners();
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }
}

/// A polygon with one exterior ring and zero or more interior rings (holes).
///
/// Rings need not repeat the first vertex; closure is implicit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interiors: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    pub fn with_interiors(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Axis-aligned bounding box of the exterior ring.
    pub fn bounds(&self) -> MapRect {
        ring_bounds(&self.exterior)
    }

    /// Even-odd containment across all rings, so points inside a hole are
    /// outside the polygon.
    pub fn contains_point(&self, p: Point) -> bool {
        let mut inside = point_in_ring(p, &self.exterior);
        for ring in &self.interiors {
            if point_in_ring(p, ring) {
                inside = !inside;
            }
        }
        inside
    }

    /// All ring segments (exterior and holes), with implicit closure.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        std::iter::once(&self.exterior)
            .chain(self.interiors.iter())
            .flat_map(|ring| ring_segments(ring))
    }

    /// Returns true if the polygon and the rectangle share any area or
    /// boundary.
    pub fn intersects_rect(&self, rect: &MapRect) -> bool {
        if !self.bounds().intersects(rect) {
            return false;
        }
        // Any vertex inside the rect, or any rect corner inside the polygon,
        // settles it without edge tests.
        if self.exterior.iter().any(|&p| rect.contains_point(p)) {
            return true;
        }
        if rect.corners().iter().any(|&c| self.contains_point(c)) {
            return true;
        }
        // Remaining case: boundary crossing without vertex containment.
        let rect_edges = rect.edges();
        self.segments()
            .any(|(a, b)| rect_edges.iter().any(|&(c, d)| segments_intersect(a, b, c, d)))
    }
}

/// A label footprint: a single polygon or a multi-part polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// Returns true for multi-part geometries. Drives the COCO `iscrowd`
    /// flag at annotation emission time.
    pub fn is_multi(&self) -> bool {
        matches!(self, Geometry::MultiPolygon(_))
    }

    /// The constituent polygons, one for `Polygon`, all parts for
    /// `MultiPolygon`.
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(ps) => ps,
        }
    }

    pub fn bounds(&self) -> MapRect {
        let mut iter = self.polygons().iter();
        let mut bounds = iter
            .next()
            .map(|p| p.bounds())
            .unwrap_or_else(|| MapRect::new(0.0, 0.0, 0.0, 0.0));
        for p in iter {
            bounds = bounds.union(&p.bounds());
        }
        bounds
    }

    pub fn intersects_rect(&self, rect: &MapRect) -> bool {
        self.polygons().iter().any(|p| p.intersects_rect(rect))
    }
}

fn ring_bounds(ring: &[Point]) -> MapRect {
    let mut bounds = MapRect::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in ring {
        bounds.min_x = bounds.min_x.min(p.x);
        bounds.min_y = bounds.min_y.min(p.y);
        bounds.max_x = bounds.max_x.max(p.x);
        bounds.max_y = bounds.max_y.max(p.y);
    }
    bounds
}

fn ring_segments(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// Even-odd ray cast against a single ring.
fn point_in_ring(p: Point, ring: &[Point]) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if ((a.y > p.y) != (b.y > p.y))
            && (p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Orientation of the ordered triple (a, b, c): 0 collinear, 1 clockwise,
/// 2 counter-clockwise.
fn orientation(a: Point, b: Point, c: Point) -> u8 {
    let v = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if v == 0.0 {
        0
    } else if v > 0.0 {
        1
    } else {
        2
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x <= a.x.max(b.x) && p.x >= a.x.min(b.x) && p.y <= a.y.max(b.y) && p.y >= a.y.min(b.y)
}

/// Closed-segment intersection test, counting collinear overlap and shared
/// endpoints as intersecting.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}

//! The vector-label collaborator.
//!
//! A [`LabelCollection`] is the tabular geometry source the pipeline
//! consumes: one row per annotation feature, each with a polygon or
//! multipolygon footprint and optional category attribute columns. Rows are
//! assumed pre-validated (non-null, valid geometry, CRS matching the
//! raster); schema validation of the upstream file format happens outside
//! this crate.

use crate::geom::{Geometry, MapRect};

/// One label row: a footprint plus optional category attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub geometry: Geometry,
    pub category_id: Option<u64>,
    pub category_name: Option<String>,
    pub supercategory: Option<String>,
}

impl Label {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            category_id: None,
            category_name: None,
            supercategory: None,
        }
    }

    pub fn with_category_id(mut self, id: u64) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn with_category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn with_supercategory(mut self, supercategory: impl Into<String>) -> Self {
        self.supercategory = Some(supercategory.into());
        self
    }
}

/// All label rows for one ingestion run, tagged with their CRS identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelCollection {
    labels: Vec<Label>,
    crs: String,
}

impl LabelCollection {
    pub fn new(crs: impl Into<String>) -> Self {
        Self {
            labels: Vec::new(),
            crs: crs.into(),
        }
    }

    pub fn from_labels(crs: impl Into<String>, labels: Vec<Label>) -> Self {
        Self {
            labels,
            crs: crs.into(),
        }
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }

    pub fn get(&self, index: usize) -> &Label {
        &self.labels[index]
    }

    /// Union of all label footprint bounds, `None` for an empty collection.
    pub fn bounds(&self) -> Option<MapRect> {
        let mut iter = self.labels.iter();
        let mut bounds = iter.next()?.geometry.bounds();
        for label in iter {
            bounds = bounds.union(&label.geometry.bounds());
        }
        Some(bounds)
    }

    /// Indices of labels whose footprint intersects `rect`, in row order.
    pub fn intersecting(&self, rect: &MapRect) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.geometry.intersects_rect(rect))
            .map(|(i, _)| i)
            .collect()
    }

    /// The category-id column, present only when every row carries it.
    pub fn category_id_column(&self) -> Option<Vec<u64>> {
        self.labels.iter().map(|l| l.category_id).collect()
    }

    /// The category-name column, present only when every row carries it.
    pub fn category_name_column(&self) -> Option<Vec<String>> {
        self.labels
            .iter()
            .map(|l| l.category_name.clone())
            .collect()
    }

    /// The supercategory column, present only when every row carries it.
    pub fn supercategory_column(&self) -> Option<Vec<String>> {
        self.labels
            .iter()
            .map(|l| l.supercategory.clone())
            .collect()
    }
}

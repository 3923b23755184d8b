//! The records of the persisted dataset document.
//!
//! These mirror the COCO annotation format, extended with the `sources`
//! table that keys the incremental versioning policy. All records except
//! [`Info`] are immutable once appended to the aggregate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ids::{AnnotationId, CategoryId, ImageId, SourceId};

/// Dataset metadata. The only mutable record: the version string advances
/// with every ingestion run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Three-component semantic version, monotonically advanced.
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,

    /// ISO 8601 creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            version: "0.0.0".to_string(),
            year: None,
            description: None,
            contributor: None,
            date_created: None,
        }
    }
}

/// One distinct raster ever ingested into the dataset. Identity key is
/// `file_name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub file_name: PathBuf,
}

/// A class label in the category table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub supercategory: String,
}

impl Category {
    pub fn new(
        id: impl Into<CategoryId>,
        name: impl Into<String>,
        supercategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: supercategory.into(),
        }
    }
}

/// One emitted tile that contained at least one non-empty mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
    pub file_name: PathBuf,
    pub source_id: SourceId,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        width: u32,
        height: u32,
        file_name: impl Into<PathBuf>,
        source_id: impl Into<SourceId>,
    ) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            file_name: file_name.into(),
            source_id: source_id.into(),
        }
    }
}

/// A COCO-compatible RLE segmentation: `size` is `[height, width]`,
/// `counts` the LEB128-like character encoding of the column-major runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleSeg {
    pub size: [u32; 2],
    pub counts: String,
}

/// One non-empty intersected label within a tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub segmentation: RleSeg,
    /// Integer pixel area: the mask's foreground count.
    pub area: u64,
    /// `[x, y, w, h]` of the foreground pixels, in tile pixel coordinates.
    pub bbox: [f64; 4],
    /// 1 when the source geometry was a multi-part polygon, else 0.
    pub iscrowd: u8,
}

impl Annotation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        segmentation: RleSeg,
        area: u64,
        bbox: [f64; 4],
        iscrowd: u8,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            segmentation,
            area,
            bbox,
            iscrowd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_defaults_to_version_zero() {
        assert_eq!(Info::default().version, "0.0.0");
    }

    #[test]
    fn annotation_serializes_with_rle_dict() {
        let ann = Annotation::new(
            1u64,
            1u64,
            3u64,
            RleSeg {
                size: [256, 256],
                counts: "b3c1".to_string(),
            },
            10,
            [1.0, 2.0, 3.0, 4.0],
            0,
        );
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["segmentation"]["size"][0], 256);
        assert_eq!(json["category_id"], 3);
        assert_eq!(json["iscrowd"], 0);
    }
}

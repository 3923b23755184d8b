//! JSON persistence of the dataset document.
//!
//! The document is one JSON object mirroring the aggregate's public fields
//! (`info`, `images`, `annotations`, `categories`, `sources`). Counters are
//! derived on load, never stored: [`load_dataset`] recomputes them from the
//! collection lengths so that a serialize/deserialize round-trip reproduces
//! an identical aggregate.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::CocotileError;

use super::aggregate::Dataset;
use super::model::Info;

/// Reads a dataset document from a JSON file and syncs its counters.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_dataset(path: &Path) -> Result<Dataset, CocotileError> {
    let file = File::open(path).map_err(CocotileError::Io)?;
    let reader = BufReader::new(file);

    let mut dataset: Dataset =
        serde_json::from_reader(reader).map_err(|source| CocotileError::DatasetParse {
            path: path.to_path_buf(),
            source,
        })?;
    dataset.sync_counters();
    Ok(dataset)
}

/// Writes a dataset document as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<(), CocotileError> {
    let file = File::create(path).map_err(CocotileError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, dataset).map_err(|source| CocotileError::DatasetWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// A new empty dataset at version `0.0.0` with the given metadata.
pub fn create_dataset(
    description: impl Into<String>,
    contributor: impl Into<String>,
    year: Option<i32>,
    date_created: Option<String>,
) -> Dataset {
    Dataset::new(Info {
        version: "0.0.0".to_string(),
        year,
        description: Some(description.into()),
        contributor: Some(contributor.into()),
        date_created,
    })
}

/// Reads a dataset from a JSON string. Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let mut dataset: Dataset = serde_json::from_str(json)?;
    dataset.sync_counters();
    Ok(dataset)
}

/// Writes a dataset to a JSON string. Useful for testing without file I/O.
pub fn to_json_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ids::{AnnotationId, ImageId, SourceId};
    use crate::dataset::model::{Annotation, Image, RleSeg};
    use std::path::PathBuf;

    fn populated_dataset() -> Dataset {
        let mut dataset = create_dataset("roofs", "surveyor", Some(2024), None);
        dataset.add_source(Path::new("scene.tif")).unwrap();
        dataset
            .add_categories(Some(&[2, 7]), None, None)
            .unwrap();
        dataset.add_annotation(Annotation::new(
            dataset.next_annotation_id(),
            dataset.next_image_id(),
            2u64,
            RleSeg {
                size: [64, 64],
                counts: "b28".to_string(),
            },
            40,
            [3.0, 4.0, 5.0, 8.0],
            0,
        ));
        dataset.add_image(Image::new(
            dataset.next_image_id(),
            64,
            64,
            PathBuf::from("out/1_0_0_64_64.png"),
            dataset.next_source_id(),
        ));
        dataset
    }

    #[test]
    fn string_roundtrip_reproduces_every_field() {
        let dataset = populated_dataset();
        let json = to_json_string(&dataset).unwrap();
        let back = from_json_str(&json).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn counters_recomputed_on_load() {
        let dataset = populated_dataset();
        let back = from_json_str(&to_json_string(&dataset).unwrap()).unwrap();
        assert_eq!(back.next_image_id(), ImageId(2));
        assert_eq!(back.next_annotation_id(), AnnotationId(2));
        assert_eq!(back.next_source_id(), SourceId(1));
    }

    #[test]
    fn counters_are_not_serialized() {
        let json = to_json_string(&populated_dataset()).unwrap();
        assert!(!json.contains("next_image_id"));
        assert!(!json.contains("next_annotation_id"));
        assert!(!json.contains("next_source_id"));
    }

    #[test]
    fn create_dataset_starts_at_version_zero() {
        let dataset = create_dataset("d", "c", None, None);
        assert_eq!(dataset.info.version, "0.0.0");
        assert!(dataset.images.is_empty());
        assert!(dataset.sources.is_empty());
    }
}

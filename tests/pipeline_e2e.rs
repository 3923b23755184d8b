//! End-to-end ingestion over an in-memory raster.
//!
//! Exercises the full run: overlap validation, source registration and
//! version bumps, category reconciliation, schema estimation, the tile
//! walk, artifact writing, and deterministic ID assignment.

use std::path::Path;

use cocotile::dataset::{create_dataset, Dataset};
use cocotile::error::CocotileError;
use cocotile::geom::{Geometry, Point, Polygon};
use cocotile::labels::{Label, LabelCollection};
use cocotile::mask::rle;
use cocotile::pipeline::{labels_to_dataset, IngestOptions};
use cocotile::raster::{GeoTransform, MemoryRaster};

const CRS: &str = "EPSG:32631";

/// 64x64 single-band raster, 1m pixels, origin (0, 64), north-up: pixel
/// (col, row) covers map x in [col, col+1], y in [63-row, 64-row].
fn scene(name: &str) -> MemoryRaster {
    let data: Vec<f64> = (0..64 * 64).map(|i| (i % 251) as f64).collect();
    MemoryRaster::new(
        name,
        1,
        64,
        64,
        data,
        GeoTransform::north_up(0.0, 64.0, 1.0, 1.0),
        CRS,
        Some(0.0),
    )
}

fn square(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::Polygon(Polygon::new(vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
    ]))
}

/// Two square labels with explicit category ids.
///
/// Sizes 4m and 6m give a 0.9-quantile extent of 5.8m, hence a 6px overlap
/// and a 20px step for the 32px window: tile origins at 0, 20 and 40 per
/// axis. Both labels sit strictly inside one tile's exclusive region, away
/// from any overlap margin.
fn scene_labels() -> LabelCollection {
    LabelCollection::from_labels(
        CRS,
        vec![
            Label::new(square(10.0, 50.0, 4.0)).with_category_id(7),
            Label::new(square(54.0, 4.0, 6.0)).with_category_id(3),
        ],
    )
}

fn options() -> IngestOptions {
    IngestOptions {
        quantile: 0.9,
        window_candidates: vec![(32, 32)],
        progress: false,
    }
}

fn fresh_dataset() -> Dataset {
    create_dataset("e2e", "tester", Some(2024), None)
}

#[test]
fn first_run_populates_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = scene_labels();
    let mut dataset = fresh_dataset();

    labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap();

    // new source (minor) then new output dir (major)
    assert_eq!(dataset.info.version, "1.0.0");
    assert_eq!(dataset.sources.len(), 1);

    // categories arrive deduplicated, id-sorted, with ids as names
    let cat_ids: Vec<u64> = dataset.categories.iter().map(|c| c.id.as_u64()).collect();
    let cat_names: Vec<&str> = dataset.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cat_ids, vec![3, 7]);
    assert_eq!(cat_names, vec!["3", "7"]);

    // each label lands in exactly one tile of the 3x3 grid
    assert_eq!(dataset.images.len(), 2);
    assert_eq!(dataset.annotations.len(), 2);
    assert_eq!(dataset.images[0].id.as_u64(), 1);
    assert_eq!(dataset.images[1].id.as_u64(), 2);
    assert_eq!(dataset.annotations[0].id.as_u64(), 1);
    assert_eq!(dataset.annotations[1].id.as_u64(), 2);

    // row-major tile order: the (0,0) tile holds label A (category 7), the
    // clipped (40,40) corner tile holds label B (category 3)
    assert_eq!(dataset.annotations[0].category_id.as_u64(), 7);
    assert_eq!(dataset.annotations[1].category_id.as_u64(), 3);

    // artifacts exist at their deterministic paths; the corner tile is
    // clipped to 24x24
    assert!(dir.path().join("1_0_0_32_32.png").exists());
    assert!(dir.path().join("1_40_40_24_24.png").exists());
    assert_eq!(
        dataset.images[0].file_name,
        dir.path().join("1_0_0_32_32.png")
    );
    assert_eq!((dataset.images[1].width, dataset.images[1].height), (24, 24));
}

#[test]
fn masks_are_all_touched_and_coco_encoded() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = scene_labels();
    let mut dataset = fresh_dataset();

    labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap();

    // label A: map square (10,50)-(14,54) -> pixel cols 10..=14, rows
    // 10..=14 under the all-touched rule
    let ann = &dataset.annotations[0];
    assert_eq!(ann.bbox, [10.0, 10.0, 5.0, 5.0]);
    assert_eq!(ann.area, 25);
    assert_eq!(ann.iscrowd, 0);
    assert_eq!(ann.segmentation.size, [32, 32]);

    // the stored counts string decodes back to the same area
    let decoded = rle::from_string(&ann.segmentation.counts, 32, 32);
    assert_eq!(rle::area(&decoded), ann.area);
    assert_eq!(rle::to_bbox(&decoded), ann.bbox);
}

#[test]
fn repeat_run_bumps_patch_and_extends_collections() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = scene_labels();
    let mut dataset = fresh_dataset();

    labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap();
    let categories = dataset.categories.clone();

    labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap();

    // same source, known output dir: patch only
    assert_eq!(dataset.info.version, "1.0.1");
    assert_eq!(dataset.sources.len(), 1);
    // category table untouched
    assert_eq!(dataset.categories, categories);
    // bookkeeping proceeds even though artifacts already exist on disk
    assert_eq!(dataset.images.len(), 4);
    assert_eq!(dataset.annotations.len(), 4);
    assert_eq!(dataset.images[3].id.as_u64(), 4);
}

#[test]
fn second_source_bumps_minor() {
    let dir = tempfile::tempdir().unwrap();
    let labels = scene_labels();
    let mut dataset = fresh_dataset();

    labels_to_dataset(&mut dataset, dir.path(), &scene("a.tif"), &labels, &options()).unwrap();
    assert_eq!(dataset.info.version, "1.0.0");

    labels_to_dataset(&mut dataset, dir.path(), &scene("b.tif"), &labels, &options()).unwrap();
    assert_eq!(dataset.info.version, "1.1.0");
    assert_eq!(dataset.sources.len(), 2);

    // tiles of the second source never collide with the first source's
    assert!(dir.path().join("1_0_0_32_32.png").exists());
    assert!(dir.path().join("2_0_0_32_32.png").exists());
}

#[test]
fn runs_are_byte_for_byte_reproducible() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let labels = scene_labels();

    let mut a = fresh_dataset();
    labels_to_dataset(&mut a, &dir_a.path().join("out"), &scene("s.tif"), &labels, &options())
        .unwrap();
    let mut b = fresh_dataset();
    labels_to_dataset(&mut b, &dir_b.path().join("out"), &scene("s.tif"), &labels, &options())
        .unwrap();

    // identical apart from the differing artifact directories
    assert_eq!(a.info, b.info);
    assert_eq!(a.annotations, b.annotations);
    assert_eq!(a.categories, b.categories);
    let names_a: Vec<_> = a.images.iter().map(|i| i.file_name.file_name()).collect();
    let names_b: Vec<_> = b.images.iter().map(|i| i.file_name.file_name()).collect();
    assert_eq!(names_a, names_b);
}

#[test]
fn name_attributed_labels_resolve_through_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = LabelCollection::from_labels(
        CRS,
        vec![
            Label::new(square(10.0, 50.0, 4.0)).with_category_name("roof"),
            Label::new(square(54.0, 4.0, 6.0)).with_category_name("tank"),
        ],
    );
    let mut dataset = fresh_dataset();

    labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap();

    // ids assigned in first-appearance order from max existing id (none)
    let names: Vec<&str> = dataset.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["roof", "tank"]);
    assert_eq!(dataset.annotations[0].category_id.as_u64(), 1);
    assert_eq!(dataset.annotations[1].category_id.as_u64(), 2);
}

#[test]
fn label_without_category_attributes_aborts_before_tiling() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = LabelCollection::from_labels(CRS, vec![Label::new(square(10.0, 50.0, 4.0))]);
    let mut dataset = fresh_dataset();

    let err = labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap_err();
    assert!(matches!(
        err,
        CocotileError::MissingCategoryAttribute { index: 0 }
    ));
    assert!(dataset.images.is_empty());
    assert!(dataset.annotations.is_empty());
}

#[test]
fn crs_mismatch_aborts_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    let labels = LabelCollection::from_labels(
        "EPSG:4326",
        vec![Label::new(square(10.0, 50.0, 4.0)).with_category_id(1)],
    );
    let mut dataset = fresh_dataset();

    let err = labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap_err();
    assert!(matches!(err, CocotileError::CrsMismatch { .. }));
    assert_eq!(dataset.info.version, "0.0.0");
    assert!(dataset.sources.is_empty());
}

#[test]
fn closed_raster_fails_with_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut src = scene("scene.tif");
    src.close();
    let labels = scene_labels();
    let mut dataset = fresh_dataset();

    let err = labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options()).unwrap_err();
    assert!(matches!(err, CocotileError::RasterClosed(_)));
}

#[test]
fn oversized_labels_exhaust_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let src = scene("scene.tif");
    // a label wider than any candidate window can overlap
    let labels = LabelCollection::from_labels(
        CRS,
        vec![Label::new(square(0.0, 0.0, 60.0)).with_category_id(1)],
    );
    let mut dataset = fresh_dataset();

    let options = IngestOptions {
        window_candidates: vec![(32, 32), (64, 64)],
        ..options()
    };
    let err = labels_to_dataset(&mut dataset, dir.path(), &src, &labels, &options).unwrap_err();
    assert!(matches!(err, CocotileError::NoViableSchema { .. }));
}

//! The ingestion pipeline: raster + labels -> tiles + annotations.
//!
//! A single-threaded, synchronous batch transform. Tiles are generated and
//! processed strictly one at a time; for a fixed input (raster, label set,
//! schema, sort order) the sequence of tiles and the assigned
//! image/annotation IDs are byte-for-byte reproducible. Per-tile outcomes
//! are the tagged [`TileResult`]: tiles with no intersecting labels or no
//! non-empty masks are skipped silently, the expected majority case over a
//! sparse label set.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use crate::dataset::{Annotation, AnnotationId, CategoryId, Dataset, Image, RleSeg, SourceId};
use crate::error::CocotileError;
use crate::labels::LabelCollection;
use crate::mask::{rasterize, rle};
use crate::raster::{PixelBuffer, RasterSource};
use crate::tiling::{estimate_schema, tiles, Window, DEFAULT_QUANTILE, DEFAULT_WINDOW_CANDIDATES};

/// Pass-through configuration for one ingestion run.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    /// Quantile of the label-size distribution used for overlap sizing.
    pub quantile: f64,
    /// Candidate window sizes, tried in order.
    pub window_candidates: Vec<(u32, u32)>,
    /// Draw a progress bar over the tile count.
    pub progress: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_QUANTILE,
            window_candidates: DEFAULT_WINDOW_CANDIDATES.to_vec(),
            progress: true,
        }
    }
}

/// Outcome of processing one tile.
#[derive(Clone, Debug)]
pub enum TileResult {
    /// No intersecting labels, or every mask came back empty. Nothing is
    /// appended and no artifact is written.
    Skipped,
    /// The tile produced an image and at least one annotation, ready to be
    /// appended in order.
    Produced {
        image: Image,
        annotations: Vec<Annotation>,
    },
}

/// Validates that raster and labels can be combined at all: matching CRS
/// identifiers and intersecting extents.
///
/// Called once before any tiling begins, replacing the historical
/// warn-and-continue behavior with a typed, fail-fast check.
pub fn assert_overlap(
    src: &dyn RasterSource,
    labels: &LabelCollection,
) -> Result<(), CocotileError> {
    if src.crs() != labels.crs() {
        return Err(CocotileError::CrsMismatch {
            raster: src.crs().to_string(),
            labels: labels.crs().to_string(),
        });
    }
    let label_bounds = labels.bounds().ok_or(CocotileError::NoOverlap)?;
    if !src.bounds().intersects(&label_bounds) {
        return Err(CocotileError::NoOverlap);
    }
    Ok(())
}

/// Deterministic artifact name for a tile of a given source.
///
/// Derived from `(source_id, col_off, row_off, width, height)`, so the same
/// tile of the same source is trivially re-derivable and never collides
/// with a tile of another source.
pub fn tile_file_name(source_id: SourceId, tile: &Window) -> String {
    format!(
        "{}_{}_{}_{}_{}.png",
        source_id,
        tile.col_off(),
        tile.row_off(),
        tile.width(),
        tile.height()
    )
}

/// Moves across the raster, converting all intersecting labels to COCO
/// annotations and appending them to `dataset`.
///
/// Per run this: validates CRS/extent overlap, registers the raster as a
/// source (version floor), checks for a new output directory (major bump),
/// reconciles the label categories into the category table, estimates the
/// tile schema from the label sizes, then walks the clipped tile grid. Each
/// produced tile writes a PNG artifact under `images_dir` (skipped when the
/// file already exists, making interrupted runs cheap to restart) and
/// appends one `Image` plus one `Annotation` per non-empty mask.
pub fn labels_to_dataset(
    dataset: &mut Dataset,
    images_dir: &Path,
    src: &dyn RasterSource,
    labels: &LabelCollection,
    options: &IngestOptions,
) -> Result<(), CocotileError> {
    assert_overlap(src, labels)?;

    let source_id = dataset.add_source(src.file_name())?;
    dataset.verify_new_output_dir(images_dir)?;

    let category_ids = reconcile_categories(dataset, labels)?;

    let schema = estimate_schema(
        labels,
        src.resolution(),
        options.quantile,
        &options.window_candidates,
    )?;
    let parent = src.full_window();
    let grid = tiles(&parent, &schema, false);

    log::info!(
        "ingesting {} into {}: {} tiles of {}x{} (overlap {}x{})",
        src.file_name().display(),
        images_dir.display(),
        grid.len(),
        schema.window_w(),
        schema.window_h(),
        schema.overlap_w(),
        schema.overlap_h(),
    );

    std::fs::create_dir_all(images_dir)?;

    let progress = if options.progress {
        ProgressBar::new(grid.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    for tile in grid {
        let result = process_tile(
            dataset,
            images_dir,
            src,
            labels,
            &category_ids,
            source_id,
            &tile,
        )?;
        if let TileResult::Produced { image, annotations } = result {
            for annotation in annotations {
                dataset.add_annotation(annotation);
            }
            dataset.add_image(image);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(())
}

/// Processes a single tile against the label set.
///
/// IDs are taken from the dataset's counters, so the caller must append the
/// returned annotations and image (in that order) before processing the
/// next tile.
pub fn process_tile(
    dataset: &Dataset,
    images_dir: &Path,
    src: &dyn RasterSource,
    labels: &LabelCollection,
    category_ids: &[CategoryId],
    source_id: SourceId,
    tile: &Window,
) -> Result<TileResult, CocotileError> {
    let tile_transform = src.transform().for_window(tile.col_off(), tile.row_off());
    let tile_bounds = tile_transform.grid_bounds(tile.width(), tile.height());

    let mut hits = labels.intersecting(&tile_bounds);
    if hits.is_empty() {
        return Ok(TileResult::Skipped);
    }
    // stable category order keeps annotation ID assignment deterministic
    hits.sort_by_key(|&index| category_ids[index]);

    let image_id = dataset.next_image_id();
    let next_annotation = dataset.next_annotation_id().as_u64();

    let mut annotations = Vec::new();
    for &index in &hits {
        let geometry = &labels.get(index).geometry;
        let mask = rasterize(geometry, &tile_transform, tile.width(), tile.height());
        if !mask.any() {
            continue;
        }

        let encoded = rle::encode(&mask);
        let segmentation = RleSeg {
            size: [tile.height(), tile.width()],
            counts: rle::to_string(&encoded),
        };
        annotations.push(Annotation::new(
            AnnotationId::new(next_annotation + annotations.len() as u64),
            image_id,
            category_ids[index],
            segmentation,
            rle::area(&encoded),
            rle::to_bbox(&encoded),
            geometry.is_multi() as u8,
        ));
    }

    if annotations.is_empty() {
        return Ok(TileResult::Skipped);
    }

    let artifact_path = images_dir.join(tile_file_name(source_id, tile));
    if artifact_path.exists() {
        log::debug!("artifact {} exists, skipping write", artifact_path.display());
    } else {
        let buffer = src.read(tile)?;
        write_artifact(&buffer, &artifact_path)?;
    }

    let image = Image::new(
        image_id,
        tile.width(),
        tile.height(),
        artifact_path,
        source_id,
    );
    Ok(TileResult::Produced { image, annotations })
}

/// Merges the label table's category columns into the dataset and resolves
/// one category ID per label row.
fn reconcile_categories(
    dataset: &mut Dataset,
    labels: &LabelCollection,
) -> Result<Vec<CategoryId>, CocotileError> {
    let ids = labels.category_id_column();
    let names = labels.category_name_column();
    let supers = labels.supercategory_column();

    if ids.is_none() && names.is_none() {
        return Err(
            match labels
                .iter()
                .position(|l| l.category_id.is_none() && l.category_name.is_none())
            {
                Some(index) => CocotileError::MissingCategoryAttribute { index },
                None => CocotileError::MissingCategoryInput,
            },
        );
    }

    dataset.add_categories(ids.as_deref(), names.as_deref(), supers.as_deref())?;

    match (ids, names) {
        (Some(ids), _) => Ok(ids.into_iter().map(CategoryId::new).collect()),
        (None, Some(names)) => names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                dataset
                    .category_id_by_name(name)
                    .ok_or(CocotileError::MissingCategoryAttribute { index })
            })
            .collect(),
        (None, None) => unreachable!("guarded above"),
    }
}

/// Normalizes the buffer to u8 and writes it as a PNG artifact.
fn write_artifact(buffer: &PixelBuffer, path: &Path) -> Result<(), CocotileError> {
    let (w, h) = (buffer.width, buffer.height);
    let pixels = buffer.to_u8_normalized();
    let plane = (w as usize) * (h as usize);

    let saved = match buffer.bands {
        1 => {
            let img = image::GrayImage::from_fn(w, h, |x, y| {
                image::Luma([pixels[y as usize * w as usize + x as usize]])
            });
            img.save(path)
        }
        3 => {
            let img = image::RgbImage::from_fn(w, h, |x, y| {
                let idx = y as usize * w as usize + x as usize;
                image::Rgb([pixels[idx], pixels[plane + idx], pixels[2 * plane + idx]])
            });
            img.save(path)
        }
        other => return Err(CocotileError::UnsupportedBandCount(other)),
    };
    saved.map_err(|source| CocotileError::ArtifactEncode {
        path: PathBuf::from(path),
        source,
    })
}

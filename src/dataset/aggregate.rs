//! The growable dataset aggregate.
//!
//! One [`Dataset`] value owns the four append-only collections and the ID
//! counters that are the sole source of new IDs. Counters are not persisted:
//! they are recomputed from collection lengths at load time
//! ([`Dataset::sync_counters`]) and advance only through the append
//! operations here. Category and Source rows, once created, are never
//! mutated, reordered, or removed; that is what makes repeated ingestion
//! runs safe to replay against the same document.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CocotileError;

use super::ids::{AnnotationId, CategoryId, ImageId, SourceId};
use super::model::{Annotation, Category, Image, Info, Source};
use super::version::{Version, VersionTier};

/// Default supercategory sentinel for new categories without one.
const SUPERCATEGORY_SENTINEL: &str = "1";

/// Which key identifies proposed categories during reconciliation,
/// dispatched once at the top of [`Dataset::add_categories`].
#[derive(Clone, Copy, Debug)]
enum CategoryKey<'a> {
    ById(&'a [u64]),
    ByName(&'a [String]),
    ByBoth(&'a [u64], &'a [String]),
}

/// The incremental dataset document: COCO-style collections plus the source
/// table and version policy that make repeated runs composable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub info: Info,

    #[serde(default)]
    pub images: Vec<Image>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub sources: Vec<Source>,

    // Counters are derived state, never persisted. Loaders must call
    // sync_counters() after deserializing.
    #[serde(skip)]
    next_image_id: u64,

    #[serde(skip)]
    next_annotation_id: u64,

    #[serde(skip)]
    next_source_id: u64,
}

impl Dataset {
    /// A new, empty dataset at the given metadata.
    pub fn new(info: Info) -> Self {
        let mut dataset = Self {
            info,
            ..Self::default()
        };
        dataset.sync_counters();
        dataset
    }

    /// Recomputes the ID counters from the collection lengths.
    ///
    /// `next_image_id`/`next_annotation_id` become `len + 1`;
    /// `next_source_id` becomes `len`; sources are 0-based until
    /// [`Dataset::add_source`] registers the run's raster.
    pub fn sync_counters(&mut self) {
        self.next_image_id = self.images.len() as u64 + 1;
        self.next_annotation_id = self.annotations.len() as u64 + 1;
        self.next_source_id = self.sources.len() as u64;
    }

    /// The ID the next appended image must carry.
    pub fn next_image_id(&self) -> ImageId {
        ImageId::new(self.next_image_id)
    }

    /// The ID the next appended annotation must carry.
    pub fn next_annotation_id(&self) -> AnnotationId {
        AnnotationId::new(self.next_annotation_id)
    }

    /// The current run's source ID (0 before any registration).
    pub fn next_source_id(&self) -> SourceId {
        SourceId::new(self.next_source_id)
    }

    /// Appends an image. The caller must have used [`Dataset::next_image_id`]
    /// for its `id`.
    pub fn add_image(&mut self, image: Image) {
        self.images.push(image);
        self.next_image_id += 1;
    }

    /// Appends an annotation. Same ID-use contract as [`Dataset::add_image`].
    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
        self.next_annotation_id += 1;
    }

    /// Registers the run's source raster, keyed by file name.
    ///
    /// A repeat of an already-known raster bumps the version by patch; a new
    /// raster is appended with `id = len(sources) + 1` and bumps by minor.
    /// Mandatory once per ingestion run, before any tiles are processed:
    /// this sets the version-bump floor that
    /// [`Dataset::verify_new_output_dir`] may override with a major bump.
    pub fn add_source(&mut self, file_name: &Path) -> Result<SourceId, CocotileError> {
        let id = match self.sources.iter().find(|s| s.file_name == file_name) {
            Some(existing) => {
                let id = existing.id;
                self.bump_version(VersionTier::Patch)?;
                id
            }
            None => {
                let id = SourceId::new(self.sources.len() as u64 + 1);
                self.sources.push(Source {
                    id,
                    file_name: file_name.to_path_buf(),
                });
                self.bump_version(VersionTier::Minor)?;
                id
            }
        };
        self.next_source_id = id.as_u64();
        Ok(id)
    }

    /// Bumps major when `images_dir` has never held any of the dataset's
    /// tile artifacts. Major strictly supersedes the minor/patch floor from
    /// [`Dataset::add_source`]: the bump resets the lower components.
    pub fn verify_new_output_dir(&mut self, images_dir: &Path) -> Result<(), CocotileError> {
        let known = self
            .images
            .iter()
            .filter_map(|image| image.file_name.parent())
            .any(|parent| parent == images_dir);
        if !known {
            self.bump_version(VersionTier::Major)?;
        }
        Ok(())
    }

    /// Parses, bumps, and stores back the version string.
    pub fn bump_version(&mut self, tier: VersionTier) -> Result<(), CocotileError> {
        let version: Version = self.info.version.parse()?;
        let bumped = version.bump(tier);
        log::debug!("version {} -> {} ({:?})", version, bumped, tier);
        self.info.version = bumped.to_string();
        Ok(())
    }

    /// Reconciles a proposed category batch against the existing table.
    ///
    /// At least one of `ids`/`names` is required. The proposed batch is
    /// deduplicated first (first occurrence wins per key); an entry is new
    /// iff its key (id when ids are given, else name) is absent from the
    /// table. New rows are appended in increasing id order; existing rows
    /// are untouched. All structural checks run before any mutation.
    pub fn add_categories(
        &mut self,
        ids: Option<&[u64]>,
        names: Option<&[String]>,
        supercategories: Option<&[String]>,
    ) -> Result<(), CocotileError> {
        let key = match (ids, names) {
            (None, None) => return Err(CocotileError::MissingCategoryInput),
            (Some(ids), None) => CategoryKey::ById(ids),
            (None, Some(names)) => CategoryKey::ByName(names),
            (Some(ids), Some(names)) => {
                if ids.len() != names.len() {
                    return Err(CocotileError::CategoryLengthMismatch {
                        ids: ids.len(),
                        names: names.len(),
                    });
                }
                CategoryKey::ByBoth(ids, names)
            }
        };

        let proposed_len = ids.map(<[u64]>::len).or(names.map(<[String]>::len)).unwrap_or(0);
        if let Some(supers) = supercategories {
            if supers.len() != proposed_len {
                return Err(CocotileError::SupercategoryLengthMismatch {
                    supers: supers.len(),
                    proposed: proposed_len,
                });
            }
        }

        let supercategory_at = |index: usize| -> String {
            supercategories
                .map(|s| s[index].clone())
                .unwrap_or_else(|| SUPERCATEGORY_SENTINEL.to_string())
        };

        let mut new_rows: Vec<Category> = Vec::new();
        match key {
            CategoryKey::ById(ids) => {
                let existing: HashSet<u64> =
                    self.categories.iter().map(|c| c.id.as_u64()).collect();
                let mut seen = HashSet::new();
                for (index, &id) in ids.iter().enumerate() {
                    if !seen.insert(id) || existing.contains(&id) {
                        continue;
                    }
                    new_rows.push(Category::new(id, id.to_string(), supercategory_at(index)));
                }
            }
            CategoryKey::ByName(names) => {
                let existing: HashSet<&str> =
                    self.categories.iter().map(|c| c.name.as_str()).collect();
                let max_id = self
                    .categories
                    .iter()
                    .map(|c| c.id.as_u64())
                    .max()
                    .unwrap_or(0);
                let mut seen = HashSet::new();
                let mut next_id = max_id + 1;
                for (index, name) in names.iter().enumerate() {
                    if !seen.insert(name.as_str()) || existing.contains(name.as_str()) {
                        continue;
                    }
                    new_rows.push(Category::new(next_id, name.clone(), supercategory_at(index)));
                    next_id += 1;
                }
            }
            CategoryKey::ByBoth(ids, names) => {
                // conflict check across the whole batch before any append
                let mut first_name_for: Vec<(u64, &str)> = Vec::new();
                for (&id, name) in ids.iter().zip(names) {
                    match first_name_for.iter().find(|(seen_id, _)| *seen_id == id) {
                        Some(&(_, first)) if first != name.as_str() => {
                            return Err(CocotileError::CategoryConflict {
                                id,
                                first: first.to_string(),
                                second: name.clone(),
                            });
                        }
                        Some(_) => {}
                        None => first_name_for.push((id, name.as_str())),
                    }
                }
                let existing: HashSet<u64> =
                    self.categories.iter().map(|c| c.id.as_u64()).collect();
                let mut seen = HashSet::new();
                for (index, (&id, name)) in ids.iter().zip(names).enumerate() {
                    if !seen.insert(id) || existing.contains(&id) {
                        continue;
                    }
                    new_rows.push(Category::new(id, name.clone(), supercategory_at(index)));
                }
            }
        }

        new_rows.sort_by_key(|c| c.id);
        self.categories.extend(new_rows);
        Ok(())
    }

    /// Lookup of a category id by name, used to resolve name-attributed
    /// labels after reconciliation.
    pub fn category_id_by_name(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }
}

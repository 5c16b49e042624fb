use crate::dataset::coco_dataset::{
    read_annotations_file, write_annotations_file, Annotation, Category, CocoDatasetJson, Image,
};
use crate::dataset::shuffling::{seeded_shuffle, SHUFFLE_ALGORITHM};
use crate::error::{SplitError, SplitResult};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;
pub const DEFAULT_SEED: i64 = 123;

/// How many images go to the train side of a split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitSpec {
    /// Fraction in `(0, 1]`, the train side gets `floor(images * ratio)` images
    Ratio(f64),
    /// Exact number of train images, at most the number of images
    Count(usize),
}

impl SplitSpec {
    /// Number of train images for a dataset with `image_count` images.
    pub fn train_len(&self, image_count: usize) -> SplitResult<usize> {
        match *self {
            SplitSpec::Ratio(ratio) => {
                // also catches NaN
                if !(ratio > 0.0 && ratio <= 1.0) {
                    return Err(SplitError::InvalidArgument(format!(
                        "train ratio must be in (0, 1], got {}",
                        ratio
                    )));
                }
                Ok(((image_count as f64 * ratio).floor() as usize).min(image_count))
            }
            SplitSpec::Count(count) => {
                if count > image_count {
                    return Err(SplitError::InvalidArgument(format!(
                        "train count {} exceeds the {} available images",
                        count, image_count
                    )));
                }
                Ok(count)
            }
        }
    }

    /// Names for the two halves of a split of `stem`, e.g. `instances_train_0.80` and
    /// `instances_val_0.20`. Count splits use the image count of each side instead.
    pub fn output_names(&self, stem: &str, image_count: usize) -> (String, String) {
        match *self {
            SplitSpec::Ratio(ratio) => (
                format!("{}_train_{:.2}", stem, ratio),
                format!("{}_val_{:.2}", stem, 1.0 - ratio),
            ),
            SplitSpec::Count(count) => (
                format!("{}_train_{}", stem, count),
                format!("{}_val_{}", stem, image_count.saturating_sub(count)),
            ),
        }
    }
}

/// A COCO annotation set that can be queried, split into train/val and saved.
///
/// The wrapped dataset is never modified: every split builds two new, independent
/// `DatasetSplitter`s, which can in turn be split again.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplitter {
    dataset: CocoDatasetJson,
}

impl DatasetSplitter {
    /// Loads and checks the COCO annotation file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> SplitResult<DatasetSplitter> {
        let path = path.as_ref();
        let dataset = read_annotations_file(path)?;
        check_consistency(&dataset).map_err(|msg| SplitError::invalid_input(path, msg))?;
        log::info!("Loaded {}", path.display());
        Ok(DatasetSplitter::new_unchecked(dataset))
    }

    /// Wraps an already parsed dataset after checking it.
    pub fn from_dataset(dataset: CocoDatasetJson) -> SplitResult<DatasetSplitter> {
        check_consistency(&dataset)
            .map_err(|msg| SplitError::invalid_input("<in-memory dataset>", msg))?;
        Ok(DatasetSplitter::new_unchecked(dataset))
    }

    fn new_unchecked(dataset: CocoDatasetJson) -> DatasetSplitter {
        let (images, annotations, categories) = (
            dataset.images.len(),
            dataset.annotations.len(),
            dataset.categories.len(),
        );
        log::info!(
            "Found {} images, {} annotations, {} categories",
            images,
            annotations,
            categories
        );
        DatasetSplitter { dataset }
    }

    pub fn dataset(&self) -> &CocoDatasetJson {
        &self.dataset
    }

    pub fn into_dataset(self) -> CocoDatasetJson {
        self.dataset
    }

    pub fn images(&self) -> &[Image] {
        &self.dataset.images
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.dataset.annotations
    }

    pub fn categories(&self) -> &[Category] {
        &self.dataset.categories
    }

    /// `(images, annotations, categories)`
    pub fn get_counts(&self) -> (usize, usize, usize) {
        (
            self.dataset.images.len(),
            self.dataset.annotations.len(),
            self.dataset.categories.len(),
        )
    }

    /// Images whose id is in `ids`, in file order. Unknown ids are ignored.
    pub fn get_images_by_ids(&self, ids: &HashSet<i64>) -> Vec<&Image> {
        self.dataset
            .images
            .iter()
            .filter(|image| ids.contains(&image.id))
            .collect()
    }

    /// Annotations that belong to one of `image_ids`, in file order.
    pub fn get_annotations_for_images(&self, image_ids: &HashSet<i64>) -> Vec<&Annotation> {
        self.dataset
            .annotations
            .iter()
            .filter(|annotation| image_ids.contains(&annotation.image_id))
            .collect()
    }

    /// Every category with the number of annotations using it, in file order.
    pub fn annotations_per_category(&self) -> Vec<(&Category, usize)> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for category_id in self.dataset.annotations.iter().filter_map(Annotation::category_id) {
            *counts.entry(category_id).or_insert(0) += 1;
        }
        self.dataset
            .categories
            .iter()
            .map(|category| (category, counts.get(&category.id).copied().unwrap_or(0)))
            .collect()
    }

    pub fn split_by_ratio(
        &self,
        train_ratio: f64,
        seed: i64,
    ) -> SplitResult<(DatasetSplitter, DatasetSplitter)> {
        self.split(SplitSpec::Ratio(train_ratio), seed)
    }

    pub fn split_by_count(
        &self,
        train_count: usize,
        seed: i64,
    ) -> SplitResult<(DatasetSplitter, DatasetSplitter)> {
        self.split(SplitSpec::Count(train_count), seed)
    }

    /// Shuffles the image ids with `seed` and cuts them into `(train, val)` as `spec` says.
    /// Annotations follow their image and both sides get every category.
    ///
    /// Negative seeds are valid, the generator is seeded with their two's complement bits.
    pub fn split(
        &self,
        spec: SplitSpec,
        seed: i64,
    ) -> SplitResult<(DatasetSplitter, DatasetSplitter)> {
        let mut image_ids: Vec<i64> = self.dataset.images.iter().map(|image| image.id).collect();
        let split_at = spec.train_len(image_ids.len())?;

        log::debug!(
            "Shuffling {} image ids with {} (seed {})",
            image_ids.len(),
            SHUFFLE_ALGORITHM,
            seed
        );
        seeded_shuffle(&mut image_ids, seed as u64);
        let (train_ids, val_ids) = image_ids.split_at(split_at);

        let train = self.subset(&train_ids.iter().copied().collect());
        let val = self.subset(&val_ids.iter().copied().collect());
        log::info!(
            "Split into {} train images ({} annotations) and {} val images ({} annotations)",
            train.dataset.images.len(),
            train.dataset.annotations.len(),
            val.dataset.images.len(),
            val.dataset.annotations.len()
        );
        Ok((train, val))
    }

    /// New dataset restricted to `image_ids`, sharing nothing with `self`.
    fn subset(&self, image_ids: &HashSet<i64>) -> DatasetSplitter {
        DatasetSplitter {
            dataset: CocoDatasetJson {
                images: self
                    .get_images_by_ids(image_ids)
                    .into_iter()
                    .cloned()
                    .collect(),
                annotations: self
                    .get_annotations_for_images(image_ids)
                    .into_iter()
                    .cloned()
                    .collect(),
                categories: self.dataset.categories.clone(),
                extra: self.dataset.extra.clone(),
            },
        }
    }

    /// Writes compact json to `path`. Reports `FileAlreadyExists` instead of overwriting.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SplitResult<()> {
        self.save_with(path.as_ref(), false)
    }

    /// Same as `save` but indented.
    pub fn save_pretty<P: AsRef<Path>>(&self, path: P) -> SplitResult<()> {
        self.save_with(path.as_ref(), true)
    }

    fn save_with(&self, path: &Path, pretty: bool) -> SplitResult<()> {
        match write_annotations_file(&self.dataset, path, pretty) {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                Ok(())
            }
            Err(SplitError::FileAlreadyExists(existing)) => {
                log::warn!("{} already exists, not saving it", existing.display());
                Err(SplitError::FileAlreadyExists(existing))
            }
            Err(e) => Err(e),
        }
    }
}

/// Where a split named `name` is saved by default, `outputs/<name>.json`.
pub fn default_output_path<P: AsRef<Path>>(output_dir: P, name: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{}.json", name))
}

/// Ids must be unique per section and every annotation must point at an existing image.
fn check_consistency(dataset: &CocoDatasetJson) -> Result<(), String> {
    if let Some(id) = dataset.images.iter().map(|e| e.id).duplicates().next() {
        return Err(format!("duplicate image id {}", id));
    }
    if let Some(id) = dataset.annotations.iter().map(|e| e.id).duplicates().next() {
        return Err(format!("duplicate annotation id {}", id));
    }
    if let Some(id) = dataset.categories.iter().map(|e| e.id).duplicates().next() {
        return Err(format!("duplicate category id {}", id));
    }
    let image_ids: HashSet<i64> = dataset.images.iter().map(|e| e.id).collect();
    if let Some(orphan) = dataset
        .annotations
        .iter()
        .find(|annotation| !image_ids.contains(&annotation.image_id))
    {
        return Err(format!(
            "annotation {} references missing image {}",
            orphan.id, orphan.image_id
        ));
    }
    Ok(())
}

/// COCO json model plus reading/writing it
pub mod coco_dataset;
/// Seeded, pinned shuffling of image ids
pub mod shuffling;
/// Train/val splitting of a COCO dataset
pub mod splitter;

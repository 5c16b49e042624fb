pub mod dataset;
pub mod error;

pub use dataset::coco_dataset::CocoDatasetJson;
pub use dataset::splitter::{DatasetSplitter, SplitSpec};
pub use error::{SplitError, SplitResult};

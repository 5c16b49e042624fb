use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields of a COCO object that are not modelled explicitly. Kept verbatim so a load/save
/// cycle does not lose anything.
pub type ExtraFields = Map<String, Value>;

/// Top level of a COCO annotation file.
/// `info`, `licenses` and any other unknown key end up in `extra`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoDatasetJson {
    pub images: Vec<Image>,
    // image-info files (e.g. image_info_test2017.json) have no annotations at all
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub image_id: i64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

fn str_field<'a>(extra: &'a ExtraFields, key: &str) -> Option<&'a str> {
    extra.get(key).and_then(Value::as_str)
}

fn int_field(extra: &ExtraFields, key: &str) -> Option<i64> {
    extra.get(key).and_then(Value::as_i64)
}

impl Image {
    pub fn new(id: i64) -> Image {
        Image {
            id,
            extra: ExtraFields::new(),
        }
    }
}

impl Annotation {
    pub fn new(id: i64, image_id: i64) -> Annotation {
        Annotation {
            id,
            image_id,
            extra: ExtraFields::new(),
        }
    }

    pub fn category_id(&self) -> Option<i64> {
        int_field(&self.extra, "category_id")
    }
}

impl Category {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.extra, "name")
    }

    pub fn supercategory(&self) -> Option<&str> {
        str_field(&self.extra, "supercategory")
    }
}

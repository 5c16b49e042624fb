mod coco_dataset_struct;

pub use coco_dataset_struct::*;

use crate::error::{SplitError, SplitResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads a COCO annotation file into a rust struct
pub fn read_annotations_file<P: AsRef<Path>>(filepath: P) -> SplitResult<CocoDatasetJson> {
    let filepath = filepath.as_ref();
    if !filepath.is_file() {
        return Err(SplitError::invalid_input(filepath, "no such file"));
    }
    let input_file = File::open(filepath)
        .map_err(|e| SplitError::invalid_input(filepath, format!("could not open: {}", e)))?;
    serde_json::from_reader(BufReader::new(input_file)).map_err(|e| {
        SplitError::invalid_input(filepath, format!("not a valid COCO json: {}", e))
    })
}

/// Writes `dataset` to `filepath`, creating missing parent folders.
/// Never overwrites: an existing file is reported as `FileAlreadyExists` and left untouched.
pub fn write_annotations_file<P: AsRef<Path>>(
    dataset: &CocoDatasetJson,
    filepath: P,
    pretty: bool,
) -> SplitResult<()> {
    write_json_no_clobber(dataset, filepath.as_ref(), pretty)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SplitError {
    let path = path.to_owned();
    move |source| SplitError::Io { path, source }
}

/// The json goes to a temp file next to `filepath` first and is only linked into place once
/// fully written, so a failed write leaves nothing behind.
fn write_json_no_clobber<T: Serialize>(
    value: &T,
    filepath: &Path,
    pretty: bool,
) -> SplitResult<()> {
    if filepath.exists() {
        return Err(SplitError::FileAlreadyExists(filepath.to_owned()));
    }
    let parent = match filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error(parent))?;

    let temp_file = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        let serialized = if pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        serialized
            .map_err(io::Error::from)
            .and_then(|_| writer.flush())
            .map_err(io_error(filepath))?;
    }
    match temp_file.persist_noclobber(filepath) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            Err(SplitError::FileAlreadyExists(filepath.to_owned()))
        }
        Err(e) => Err(SplitError::Io {
            path: filepath.to_owned(),
            source: e.error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_invalid_input() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = read_annotations_file(temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SplitError::InvalidInput { .. }));
    }

    #[test]
    fn directory_is_invalid_input() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = read_annotations_file(temp.path()).unwrap_err();
        assert!(matches!(err, SplitError::InvalidInput { .. }));
    }

    #[test]
    fn garbage_is_invalid_input() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("bad.json");
        fs::write(&path, "{\"images\": [{\"id\": \"seven\"}]").unwrap();
        let err = read_annotations_file(&path).unwrap_err();
        assert!(matches!(err, SplitError::InvalidInput { .. }));
    }

    #[test]
    fn write_creates_parent_folders() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("outputs").join("nested").join("a.json");
        let dataset = CocoDatasetJson {
            images: vec![Image::new(1)],
            ..Default::default()
        };
        write_annotations_file(&dataset, &path, false).unwrap();
        assert_eq!(read_annotations_file(&path).unwrap(), dataset);
    }

    #[test]
    fn write_never_overwrites() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("a.json");
        fs::write(&path, "keep me").unwrap();
        let err = write_annotations_file(&CocoDatasetJson::default(), &path, true).unwrap_err();
        assert!(matches!(err, SplitError::FileAlreadyExists(p) if p == path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    struct FailsHalfway;

    impl Serialize for FailsHalfway {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::{Error, SerializeSeq};
            let mut seq = serializer.serialize_seq(None)?;
            seq.serialize_element(&1)?;
            Err(S::Error::custom("disk gave up"))
        }
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("a.json");
        let err = write_json_no_clobber(&FailsHalfway, &path, false).unwrap_err();
        assert!(matches!(err, SplitError::Io { .. }));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);

        // the path is still free for the next attempt
        write_annotations_file(&CocoDatasetJson::default(), &path, false).unwrap();
        assert_eq!(read_annotations_file(&path).unwrap(), CocoDatasetJson::default());
    }
}

//! Directory-tree dataset loading
//!
//! A split root holds one directory per class; every non-hidden file inside a
//! class directory is one sample.
//!
//! ```text
//! train/
//!   cats/  cat.1.jpg  cat.2.jpg ...
//!   dogs/  dog.1.jpg  dog.2.jpg ...
//! ```

use crate::core::{to_solver_label, Dataset, FeatureVector, Label, Result, SVMError, Sample, CAT};
use crate::data::labels::{label_name, LabelStrategy};
use crate::features::{is_hidden, FeatureExtractor};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Aligned features, labels and file names of one split
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    features: Vec<FeatureVector>,
    labels: Vec<Label>,
    filenames: Vec<String>,
}

impl DatasetSplit {
    /// Build a split, checking that the three sequences line up and that all
    /// vectors have the same length
    pub fn new(
        features: Vec<FeatureVector>,
        labels: Vec<Label>,
        filenames: Vec<String>,
    ) -> Result<Self> {
        if labels.len() != features.len() {
            return Err(SVMError::DimensionMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        if filenames.len() != features.len() {
            return Err(SVMError::DimensionMismatch {
                expected: features.len(),
                actual: filenames.len(),
            });
        }
        if let Some(first) = features.first() {
            if let Some(bad) = features.iter().find(|f| f.len() != first.len()) {
                return Err(SVMError::DimensionMismatch {
                    expected: first.len(),
                    actual: bad.len(),
                });
            }
        }

        Ok(Self {
            features,
            labels,
            filenames,
        })
    }

    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Number of (cat, dog) samples
    pub fn class_counts(&self) -> (usize, usize) {
        let cats = self.labels.iter().filter(|&&l| l == CAT).count();
        (cats, self.labels.len() - cats)
    }

    /// Iterate over (filename, features, label)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureVector, Label)> {
        self.filenames
            .iter()
            .zip(self.features.iter())
            .zip(self.labels.iter())
            .map(|((name, features), &label)| (name.as_str(), features, label))
    }
}

impl Dataset for DatasetSplit {
    fn len(&self) -> usize {
        self.features.len()
    }

    fn dim(&self) -> usize {
        self.features.first().map(|f| f.len()).unwrap_or(0)
    }

    fn get_sample(&self, i: usize) -> Sample {
        Sample::new(self.features[i].clone(), to_solver_label(self.labels[i]))
    }

    fn get_labels(&self) -> Vec<f64> {
        self.labels.iter().map(|&l| to_solver_label(l)).collect()
    }
}

/// One file waiting for feature extraction
struct PendingImage {
    path: PathBuf,
    filename: String,
    label: Label,
}

/// Load every image under `root`, labelling each class directory with
/// `label_strategy`
///
/// Entries are visited in name order. Non-directories directly under `root`
/// are ignored, as are hidden entries at either level. The first file that
/// cannot be described aborts the load.
///
/// Hidden class directories (such as `.ipynb_checkpoints`) and directories
/// nested inside a class bucket are deliberately skipped instead of being
/// labelled as a class or handed to the extractor as images.
pub fn load_split<E, L>(
    root: &Path,
    extractor: &E,
    label_strategy: &L,
    parallel: bool,
) -> Result<DatasetSplit>
where
    E: FeatureExtractor + ?Sized,
    L: LabelStrategy + ?Sized,
{
    if !root.exists() {
        return Err(SVMError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SVMError::InvalidDataset(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut pending = Vec::new();

    for bucket in sorted_entries(root)? {
        if !bucket.is_dir() {
            debug!("Skipping non-directory {}", bucket.display());
            continue;
        }
        if is_hidden(&bucket) {
            debug!("Skipping hidden directory {}", bucket.display());
            continue;
        }

        let bucket_name = file_name(&bucket);
        let label = label_strategy.label_for(&bucket_name);
        let before = pending.len();

        for path in sorted_entries(&bucket)? {
            if is_hidden(&path) {
                debug!("Skipping hidden file {}", path.display());
                continue;
            }
            if path.is_dir() {
                debug!("Skipping nested directory {}", path.display());
                continue;
            }
            pending.push(PendingImage {
                filename: file_name(&path),
                path,
                label,
            });
        }

        info!(
            "{}: bucket '{}' -> {} ({} files)",
            root.display(),
            bucket_name,
            label_name(label),
            pending.len() - before
        );
    }

    if pending.is_empty() {
        warn!("{} contains no images", root.display());
    }

    let describe = |image: &PendingImage| {
        debug!("Describing {}", image.path.display());
        extractor.extract(&image.path)
    };
    let features: Vec<FeatureVector> = if parallel {
        pending.par_iter().map(describe).collect::<Result<Vec<_>>>()?
    } else {
        pending.iter().map(describe).collect::<Result<Vec<_>>>()?
    };

    let (labels, filenames): (Vec<Label>, Vec<String>) = pending
        .into_iter()
        .map(|image| (image.label, image.filename))
        .unzip();

    let split = DatasetSplit::new(features, labels, filenames)?;
    let (cats, dogs) = split.class_counts();
    info!(
        "Loaded {} images from {} ({} cat, {} dog, {} features each)",
        split.len(),
        root.display(),
        cats,
        dogs,
        split.dim()
    );

    Ok(split)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DOG;
    use crate::data::labels::SubstringLabel;
    use tempfile::TempDir;

    /// Reads "x,y" from the file; anything else fails to decode
    struct TextExtractor;

    impl FeatureExtractor for TextExtractor {
        fn extract(&self, path: &Path) -> Result<FeatureVector> {
            let text = fs::read_to_string(path)?;
            let values = text
                .trim()
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| SVMError::DecodeError {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            Ok(FeatureVector::new(values))
        }

        fn descriptor_len(&self) -> usize {
            2
        }
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "dogs/b.txt", "2,1");
        write(root, "dogs/a.txt", "1.5,1");
        write(root, "cats/c.txt", "-2,-1");
        write(root, "cats/.DS_Store", "junk");
        write(root, "README", "not a bucket");
        write(root, ".hidden/x.txt", "junk");
        write(root, ".ipynb_checkpoints/cats/y.txt", "junk");
        write(root, "cats/nested/d.txt", "junk");
        dir
    }

    #[test]
    fn test_load_split_sorted_and_aligned() {
        let dir = fixture();
        let split = load_split(dir.path(), &TextExtractor, &SubstringLabel::default(), false)
            .unwrap();

        assert_eq!(split.len(), 3);
        assert_eq!(split.filenames(), &["c.txt", "a.txt", "b.txt"]);
        assert_eq!(split.labels(), &[CAT, DOG, DOG]);
        assert_eq!(split.features()[0].as_slice(), &[-2.0, -1.0]);
        assert_eq!(split.class_counts(), (1, 2));
        assert_eq!(split.dim(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = fixture();
        let sequential =
            load_split(dir.path(), &TextExtractor, &SubstringLabel::default(), false).unwrap();
        let parallel =
            load_split(dir.path(), &TextExtractor, &SubstringLabel::default(), true).unwrap();

        assert_eq!(sequential.filenames(), parallel.filenames());
        assert_eq!(sequential.labels(), parallel.labels());
        assert_eq!(sequential.features(), parallel.features());
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = load_split(&missing, &TextExtractor, &SubstringLabel::default(), false);
        assert!(matches!(result, Err(SVMError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_bad_file_aborts() {
        let dir = fixture();
        write(dir.path(), "cats/broken.txt", "meow");

        for parallel in [false, true] {
            let result = load_split(
                dir.path(),
                &TextExtractor,
                &SubstringLabel::default(),
                parallel,
            );
            assert!(matches!(result, Err(SVMError::DecodeError { .. })));
        }
    }

    #[test]
    fn test_custom_label_strategy() {
        let dir = fixture();
        let everything_is_a_cat = |_: &str| CAT;
        let split = load_split(dir.path(), &TextExtractor, &everything_is_a_cat, false).unwrap();
        assert_eq!(split.class_counts(), (3, 0));
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        let dir = fixture();
        write(dir.path(), "dogs/c.txt", "1,2,3");
        let result = load_split(dir.path(), &TextExtractor, &SubstringLabel::default(), false);
        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_split_new_length_mismatch() {
        let result = DatasetSplit::new(
            vec![FeatureVector::new(vec![1.0])],
            vec![CAT, DOG],
            vec!["a".to_string()],
        );
        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_dataset_trait_uses_solver_labels() {
        let split = DatasetSplit::new(
            vec![FeatureVector::new(vec![1.0]), FeatureVector::new(vec![2.0])],
            vec![CAT, 5],
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap();

        assert_eq!(split.get_labels(), vec![-1.0, 1.0]);
        assert_eq!(split.get_sample(1).label, 1.0);
    }
}

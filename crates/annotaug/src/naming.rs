//! Deterministic output names for augmented images.
//!
//! `a/img.jpg`, round 2 becomes `a/img_augmented_2.jpg`. Directory components
//! of the source reference are kept so equal file names from different
//! folders do not collide. Root, prefix and `..` components are dropped so
//! the result always stays below the output directory; the clashes this can
//! create (and repeated references) are resolved by [`assign_output_bases`].

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

const AUGMENTED_TAG: &str = "_augmented_";
const PREVIEW_SUFFIX: &str = "_preview";

/// Relative directory, stem and extension that all outputs of one source
/// record are named after.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputBase {
    parent: PathBuf,
    stem: String,
    extension: String,
}

impl OutputBase {
    /// Split a file reference into its sanitized parts.
    pub fn new(file: &str, default_extension: &str) -> Self {
        let path = Path::new(file);
        let parent: PathBuf = path
            .parent()
            .map(|p| {
                p.components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_extension.trim_start_matches('.').to_string());
        Self {
            parent,
            stem,
            extension,
        }
    }

    fn with_stem(&self, stem: String) -> Self {
        Self {
            stem,
            ..self.clone()
        }
    }

    /// Relative output path of round `round`.
    pub fn augmented(&self, round: u32) -> PathBuf {
        self.parent.join(format!(
            "{}{AUGMENTED_TAG}{round}.{}",
            self.stem, self.extension
        ))
    }

    /// Relative path of the annotation preview that goes with [`Self::augmented`].
    pub fn preview(&self, round: u32) -> PathBuf {
        self.parent.join(format!(
            "{}{AUGMENTED_TAG}{round}{PREVIEW_SUFFIX}.{}",
            self.stem, self.extension
        ))
    }
}

/// One base per file reference, in input order, all distinct.
///
/// A base already handed out gets `_<index>` appended to its stem (then
/// `_<index>_<n>` if that is taken too). Rounds are a trailing number after
/// `_augmented_`, so distinct bases never produce the same output path.
pub fn assign_output_bases<'a>(
    files: impl IntoIterator<Item = &'a str>,
    default_extension: &str,
) -> Vec<OutputBase> {
    let mut used = HashSet::new();
    files
        .into_iter()
        .enumerate()
        .map(|(index, file)| {
            let base = OutputBase::new(file, default_extension);
            let mut candidate = base.clone();
            let mut n = 0usize;
            while used.contains(&candidate) {
                let stem = if n == 0 {
                    format!("{}_{index}", base.stem)
                } else {
                    format!("{}_{index}_{n}", base.stem)
                };
                candidate = base.with_stem(stem);
                n += 1;
            }
            if candidate != base {
                log::info!(
                    "output name for record #{index} ({file}) renamed to stem {:?}",
                    candidate.stem
                );
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Render a relative path with `/` separators for the annotation file.
pub fn to_reference(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

//! Project discovery and per-project image ordering.
//!
//! ## Directory Structure
//!
//! ```text
//! content/projects/                # Projects root
//! ├── config.toml                  # Optimizer config (optional)
//! ├── bauhaus-poster/              # One directory per project slug
//! │   ├── cover.jpg                # Cover (any case, jpg/jpeg/png), processed first
//! │   ├── 1.jpg                    # Sequence images, ascending by number
//! │   ├── 2.png
//! │   ├── 10.jpg
//! │   └── detail-shot.jpg          # Everything else, after the sequence
//! └── type-specimen/
//!     └── ...
//! ```
//!
//! ## Ordering
//!
//! [`ProjectImageSet::ordered`] yields the cover, then numbered images by
//! number, then the remaining images. Directory listings come back in
//! filesystem order, so every listing is sorted by file name first; the
//! remaining images therefore appear alphabetically and runs are repeatable.
//!
//! ## Duplicates
//!
//! No two sources may write the same output file. That happens when two
//! files map to one canonical name (`1.jpg` and `01.png`, `extra.jpg` and
//! `extra.png`, a second cover), and also when one canonical name equals a
//! preset file of another (`hero-medium.jpg` is `img-hero-medium.*`, which
//! `hero.jpg` writes for the `medium` preset). Sources claim their output
//! names in file-name order; a source hitting an already claimed name is
//! listed in [`ProjectImageSet::duplicates`] and never processed.
//!
//! Hidden files, subdirectories and non-image files are ignored.

use crate::imaging::supported_input_extensions;
use crate::naming::{ImageRole, output_filenames};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// One source image and the name its variants are written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub filename: String,
    pub role: ImageRole,
    pub canonical: String,
}

/// A source skipped because another file already claimed one of its output
/// file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub path: PathBuf,
    pub canonical: String,
    /// The first clashing output file name.
    pub output: String,
    /// The source that keeps it.
    pub kept: PathBuf,
}

/// The ordered source images of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectImageSet {
    pub slug: String,
    pub dir: PathBuf,
    pub cover: Option<SourceEntry>,
    /// Ascending by number.
    pub numbered: Vec<SourceEntry>,
    /// Sorted by file name.
    pub others: Vec<SourceEntry>,
    pub duplicates: Vec<Duplicate>,
}

impl ProjectImageSet {
    /// Processing order: cover, numbered, others.
    pub fn ordered(&self) -> Vec<&SourceEntry> {
        self.cover
            .iter()
            .chain(self.numbered.iter())
            .chain(self.others.iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cover.iter().count() + self.numbered.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_source_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Sorted, non-hidden entries of `dir`.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::DirectoryNotFound(dir.to_path_buf()));
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !is_hidden(&file_name(p)))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Project directories under `root`, sorted by slug.
pub fn list_projects(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    Ok(sorted_entries(root)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

/// Collect and order the source images of one project directory.
///
/// `presets` are the preset names variants will be written under; they
/// decide which output names a source claims.
pub fn scan_project(dir: &Path, presets: &[&str]) -> Result<ProjectImageSet, ScanError> {
    let slug = file_name(dir);
    let mut set = ProjectImageSet {
        slug,
        dir: dir.to_path_buf(),
        cover: None,
        numbered: Vec::new(),
        others: Vec::new(),
        duplicates: Vec::new(),
    };
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();

    for path in sorted_entries(dir)? {
        if !path.is_file() || !is_source_image(&path) {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let role = ImageRole::from_stem(&stem);
        let canonical = role.canonical_name();

        let outputs = output_filenames(&canonical, presets);
        let clash = outputs
            .iter()
            .find_map(|name| claimed.get(name).map(|kept| (name.clone(), kept.clone())));
        if let Some((output, kept)) = clash {
            set.duplicates.push(Duplicate {
                path,
                canonical,
                output,
                kept,
            });
            continue;
        }
        for name in outputs {
            claimed.insert(name, path.clone());
        }

        let entry = SourceEntry {
            filename: file_name(&path),
            path,
            role,
            canonical,
        };
        match entry.role {
            ImageRole::Cover => set.cover = Some(entry),
            ImageRole::Numbered(_) => set.numbered.push(entry),
            ImageRole::Other(_) => set.others.push(entry),
        }
    }

    set.numbered
        .sort_by(|a, b| a.role.sequence_key().cmp(&b.role.sequence_key()));
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    const PRESETS: &[&str] = &["thumbnail", "medium", "large", "desktop"];

    fn scan(dir: &Path) -> Result<ProjectImageSet, ScanError> {
        scan_project(dir, PRESETS)
    }

    fn order(set: &ProjectImageSet) -> Vec<&str> {
        set.ordered().iter().map(|e| e.filename.as_str()).collect()
    }

    #[test]
    fn cover_then_numbers_then_rest() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["extra.png", "2.jpg", "1.jpg", "cover.jpg"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(order(&set), vec!["cover.jpg", "1.jpg", "2.jpg", "extra.png"]);
        let names: Vec<&str> = set.ordered().iter().map(|e| e.canonical.as_str()).collect();
        assert_eq!(names, vec!["cover", "img-01", "img-02", "img-extra"]);
    }

    #[test]
    fn numbers_sort_numerically_not_lexically() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["10.jpg", "9.jpg", "02.png", "1.jpeg"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(order(&set), vec!["1.jpeg", "02.png", "9.jpg", "10.jpg"]);
    }

    #[test]
    fn cover_matches_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1.jpg", "COVER.PNG"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(set.cover.as_ref().unwrap().filename, "COVER.PNG");
        assert_eq!(set.cover.as_ref().unwrap().canonical, "cover");
    }

    #[test]
    fn ignores_hidden_non_images_and_subdirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &[".DS_Store", "notes.txt", "clip.gif", "1.jpg"]);
        fs::create_dir(tmp.path().join("raw")).unwrap();
        touch(&tmp.path().join("raw"), &["2.jpg"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(order(&set), vec!["1.jpg"]);
    }

    #[test]
    fn duplicate_canonical_names_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["1.jpg", "01.png", "cover.jpg", "cover.png"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(order(&set), vec!["cover.jpg", "01.png"]);
        let dups: Vec<String> = set.duplicates.iter().map(|d| file_name(&d.path)).collect();
        assert_eq!(dups, vec!["1.jpg", "cover.png"]);
        assert_eq!(set.duplicates[0].canonical, "img-01");
        assert_eq!(set.duplicates[0].output, "img-01.jpg");
        assert_eq!(file_name(&set.duplicates[0].kept), "01.png");
    }

    #[test]
    fn canonical_name_clashing_with_preset_file_is_duplicate() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["hero.jpg", "hero-medium.jpg"]);

        let set = scan(tmp.path()).unwrap();

        // `hero-medium.jpg` sorts first and claims img-hero-medium.*
        assert_eq!(order(&set), vec!["hero-medium.jpg"]);
        assert_eq!(set.duplicates.len(), 1);
        let dup = &set.duplicates[0];
        assert_eq!(file_name(&dup.path), "hero.jpg");
        assert_eq!(dup.output, "img-hero-medium.jpg");
        assert_eq!(file_name(&dup.kept), "hero-medium.jpg");
    }

    #[test]
    fn preset_suffix_without_matching_preset_is_fine() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["hero.jpg", "hero-poster.jpg"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(order(&set), vec!["hero-poster.jpg", "hero.jpg"]);
        assert!(set.duplicates.is_empty());
    }

    #[test]
    fn collisions_follow_the_configured_presets() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["hero.jpg", "hero-poster.jpg"]);

        let set = scan_project(tmp.path(), &["poster"]).unwrap();
        assert_eq!(order(&set), vec!["hero-poster.jpg"]);
        assert_eq!(set.duplicates[0].output, "img-hero-poster.jpg");
    }

    #[test]
    fn very_long_numbers_stay_in_the_sequence() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["99999999999.jpg", "2.jpg", "extra.jpg", "10.jpg"]);

        let set = scan(tmp.path()).unwrap();
        assert_eq!(
            order(&set),
            vec!["2.jpg", "10.jpg", "99999999999.jpg", "extra.jpg"]
        );
    }

    #[test]
    fn project_without_cover() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["b.jpg", "a.jpg"]);

        let set = scan(tmp.path()).unwrap();
        assert!(set.cover.is_none());
        assert_eq!(order(&set), vec!["a.jpg", "b.jpg"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn missing_project_is_directory_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound(_))));
    }

    #[test]
    fn list_projects_sorted_dirs_only() {
        let tmp = TempDir::new().unwrap();
        for dir in ["zeta", "alpha", ".git"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        touch(tmp.path(), &["config.toml"]);

        let projects: Vec<String> = list_projects(tmp.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(projects, vec!["alpha", "zeta"]);
    }

    #[test]
    fn slug_is_directory_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bauhaus-poster");
        fs::create_dir(&dir).unwrap();
        assert_eq!(scan(&dir).unwrap().slug, "bauhaus-poster");
    }
}

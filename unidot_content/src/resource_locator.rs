use std::{
    collections::{hash_map::Entry, HashMap},
    path::{Path, PathBuf},
};

use unidot_shared::{
    log::{info, trace, warn},
    walkdir::WalkDir,
};

use crate::common::{extract_extension_from_path, ResourceId};

/// Extension that every texture is expected to have in the Godot project when the original format can't be imported.
pub const CANONICAL_RASTER_EXTENSION: &str = "png";

/// Layered image formats that Godot can't import. They are expected to be exported as PNG.
pub const LAYERED_IMAGE_EXTENSIONS: &[&str] = &["psd", "psb", "xcf"];

/// Files of one Godot project by their lowercase file name.
#[derive(Debug, Default, Clone)]
pub struct FileNameIndex {
    files: HashMap<String, PathBuf>,
}

impl FileNameIndex {
    /// Walks the whole tree under `root`. The walk is sorted by file name and when the same
    /// file name appears in several directories, the first one in that order wins.
    pub fn build(root: &Path) -> Self {
        info!("Indexing file names in '{}'", root.display());
        let mut files = HashMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read directory entry in '{}': {err}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_lowercase();
            files.entry(file_name).or_insert_with(|| entry.into_path());
        }
        trace!("Found {} distinct file names in '{}'", files.len(), root.display());
        Self { files }
    }

    /// Returns the first file with the given name. The comparison is case-insensitive.
    pub fn get(&self, file_name: &str) -> Option<&Path> {
        self.files.get(&file_name.to_lowercase()).map(PathBuf::as_path)
    }
}

/// File names (lowercase) that are tried in order when looking for the Godot counterpart of `source_path`.
///
/// # Example
///
/// ```rust
/// use unidot_content::resource_locator::candidate_file_names;
/// assert_eq!(candidate_file_names("Textures/Wood.psd"), vec!["wood.png"]);
/// assert_eq!(candidate_file_names("Textures/Wood.tga"), vec!["wood.tga", "wood.png"]);
/// ```
pub fn candidate_file_names(source_path: impl AsRef<Path>) -> Vec<String> {
    let source_path = source_path.as_ref();
    let Some(stem) = source_path.file_stem() else {
        return Vec::new();
    };
    let stem = stem.to_string_lossy().to_lowercase();

    let mut file_names = Vec::with_capacity(2);
    match extract_extension_from_path(source_path) {
        Some(extension) if LAYERED_IMAGE_EXTENSIONS.contains(&extension.as_str()) => {}
        Some(extension) => file_names.push(format!("{stem}.{extension}")),
        None => file_names.push(stem.clone()),
    }
    let fallback = format!("{stem}.{CANONICAL_RASTER_EXTENSION}");
    if !file_names.contains(&fallback) {
        file_names.push(fallback);
    }
    file_names
}

/// Finds the Godot resource that corresponds to a Unity asset by its file name.
#[derive(Debug, Default)]
pub struct ResourceLocator {
    indices: HashMap<PathBuf, FileNameIndex>,
    located: HashMap<(PathBuf, PathBuf), Option<ResourceId>>,
    walk_count: usize,
}

impl ResourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the [`ResourceId`] of the file in the Godot project at `target_root` that
    /// has the same name as `source_path`. See [`candidate_file_names`] for the names that are tried.
    pub fn locate(&mut self, target_root: impl AsRef<Path>, source_path: impl AsRef<Path>) -> Option<ResourceId> {
        let target_root = target_root.as_ref();
        let source_path = source_path.as_ref();

        let key = (target_root.to_owned(), source_path.to_owned());
        if let Some(located) = self.located.get(&key) {
            return located.clone();
        }

        let index = match self.indices.entry(target_root.to_owned()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.walk_count += 1;
                vacant.insert(FileNameIndex::build(target_root))
            }
        };

        let located = candidate_file_names(source_path)
            .iter()
            .find_map(|file_name| index.get(file_name))
            .and_then(|path| ResourceId::from_project_path(target_root, path));
        trace!("Located '{}' as {located:?}", source_path.display());

        self.located.insert(key, located.clone());
        located
    }

    /// Number of directory walks that were necessary so far.
    pub fn walk_count(&self) -> usize {
        self.walk_count
    }
}

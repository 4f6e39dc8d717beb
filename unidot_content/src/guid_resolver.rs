//! Resolves the GUIDs that Unity files use to reference each other.
//!
//! Every Unity asset has a `.meta` sidecar next to it that declares the GUID of the
//! asset in a top-level `guid: <hex>` line. A material referencing a texture only
//! contains that GUID, so the sidecars of the whole project have to be read to find
//! the texture file.

use std::{
    collections::{hash_map::Entry, HashMap},
    fs,
    path::{Path, PathBuf},
};

use unidot_shared::{
    log::{info, trace, warn},
    walkdir::WalkDir,
};

use crate::common::{has_extension, META_FILE_EXTENSION};

const GUID_MARKER: &str = "guid:";

/// Maps the GUIDs declared by the sidecars of one project to the assets they describe.
#[derive(Debug, Default, Clone)]
pub struct GuidIndex {
    assets: HashMap<String, PathBuf>,
}

impl GuidIndex {
    /// Walks the whole tree under `project_root` and reads every sidecar.
    ///
    /// The walk is sorted by file name. When two sidecars declare the same GUID, the
    /// first one in that order wins. Sidecars that can't be read as UTF-8 and sidecars
    /// of assets that don't exist are skipped.
    pub fn build(project_root: &Path) -> Self {
        info!("Indexing GUIDs in '{}'", project_root.display());
        let mut assets = HashMap::new();

        for entry in WalkDir::new(project_root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read directory entry in '{}': {err}", project_root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() || !has_extension(entry.path(), META_FILE_EXTENSION) {
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(err) => {
                    trace!("Skipping sidecar '{}': {err}", entry.path().display());
                    continue;
                }
            };
            let Some(guid) = parse_guid(&content) else {
                trace!("Sidecar '{}' doesn't declare a GUID", entry.path().display());
                continue;
            };

            // Removes only the ".meta" so that "Wood.psd.meta" becomes "Wood.psd".
            let asset_path = entry.path().with_extension("");
            if !asset_path.exists() {
                trace!("Sidecar '{}' belongs to an asset that doesn't exist", entry.path().display());
                continue;
            }

            match assets.entry(guid.to_owned()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(asset_path);
                }
                Entry::Occupied(occupied) => {
                    warn! {
                        "GUID {guid} is declared for '{}' and '{}'. Keeping the first one.",
                        occupied.get().display(),
                        asset_path.display()
                    }
                }
            }
        }

        trace!("Found {} GUIDs in '{}'", assets.len(), project_root.display());
        Self { assets }
    }

    /// Returns the asset that declares the `guid`.
    pub fn get(&self, guid: &str) -> Option<&Path> {
        self.assets.get(guid).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Returns the value of the top-level `guid:` line. Nested references like
/// `second: {fileID: 2100000, guid: …}` in importer settings are indented and don't count.
fn parse_guid(content: &str) -> Option<&str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(GUID_MARKER))
        .map(str::trim)
        .filter(|guid| !guid.is_empty())
}

/// Finds the asset that belongs to a GUID.
///
/// The first lookup in a project walks the project once and builds a [`GuidIndex`]. All
/// following lookups in the same project, successful or not, are answered from that index.
#[derive(Debug, Default)]
pub struct GuidResolver {
    indices: HashMap<PathBuf, GuidIndex>,
    walk_count: usize,
}

impl GuidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path of the asset whose sidecar declares the `guid`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unidot_content::GuidResolver;
    /// let mut guid_resolver = GuidResolver::new();
    /// let asset = guid_resolver.resolve("missing_unity_project", "0123456789abcdef0123456789abcdef");
    /// assert_eq!(asset, None);
    /// assert_eq!(guid_resolver.walk_count(), 1);
    /// ```
    pub fn resolve(&mut self, project_root: impl AsRef<Path>, guid: &str) -> Option<PathBuf> {
        let project_root = project_root.as_ref();
        trace!("Searching for GUID {guid} in '{}'", project_root.display());
        let index = match self.indices.entry(project_root.to_owned()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.walk_count += 1;
                vacant.insert(GuidIndex::build(project_root))
            }
        };
        index.get(guid).map(Path::to_path_buf)
    }

    /// Number of directory walks that were necessary so far.
    pub fn walk_count(&self) -> usize {
        self.walk_count
    }
}

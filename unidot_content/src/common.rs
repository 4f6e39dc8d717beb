use std::{
    collections::BTreeMap,
    fmt::{self, Formatter},
    fs, io,
    path::{Component, Path, PathBuf},
    result,
};

use serde::Serialize;
use unidot_shared::{log::info, pathdiff, thiserror};

/// Extension of the sidecar files that Unity writes next to every asset.
pub const META_FILE_EXTENSION: &str = "meta";

/// Prefix of every Godot resource path.
pub const RESOURCE_SCHEME: &str = "res://";

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("Directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid config '{0}': {1}")]
    InvalidConfig(PathBuf, String),
}

/// Identifies a resource in the Godot project. It's the `res://` path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a [`ResourceId`] from a path relative to the Godot project root.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unidot_content::ResourceId;
    /// let resource_id = ResourceId::from_relative_path("textures/wood.png");
    /// assert_eq!(resource_id.as_str(), "res://textures/wood.png");
    /// ```
    pub fn from_relative_path(relative_path: impl AsRef<Path>) -> Self {
        let relative_path = relative_path.as_ref().to_string_lossy().replace('\\', "/");
        Self(format!("{RESOURCE_SCHEME}{relative_path}"))
    }

    /// Creates a [`ResourceId`] for a file in the Godot project. Returns `None` when the
    /// file is not located below `project_root`.
    pub fn from_project_path(project_root: impl AsRef<Path>, path: impl AsRef<Path>) -> Option<Self> {
        let relative_path = pathdiff::diff_paths(path.as_ref(), project_root.as_ref())?;
        let is_below_root = relative_path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !is_below_root {
            return None;
        }
        Some(Self::from_relative_path(relative_path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Godot resource of every converted material, keyed by the material name declared in the Unity file.
pub type MaterialMapping = BTreeMap<String, ResourceId>;

/// The four directories of a conversion run.
///
/// The Unity and Godot project roots are used to resolve references between the
/// projects. The Unity assets directory is the input that is scanned for materials
/// and meshes and the Godot assets directory is the output. Both assets directories
/// are usually located inside of their project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    unity_project_path: PathBuf,
    godot_project_path: PathBuf,
    unity_assets_path: PathBuf,
    godot_assets_path: PathBuf,
}

impl Directories {
    pub fn new(
        unity_project_path: impl Into<PathBuf>,
        godot_project_path: impl Into<PathBuf>,
        unity_assets_path: impl Into<PathBuf>,
        godot_assets_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            unity_project_path: unity_project_path.into(),
            godot_project_path: godot_project_path.into(),
            unity_assets_path: unity_assets_path.into(),
            godot_assets_path: godot_assets_path.into(),
        }
    }

    /// Checks that the input directories exist and creates the output directory.
    ///
    /// Returns the directories as canonical absolute paths so that paths below one root can
    /// be compared with every other root, no matter how they were spelled.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unidot_content::{Directories, Error};
    /// let directories = Directories::new("does/not/exist", "godot", "does/not/exist/Assets", "godot/assets");
    /// assert!(matches!(directories.check(), Err(Error::MissingDirectory(_))));
    /// ```
    pub fn check(&self) -> Result<Self> {
        for path in [&self.unity_project_path, &self.godot_project_path, &self.unity_assets_path] {
            if !path.is_dir() {
                return Err(Error::MissingDirectory(path.clone()));
            }
        }
        if !self.godot_assets_path.is_dir() {
            info!("Creating output directory '{}'", self.godot_assets_path.display());
            fs::create_dir_all(&self.godot_assets_path)?;
        }
        Ok(Self {
            unity_project_path: fs::canonicalize(&self.unity_project_path)?,
            godot_project_path: fs::canonicalize(&self.godot_project_path)?,
            unity_assets_path: fs::canonicalize(&self.unity_assets_path)?,
            godot_assets_path: fs::canonicalize(&self.godot_assets_path)?,
        })
    }

    pub fn unity_project_path(&self) -> &Path {
        &self.unity_project_path
    }

    pub fn godot_project_path(&self) -> &Path {
        &self.godot_project_path
    }

    pub fn unity_assets_path(&self) -> &Path {
        &self.unity_assets_path
    }

    pub fn godot_assets_path(&self) -> &Path {
        &self.godot_assets_path
    }
}

/// Returns the lowercase extension of the path if it has one.
pub(crate) fn extract_extension_from_path(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_lowercase())
}

pub(crate) fn extract_file_name_from_path(path: &Path) -> Result<String> {
    Ok(path
        .file_name()
        .and_then(|file_name| file_name.to_str())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

pub(crate) fn extract_file_stem_from_path(path: &Path) -> Result<String> {
    Ok(path
        .file_stem()
        .and_then(|file_stem| file_stem.to_str())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

/// Checks the extension case-insensitively.
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    extract_extension_from_path(path).is_some_and(|e| e == extension.to_lowercase())
}

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fmt::Write,
    fs,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;
use unidot_shared::{
    log::{info, trace, warn},
    pathdiff,
    walkdir::WalkDir,
};

use crate::{
    common::{extract_file_name_from_path, extract_file_stem_from_path, Directories, MaterialMapping, ResourceId},
    Result,
};

/// Decides whether a material belongs to a mesh.
pub trait MaterialMatcher {
    fn matches(&self, material_name: &str, mesh_name: &str) -> bool;
}

/// The material name is contained in the mesh name, ignoring case. "Crate" matches "Crate_Large".
#[derive(Debug, Clone, Copy, Default)]
pub struct NameContainment;

impl MaterialMatcher for NameContainment {
    fn matches(&self, material_name: &str, mesh_name: &str) -> bool {
        mesh_name.to_lowercase().contains(&material_name.to_lowercase())
    }
}

/// The material name equals the mesh name, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactStem;

impl MaterialMatcher for ExactStem {
    fn matches(&self, material_name: &str, mesh_name: &str) -> bool {
        material_name.to_lowercase() == mesh_name.to_lowercase()
    }
}

/// Selects one of the [`MaterialMatcher`]s in a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialMatching {
    #[default]
    Contains,
    Exact,
}

impl MaterialMatching {
    pub fn matcher(self) -> Box<dyn MaterialMatcher> {
        match self {
            MaterialMatching::Contains => Box::new(NameContainment),
            MaterialMatching::Exact => Box::new(ExactStem),
        }
    }
}

/// Returns the material overrides for the mesh keyed by the node name, which is the mesh name.
///
/// When several materials match, the last one in the order of the material names wins.
///
/// # Example
///
/// ```rust
/// use unidot_content::{scene_composer::{associate_materials, NameContainment}, MaterialMapping, ResourceId};
/// let mut material_mapping = MaterialMapping::new();
/// material_mapping.insert("crate".to_owned(), ResourceId::from_relative_path("assets/Crate.tres"));
/// material_mapping.insert("barrel".to_owned(), ResourceId::from_relative_path("assets/Barrel.tres"));
/// let overrides = associate_materials("Crate_Large", &material_mapping, &NameContainment);
/// assert_eq!(overrides["Crate_Large"].as_str(), "res://assets/Crate.tres");
/// assert_eq!(overrides.len(), 1);
/// ```
pub fn associate_materials(mesh_name: &str, material_mapping: &MaterialMapping, matcher: &dyn MaterialMatcher) -> BTreeMap<String, ResourceId> {
    let mut overrides = BTreeMap::new();
    for (material_name, resource_id) in material_mapping {
        if matcher.matches(material_name, mesh_name) {
            trace!("Material '{material_name}' matches mesh '{mesh_name}'");
            overrides.insert(mesh_name.to_owned(), resource_id.clone());
        }
    }
    overrides
}

/// Location of a node in the instantiated scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSlot {
    pub parent: String,
    pub index: usize,
}

/// Determines the nodes of the instantiated mesh scene that receive a material override.
pub trait NodeLayout {
    fn override_slots(&self, mesh_resource: &ResourceId, node_name: &str) -> Vec<NodeSlot>;
}

/// Assumes that the mesh is the first child of the scene root, which is how Godot imports single-mesh files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChildLayout;

impl NodeLayout for FirstChildLayout {
    fn override_slots(&self, _mesh_resource: &ResourceId, _node_name: &str) -> Vec<NodeSlot> {
        vec![NodeSlot {
            parent: ".".to_owned(),
            index: 0,
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOverride {
    pub node_name: String,
    pub slot: NodeSlot,
    pub material: ResourceId,
}

/// A `.tscn` scene that instantiates a mesh and overrides its materials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GodotScene {
    pub root_name: String,
    pub mesh_resource: ResourceId,
    pub overrides: Vec<NodeOverride>,
}

impl GodotScene {
    pub fn to_tscn(&self) -> String {
        let mut tscn = String::from("[gd_scene load_steps=2 format=3]\n\n");
        // Writing to a String can't fail.
        let _ = write!(
            tscn,
            "[ext_resource type=\"PackedScene\" path=\"{}\" id=\"1\"]\n\n[node name=\"{}\" instance=ExtResource(\"1\")]\n\n",
            self.mesh_resource, self.root_name
        );
        for node_override in &self.overrides {
            let _ = write!(
                tscn,
                "[node name=\"{}\" parent=\"{}\" index=\"{}\"]\nmaterial_override = ExtResource(\"{}\")\n\n",
                node_override.node_name, node_override.slot.parent, node_override.slot.index, node_override.material
            );
        }
        tscn
    }
}

/// Finds the Godot counterpart of a Unity mesh.
///
/// First the relative location in the Unity assets directory is tried in the Godot assets
/// directory. Otherwise the first file with exactly the same name anywhere in the Godot
/// assets directory is used.
pub fn locate_mesh(mesh_source_path: &Path, directories: &Directories) -> Option<ResourceId> {
    let godot_project_path = directories.godot_project_path();
    let godot_assets_path = directories.godot_assets_path();

    if let Some(relative_path) = pathdiff::diff_paths(mesh_source_path, directories.unity_assets_path()) {
        let direct_path = godot_assets_path.join(relative_path);
        if direct_path.is_file() {
            info!("Found mesh via direct mapping: {}", direct_path.display());
            return ResourceId::from_project_path(godot_project_path, direct_path);
        }
    }

    let file_name = mesh_source_path.file_name()?;
    info! {
        "Direct path not found, searching for {} in {}",
        file_name.to_string_lossy(),
        godot_assets_path.display()
    };
    let found_path = WalkDir::new(godot_assets_path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Failed to read directory entry in '{}': {err}", godot_assets_path.display());
                None
            }
        })
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())?;
    info!("Found mesh via search: {}", found_path.display());
    ResourceId::from_project_path(godot_project_path, found_path)
}

/// Writes scenes that instantiate the meshes of the Godot project with the converted materials.
pub struct SceneComposer {
    mesh_marker: String,
    scenes_dir_name: String,
    matcher: Box<dyn MaterialMatcher>,
    node_layout: Box<dyn NodeLayout>,
}

impl SceneComposer {
    pub fn new(mesh_marker: impl Into<String>, scenes_dir_name: impl Into<String>) -> Self {
        Self {
            mesh_marker: mesh_marker.into(),
            scenes_dir_name: scenes_dir_name.into(),
            matcher: Box::new(NameContainment),
            node_layout: Box::new(FirstChildLayout),
        }
    }

    /// Replaces the [`NameContainment`] matcher.
    pub fn with_matcher(mut self, matcher: Box<dyn MaterialMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Replaces the [`FirstChildLayout`].
    pub fn with_node_layout(mut self, node_layout: Box<dyn NodeLayout>) -> Self {
        self.node_layout = node_layout;
        self
    }

    /// Path of the scene file for the mesh.
    ///
    /// Scenes are collected in a scenes directory in the Godot assets directory. Below that, the
    /// location of the mesh relative to the Unity assets directory is kept starting with the
    /// mesh marker directory, e.g. `Art/Meshes/Props/Crate.fbx` becomes `Scenes/Meshes/Props/Crate.tscn`.
    pub fn scene_path(&self, mesh_source_path: &Path, directories: &Directories) -> Result<PathBuf> {
        let relative_path = pathdiff::diff_paths(mesh_source_path, directories.unity_assets_path())
            .unwrap_or_else(|| PathBuf::from(extract_file_name_from_path(mesh_source_path).unwrap_or_default()));
        let components = relative_path.components().collect::<Vec<_>>();
        let marker = OsStr::new(&self.mesh_marker);
        let relevant_path = match components.iter().position(|component| component.as_os_str() == marker) {
            Some(marker_index) => components[marker_index..].iter().collect::<PathBuf>(),
            None => {
                trace!("No '{}' directory in '{}'", self.mesh_marker, relative_path.display());
                relative_path.clone()
            }
        };
        let scene_dir = relevant_path
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter(|component| matches!(component, Component::Normal(_)))
                    .collect::<PathBuf>()
            })
            .unwrap_or_default();
        let scene_file_name = format!("{}.tscn", extract_file_stem_from_path(mesh_source_path)?);
        Ok(directories
            .godot_assets_path()
            .join(&self.scenes_dir_name)
            .join(scene_dir)
            .join(scene_file_name))
    }

    /// Builds the scene for the mesh. Returns `None` when the mesh is missing in the Godot project.
    pub fn compose_scene(
        &self,
        mesh_source_path: &Path,
        material_mapping: &MaterialMapping,
        directories: &Directories,
    ) -> Result<Option<GodotScene>> {
        let root_name = extract_file_stem_from_path(mesh_source_path)?;
        let Some(mesh_resource) = locate_mesh(mesh_source_path, directories) else {
            warn!("Could not find corresponding mesh in Godot project for {}", mesh_source_path.display());
            return Ok(None);
        };

        let overrides = associate_materials(&root_name, material_mapping, self.matcher.as_ref());
        let mut node_overrides = Vec::new();
        for (node_name, material) in &overrides {
            for slot in self.node_layout.override_slots(&mesh_resource, node_name) {
                node_overrides.push(NodeOverride {
                    node_name: node_name.clone(),
                    slot,
                    material: material.clone(),
                });
            }
        }

        Ok(Some(GodotScene {
            root_name,
            mesh_resource,
            overrides: node_overrides,
        }))
    }

    /// Writes the scene for the mesh and returns its path. Returns `None` and writes nothing
    /// when the mesh is missing in the Godot project.
    pub fn compose(&self, mesh_source_path: &Path, material_mapping: &MaterialMapping, directories: &Directories) -> Result<Option<PathBuf>> {
        let Some(scene) = self.compose_scene(mesh_source_path, material_mapping, directories)? else {
            return Ok(None);
        };
        let scene_path = self.scene_path(mesh_source_path, directories)?;
        if let Some(parent) = scene_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&scene_path, scene.to_tscn())?;
        Ok(Some(scene_path))
    }
}

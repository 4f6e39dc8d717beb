use std::{fs, path::Path};

use serde::Deserialize;
use unidot_shared::log::info;

use crate::{material_translator::KeywordMatching, scene_composer::MaterialMatching, Error, Result};

/// Settings of a conversion run. Every field is optional in the YAML file.
///
/// # Example
///
/// ```rust
/// use unidot_content::{config::ConverterConfig, material_translator::KeywordMatching};
/// let config = ConverterConfig::from_yaml_str("keyword_matching: token\nmesh_extensions: [fbx, obj]\n").unwrap();
/// assert_eq!(config.keyword_matching, KeywordMatching::Token);
/// assert_eq!(config.mesh_extensions, vec!["fbx", "obj"]);
/// assert_eq!(config.mesh_marker, "Meshes");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub keyword_matching: KeywordMatching,
    pub material_matching: MaterialMatching,
    /// Extension of the Unity materials without the dot.
    pub material_extension: String,
    /// Extensions of the meshes for which scenes are composed.
    pub mesh_extensions: Vec<String>,
    /// Directory name from which the location of a mesh is kept for its scene.
    pub mesh_marker: String,
    /// Directory in the Godot assets directory that receives the scenes.
    pub scenes_dir_name: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            keyword_matching: KeywordMatching::default(),
            material_matching: MaterialMatching::default(),
            material_extension: "mat".to_owned(),
            mesh_extensions: vec!["fbx".to_owned()],
            mesh_marker: "Meshes".to_owned(),
            scenes_dir_name: "Scenes".to_owned(),
        }
    }
}

impl ConverterConfig {
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file is a document without content, which serde_yaml doesn't accept as a struct.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading config '{}'", path.display());
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml).map_err(|err| Error::InvalidConfig(path.to_owned(), err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;
    use unidot_shared::indoc::indoc;
    use unidot_test::write_file;

    use super::*;

    #[test]
    fn defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.keyword_matching, KeywordMatching::Substring);
        assert_eq!(config.material_matching, MaterialMatching::Contains);
        assert_eq!(config.material_extension, "mat");
        assert_eq!(config.mesh_extensions, vec!["fbx"]);
        assert_eq!(config.scenes_dir_name, "Scenes");
        assert_eq!(ConverterConfig::from_yaml_str("").unwrap(), config);
    }

    #[test]
    fn from_file() {
        let root = TempDir::new("config").unwrap();
        let path = write_file(
            root.path().join("unidot.yaml"),
            indoc! {"
                material_matching: exact
                mesh_marker: Models
                scenes_dir_name: Prefabs
            "},
        );
        let config = ConverterConfig::from_yaml_file(path).unwrap();
        assert_eq!(config.material_matching, MaterialMatching::Exact);
        assert_eq!(config.mesh_marker, "Models");
        assert_eq!(config.scenes_dir_name, "Prefabs");
        assert_eq!(config.keyword_matching, KeywordMatching::Substring);
    }

    #[test]
    fn invalid_file() {
        let root = TempDir::new("config").unwrap();
        let path = write_file(root.path().join("unidot.yaml"), "keyword_matching: fuzzy\n");
        assert!(matches!(ConverterConfig::from_yaml_file(&path), Err(Error::InvalidConfig(p, _)) if p == path));

        let path = write_file(root.path().join("typo.yaml"), "mesh_extension: [obj]\n");
        assert!(matches!(ConverterConfig::from_yaml_file(&path), Err(Error::InvalidConfig(_, _))));

        assert!(matches!(
            ConverterConfig::from_yaml_file(root.path().join("missing.yaml")),
            Err(Error::IoError(_))
        ));
    }
}

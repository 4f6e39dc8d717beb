use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use tempdir::TempDir;
use unidot_shared::{
    indoc::{formatdoc, indoc},
    log::LevelFilter,
};

/// Installs a logger for the test. Can be called from every test since only the first call has an effect.
pub fn setup_logger() {
    let _ = simple_logger::SimpleLogger::new().with_level(LevelFilter::Trace).init();
}

/// Writes `content` to `path` and creates the parent directories if necessary.
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> PathBuf {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|err| panic!("Failed to create directory '{}': {err}", parent.display()));
    }
    fs::write(path, content).unwrap_or_else(|err| panic!("Failed to write file '{}': {err}", path.display()));
    path.to_owned()
}

/// Content of a `.meta` sidecar that declares the given GUID.
pub fn meta_file_content(guid: &str) -> String {
    formatdoc! {"
        fileFormatVersion: 2
        guid: {guid}
        TextureImporter:
          internalIDToNameTable: []
          externalObjects: {{}}
          serializedVersion: 12
    "}
}

/// A Unity project and a Godot project side by side in a temporary directory.
///
/// ```text
/// root/
/// ├─ unity/
/// │  ├─ Assets/
/// ├─ godot/
/// │  ├─ assets/
/// ```
pub struct ProjectFixture {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new("unidot").expect("Failed to create temporary directory");
        // The converter works with canonical paths, so the fixture hands out the same spelling.
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temporary directory");
        let fixture = Self { _temp_dir: temp_dir, root };
        fs::create_dir_all(fixture.unity_assets()).expect("Failed to create the Unity assets directory");
        fs::create_dir_all(fixture.godot_assets()).expect("Failed to create the Godot assets directory");
        fixture
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unity_root(&self) -> PathBuf {
        self.root().join("unity")
    }

    pub fn godot_root(&self) -> PathBuf {
        self.root().join("godot")
    }

    pub fn unity_assets(&self) -> PathBuf {
        self.unity_root().join("Assets")
    }

    pub fn godot_assets(&self) -> PathBuf {
        self.godot_root().join("assets")
    }

    /// Creates a Unity asset at the path relative to the Unity project root together with its `.meta` sidecar.
    pub fn add_unity_asset(&self, relative_path: impl AsRef<Path>, guid: &str) -> PathBuf {
        let asset_path = self.unity_root().join(relative_path);
        write_file(&asset_path, b"unity asset");
        let mut meta_path = asset_path.clone().into_os_string();
        meta_path.push(".meta");
        write_file(meta_path, meta_file_content(guid));
        asset_path
    }

    /// Creates a Unity material at the path relative to the Unity project root.
    pub fn add_unity_material(&self, relative_path: impl AsRef<Path>, material: &MaterialFixture) -> PathBuf {
        write_file(self.unity_root().join(relative_path), material.to_yaml())
    }

    /// Creates a file with the path relative to the Unity project root.
    pub fn add_unity_file(&self, relative_path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(self.unity_root().join(relative_path), content)
    }

    /// Creates a file with the path relative to the Godot project root.
    pub fn add_godot_file(&self, relative_path: impl AsRef<Path>) -> PathBuf {
        write_file(self.godot_root().join(relative_path), b"godot asset")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the YAML text of a Unity material (`.mat`) in the layout the Unity editor serializes.
#[derive(Debug, Clone, Default)]
pub struct MaterialFixture {
    name: String,
    shader_keywords: Option<String>,
    valid_keywords: Vec<String>,
    textures: Vec<(String, String, String)>,
    floats: Vec<(String, String)>,
    colors: Vec<(String, [f64; 4])>,
}

impl MaterialFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the `m_ShaderKeywords` line.
    pub fn with_shader_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.shader_keywords = Some(keywords.into());
        self
    }

    /// Adds an entry to the `m_ValidKeywords` list that newer Unity versions write.
    pub fn with_valid_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.valid_keywords.push(keyword.into());
        self
    }

    /// Adds a texture property like `_MainTex` that references the given GUID. An empty GUID writes an unset texture slot.
    pub fn with_texture(mut self, property: impl Into<String>, file_id: impl Into<String>, guid: impl Into<String>) -> Self {
        self.textures.push((property.into(), file_id.into(), guid.into()));
        self
    }

    /// Adds a float property. The value is written verbatim.
    pub fn with_float(mut self, property: impl Into<String>, value: impl ToString) -> Self {
        self.floats.push((property.into(), value.to_string()));
        self
    }

    pub fn with_color(mut self, property: impl Into<String>, rgba: [f64; 4]) -> Self {
        self.colors.push((property.into(), rgba));
        self
    }

    pub fn to_yaml(&self) -> String {
        let mut yaml = String::new();
        yaml.push_str(indoc! {"
            %YAML 1.1
            %TAG !u! tag:unity3d.com,2011:
            --- !u!21 &2100000
            Material:
              serializedVersion: 6
              m_ObjectHideFlags: 0
              m_CorrespondingSourceObject: {fileID: 0}
              m_PrefabInstance: {fileID: 0}
              m_PrefabAsset: {fileID: 0}
        "});
        writeln!(yaml, "  m_Name: {}", self.name).unwrap();
        yaml.push_str("  m_Shader: {fileID: 46, guid: 0000000000000000f000000000000000, type: 0}\n");
        if let Some(shader_keywords) = &self.shader_keywords {
            writeln!(yaml, "  m_ShaderKeywords: {shader_keywords}").unwrap();
        }
        if self.valid_keywords.is_empty() {
            yaml.push_str("  m_ValidKeywords: []\n");
        } else {
            yaml.push_str("  m_ValidKeywords:\n");
            for keyword in &self.valid_keywords {
                writeln!(yaml, "  - {keyword}").unwrap();
            }
        }
        yaml.push_str("  m_InvalidKeywords: []\n");
        yaml.push_str("  m_LightmapFlags: 4\n");
        yaml.push_str("  m_SavedProperties:\n");
        yaml.push_str("    serializedVersion: 3\n");

        yaml.push_str(if self.textures.is_empty() { "    m_TexEnvs: []\n" } else { "    m_TexEnvs:\n" });
        for (property, file_id, guid) in &self.textures {
            writeln!(yaml, "    - {property}:").unwrap();
            if guid.is_empty() {
                yaml.push_str("        m_Texture: {fileID: 0}\n");
            } else {
                writeln!(yaml, "        m_Texture: {{fileID: {file_id}, guid: {guid}, type: 3}}").unwrap();
            }
            yaml.push_str("        m_Scale: {x: 1, y: 1}\n");
            yaml.push_str("        m_Offset: {x: 0, y: 0}\n");
        }

        yaml.push_str("    m_Ints: []\n");
        if self.floats.is_empty() {
            yaml.push_str("    m_Floats: []\n");
        } else {
            yaml.push_str("    m_Floats:\n");
            for (property, value) in &self.floats {
                writeln!(yaml, "    - {property}: {value}").unwrap();
            }
        }

        if self.colors.is_empty() {
            yaml.push_str("    m_Colors: []\n");
        } else {
            yaml.push_str("    m_Colors:\n");
            for (property, [r, g, b, a]) in &self.colors {
                writeln!(yaml, "    - {property}: {{r: {r}, g: {g}, b: {b}, a: {a}}}").unwrap();
            }
        }
        yaml.push_str("  m_BuildTextureStacks: []\n");
        yaml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_layout() {
        let fixture = ProjectFixture::new();
        assert!(fixture.unity_assets().is_dir());
        assert!(fixture.godot_assets().is_dir());

        let asset = fixture.add_unity_asset("Assets/Textures/Wood.psd", "0123456789abcdef0123456789abcdef");
        assert!(asset.is_file());
        let meta = fs::read_to_string(fixture.unity_root().join("Assets/Textures/Wood.psd.meta")).unwrap();
        assert!(meta.contains("\nguid: 0123456789abcdef0123456789abcdef\n"));
    }

    #[test]
    fn material_yaml() {
        let yaml = MaterialFixture::new("Crate")
            .with_shader_keywords("_ALPHATEST_ON")
            .with_texture("_MainTex", "2800000", "0123456789abcdef0123456789abcdef")
            .with_float("_Glossiness", 0.5)
            .with_color("_Color", [1.0, 0.5, 0.25, 1.0])
            .to_yaml();
        assert!(yaml.contains("  m_Name: Crate\n"));
        assert!(yaml.contains("  m_ShaderKeywords: _ALPHATEST_ON\n"));
        assert!(yaml.contains("    - _MainTex:\n        m_Texture: {fileID: 2800000, guid: 0123456789abcdef0123456789abcdef, type: 3}\n"));
        assert!(yaml.contains("    m_Floats:\n    - _Glossiness: 0.5\n"));
        assert!(yaml.contains("    - _Color: {r: 1, g: 0.5, b: 0.25, a: 1}\n"));
    }
}

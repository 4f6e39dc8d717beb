//! Reads the parts of a Unity material (`.mat`) that are relevant for the conversion.
//!
//! Unity serializes materials in its own YAML dialect (custom tags, `%TAG` directives,
//! flow mappings spanning references). Only a handful of blocks are needed, so they are
//! extracted with patterns instead of deserializing the whole document:
//!
//! ```text
//! Material:
//!   m_Name: Crate
//!   m_ShaderKeywords: _ALPHATEST_ON _NORMALMAP
//!   m_SavedProperties:
//!     m_TexEnvs:
//!     - _MainTex:
//!         m_Texture: {fileID: 2800000, guid: 0123456789abcdef0123456789abcdef, type: 3}
//!     m_Floats:
//!     - _Glossiness: 0.5
//!     m_Colors:
//!     - _Color: {r: 1, g: 1, b: 1, a: 1}
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use unidot_shared::{
    log::{trace, warn},
    Rgba,
};

use crate::Result;

/// Name of materials that don't declare `m_Name`.
pub const UNKNOWN_MATERIAL_NAME: &str = "Unknown";

/// `fileID` of a texture slot that has no texture assigned.
const UNSET_FILE_ID: &str = "0";

lazy_static! {
    static ref NAME: Regex = Regex::new(r"m_Name: (.+)").expect("invalid name pattern");
    static ref TEXTURE: Regex = Regex::new(r"_(\w+):\s*\n\s*m_Texture:\s*\{fileID:\s*(-?\d+),\s*guid:\s*([a-f0-9]{32})")
        .expect("invalid texture pattern");
    static ref FLOAT_BLOCK: Regex = Regex::new(r"m_Floats:\s*((?:\s*-\s*_\w+:\s*-?[\d.]+(?:[eE][-+]?\d+)?\s*)+)").expect("invalid float block pattern");
    static ref FLOAT: Regex = Regex::new(r"-\s*_(\w+):\s*(-?[\d.]+(?:[eE][-+]?\d+)?)").expect("invalid float pattern");
    static ref COLOR_BLOCK: Regex = Regex::new(r"m_Colors:\s*((?:\s*-\s*_\w+:\s*\{[^}]+\}\s*)+)").expect("invalid color block pattern");
    static ref COLOR: Regex = Regex::new(
        r"-\s*_(\w+):\s*\{r:\s*(-?[\d.]+(?:[eE][-+]?\d+)?),\s*g:\s*(-?[\d.]+(?:[eE][-+]?\d+)?),\s*b:\s*(-?[\d.]+(?:[eE][-+]?\d+)?),\s*a:\s*(-?[\d.]+(?:[eE][-+]?\d+)?)\}"
    )
    .expect("invalid color pattern");
    static ref SHADER_KEYWORDS: Regex = Regex::new(r"m_ShaderKeywords:[ \t]*(.*)").expect("invalid shader keywords pattern");
    static ref VALID_KEYWORDS_BLOCK: Regex =
        Regex::new(r"m_ValidKeywords:[ \t]*\r?\n((?:[ \t]*-[ \t]+\S+[ \t]*(?:\r?\n|$))+)").expect("invalid valid keywords block pattern");
    static ref VALID_KEYWORD: Regex = Regex::new(r"-[ \t]+(\S+)").expect("invalid valid keyword pattern");
}

/// Reference from one Unity file to an asset in another file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetReference {
    pub file_id: String,
    pub guid: String,
}

/// The result of analyzing a Unity material.
///
/// Property names are stored without the leading underscore, so `_MainTex` is stored as `MainTex`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub name: String,
    pub source_path: PathBuf,
    pub textures: BTreeMap<String, AssetReference>,
    pub floats: BTreeMap<String, f64>,
    pub colors: BTreeMap<String, Rgba>,
    /// Space separated shader keywords like `_ALPHATEST_ON _NORMALMAP`
    pub shader_keywords: String,
}

impl MaterialRecord {
    /// Reads and analyzes the material file. Only fails when the file can't be read.
    ///
    /// Files that aren't valid UTF-8 are decoded as Latin-1.
    pub fn analyze(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(err) => {
                trace!("Material '{}' is not valid UTF-8. Decoding as Latin-1.", path.display());
                decode_latin1(err.as_bytes())
            }
        };
        Ok(Self::parse(&content, path))
    }

    /// Analyzes the text of a material. Blocks that are missing result in empty fields.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unidot_content::MaterialRecord;
    /// let record = MaterialRecord::parse("m_Name: Crate\nm_Floats:\n- _Glossiness: 0.8\n", "Crate.mat");
    /// assert_eq!(record.name, "Crate");
    /// assert_eq!(record.floats.get("Glossiness"), Some(&0.8));
    /// ```
    pub fn parse(content: &str, source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();

        let name = NAME
            .captures(content)
            .map(|captures| captures[1].trim().to_owned())
            .unwrap_or_else(|| UNKNOWN_MATERIAL_NAME.to_owned());

        let textures = TEXTURE
            .captures_iter(content)
            .filter(|captures| &captures[2] != UNSET_FILE_ID)
            .map(|captures| {
                let reference = AssetReference {
                    file_id: captures[2].to_owned(),
                    guid: captures[3].to_owned(),
                };
                (captures[1].to_owned(), reference)
            })
            .collect();

        let mut floats = BTreeMap::new();
        if let Some(block) = FLOAT_BLOCK.captures(content) {
            for captures in FLOAT.captures_iter(&block[1]) {
                match captures[2].parse::<f64>() {
                    Ok(value) => {
                        floats.insert(captures[1].to_owned(), value);
                    }
                    Err(_) => warn!("Ignoring float '_{}' with value '{}' in '{}'", &captures[1], &captures[2], source_path.display()),
                }
            }
        }

        let mut colors = BTreeMap::new();
        if let Some(block) = COLOR_BLOCK.captures(content) {
            for captures in COLOR.captures_iter(&block[1]) {
                let channels = [&captures[2], &captures[3], &captures[4], &captures[5]].map(str::parse::<f64>);
                match channels {
                    [Ok(r), Ok(g), Ok(b), Ok(a)] => {
                        colors.insert(captures[1].to_owned(), Rgba::new(r, g, b, a));
                    }
                    _ => warn!("Ignoring color '_{}' with invalid channels in '{}'", &captures[1], source_path.display()),
                }
            }
        }

        let shader_keywords = match SHADER_KEYWORDS.captures(content) {
            Some(captures) => captures[1].trim().to_owned(),
            None => valid_keywords(content),
        };

        Self {
            name,
            source_path,
            textures,
            floats,
            colors,
            shader_keywords,
        }
    }
}

/// Newer Unity versions write the keywords as `m_ValidKeywords` list instead of the
/// `m_ShaderKeywords` line. The entries are joined with spaces to get the same format.
fn valid_keywords(content: &str) -> String {
    let Some(block) = VALID_KEYWORDS_BLOCK.captures(content) else {
        return String::new();
    };
    VALID_KEYWORD
        .captures_iter(&block[1])
        .map(|captures| captures[1].to_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every byte is the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;
    use unidot_shared::{float_cmp::approx_eq, indoc::indoc, maplit::btreemap};
    use unidot_test::{setup_logger, write_file, MaterialFixture};

    use super::*;

    const GUID: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn full_material() {
        let yaml = MaterialFixture::new("Crate")
            .with_shader_keywords("_ALPHATEST_ON _NORMALMAP")
            .with_texture("_MainTex", "2800000", GUID)
            .with_texture("_BumpMap", "2800000", "fedcba9876543210fedcba9876543210")
            .with_float("_Glossiness", 0.8)
            .with_float("_Metallic", 0)
            .with_float("_Cutoff", 0.25)
            .with_color("_Color", [1.0, 0.5, 0.25, 1.0])
            .with_color("_EmissionColor", [0.0, 0.0, 0.0, 1.0])
            .to_yaml();
        let record = MaterialRecord::parse(&yaml, "Assets/Materials/Crate.mat");

        assert_eq!(record.name, "Crate");
        assert_eq!(record.source_path, PathBuf::from("Assets/Materials/Crate.mat"));
        assert_eq!(
            record.textures,
            btreemap! {
                "BumpMap".to_owned() => AssetReference { file_id: "2800000".to_owned(), guid: "fedcba9876543210fedcba9876543210".to_owned() },
                "MainTex".to_owned() => AssetReference { file_id: "2800000".to_owned(), guid: GUID.to_owned() },
            }
        );
        assert_eq!(record.floats.len(), 3);
        assert!(approx_eq!(f64, record.floats["Glossiness"], 0.8));
        assert!(approx_eq!(f64, record.floats["Metallic"], 0.0));
        assert!(approx_eq!(f64, record.floats["Cutoff"], 0.25));
        assert_eq!(record.colors["Color"], Rgba::new(1.0, 0.5, 0.25, 1.0));
        assert_eq!(record.colors["EmissionColor"], Rgba::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(record.shader_keywords, "_ALPHATEST_ON _NORMALMAP");
    }

    #[test]
    fn empty_material() {
        let record = MaterialRecord::parse("%YAML 1.1\n", "Empty.mat");
        assert_eq!(record.name, UNKNOWN_MATERIAL_NAME);
        assert!(record.textures.is_empty());
        assert!(record.floats.is_empty());
        assert!(record.colors.is_empty());
        assert_eq!(record.shader_keywords, "");
    }

    #[test]
    fn unset_textures_are_excluded() {
        let content = indoc! {"
            m_TexEnvs:
            - _MainTex:
                m_Texture: {fileID: 0, guid: 0123456789abcdef0123456789abcdef, type: 3}
            - _BumpMap:
                m_Texture: {fileID: 0}
            - _OcclusionMap:
                m_Texture: {fileID: 2800000, guid: 0123456789abcdef0123456789abcdef, type: 3}
        "};
        let record = MaterialRecord::parse(content, "A.mat");
        assert_eq!(record.textures.keys().collect::<Vec<_>>(), vec!["OcclusionMap"]);
    }

    #[test]
    fn negative_and_exponent_floats() {
        let content = indoc! {"
            m_Floats:
            - _Parallax: -0.02
            - _Threshold: 1e-05
            - _ZWrite: 1
            m_Colors: []
        "};
        let record = MaterialRecord::parse(content, "A.mat");
        assert_eq!(record.floats.len(), 3);
        assert!(approx_eq!(f64, record.floats["Parallax"], -0.02));
        assert!(approx_eq!(f64, record.floats["Threshold"], 0.00001));
        assert!(approx_eq!(f64, record.floats["ZWrite"], 1.0));
    }

    #[test]
    fn unparsable_float_is_skipped() {
        let record = MaterialRecord::parse("m_Floats:\n- _Broken: 1.2.3\n- _Metallic: 0.5\n", "A.mat");
        assert_eq!(record.floats, btreemap! { "Metallic".to_owned() => 0.5 });
    }

    #[test]
    fn empty_shader_keywords_line_does_not_swallow_next_line() {
        let record = MaterialRecord::parse("m_ShaderKeywords: \nm_LightmapFlags: 4\n", "A.mat");
        assert_eq!(record.shader_keywords, "");
    }

    #[test]
    fn valid_keywords_list() {
        let yaml = MaterialFixture::new("Leaves")
            .with_valid_keyword("_ALPHATEST_ON")
            .with_valid_keyword("_NORMALMAP")
            .to_yaml();
        let record = MaterialRecord::parse(&yaml, "Leaves.mat");
        assert_eq!(record.shader_keywords, "_ALPHATEST_ON _NORMALMAP");
    }

    #[test]
    fn windows_line_endings() {
        let yaml = MaterialFixture::new("Crate")
            .with_texture("_MainTex", "2800000", GUID)
            .with_float("_Metallic", 0.5)
            .to_yaml()
            .replace('\n', "\r\n");
        let record = MaterialRecord::parse(&yaml, "Crate.mat");
        assert_eq!(record.name, "Crate");
        assert_eq!(record.textures["MainTex"].guid, GUID);
        assert_eq!(record.floats["Metallic"], 0.5);
    }

    #[test]
    fn analyze_latin1_file() {
        setup_logger();
        let root = TempDir::new("materials").unwrap();
        let path = write_file(root.path().join("Caf\u{e9}.mat"), b"m_Name: Caf\xe9\nm_Floats:\n- _Metallic: 1\n");
        let record = MaterialRecord::analyze(&path).unwrap();
        assert_eq!(record.name, "Caf\u{e9}");
        assert_eq!(record.source_path, path);
        assert_eq!(record.floats["Metallic"], 1.0);
    }

    #[test]
    fn analyze_missing_file() {
        assert!(MaterialRecord::analyze("does/not/exist.mat").is_err());
    }
}

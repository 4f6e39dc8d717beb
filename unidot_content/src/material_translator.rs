use std::{
    fmt::{self, Display, Formatter, Write},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use unidot_shared::{
    log::{info, warn},
    Rgba,
};

use crate::{
    common::ResourceId,
    guid_resolver::GuidResolver,
    material::{AssetReference, MaterialRecord},
    resource_locator::ResourceLocator,
};

/// Unity property (without the leading underscore) and the `StandardMaterial3D` property it becomes.
/// The order is the order in which the properties are written.
pub const PROPERTY_MAPPINGS: &[(&str, &str)] = &[
    ("MainTex", "albedo_texture"),
    ("Color", "albedo_color"),
    ("Metallic", "metallic"),
    ("Glossiness", "roughness"),
    ("BumpMap", "normal_texture"),
    ("EmissionColor", "emission"),
    ("EmissionMap", "emission_texture"),
    ("OcclusionMap", "ao_texture"),
];

/// Unity's smoothness is the inverse of Godot's roughness.
const GLOSSINESS_PROPERTY: &str = "Glossiness";
const CUTOFF_PROPERTY: &str = "Cutoff";

pub const ALPHA_TEST_KEYWORD: &str = "_ALPHATEST_ON";
pub const ALPHA_BLEND_KEYWORDS: [&str; 2] = ["_ALPHABLEND_ON", "_ALPHAPREMULTIPLY_ON"];
pub const DEFAULT_ALPHA_SCISSOR_THRESHOLD: f64 = 0.5;

/// Determines how the flags in the shader keywords are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatching {
    /// The flag is contained anywhere in the keyword string. `_ALPHATEST_ON_CUSTOM` counts as `_ALPHATEST_ON`.
    #[default]
    Substring,
    /// The keyword string is split on whitespace and the flag has to equal one of the tokens.
    Token,
}

impl KeywordMatching {
    pub fn contains(self, shader_keywords: &str, keyword: &str) -> bool {
        match self {
            KeywordMatching::Substring => shader_keywords.contains(keyword),
            KeywordMatching::Token => shader_keywords.split_whitespace().any(|token| token == keyword),
        }
    }
}

/// Transparency mode that is inferred from the shader keywords.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transparency {
    Opaque,
    AlphaScissor { threshold: f64 },
    AlphaBlend,
}

impl Transparency {
    /// Alpha testing takes precedence over alpha blending. The threshold is the `_Cutoff` float.
    pub fn infer(record: &MaterialRecord, keyword_matching: KeywordMatching) -> Self {
        let keywords = record.shader_keywords.as_str();
        if keyword_matching.contains(keywords, ALPHA_TEST_KEYWORD) {
            let threshold = record
                .floats
                .get(CUTOFF_PROPERTY)
                .copied()
                .unwrap_or(DEFAULT_ALPHA_SCISSOR_THRESHOLD);
            Transparency::AlphaScissor { threshold }
        } else if ALPHA_BLEND_KEYWORDS
            .iter()
            .any(|keyword| keyword_matching.contains(keywords, keyword))
        {
            Transparency::AlphaBlend
        } else {
            Transparency::Opaque
        }
    }
}

/// Value of a property in a Godot resource.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Resource(ResourceId),
    Color(Rgba),
    Float(f64),
    Int(i64),
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Resource(resource_id) => write!(f, "ExtResource(\"{resource_id}\")"),
            PropertyValue::Color(color) => {
                let [r, g, b, a] = color.to_array().map(format_float);
                write!(f, "Color({r}, {g}, {b}, {a})")
            }
            PropertyValue::Float(value) => f.write_str(&format_float(*value)),
            PropertyValue::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Writes floats the way Godot does: shortest representation but always with a decimal point.
pub fn format_float(value: f64) -> String {
    let formatted = value.to_string();
    if value.is_finite() && !formatted.contains('.') {
        formatted + ".0"
    } else {
        formatted
    }
}

/// A `StandardMaterial3D` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct GodotMaterial {
    pub transparency: Transparency,
    /// Properties in the order they are written.
    pub properties: Vec<(&'static str, PropertyValue)>,
    /// Texture properties that were left out with a warning.
    pub unresolved_textures: Vec<UnresolvedTexture>,
}

impl GodotMaterial {
    /// Returns the value of the property with the given Godot name.
    pub fn get(&self, godot_property: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(name, _)| *name == godot_property)
            .map(|(_, value)| value)
    }

    /// The content of the `.tres` file.
    pub fn to_tres(&self) -> String {
        let mut tres = String::from("[gd_resource type=\"StandardMaterial3D\" format=3]\n\n[resource]\n");
        let mut write_property = |name: &str, value: &PropertyValue| {
            // Writing to a String can't fail.
            let _ = writeln!(tres, "{name} = {value}");
        };
        match self.transparency {
            Transparency::Opaque => {}
            Transparency::AlphaScissor { threshold } => {
                write_property("transparency", &PropertyValue::Int(1));
                write_property("alpha_scissor_threshold", &PropertyValue::Float(threshold));
                write_property("alpha_hash_scale", &PropertyValue::Float(1.0));
            }
            Transparency::AlphaBlend => {
                write_property("transparency", &PropertyValue::Int(1));
                write_property("blend_mode", &PropertyValue::Int(1));
            }
        }
        for (name, value) in &self.properties {
            write_property(name, value);
        }
        tres
    }
}

/// Translates [`MaterialRecord`]s into [`GodotMaterial`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialTranslator {
    keyword_matching: KeywordMatching,
}

impl MaterialTranslator {
    pub fn new(keyword_matching: KeywordMatching) -> Self {
        Self { keyword_matching }
    }

    /// Maps the properties of the record that appear in [`PROPERTY_MAPPINGS`].
    ///
    /// For every mapped property a texture takes precedence over a color which takes
    /// precedence over a float. Properties that the record doesn't set are not written. A
    /// texture that can't be found in either project is skipped with a warning.
    pub fn translate(
        &self,
        record: &MaterialRecord,
        guid_resolver: &mut GuidResolver,
        resource_locator: &mut ResourceLocator,
        unity_project_root: &Path,
        godot_project_root: &Path,
    ) -> GodotMaterial {
        let transparency = Transparency::infer(record, self.keyword_matching);

        let mut properties = Vec::new();
        let mut unresolved_textures = Vec::new();
        for &(unity_property, godot_property) in PROPERTY_MAPPINGS {
            if let Some(reference) = record.textures.get(unity_property) {
                let resolved = resolve_texture(
                    unity_property,
                    reference,
                    guid_resolver,
                    resource_locator,
                    unity_project_root,
                    godot_project_root,
                );
                match resolved {
                    Ok(resource_id) => properties.push((godot_property, PropertyValue::Resource(resource_id))),
                    Err(unresolved) => {
                        warn!("{unresolved} in material '{}'", record.name);
                        unresolved_textures.push(unresolved);
                    }
                }
            } else if let Some(color) = record.colors.get(unity_property) {
                properties.push((godot_property, PropertyValue::Color(*color)));
            } else if let Some(value) = record.floats.get(unity_property) {
                let value = if unity_property == GLOSSINESS_PROPERTY { 1.0 - value } else { *value };
                properties.push((godot_property, PropertyValue::Float(value)));
            }
        }

        GodotMaterial {
            transparency,
            properties,
            unresolved_textures,
        }
    }
}

/// A texture reference that couldn't be followed into the Godot project. The property is left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedTexture {
    /// No sidecar in the Unity project declares the GUID.
    UnknownGuid { property: String, guid: String },
    /// The Unity asset has no file with a matching name in the Godot project.
    MissingInGodotProject { property: String, unity_path: PathBuf },
}

impl UnresolvedTexture {
    pub fn property(&self) -> &str {
        match self {
            UnresolvedTexture::UnknownGuid { property, .. } => property,
            UnresolvedTexture::MissingInGodotProject { property, .. } => property,
        }
    }
}

impl Display for UnresolvedTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedTexture::UnknownGuid { property, guid } => {
                write!(f, "Could not find the texture with GUID {guid} for '_{property}'")
            }
            UnresolvedTexture::MissingInGodotProject { property, unity_path } => {
                write!(f, "Could not find Godot resource for '{}' of '_{property}'", unity_path.display())
            }
        }
    }
}

fn resolve_texture(
    unity_property: &str,
    reference: &AssetReference,
    guid_resolver: &mut GuidResolver,
    resource_locator: &mut ResourceLocator,
    unity_project_root: &Path,
    godot_project_root: &Path,
) -> Result<ResourceId, UnresolvedTexture> {
    let Some(unity_path) = guid_resolver.resolve(unity_project_root, &reference.guid) else {
        return Err(UnresolvedTexture::UnknownGuid {
            property: unity_property.to_owned(),
            guid: reference.guid.clone(),
        });
    };
    let Some(resource_id) = resource_locator.locate(godot_project_root, &unity_path) else {
        return Err(UnresolvedTexture::MissingInGodotProject {
            property: unity_property.to_owned(),
            unity_path,
        });
    };
    info!("Found texture: {} -> {resource_id}", unity_path.display());
    Ok(resource_id)
}

use std::{
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use unidot_shared::{
    log::{error, info, trace, warn},
    pathdiff,
    walkdir::WalkDir,
};

use crate::{
    common::{has_extension, Directories, MaterialMapping, ResourceId},
    config::ConverterConfig,
    guid_resolver::GuidResolver,
    material::MaterialRecord,
    material_translator::MaterialTranslator,
    resource_locator::ResourceLocator,
    scene_composer::SceneComposer,
    Error, Result,
};

const MATERIAL_OUTPUT_EXTENSION: &str = "tres";

/// Counts of a [`Converter::convert_all`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub materials_converted: usize,
    pub materials_failed: usize,
    pub scenes_written: usize,
    /// Meshes without a counterpart in the Godot project.
    pub scenes_skipped: usize,
    pub scenes_failed: usize,
}

impl ConversionReport {
    pub fn has_failures(&self) -> bool {
        self.materials_failed > 0 || self.scenes_failed > 0
    }
}

impl Display for ConversionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} materials converted ({} failed), {} scenes written ({} skipped, {} failed)",
            self.materials_converted, self.materials_failed, self.scenes_written, self.scenes_skipped, self.scenes_failed
        )
    }
}

/// Converts the materials of the Unity assets directory and composes a scene for every mesh.
///
/// The [`GuidResolver`] and the [`ResourceLocator`] are owned by the converter, so every
/// project is walked at most once per run no matter how many materials reference it.
pub struct Converter {
    directories: Directories,
    config: ConverterConfig,
    guid_resolver: GuidResolver,
    resource_locator: ResourceLocator,
    material_translator: MaterialTranslator,
    scene_composer: SceneComposer,
    material_mapping: MaterialMapping,
}

impl Converter {
    /// Creates a new [`Converter`]. Fails when one of the input directories doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unidot_content::{config::ConverterConfig, converter::Converter, Directories};
    /// let directories = Directories::new("missing_unity", "missing_godot", "missing_unity/Assets", "missing_godot/assets");
    /// assert!(Converter::new(directories, ConverterConfig::default()).is_err());
    /// ```
    pub fn new(directories: Directories, config: ConverterConfig) -> Result<Self> {
        let directories = directories.check()?;
        info!("Creating Converter for '{directories:?}'");
        let material_translator = MaterialTranslator::new(config.keyword_matching);
        let scene_composer = SceneComposer::new(&config.mesh_marker, &config.scenes_dir_name).with_matcher(config.material_matching.matcher());
        Ok(Self {
            directories,
            config,
            guid_resolver: GuidResolver::new(),
            resource_locator: ResourceLocator::new(),
            material_translator,
            scene_composer,
            material_mapping: MaterialMapping::new(),
        })
    }

    pub fn directories(&self) -> &Directories {
        &self.directories
    }

    pub fn guid_resolver(&self) -> &GuidResolver {
        &self.guid_resolver
    }

    pub fn resource_locator(&self) -> &ResourceLocator {
        &self.resource_locator
    }

    /// Materials converted so far by their name.
    pub fn material_mapping(&self) -> &MaterialMapping {
        &self.material_mapping
    }

    /// Converts all materials and then composes the scenes of all meshes.
    ///
    /// A file that fails is logged and counted in the [`ConversionReport`] but doesn't stop the run.
    pub fn convert_all(&mut self) -> Result<ConversionReport> {
        let (material_paths, mesh_paths) = self.collect_files();
        info!("Found {} material files and {} mesh files", material_paths.len(), mesh_paths.len());

        let mut report = ConversionReport::default();

        info!("Converting materials");
        for material_path in &material_paths {
            match self.convert_material(material_path) {
                Ok(output_path) => {
                    info!("Converted material '{}' to '{}'", material_path.display(), output_path.display());
                    report.materials_converted += 1;
                }
                Err(err) => {
                    error!("Failed to convert material '{}': {err}", material_path.display());
                    report.materials_failed += 1;
                }
            }
        }

        info!("Creating scene files with material assignments");
        for mesh_path in &mesh_paths {
            match self.compose_scene(mesh_path) {
                Ok(Some(scene_path)) => {
                    info!("Created scene file '{}'", scene_path.display());
                    report.scenes_written += 1;
                }
                Ok(None) => report.scenes_skipped += 1,
                Err(err) => {
                    error!("Failed to create scene for '{}': {err}", mesh_path.display());
                    report.scenes_failed += 1;
                }
            }
        }

        info!("Conversion complete: {report}");
        Ok(report)
    }

    /// Analyzes, translates and writes one material. The material is added to the
    /// [`MaterialMapping`] when the output is located in the Godot project.
    pub fn convert_material(&mut self, material_path: &Path) -> Result<PathBuf> {
        let record = MaterialRecord::analyze(material_path)?;
        let godot_material = self.material_translator.translate(
            &record,
            &mut self.guid_resolver,
            &mut self.resource_locator,
            self.directories.unity_project_path(),
            self.directories.godot_project_path(),
        );

        let output_path = self.material_output_path(material_path)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, godot_material.to_tres())?;

        match ResourceId::from_project_path(self.directories.godot_project_path(), &output_path) {
            Some(resource_id) => {
                if let Some(previous) = self.material_mapping.insert(record.name.clone(), resource_id) {
                    warn!("Material name '{}' is used more than once. Replacing '{previous}'.", record.name);
                }
            }
            None => {
                warn! {
                    "Material '{}' was written outside of the Godot project '{}' and can't be assigned to meshes",
                    output_path.display(),
                    self.directories.godot_project_path().display()
                }
            }
        }
        Ok(output_path)
    }

    /// Composes the scene of one mesh with the materials converted so far.
    pub fn compose_scene(&self, mesh_path: &Path) -> Result<Option<PathBuf>> {
        self.scene_composer.compose(mesh_path, &self.material_mapping, &self.directories)
    }

    /// `Materials/Crate.mat` in the Unity assets directory becomes `Materials/Crate.tres` in the Godot assets directory.
    fn material_output_path(&self, material_path: &Path) -> Result<PathBuf> {
        let relative_path = pathdiff::diff_paths(material_path, self.directories.unity_assets_path())
            .filter(|relative_path| relative_path.is_relative())
            .ok_or_else(|| Error::InvalidPath(material_path.to_owned()))?;
        Ok(self
            .directories
            .godot_assets_path()
            .join(relative_path)
            .with_extension(MATERIAL_OUTPUT_EXTENSION))
    }

    /// Returns the materials and the meshes in the Unity assets directory, each sorted by path.
    fn collect_files(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut material_paths = Vec::new();
        let mut mesh_paths = Vec::new();
        let path = self.directories.unity_assets_path();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read directory entry in '{}': {err}", path.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if has_extension(entry.path(), &self.config.material_extension) {
                material_paths.push(entry.into_path());
            } else if self
                .config
                .mesh_extensions
                .iter()
                .any(|extension| has_extension(entry.path(), extension))
            {
                mesh_paths.push(entry.into_path());
            } else {
                trace!("Ignoring '{}'", entry.path().display());
            }
        }
        material_paths.sort();
        mesh_paths.sort();
        (material_paths, mesh_paths)
    }
}

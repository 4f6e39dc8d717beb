use std::{io, path::PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre as ey;
use ey::eyre::{eyre, Context};
use unidot_content::{ConverterConfig, Converter, Directories, GuidResolver, KeywordMatching, MaterialMatching, MaterialRecord};
use unidot_shared::log::{info, LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
enum CommandLineArguments {
    /// Converts the Unity materials of a directory and creates scenes for its meshes
    Convert(Convert),
    /// Prints the asset that declares the GUID
    ResolveGuid(ResolveGuid),
    /// Prints what is read from a Unity material
    Inspect(Inspect),
}

#[derive(Parser, Debug)]
struct Convert {
    /// Root directory of the Unity project
    #[arg(long)]
    unity_root: PathBuf,

    /// Root directory of the Godot project
    #[arg(long)]
    godot_root: PathBuf,

    /// Directory containing the Unity assets
    #[arg(short, long)]
    input: PathBuf,

    /// Directory containing the Godot assets
    #[arg(short, long)]
    output: PathBuf,

    /// How the shader keywords of a material are searched
    #[arg(long)]
    keyword_matching: Option<KeywordMatchingArg>,

    /// How materials are assigned to meshes
    #[arg(long)]
    material_matching: Option<MaterialMatchingArg>,

    /// Extension of the meshes for which scenes are created. Can be given multiple times.
    #[arg(long = "mesh-extension")]
    mesh_extensions: Vec<String>,

    /// YAML file with the settings. Arguments take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info", value_parser = parse_level_filter)]
    log_level: LevelFilter,
}

#[derive(Parser, Debug)]
struct ResolveGuid {
    /// Root directory of the Unity project
    #[arg(long)]
    unity_root: PathBuf,

    guid: String,

    #[arg(long, default_value = "warn", value_parser = parse_level_filter)]
    log_level: LevelFilter,
}

#[derive(Parser, Debug)]
struct Inspect {
    /// The `.mat` file
    material_filepath: PathBuf,

    #[arg(long, default_value = "warn", value_parser = parse_level_filter)]
    log_level: LevelFilter,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KeywordMatchingArg {
    Substring,
    Token,
}

impl From<KeywordMatchingArg> for KeywordMatching {
    fn from(value: KeywordMatchingArg) -> Self {
        match value {
            KeywordMatchingArg::Substring => KeywordMatching::Substring,
            KeywordMatchingArg::Token => KeywordMatching::Token,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MaterialMatchingArg {
    Contains,
    Exact,
}

impl From<MaterialMatchingArg> for MaterialMatching {
    fn from(value: MaterialMatchingArg) -> Self {
        match value {
            MaterialMatchingArg::Contains => MaterialMatching::Contains,
            MaterialMatchingArg::Exact => MaterialMatching::Exact,
        }
    }
}

fn parse_level_filter(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("'{level}' is not one of off, error, warn, info, debug, trace"))
}

impl CommandLineArguments {
    fn log_level(&self) -> LevelFilter {
        match self {
            CommandLineArguments::Convert(convert) => convert.log_level,
            CommandLineArguments::ResolveGuid(resolve_guid) => resolve_guid.log_level,
            CommandLineArguments::Inspect(inspect) => inspect.log_level,
        }
    }
}

fn setup_logger(level: LevelFilter) -> ey::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                unidot_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    Ok(())
}

fn convert(convert: &Convert) -> ey::Result<()> {
    let mut config = match &convert.config {
        Some(config_filepath) => ConverterConfig::from_yaml_file(config_filepath).wrap_err("Failed to read config")?,
        None => ConverterConfig::default(),
    };
    if let Some(keyword_matching) = convert.keyword_matching {
        config.keyword_matching = keyword_matching.into();
    }
    if let Some(material_matching) = convert.material_matching {
        config.material_matching = material_matching.into();
    }
    if !convert.mesh_extensions.is_empty() {
        config.mesh_extensions = convert.mesh_extensions.clone();
    }
    info!("Using config: {config:?}");

    let directories = Directories::new(&convert.unity_root, &convert.godot_root, &convert.input, &convert.output);
    let mut converter = Converter::new(directories, config).wrap_err("Failed to create converter")?;
    let report = converter.convert_all().wrap_err("Failed to convert")?;
    println!("{report}");
    if report.has_failures() {
        return Err(eyre!("{} files failed to convert", report.materials_failed + report.scenes_failed));
    }
    Ok(())
}

fn main() -> ey::Result<()> {
    color_eyre::install()?;

    let command_line_arguments = CommandLineArguments::parse();
    setup_logger(command_line_arguments.log_level())?;

    match &command_line_arguments {
        CommandLineArguments::Convert(arguments) => convert(arguments)?,
        CommandLineArguments::ResolveGuid(resolve_guid) => {
            let mut guid_resolver = GuidResolver::new();
            let asset_path = guid_resolver
                .resolve(&resolve_guid.unity_root, &resolve_guid.guid)
                .ok_or_else(|| eyre!("No asset declares the GUID {}", resolve_guid.guid))?;
            println!("{}", asset_path.display());
        }
        CommandLineArguments::Inspect(inspect) => {
            info!("Analyzing material: {:?}", inspect.material_filepath);
            let record = MaterialRecord::analyze(&inspect.material_filepath).wrap_err("Failed to read material")?;
            let yaml = serde_yaml::to_string(&record).wrap_err("Failed to serialize material")?;
            print!("{yaml}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        CommandLineArguments::command().debug_assert();
    }

    #[test]
    fn parse_convert() {
        let arguments = CommandLineArguments::parse_from([
            "unidot",
            "convert",
            "--unity-root",
            "unity",
            "--godot-root",
            "godot",
            "--input",
            "unity/Assets",
            "--output",
            "godot/assets",
            "--keyword-matching",
            "token",
            "--mesh-extension",
            "fbx",
            "--mesh-extension",
            "obj",
        ]);
        let CommandLineArguments::Convert(convert) = arguments else {
            panic!("expected the convert command");
        };
        assert_eq!(convert.mesh_extensions, vec!["fbx", "obj"]);
        assert!(matches!(convert.keyword_matching, Some(KeywordMatchingArg::Token)));
        assert!(convert.material_matching.is_none());
        assert_eq!(convert.log_level, LevelFilter::Info);
    }
}

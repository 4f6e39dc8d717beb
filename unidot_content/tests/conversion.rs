use std::{
    env, fs,
    path::{Path, PathBuf},
};

use unidot_content::{ConverterConfig, Converter, Directories, ResourceId};
use unidot_shared::{indoc::indoc, pathdiff};
use unidot_test::{setup_logger, MaterialFixture, ProjectFixture};

const WOOD_GUID: &str = "0123456789abcdef0123456789abcdef";
const NORMAL_GUID: &str = "fedcba9876543210fedcba9876543210";

fn directories(fixture: &ProjectFixture) -> Directories {
    Directories::new(fixture.unity_root(), fixture.godot_root(), fixture.unity_assets(), fixture.godot_assets())
}

#[test]
fn layered_texture_is_found_as_png() {
    setup_logger();
    let fixture = ProjectFixture::new();
    fixture.add_unity_asset("Assets/Textures/Wood.psd", WOOD_GUID);
    fixture.add_godot_file("assets/Textures/Wood.png");
    let material = MaterialFixture::new("Crate").with_texture("_MainTex", "2800000", WOOD_GUID);
    let material_path = fixture.add_unity_material("Assets/Materials/Crate.mat", &material);

    let mut converter = Converter::new(directories(&fixture), ConverterConfig::default()).unwrap();
    let output_path = converter.convert_material(&material_path).unwrap();

    let tres = fs::read_to_string(output_path).unwrap();
    assert!(tres.contains("albedo_texture = ExtResource(\"res://assets/Textures/Wood.png\")\n"));
}

#[test]
fn full_conversion() {
    setup_logger();
    let fixture = ProjectFixture::new();
    fixture.add_unity_asset("Assets/Textures/Wood.psd", WOOD_GUID);
    fixture.add_unity_asset("Assets/Textures/Wood_Normal.tga", NORMAL_GUID);
    fixture.add_godot_file("assets/Textures/Wood.png");
    fixture.add_godot_file("assets/Textures/wood_normal.TGA");
    fixture.add_unity_file("Assets/Art/Meshes/Props/Crate.fbx", "fbx");
    fixture.add_godot_file("assets/Art/Meshes/Props/Crate.fbx");

    let material = MaterialFixture::new("Crate")
        .with_shader_keywords("_ALPHATEST_ON _NORMALMAP")
        .with_texture("_MainTex", "2800000", WOOD_GUID)
        .with_texture("_BumpMap", "2800000", NORMAL_GUID)
        .with_texture("_EmissionMap", "0", "")
        .with_float("_Cutoff", 0.3)
        .with_float("_Glossiness", 0.75)
        .with_float("_Metallic", 0)
        .with_color("_Color", [1.0, 1.0, 1.0, 1.0]);
    fixture.add_unity_material("Assets/Materials/Crate.mat", &material);

    let mut converter = Converter::new(directories(&fixture), ConverterConfig::default()).unwrap();
    let report = converter.convert_all().unwrap();
    assert_eq!(report.materials_converted, 1);
    assert_eq!(report.scenes_written, 1);
    assert!(!report.has_failures());

    let tres = fs::read_to_string(fixture.godot_assets().join("Materials/Crate.tres")).unwrap();
    let expected_tres = indoc! {r#"
        [gd_resource type="StandardMaterial3D" format=3]

        [resource]
        transparency = 1
        alpha_scissor_threshold = 0.3
        alpha_hash_scale = 1.0
        albedo_texture = ExtResource("res://assets/Textures/Wood.png")
        albedo_color = Color(1.0, 1.0, 1.0, 1.0)
        metallic = 0.0
        roughness = 0.25
        normal_texture = ExtResource("res://assets/Textures/wood_normal.TGA")
    "#};
    assert_eq!(tres, expected_tres);

    let tscn = fs::read_to_string(fixture.godot_assets().join("Scenes/Meshes/Props/Crate.tscn")).unwrap();
    let expected_tscn = indoc! {r#"
        [gd_scene load_steps=2 format=3]

        [ext_resource type="PackedScene" path="res://assets/Art/Meshes/Props/Crate.fbx" id="1"]

        [node name="Crate" instance=ExtResource("1")]

        [node name="Crate" parent="." index="0"]
        material_override = ExtResource("res://assets/Materials/Crate.tres")

    "#};
    assert_eq!(tscn, expected_tscn);

    assert_eq!(
        converter.material_mapping().get("Crate"),
        Some(&ResourceId::from_relative_path("assets/Materials/Crate.tres"))
    );
    assert_eq!(converter.guid_resolver().walk_count(), 1);
}

#[test]
fn missing_mesh_produces_no_scene() {
    setup_logger();
    let fixture = ProjectFixture::new();
    let mesh_path = fixture.add_unity_file("Assets/Meshes/Props/Crate.fbx", "fbx");
    fixture.add_unity_material("Assets/Materials/Crate.mat", &MaterialFixture::new("Crate"));

    let mut converter = Converter::new(directories(&fixture), ConverterConfig::default()).unwrap();
    let report = converter.convert_all().unwrap();
    assert_eq!(report.scenes_skipped, 1);
    assert_eq!(report.scenes_written, 0);
    assert_eq!(converter.compose_scene(&mesh_path).unwrap(), None);
    assert!(!fixture.godot_assets().join("Scenes").exists());
}

#[test]
fn output_directory_is_created() {
    setup_logger();
    let fixture = ProjectFixture::new();
    fixture.add_unity_material("Assets/Crate.mat", &MaterialFixture::new("Crate"));
    let output = fixture.godot_root().join("converted");
    let directories = Directories::new(fixture.unity_root(), fixture.godot_root(), fixture.unity_assets(), &output);

    let mut converter = Converter::new(directories, ConverterConfig::default()).unwrap();
    assert!(output.is_dir());
    converter.convert_all().unwrap();
    assert_eq!(
        converter.material_mapping().get("Crate"),
        Some(&ResourceId::from_relative_path("converted/Crate.tres"))
    );
}

/// Spells `path` relative to the working directory of the test.
fn relative_to_current_dir(path: &Path) -> PathBuf {
    let current_dir = fs::canonicalize(env::current_dir().unwrap()).unwrap();
    let relative_path = pathdiff::diff_paths(path, current_dir).unwrap();
    assert!(relative_path.is_relative());
    relative_path
}

fn dot_relative(path: &Path) -> PathBuf {
    Path::new(".").join(relative_to_current_dir(path))
}

/// A material and a mesh using it. Returns the path of the scene that is expected for the mesh.
fn add_crate_with_material(fixture: &ProjectFixture) -> PathBuf {
    fixture.add_unity_material("Assets/Materials/Crate.mat", &MaterialFixture::new("Crate"));
    fixture.add_unity_file("Assets/Meshes/Crate.fbx", "fbx");
    fixture.add_godot_file("assets/Meshes/Crate.fbx");
    fixture.godot_assets().join("Scenes/Meshes/Crate.tscn")
}

fn assert_crate_scene_has_material(converter: &mut Converter, scene_path: &Path) {
    let report = converter.convert_all().unwrap();
    assert_eq!(report.materials_converted, 1);
    assert_eq!(report.scenes_written, 1);
    assert_eq!(
        converter.material_mapping().get("Crate"),
        Some(&ResourceId::from_relative_path("assets/Materials/Crate.tres"))
    );
    let tscn = fs::read_to_string(scene_path).unwrap();
    assert!(tscn.contains("path=\"res://assets/Meshes/Crate.fbx\""));
    assert!(tscn.contains("material_override = ExtResource(\"res://assets/Materials/Crate.tres\")"));
}

#[test]
fn dot_prefixed_directories() {
    setup_logger();
    let fixture = ProjectFixture::new();
    let scene_path = add_crate_with_material(&fixture);
    let directories = Directories::new(
        dot_relative(&fixture.unity_root()),
        dot_relative(&fixture.godot_root()),
        dot_relative(&fixture.unity_assets()),
        dot_relative(&fixture.godot_assets()),
    );

    let mut converter = Converter::new(directories, ConverterConfig::default()).unwrap();
    assert_crate_scene_has_material(&mut converter, &scene_path);
}

#[test]
fn absolute_godot_root_with_relative_output() {
    setup_logger();
    let fixture = ProjectFixture::new();
    let scene_path = add_crate_with_material(&fixture);
    let relative_output = relative_to_current_dir(&fixture.godot_assets());
    let directories = Directories::new(fixture.unity_root(), fixture.godot_root(), fixture.unity_assets(), relative_output);

    let mut converter = Converter::new(directories, ConverterConfig::default()).unwrap();
    assert_crate_scene_has_material(&mut converter, &scene_path);
}

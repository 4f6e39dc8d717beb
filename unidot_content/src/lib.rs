//! # Overview
//!
//! Crate for [converting](Converter) the materials of a Unity project into Godot
//! resources and for composing Godot scenes that assign them to meshes.
//!
//! This crate is based around two projects side by side. Unity references assets by
//! GUIDs that are declared in `.meta` sidecars next to every asset. Godot references
//! resources by their `res://` path relative to the project root. A texture
//! referenced by a Unity material is therefore found in two steps: the
//! [`GuidResolver`] finds the Unity asset that declares the GUID and the
//! [`ResourceLocator`] finds the file with the same name in the Godot project.
//!
//! ## Example:
//!
//! **Unity Assets Directory:**
//!
//! ```text
//! Assets/
//! ├─ Materials/
//! │  ├─ Crate.mat
//! ├─ Textures/
//! │  ├─ Wood.psd
//! │  ├─ Wood.psd.meta
//! ├─ Meshes/
//! │  ├─ Props/
//! │  │  ├─ Crate.fbx
//! ```
//!
//! **Godot Assets Directory after the conversion:**
//!
//! ```text
//! assets/
//! ├─ Materials/
//! │  ├─ Crate.tres
//! ├─ Textures/
//! │  ├─ Wood.png
//! ├─ Meshes/
//! │  ├─ Props/
//! │  │  ├─ Crate.fbx
//! ├─ Scenes/
//! │  ├─ Meshes/
//! │  │  ├─ Props/
//! │  │  │  ├─ Crate.tscn
//! ```
//!
//! # Components
//!
//! The [`MaterialRecord`] is the analyzed content of a Unity material. The
//! [`MaterialTranslator`] turns it into a [`GodotMaterial`] and the [`SceneComposer`]
//! writes a scene for every mesh that overrides its material. The [`Converter`] runs
//! all of them over a whole directory.

mod common;

pub mod config;
pub mod converter;
pub mod guid_resolver;
pub mod material;
pub mod material_translator;
pub mod resource_locator;
pub mod scene_composer;

pub use common::{Directories, Error, MaterialMapping, ResourceId, Result, META_FILE_EXTENSION, RESOURCE_SCHEME};
pub use config::ConverterConfig;
pub use converter::{ConversionReport, Converter};
pub use guid_resolver::GuidResolver;
pub use material::{AssetReference, MaterialRecord};
pub use material_translator::{GodotMaterial, KeywordMatching, MaterialTranslator, UnresolvedTexture};
pub use resource_locator::ResourceLocator;
pub use scene_composer::{GodotScene, MaterialMatching, SceneComposer};

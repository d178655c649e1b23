//! Data-driven ability content and loaders.
//!
//! This crate reads RON/TOML data files into `ability-core` types:
//! - Step catalog: default parameters per step kind (RON)
//! - Recipe library: named recipes, embedded or from a directory (RON)
//! - Engine configuration: tolerances and limits (TOML)
//!
//! Recipes are authored here offline; at cast time they are read-only and
//! shared between casts.

pub mod loaders;

pub use loaders::{ConfigLoader, LoadResult, RecipeLibrary, StepCatalog};

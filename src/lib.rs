//! Build configuration resolver
//!
//! Resolves the layered build declarations of an application module
//! (shared parent defaults, module-local overrides, plugins, role-tagged
//! dependencies, build variants) into one immutable
//! [`EffectiveConfiguration`], or a structured failure naming the offending
//! layer, key or variant.

pub mod dependency;
pub mod error;
pub mod input;
pub mod options;
pub mod plugin;
pub mod property;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod variant;

pub use dependency::DependencyLedger;
pub use error::{ErrorKind, Failure, Location, Origin, ResolveError};
pub use input::{load_declarations, InputError, LoadedDeclarations};
pub use options::{EffectiveOptions, OptionsError, ResolverOptions};
pub use plugin::{PluginRegistry, Registration};
pub use property::{LayerGraph, PropertyResolver, ResolvedProperty};
pub use resolver::{resolve, ConfigurationResolver, EffectiveConfiguration, ResolverState, Warning};
pub use schema::Schema;
pub use variant::{BuildVariantTable, ResolvedSetting, ResolvedVariant, SigningReuse};

pub use buildcfg_model as model;

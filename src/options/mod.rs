//! Resolver options
//!
//! Options are merged from four layers, last wins:
//! 1. Built-in defaults
//! 2. Host options (~/.config/buildcfg/options.toml)
//! 3. Project options (buildcfg.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::ResolverOptions;
pub use effective::{
    default_host_path, EffectiveOptions, OptionsError, OptionsOrigin, OptionsSource,
    PROJECT_OPTIONS_FILE,
};
pub use merge::{deep_merge, merge_layers, normalize_keys};

//! Build configuration declaration model
//!
//! Plain data types describing what a module declares: layered properties,
//! plugins, role-tagged dependencies, build variants and signing references.
//! Everything here is parsed and shape-checked only; cross-declaration
//! validation belongs to the resolver.

pub mod coordinate;
pub mod declaration;
pub mod error;
pub mod key;
pub mod layer;
pub mod plugin;
pub mod schema;
pub mod signing;
pub mod value;
pub mod variant;

pub use coordinate::{Coordinate, Dependency};
pub use declaration::DeclarationTree;
pub use error::ModelError;
pub use key::PropertyKey;
pub use layer::{Binding, ConfigLayer, Property};
pub use plugin::PluginDeclaration;
pub use schema::PropertySpec;
pub use signing::SigningConfig;
pub use value::{TypeTag, Value};
pub use variant::BuildVariant;

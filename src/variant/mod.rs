//! Build variant table
//!
//! Variants inherit settings from their parent the same way layers inherit
//! properties. The parent graph is checked for cycles and dangling
//! references before any variant is resolved.

mod audit;
mod table;

pub use audit::{
    audit_signing, SigningReuse, HOST_DEBUG_SIGNING_CONFIG, HOST_DEBUG_VARIANT,
};
pub use table::{BuildVariantTable, ResolvedSetting, ResolvedVariant};

//! Cross-property consistency rules
//!
//! Checks that only make sense once every property has resolved. A rule
//! whose inputs are absent passes.

use buildcfg_model::Value;
use std::collections::BTreeMap;

use crate::dependency::DependencyLedger;
use crate::error::ResolveError;
use crate::property::ResolvedProperty;

pub const COMPILE_SDK: &str = "android.compileSdk";
pub const MIN_SDK: &str = "defaultConfig.minSdk";
pub const TARGET_SDK: &str = "defaultConfig.targetSdk";
pub const CORE_LIBRARY_DESUGARING: &str = "compileOptions.coreLibraryDesugaring";
pub const TARGET_COMPATIBILITY: &str = "compileOptions.targetCompatibility";
pub const JVM_TARGET: &str = "kotlinOptions.jvmTarget";

/// Dependency role that supplies the desugaring library.
pub const DESUGARING_ROLE: &str = "coreLibraryDesugaring";

/// What a rule gets to look at.
pub struct RuleContext<'a> {
    pub properties: &'a BTreeMap<String, ResolvedProperty>,
    pub dependencies: &'a DependencyLedger,
}

impl RuleContext<'_> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(|p| &p.value)
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.value(key).and_then(Value::as_i64)
    }
}

pub trait ConsistencyRule {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), ResolveError>;

    fn violation(&self, key: &str, message: String) -> ResolveError {
        ResolveError::ConsistencyViolation {
            rule: self.name().to_string(),
            key: key.to_string(),
            message,
        }
    }
}

/// `minSdk <= targetSdk <= compileSdk`
pub struct SdkOrdering;

impl ConsistencyRule for SdkOrdering {
    fn name(&self) -> &'static str {
        "sdk-ordering"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), ResolveError> {
        let min = ctx.int(MIN_SDK);
        let target = ctx.int(TARGET_SDK);
        let compile = ctx.int(COMPILE_SDK);

        if let (Some(min), Some(target)) = (min, target) {
            if min > target {
                return Err(self.violation(
                    MIN_SDK,
                    format!("minSdk {} is above targetSdk {}", min, target),
                ));
            }
        }
        if let (Some(target), Some(compile)) = (target, compile) {
            if target > compile {
                return Err(self.violation(
                    TARGET_SDK,
                    format!("targetSdk {} is above compileSdk {}", target, compile),
                ));
            }
        }
        Ok(())
    }
}

/// Library desugaring needs the desugaring library on its own role.
pub struct DesugaringLibrary;

impl ConsistencyRule for DesugaringLibrary {
    fn name(&self) -> &'static str {
        "desugaring-library"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), ResolveError> {
        let enabled = ctx
            .value(CORE_LIBRARY_DESUGARING)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if enabled && !ctx.dependencies.contains_role(DESUGARING_ROLE) {
            return Err(self.violation(
                CORE_LIBRARY_DESUGARING,
                format!(
                    "desugaring is enabled but no '{}' dependency is declared",
                    DESUGARING_ROLE
                ),
            ));
        }
        Ok(())
    }
}

/// Java target compatibility and Kotlin JVM target must agree.
pub struct JvmTargetAgreement;

impl ConsistencyRule for JvmTargetAgreement {
    fn name(&self) -> &'static str {
        "jvm-target"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), ResolveError> {
        let java = ctx.value(TARGET_COMPATIBILITY).and_then(Value::as_enum);
        let kotlin = ctx.value(JVM_TARGET).and_then(Value::as_str);

        if let (Some(java), Some(kotlin)) = (java, kotlin) {
            let java_level = java_level(java);
            if java_level.as_deref() != Some(kotlin) {
                return Err(self.violation(
                    JVM_TARGET,
                    format!(
                        "jvmTarget '{}' does not match targetCompatibility {}",
                        kotlin, java
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// `VERSION_1_8` -> `1.8`, `VERSION_17` -> `17`.
fn java_level(constant: &str) -> Option<String> {
    let version = constant.strip_prefix("VERSION_")?;
    Some(version.replace('_', "."))
}

pub fn builtin_rules() -> Vec<Box<dyn ConsistencyRule>> {
    vec![
        Box::new(SdkOrdering),
        Box::new(DesugaringLibrary),
        Box::new(JvmTargetAgreement),
    ]
}

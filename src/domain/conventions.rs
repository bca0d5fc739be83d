//! Naming conventions and fixed markers.
//!
//! Everything the pipeline selects on is a naming convention, not a type
//! judgement. The constants live here so selection policy is data rather
//! than control flow scattered across the stages.

use std::path::Path;

/// Type simple names ending with this suffix are instrumentation targets.
pub const TYPE_SUFFIX: &str = "ServiceImpl";

/// Parameter names ending with this suffix (case-insensitive) are loggable.
pub const ID_SUFFIX: &str = "id";

/// Literal token embedded in every synthesized statement; its presence in a
/// method's first statement means the method is already instrumented.
pub const MARKER: &str = "LPS";

/// Name of the associated constant ensured on every target type.
pub const LOGGER_CONST: &str = "LOG_CLASS";

/// The only subtree the engine parses, relative to the project root.
pub const SERVICES_SUBTREE: &str = "src/services";

/// File-name suffix the merger selects on.
pub const TARGET_FILE_SUFFIX: &str = "service_impl.rs";

/// Name of the staging directory created inside the destination.
pub const STAGING_DIR_NAME: &str = ".logprobe-tmp";

/// Top-level subtrees the mirror never copies. The staging name is included
/// so a stale staging tree from an aborted run is not mirrored along.
pub const MIRROR_EXCLUSIONS: &[&str] = &[".git", "target", STAGING_DIR_NAME];

/// Simple type names (after stripping references) whose values are loggable:
/// the long-integer, integer, and string-like forms.
pub const LOGGABLE_TYPES: &[&str] = &["i64", "u64", "i32", "u32", "String", "str"];

/// Does this type simple name mark an instrumentation target?
pub fn is_target_type(type_name: &str) -> bool {
    type_name.ends_with(TYPE_SUFFIX)
}

/// Does this relative path name a file the merger should patch?
pub fn is_target_file(rel: &Path) -> bool {
    rel.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(TARGET_FILE_SUFFIX))
        .unwrap_or(false)
}

/// Is this parameter name id-like?
pub fn is_id_like(param_name: &str) -> bool {
    param_name.to_lowercase().ends_with(ID_SUFFIX)
}

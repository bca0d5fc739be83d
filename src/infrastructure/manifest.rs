//! Config Augmenter.
//!
//! Two independent idempotent checks against the destination project, both
//! pure text containment (a deliberate simplification; no TOML or YAML
//! parsing of the patched artifacts):
//! - ensure the manifest declares the logging runtime dependencies,
//! - ensure the logging-sink config file exists at its fixed path.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ports::ConfigAugmenter;

/// Dependencies inserted into the destination `[dependencies]` section, as
/// (key, declaration line) pairs. Each line is guarded by its own key check
/// so a project that already declares one of them never gets a duplicate.
/// `kv` gives `log::info!` its structured key/value syntax; log4rs is the
/// file-configured runtime the sink config below drives.
pub const LOGGING_DEPENDENCIES: &[(&str, &str)] = &[
    ("log", r#"log = { version = "0.4", features = ["kv"] }"#),
    ("log4rs", r#"log4rs = { version = "1.3", features = ["json_encoder", "gzip"] }"#),
];

/// Fixed path of the logging-sink config, relative to the destination root.
pub const LOG_CONFIG_REL_PATH: &str = "config/log4rs.yaml";

/// Rolling, date-partitioned, JSON-encoded file sink with 7-archive
/// retention, attached to the root logger at info.
pub const LOG_CONFIG_TEMPLATE: &str = r#"appenders:
  json_file:
    kind: rolling_file
    path: logs/app.jsonl
    encoder:
      kind: json
    policy:
      kind: compound
      trigger:
        kind: time
        interval: 1 day
      roller:
        kind: fixed_window
        pattern: logs/app.{}.jsonl
        count: 7
root:
  level: info
  appenders:
    - json_file
"#;

pub struct ManifestAugmenter;

impl ConfigAugmenter for ManifestAugmenter {
    fn augment(&self, dest_root: &Path) -> Result<()> {
        ensure_logging_dependencies(&dest_root.join("Cargo.toml"))?;
        ensure_log_config(dest_root)?;
        Ok(())
    }
}

/// Ensure the manifest declares the logging dependencies. Returns whether
/// the manifest was modified.
pub fn ensure_logging_dependencies(manifest_path: &Path) -> Result<bool> {
    let manifest = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;

    let missing: Vec<&str> = LOGGING_DEPENDENCIES
        .iter()
        .filter(|(key, _)| !has_dependency_key(&manifest, key))
        .map(|(_, line)| *line)
        .collect();
    if missing.is_empty() {
        println!("[config] manifest already declares the logging dependencies");
        return Ok(false);
    }

    let mut block = missing.join("\n");
    block.push('\n');
    let patched = insert_dependency_block(&manifest, &block);
    fs::write(manifest_path, patched)
        .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
    println!("[config] added logging dependencies to manifest");
    Ok(true)
}

/// Does any line declare this dependency key? Matches `log = ...` and
/// `log.workspace = true` but not `log4rs = ...` or `tracing-log = ...`.
/// Still a pure text test, just anchored to a whole key.
fn has_dependency_key(manifest: &str, key: &str) -> bool {
    manifest.lines().any(|line| {
        line.trim_start()
            .strip_prefix(key)
            .map(|rest| rest.trim_start().starts_with('=') || rest.starts_with('.'))
            .unwrap_or(false)
    })
}

/// Insert the block at the end of the `[dependencies]` section, i.e. before
/// the next section header or at end of file. A missing section is created
/// at the end of the manifest. Offsets are accumulated over
/// `split_inclusive` so they stay exact for CRLF manifests too.
fn insert_dependency_block(manifest: &str, block: &str) -> String {
    if let Some(header_pos) = find_dependencies_header(manifest) {
        let header_len = manifest[header_pos..]
            .split_inclusive('\n')
            .next()
            .map_or(0, |line| line.len());
        let section_body = header_pos + header_len;

        let mut section_end = manifest.len();
        let mut pos = section_body;
        for line in manifest[section_body..].split_inclusive('\n') {
            if line.trim_start().starts_with('[') {
                section_end = pos;
                break;
            }
            pos += line.len();
        }

        let mut out = String::with_capacity(manifest.len() + block.len());
        out.push_str(&manifest[..section_end]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(block);
        out.push_str(&manifest[section_end..]);
        out
    } else {
        let mut out = manifest.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("\n[dependencies]\n");
        out.push_str(block);
        out
    }
}

fn find_dependencies_header(manifest: &str) -> Option<usize> {
    let mut pos = 0;
    for line in manifest.split_inclusive('\n') {
        if line.trim() == "[dependencies]" {
            return Some(pos);
        }
        pos += line.len();
    }
    None
}

/// Ensure the logging-sink config file exists, with parents, plus the logs
/// directory the sink writes into. Returns whether the file was created.
pub fn ensure_log_config(dest_root: &Path) -> Result<bool> {
    let config_path = dest_root.join(LOG_CONFIG_REL_PATH);
    fs::create_dir_all(dest_root.join("logs"))
        .with_context(|| format!("Failed to create logs directory in: {}", dest_root.display()))?;

    if config_path.exists() {
        println!("[config] {LOG_CONFIG_REL_PATH} already exists");
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&config_path, LOG_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write: {}", config_path.display()))?;
    println!("[config] created {LOG_CONFIG_REL_PATH}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL_BLOCK: &str = "log = { version = \"0.4\", features = [\"kv\"] }\nlog4rs = { version = \"1.3\", features = [\"json_encoder\", \"gzip\"] }\n";

    #[test]
    fn test_block_inserted_inside_dependencies_section() {
        let manifest = "[package]\nname = \"demo\"\n\n[dependencies]\nserde = \"1\"\n\n[dev-dependencies]\ntempfile = \"3\"\n";
        let out = insert_dependency_block(manifest, FULL_BLOCK);

        let deps_pos = out.find("[dependencies]").unwrap();
        let block_pos = out.find("log4rs = ").unwrap();
        let dev_pos = out.find("[dev-dependencies]").unwrap();
        assert!(deps_pos < block_pos && block_pos < dev_pos);
        assert!(out.contains("serde = \"1\""));
        out.parse::<toml::Table>().expect("patched manifest stays valid TOML");
    }

    #[test]
    fn test_block_inserted_inside_crlf_dependencies_section() {
        let manifest =
            "[package]\r\nname = \"demo\"\r\n\r\n[dependencies]\r\nserde = \"1\"\r\n\r\n[dev-dependencies]\r\ntempfile = \"3\"\r\n";
        let out = insert_dependency_block(manifest, FULL_BLOCK);

        let deps_pos = out.find("[dependencies]").unwrap();
        let block_pos = out.find("log4rs = ").unwrap();
        let dev_pos = out.find("[dev-dependencies]").unwrap();
        assert!(deps_pos < block_pos && block_pos < dev_pos);
        out.parse::<toml::Table>()
            .expect("patched CRLF manifest stays valid TOML");
    }

    #[test]
    fn test_section_created_when_missing() {
        let manifest = "[package]\nname = \"demo\"\n";
        let out = insert_dependency_block(manifest, FULL_BLOCK);

        assert!(out.contains("[dependencies]"));
        assert!(out.contains("log = { version = \"0.4\""));
        out.parse::<toml::Table>().unwrap();
    }

    #[test]
    fn test_existing_log_dependency_not_duplicated() {
        let dir = tempdir().unwrap();
        let manifest_path = dir.path().join("Cargo.toml");
        fs::write(
            &manifest_path,
            "[package]\nname = \"demo\"\n\n[dependencies]\nlog = \"0.4\"\n",
        )
        .unwrap();

        assert!(ensure_logging_dependencies(&manifest_path).unwrap());
        let out = fs::read_to_string(&manifest_path).unwrap();

        // Only the missing runtime is added; the existing `log` key stays the
        // only one and the manifest remains valid TOML.
        assert_eq!(out.matches("log4rs").count(), 1);
        assert!(!out.contains("features = [\"kv\"]"));
        out.parse::<toml::Table>()
            .expect("no duplicate key may be introduced");
    }

    #[test]
    fn test_dependency_key_matching_is_whole_key() {
        let manifest = "[dependencies]\ntracing-log = \"0.2\"\nlog4rs-extras = \"1\"\n";
        assert!(!has_dependency_key(manifest, "log"));
        assert!(!has_dependency_key(manifest, "log4rs"));

        let manifest = "[dependencies]\nlog.workspace = true\nlog4rs = \"1.3\"\n";
        assert!(has_dependency_key(manifest, "log"));
        assert!(has_dependency_key(manifest, "log4rs"));
    }

    #[test]
    fn test_dependency_ensure_is_idempotent() {
        let dir = tempdir().unwrap();
        let manifest_path = dir.path().join("Cargo.toml");
        fs::write(&manifest_path, "[package]\nname = \"demo\"\n\n[dependencies]\n").unwrap();

        assert!(ensure_logging_dependencies(&manifest_path).unwrap());
        let once = fs::read_to_string(&manifest_path).unwrap();

        assert!(!ensure_logging_dependencies(&manifest_path).unwrap());
        let twice = fs::read_to_string(&manifest_path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.matches("log4rs").count(), 1);
    }

    #[test]
    fn test_log_config_created_once() {
        let dir = tempdir().unwrap();

        assert!(ensure_log_config(dir.path()).unwrap());
        let config_path = dir.path().join(LOG_CONFIG_REL_PATH);
        let once = fs::read_to_string(&config_path).unwrap();
        assert!(once.contains("rolling_file"));
        assert!(once.contains("count: 7"));
        assert!(dir.path().join("logs").is_dir());

        assert!(!ensure_log_config(dir.path()).unwrap());
        let twice = fs::read_to_string(&config_path).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_config_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(LOG_CONFIG_REL_PATH);
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, "user supplied\n").unwrap();

        assert!(!ensure_log_config(dir.path()).unwrap());
        assert_eq!(fs::read_to_string(&config_path).unwrap(), "user supplied\n");
    }
}

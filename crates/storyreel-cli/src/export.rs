//! Rendering cached artifacts for the terminal and to disk.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use storyreel_models::{Artifact, ArtifactClass, ArtifactMap};

/// Short form of an artifact: URLs as-is, inline payloads by size.
pub fn describe(artifact: &Artifact) -> String {
    if artifact.is_url() {
        artifact.as_str().to_string()
    } else {
        format!("<inline, {} base64 chars>", artifact.as_str().len())
    }
}

/// JSON object of `class -> key -> description`, keys sorted.
pub fn media_summary<'a, I>(maps: I) -> Value
where
    I: IntoIterator<Item = (ArtifactClass, &'a ArtifactMap)>,
{
    let mut out = Map::new();
    for (class, map) in maps {
        let mut keys: Vec<_> = map.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        let entries = keys
            .into_iter()
            .map(|(key, artifact)| (key.to_string(), Value::String(describe(artifact))))
            .collect();
        out.insert(class.as_str().to_string(), Value::Object(entries));
    }
    Value::Object(out)
}

/// Decode an inline image and write it to `out`, creating parent
/// directories. Returns the number of bytes written.
pub fn write_image(artifact: &Artifact, out: &Path) -> Result<usize> {
    if artifact.is_url() {
        bail!("image is stored remotely at {}", artifact.as_str());
    }
    let bytes = artifact.decode().context("image is not valid base64")?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(bytes.len())
}

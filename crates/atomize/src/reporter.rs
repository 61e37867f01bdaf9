use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use xxhash_rust::xxh3::xxh3_64;

/// Content hash of the file at `path`, or `None` when it does not exist.
pub fn hash_file(path: &Path) -> anyhow::Result<Option<u64>> {
  match fs::read(path) {
    Ok(bytes) => Ok(Some(xxh3_64(&bytes))),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
    Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
  }
}

/// Write `contents` to `path` and announce the write when the file changed.
///
/// The file is always written. Returns `true` when its content hash differs
/// from what was on disk before.
pub fn write_with_report(path: &Path, contents: &[u8]) -> anyhow::Result<bool> {
  let before = hash_file(path)?;

  fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

  let after = hash_file(path)?;
  let changed = before != after;

  if changed {
    println!("[atomize] saved {}", path.display());
  } else {
    tracing::debug!("{} is unchanged", path.display());
  }

  Ok(changed)
}

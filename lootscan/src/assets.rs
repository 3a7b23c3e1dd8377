use std::path::{Path, PathBuf};

use anyhow::Result;
use ie::Templates;

/// File whose presence marks a template directory.
const MARKER: &str = "slot.png";

fn normalize_assets_dir(dir: PathBuf) -> PathBuf {
	// Accept either the template folder itself or its parent holding `assets/`.
	if dir.join(MARKER).is_file() { dir } else { dir.join("assets") }
}

/// Directories searched for templates, in order.
///
/// `LOOTSCAN_ASSETS_DIR` wins over the configured directory, then the
/// executable's directory and the current directory are tried.
pub fn candidate_dirs(configured: Option<&Path>) -> Vec<PathBuf> {
	let mut candidates: Vec<PathBuf> = Vec::new();
	if let Some(dir) = std::env::var_os("LOOTSCAN_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Some(dir) = configured {
		candidates.push(dir.to_path_buf());
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	candidates
}

/// First directory among `candidates` that holds a template set.
pub fn find_assets_dir(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
	candidates.into_iter().map(normalize_assets_dir).find(|dir| dir.join(MARKER).is_file())
}

/// Load templates from disk, or fall back to the built-in set.
pub fn resolve_templates(configured: Option<&Path>) -> Result<Templates> {
	let Some(dir) = find_assets_dir(candidate_dirs(configured)) else {
		tracing::warn!("no template directory found; using built-in templates");
		return Ok(Templates::builtin());
	};
	tracing::info!(dir = %dir.display(), "loading templates");
	Templates::load(&dir)
}

//! Target resolution for the open command.

use std::path::{Path, PathBuf};

use ldfx_model::LDF_EXTENSION;

/// The editor that had focus when the open command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEditor {
	pub path: PathBuf,
	/// True for buffers that were never saved to disk.
	pub untitled: bool,
}

/// Why the open command has nothing to open. Shown to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
	#[error("Please open an LDF file first.")]
	NoActiveFile,
	#[error("Current document is not saved.")]
	Untitled,
	#[error("Current file is not an LDF file.")]
	NotLdf,
}

/// Picks the file to open: `explicit` if given, else the active editor's
/// file if it is a saved `.ldf` file.
pub fn resolve_target(explicit: Option<&Path>, active: Option<&ActiveEditor>) -> Result<PathBuf, TargetError> {
	if let Some(path) = explicit {
		return Ok(path.to_path_buf());
	}
	let editor = active.ok_or(TargetError::NoActiveFile)?;
	if editor.untitled {
		return Err(TargetError::Untitled);
	}
	let is_ldf = editor
		.path
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case(LDF_EXTENSION));
	if !is_ldf {
		return Err(TargetError::NotLdf);
	}
	Ok(editor.path.clone())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn active(path: &str, untitled: bool) -> ActiveEditor {
		ActiveEditor {
			path: PathBuf::from(path),
			untitled,
		}
	}

	#[test]
	fn explicit_path_wins() {
		let editor = active("/work/notes.txt", false);
		assert_eq!(
			resolve_target(Some(Path::new("/work/bus.ldf")), Some(&editor)),
			Ok(PathBuf::from("/work/bus.ldf"))
		);
	}

	#[test]
	fn active_ldf_file_is_used() {
		assert_eq!(
			resolve_target(None, Some(&active("/work/Bus.LDF", false))),
			Ok(PathBuf::from("/work/Bus.LDF"))
		);
	}

	#[test]
	fn rejections_carry_user_messages() {
		assert_eq!(
			resolve_target(None, None).unwrap_err().to_string(),
			"Please open an LDF file first."
		);
		assert_eq!(
			resolve_target(None, Some(&active("Untitled-1", true))),
			Err(TargetError::Untitled)
		);
		assert_eq!(
			resolve_target(None, Some(&active("/work/bus.ldf.bak", false))).unwrap_err().to_string(),
			"Current file is not an LDF file."
		);
		assert_eq!(
			resolve_target(None, Some(&active("/work/Makefile", false))),
			Err(TargetError::NotLdf)
		);
	}
}

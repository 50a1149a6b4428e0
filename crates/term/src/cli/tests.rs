use clap::CommandFactory;
use ldfx_session::{TargetError, resolve_target};

use super::*;

#[test]
fn schema_is_consistent() {
	Cli::command().debug_assert();
}

#[test]
fn parse_explicit_file() {
	let cli = Cli::try_parse_from(["ldfx", "body.ldf", "--interpreter", "python3", "-v"]).unwrap();
	assert_eq!(cli.file, Some(PathBuf::from("body.ldf")));
	assert_eq!(cli.interpreter.as_deref(), Some("python3"));
	assert!(cli.verbose);
	assert!(!cli.in_memory);
	assert_eq!(cli.active_editor(), None);
}

#[test]
fn active_file_feeds_target_resolution() {
	let cli = Cli::try_parse_from(["ldfx", "--active-file", "/work/Body.LDF"]).unwrap();
	let target = resolve_target(cli.file.as_deref(), cli.active_editor().as_ref());
	assert_eq!(target, Ok(PathBuf::from("/work/Body.LDF")));
}

#[test]
fn untitled_active_buffer_is_rejected() {
	let cli = Cli::try_parse_from(["ldfx", "--active-file", "Untitled-1", "--untitled"]).unwrap();
	let target = resolve_target(cli.file.as_deref(), cli.active_editor().as_ref());
	assert_eq!(target, Err(TargetError::Untitled));
}

#[test]
fn untitled_requires_active_file() {
	assert!(Cli::try_parse_from(["ldfx", "--untitled"]).is_err());
}

#[test]
fn no_target_at_all() {
	let cli = Cli::try_parse_from(["ldfx"]).unwrap();
	let target = resolve_target(cli.file.as_deref(), cli.active_editor().as_ref());
	assert_eq!(target, Err(TargetError::NoActiveFile));
}

//! Launch argument helpers.
//! - launch_program_path: extract program path
//! - launch_inline_source: inline script text
//! - launch_flag: boolean launch options
//! - source_key: canonical name for a program or breakpoint path

use crate::protocol::LaunchArguments;

pub(super) fn launch_program_path(args: &LaunchArguments) -> Option<String> {
    args.additional
        .get("program")
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

pub(super) fn launch_inline_source(args: &LaunchArguments) -> Option<String> {
    args.additional
        .get("source")
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

/// `showDynamicCode`, `stopOnException` and similar switches.
pub(super) fn launch_flag(args: &LaunchArguments, key: &str) -> Option<bool> {
    args.additional.get(key).and_then(|value| value.as_bool())
}

/// Canonical path when `path` names an existing file, so a relative
/// `program` and an absolute breakpoint path refer to the same source.
pub(super) fn source_key(path: &str) -> String {
    std::fs::canonicalize(path).map_or_else(
        |_| path.to_string(),
        |canonical| canonical.to_string_lossy().into_owned(),
    )
}

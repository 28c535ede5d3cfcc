//! Object storage folders, accepted content types, and path construction.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Folders
// ---------------------------------------------------------------------------

pub const FOLDER_TRAINERS: &str = "trainers";
pub const FOLDER_COMPANIES: &str = "companies";
pub const FOLDER_PROJECTS: &str = "projects";
pub const FOLDER_WORKSHOPS: &str = "workshops";
pub const FOLDER_VIDEOS: &str = "videos";

/// Folders that accept image uploads.
const IMAGE_FOLDERS: &[&str] = &[
    FOLDER_TRAINERS,
    FOLDER_COMPANIES,
    FOLDER_PROJECTS,
    FOLDER_WORKSHOPS,
];

pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4", "video/webm"];

/// Content types accepted by `folder`, or a validation error for unknown folders.
pub fn allowed_content_types(folder: &str) -> Result<&'static [&'static str], CoreError> {
    if IMAGE_FOLDERS.contains(&folder) {
        Ok(IMAGE_CONTENT_TYPES)
    } else if folder == FOLDER_VIDEOS {
        Ok(VIDEO_CONTENT_TYPES)
    } else {
        Err(CoreError::Validation(format!(
            "Unknown upload folder '{folder}'. Must be one of: {IMAGE_FOLDERS:?}, \"{FOLDER_VIDEOS}\""
        )))
    }
}

/// Validate that `content_type` may be stored under `folder`.
pub fn validate_upload(folder: &str, content_type: &str, size: u64, max_bytes: u64) -> Result<(), CoreError> {
    let allowed = allowed_content_types(folder)?;
    if !allowed.contains(&content_type) {
        return Err(CoreError::Validation(format!(
            "Content type '{content_type}' is not accepted in '{folder}'. Allowed: {allowed:?}"
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "Uploaded file is {size} bytes; the limit is {max_bytes} bytes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Reduce a client-supplied filename to `[A-Za-z0-9._-]`, without leading dots.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_CHARS.replace_all(base, "-");
    let cleaned = cleaned.trim_start_matches('.').trim_matches('-');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Object path for a new upload: `<folder>/<unique>-<sanitized name>`.
pub fn object_path(folder: &str, unique: &str, filename: &str) -> String {
    format!("{folder}/{unique}-{}", sanitize_filename(filename))
}

/// Validate an object path received from a client before touching storage:
/// relative, no `..` segments, no empty segments.
pub fn validate_object_path(path: &str) -> Result<(), CoreError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(CoreError::Validation(format!("Invalid object path '{path}'")));
    }
    Ok(())
}

//! Input path resolution.
//!
//! Every operation starts by turning its input path into an [`InputSet`]:
//! either one file, or the ordered list of recognized video files found
//! under a directory. Extract and convert look only at a directory's direct
//! children ([`Traversal::Flat`]); merge walks the whole subtree
//! ([`Traversal::Recursive`]).
//!
//! Recursive order is deterministic: within each directory, files come first
//! sorted by name, then subdirectories sorted by name, each walked
//! depth-first.

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use walkdir::{DirEntry, WalkDir};

use crate::error::VideoToolError;

/// Recognized video file extensions, compared case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mkv", "mov", "flv", "wmv", "webm"];

/// How far below a directory input to look for videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Direct children only.
    Flat,
    /// The whole subtree.
    Recursive,
}

/// A resolved operation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSet {
    /// The input path was a recognized video file.
    SingleFile(PathBuf),
    /// The input path was a directory; these are its videos, in order.
    FileSet(Vec<PathBuf>),
}

impl InputSet {
    /// The files to process, in order.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            InputSet::SingleFile(path) => std::slice::from_ref(path),
            InputSet::FileSet(paths) => paths,
        }
    }

    /// `true` when the input was a directory.
    ///
    /// Batch inputs record per-file failures instead of returning them.
    pub fn is_batch(&self) -> bool {
        matches!(self, InputSet::FileSet(_))
    }

    /// Number of files to process.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    /// Always `false`; resolution never yields an empty set.
    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }
}

/// Returns `true` if `path` has one of the [`VIDEO_EXTENSIONS`].
pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// List the recognized video files under `root`.
///
/// Unreadable entries are logged and skipped. The result may be empty.
///
/// # Errors
///
/// Returns [`VideoToolError::InputNotFound`] if `root` does not exist.
pub fn discover_videos<P: AsRef<Path>>(
    root: P,
    traversal: Traversal,
) -> Result<Vec<PathBuf>, VideoToolError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(VideoToolError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let max_depth = match traversal {
        Traversal::Flat => 1,
        Traversal::Recursive => usize::MAX,
    };

    let mut videos = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by(files_before_directories);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::warn!("Skipping unreadable entry under {}: {error}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_video_file(path) {
            videos.push(entry.into_path());
        }
    }

    log::debug!(
        "Discovered {} video file(s) under {} ({:?})",
        videos.len(),
        root.display(),
        traversal,
    );
    Ok(videos)
}

/// Resolve an operation's input path.
///
/// # Errors
///
/// - [`VideoToolError::InputNotFound`] if `path` does not exist.
/// - [`VideoToolError::UnsupportedFormat`] if `path` is a file without a
///   recognized extension.
/// - [`VideoToolError::NoInputFound`] if `path` is a directory with no
///   recognized video files (or is neither a file nor a directory).
pub fn resolve_input<P: AsRef<Path>>(
    path: P,
    traversal: Traversal,
) -> Result<InputSet, VideoToolError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VideoToolError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        if !is_video_file(path) {
            return Err(VideoToolError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        return Ok(InputSet::SingleFile(path.to_path_buf()));
    }

    if path.is_dir() {
        let videos = discover_videos(path, traversal)?;
        if !videos.is_empty() {
            return Ok(InputSet::FileSet(videos));
        }
    }

    Err(VideoToolError::NoInputFound {
        path: path.to_path_buf(),
    })
}

fn files_before_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

use crate::models::ExtensionKey;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use walkdir::WalkDir;

/// List every regular file nested under a directory, at any depth.
/// Symlinks are not followed; a link that does not resolve to a directory is
/// reported as a file. Any unreadable entry fails the whole walk.
pub fn list_files_recursive<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory.as_ref()).follow_links(false) {
        let entry = entry?;
        let file_type = entry.file_type();

        if file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Compute `output/<extension-or-no_extension>/<file name>` for a source file
pub fn destination_for<P: AsRef<Path>, Q: AsRef<Path>>(file: P, output: Q) -> Result<PathBuf> {
    let file = file.as_ref();
    let file_name = file
        .file_name()
        .with_context(|| format!("Path has no file name: {:?}", file))?;

    let key = ExtensionKey::from_path(file);
    Ok(output.as_ref().join(key.folder_name()).join(file_name))
}

/// Copy one file into its extension subfolder under `output`.
/// Never fails: any error is captured in the returned `CopyResult`.
pub async fn copy_into_extension_folder(file: PathBuf, output: PathBuf) -> CopyResult {
    let destination = match destination_for(&file, &output) {
        Ok(destination) => destination,
        Err(e) => {
            return CopyResult::Error {
                source: file,
                destination: output,
                error: format!("{:#}", e),
            }
        }
    };

    match copy_file_bytes(&file, &destination).await {
        Ok(()) => CopyResult::Success {
            source: file,
            destination,
        },
        Err(e) => CopyResult::Error {
            source: file,
            destination,
            error: format!("{:#}", e),
        },
    }
}

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `destination` that no other copy in this process uses
fn staging_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(file_name) = destination.file_name() {
        name.push(file_name);
    }
    name.push(format!(
        ".{}-{}.tmp",
        std::process::id(),
        STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    destination.with_file_name(name)
}

/// Read the whole source and write it to the destination, creating the
/// parent folder first. Existing destinations are overwritten.
/// Bytes land in a staging file first and are renamed into place, so
/// concurrent copies to one destination never leave mixed content.
async fn copy_file_bytes(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        // create_dir_all tolerates the folder appearing concurrently
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let bytes = fs::read(source)
        .await
        .with_context(|| format!("Failed to read file: {:?}", source))?;

    let staging = staging_path(destination);
    let written = async {
        fs::write(&staging, bytes)
            .await
            .with_context(|| format!("Failed to write file: {:?}", staging))?;
        fs::rename(&staging, destination)
            .await
            .with_context(|| format!("Failed to move file into place: {:?}", destination))
    }
    .await;

    if written.is_err() {
        // drop any partial staging file
        let _ = fs::remove_file(&staging).await;
    }

    written
}

/// Result of a file copy operation
#[derive(Debug, Clone)]
pub enum CopyResult {
    Success {
        source: PathBuf,
        destination: PathBuf,
    },
    Error {
        source: PathBuf,
        destination: PathBuf,
        error: String,
    },
}

impl CopyResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyResult::Success { .. })
    }

    pub fn source(&self) -> &Path {
        match self {
            CopyResult::Success { source, .. } | CopyResult::Error { source, .. } => source,
        }
    }
}

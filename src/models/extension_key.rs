use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Folder name used for files that carry no extension
pub const NO_EXTENSION_FOLDER: &str = "no_extension";

/// Destination subfolder key derived from a file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionKey {
    Extension(OsString),
    NoExtension,
}

impl ExtensionKey {
    /// Derive the key from the last `.` of the file name, case preserved.
    /// Dot-files and names ending in a bare `.` have no extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension() {
            Some(ext) if !ext.is_empty() => ExtensionKey::Extension(ext.to_os_string()),
            _ => ExtensionKey::NoExtension,
        }
    }

    /// Name of the subfolder this key maps to under the output root
    pub fn folder_name(&self) -> &OsStr {
        match self {
            ExtensionKey::Extension(ext) => ext.as_os_str(),
            ExtensionKey::NoExtension => OsStr::new(NO_EXTENSION_FOLDER),
        }
    }
}

pub mod file_operations;

pub use file_operations::{
    copy_into_extension_folder, destination_for, list_files_recursive, CopyResult,
};

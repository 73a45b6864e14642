pub mod file_sort;

pub use file_sort::{
    find_collisions, sort_files_by_extension, validate_source, Collision, CopyError, SortConfig,
    SortError, SortReport,
};

pub mod file_operations;

pub use file_operations::{
    copy_file_overwrite, is_same_directory, list_files_in_directory, list_subdirectory_names,
    relocate_into_subdirectory,
};

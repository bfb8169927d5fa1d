use crate::error::{FileOperation, TransferError};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// List the regular files directly inside a directory.
/// Subdirectories are skipped, not descended into. Order is whatever the filesystem yields.
/// An entry that cannot be read is kept as a `List` error so the caller decides what to do with it.
pub fn list_files_in_directory<P: AsRef<Path>>(
    directory: P,
) -> Result<Vec<Result<PathBuf, TransferError>>, TransferError> {
    let dir_path = directory.as_ref();

    let entries = fs::read_dir(dir_path)
        .map_err(|e| TransferError::file_operation(FileOperation::List, dir_path, e))?;

    let files = entries
        .filter_map(|entry| listed_file(dir_path, entry.map(|entry| entry.path())))
        .collect();

    Ok(files)
}

fn listed_file(dir_path: &Path, entry: io::Result<PathBuf>) -> Option<Result<PathBuf, TransferError>> {
    match entry {
        Ok(path) if path.is_file() => Some(Ok(path)),
        Ok(_) => None,
        Err(e) => Some(Err(TransferError::file_operation(FileOperation::List, dir_path, e))),
    }
}

/// Names of the directories directly inside `directory`, sorted
pub fn list_subdirectory_names<P: AsRef<Path>>(directory: P) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory.as_ref())? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}

/// Copy `source` over `destination`, replacing whatever is there.
/// With `preserve_modified` the copy keeps the source's modification time.
pub fn copy_file_overwrite<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    preserve_modified: bool,
) -> Result<u64, TransferError> {
    let src_path = source.as_ref();
    let dest_path = destination.as_ref();

    let bytes = fs::copy(src_path, dest_path)
        .map_err(|e| TransferError::file_operation(FileOperation::Copy, src_path, e))?;

    if preserve_modified {
        carry_modification_time(src_path, dest_path);
    }

    Ok(bytes)
}

fn carry_modification_time(src_path: &Path, dest_path: &Path) {
    let modified = fs::metadata(src_path).and_then(|metadata| metadata.modified());
    let result = modified.and_then(|time| filetime::set_file_mtime(dest_path, FileTime::from_system_time(time)));

    if let Err(e) = result {
        warn!("Could not preserve modification time on {:?}: {}", dest_path, e);
    }
}

/// Move a file into `<its parent>/<subdirectory>/`, creating the subdirectory if needed.
/// Returns the new location.
pub fn relocate_into_subdirectory<P: AsRef<Path>>(
    file: P,
    subdirectory: &str,
) -> Result<PathBuf, TransferError> {
    let file_path = file.as_ref();

    let (parent, file_name) = match (file_path.parent(), file_path.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => {
            return Err(TransferError::file_operation(
                FileOperation::Relocate,
                file_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent folder"),
            ))
        }
    };

    let target_dir = parent.join(subdirectory);
    fs::create_dir_all(&target_dir)
        .map_err(|e| TransferError::file_operation(FileOperation::Relocate, &target_dir, e))?;

    let target = target_dir.join(file_name);
    fs::rename(file_path, &target)
        .map_err(|e| TransferError::file_operation(FileOperation::Relocate, file_path, e))?;

    Ok(target)
}

/// True when both paths resolve to the same existing directory
pub fn is_same_directory<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> bool {
    match (fs::canonicalize(a.as_ref()), fs::canonicalize(b.as_ref())) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_list_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), b"1").unwrap();
        fs::create_dir(dir.path().join("copied")).unwrap();
        fs::write(dir.path().join("copied").join("old.csv"), b"0").unwrap();

        let files: Vec<PathBuf> = list_files_in_directory(dir.path())
            .unwrap()
            .into_iter()
            .map(|entry| entry.unwrap())
            .collect();
        assert_eq!(files, vec![dir.path().join("a.csv")]);
    }

    #[test]
    fn test_unreadable_entry_is_kept_as_list_error() {
        let dir = TempDir::new().unwrap();
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "entry unreadable");

        let listed = listed_file(dir.path(), Err(denied));

        match listed {
            Some(Err(TransferError::FileOperationFailed { operation, path, .. })) => {
                assert_eq!(operation, FileOperation::List);
                assert_eq!(path, dir.path());
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_listed_entry_that_is_a_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("copied")).unwrap();

        assert!(listed_file(dir.path(), Ok(dir.path().join("copied"))).is_none());
    }

    #[test]
    fn test_list_files_missing_directory_is_list_error() {
        let dir = TempDir::new().unwrap();
        let err = list_files_in_directory(dir.path().join("nope")).unwrap_err();
        assert!(matches!(
            err,
            TransferError::FileOperationFailed { operation: FileOperation::List, .. }
        ));
    }

    #[test]
    fn test_list_subdirectory_names_sorted_dirs_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("file.txt"), b"x").unwrap();

        let names = list_subdirectory_names(dir.path()).unwrap();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.csv");
        let dest = dir.path().join("dest.csv");
        fs::write(&src, b"new contents").unwrap();
        fs::write(&dest, b"old").unwrap();

        let bytes = copy_file_overwrite(&src, &dest, false).unwrap();
        assert_eq!(bytes, 12);
        assert_eq!(fs::read(&dest).unwrap(), b"new contents");
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.csv");
        let dest = dir.path().join("dest.csv");
        fs::write(&src, b"x").unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600 * 24);
        filetime::set_file_mtime(&src, FileTime::from_system_time(past)).unwrap();

        copy_file_overwrite(&src, &dest, true).unwrap();

        let src_time = FileTime::from_last_modification_time(&fs::metadata(&src).unwrap());
        let dest_time = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(src_time.unix_seconds(), dest_time.unix_seconds());
    }

    #[test]
    fn test_relocate_creates_subdirectory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.csv");
        fs::write(&file, b"1").unwrap();

        let moved = relocate_into_subdirectory(&file, "copied").unwrap();
        assert_eq!(moved, dir.path().join("copied").join("a.csv"));
        assert!(!file.exists());
        assert!(moved.exists());
    }

    #[test]
    fn test_is_same_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        assert!(is_same_directory(&nested, nested.join("..").join("nested")));
        assert!(!is_same_directory(dir.path(), &nested));
        assert!(!is_same_directory(dir.path().join("missing"), dir.path().join("missing")));
    }
}

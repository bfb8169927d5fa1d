use crate::error::TransferError;
use crate::models::SourceSelection;
use crate::utils::list_subdirectory_names;
use std::path::Path;

/// User folders directly under the tasks root, sorted by name
pub fn list_users<P: AsRef<Path>>(tasks_root: P) -> Result<Vec<String>, TransferError> {
    let tasks_root = tasks_root.as_ref();
    ensure_tasks_root(tasks_root)?;
    list_folder(tasks_root)
}

/// Program folders of one user, sorted by name
pub fn list_programs<P: AsRef<Path>>(tasks_root: P, user: &str) -> Result<Vec<String>, TransferError> {
    let tasks_root = tasks_root.as_ref();
    ensure_tasks_root(tasks_root)?;
    list_folder(&tasks_root.join(user))
}

/// Build the engine input for the chosen programs of a user.
/// Only paths are assembled here; nothing is read from disk.
pub fn program_sources<P, I, S>(tasks_root: P, user: &str, programs: I) -> SourceSelection
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let user_dir = tasks_root.as_ref().join(user);
    programs
        .into_iter()
        .map(|program| user_dir.join(program.as_ref()))
        .collect()
}

fn ensure_tasks_root(tasks_root: &Path) -> Result<(), TransferError> {
    if tasks_root.is_dir() {
        Ok(())
    } else {
        Err(TransferError::TasksRootMissing {
            path: tasks_root.to_path_buf(),
        })
    }
}

fn list_folder(directory: &Path) -> Result<Vec<String>, TransferError> {
    if !directory.is_dir() {
        return Err(TransferError::SourceUnavailable {
            path: directory.to_path_buf(),
            reason: "folder does not exist".to_string(),
        });
    }

    list_subdirectory_names(directory).map_err(|e| TransferError::SourceUnavailable {
        path: directory.to_path_buf(),
        reason: e.to_string(),
    })
}

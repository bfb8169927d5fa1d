use std::path::{Path, PathBuf};

/// Ordered set of folders picked for one transfer.
/// Existence is not checked here; the engine validates each folder when it reaches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSelection {
    folders: Vec<PathBuf>,
}

impl SourceSelection {
    pub fn new<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut selection = Self::default();
        for folder in folders {
            selection.push(folder);
        }
        selection
    }

    /// Add a folder unless it is already selected
    pub fn push(&mut self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        if !self.folders.contains(&folder) {
            self.folders.push(folder);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.folders.iter().map(PathBuf::as_path)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SourceSelection {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse_keeping_first_position() {
        let selection = SourceSelection::new(["/a", "/b", "/a", "/c"]);
        let folders: Vec<&Path> = selection.iter().collect();
        assert_eq!(folders, vec![Path::new("/a"), Path::new("/b"), Path::new("/c")]);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_empty_selection() {
        let selection: SourceSelection = Vec::<PathBuf>::new().into_iter().collect();
        assert!(selection.is_empty());
    }
}

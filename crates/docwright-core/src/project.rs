//! Sphinx-style documentation projects.
//!
//! A project is a folder with sources under `source/` and generated HTML
//! under `build/html/`. The editor only needs to list the sources and to
//! find the HTML page a source renders to.

use std::path::{Path, PathBuf};

use crate::{CoreError, CoreResult};

/// File extensions treated as documentation sources.
const SOURCE_EXTENSIONS: &[&str] = &["rst", "txt"];

/// Directories never searched for sources.
const SKIPPED_DIRS: &[&str] = &["build", "_build", "target", "node_modules", "__pycache__"];

/// Entry document used when none is named.
pub const DEFAULT_ENTRY: &str = "index.rst";

/// A documentation project rooted at a folder.
#[derive(Debug, Clone)]
pub struct DocsProject {
    root: PathBuf,
    name: String,
}

impl DocsProject {
    /// Opens a project folder.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let root = path.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(CoreError::NotADirectory(root.display().to_string()));
        }

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("docs")
            .to_string();

        tracing::info!("opened project {} at {}", name, root.display());
        Ok(Self { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the sources.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    /// Directory holding the generated HTML.
    pub fn html_dir(&self) -> PathBuf {
        self.root.join("build").join("html")
    }

    /// All documentation sources under the root, sorted by path.
    pub fn source_files(&self) -> CoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_sources(&self.root, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Path of an entry document, `index.rst` by default.
    ///
    /// Looks in `source/` first, then in the root.
    pub fn entry_file(&self, name: Option<&str>) -> PathBuf {
        let name = name.unwrap_or(DEFAULT_ENTRY);
        let in_source = self.source_dir().join(name);
        if in_source.exists() {
            in_source
        } else {
            self.root.join(name)
        }
    }

    /// The HTML page a source file renders to.
    pub fn html_preview_path(&self, file: impl AsRef<Path>) -> PathBuf {
        let file = file.as_ref();
        let source_dir = self.source_dir();
        let relative = file
            .strip_prefix(&source_dir)
            .or_else(|_| file.strip_prefix(&self.root))
            .unwrap_or(file);
        let relative = match relative.file_name() {
            Some(_) => relative.with_extension("html"),
            None => relative.to_path_buf(),
        };
        self.html_dir().join(relative)
    }

    /// Returns true if the path lies inside the project.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().starts_with(&self.root)
    }
}

fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if SKIPPED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            collect_sources(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_project() -> (tempfile::TempDir, DocsProject) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("source/guide")).unwrap();
        fs::create_dir_all(root.join("build/html")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("source/index.rst"), "Index\n=====\n").unwrap();
        fs::write(root.join("source/guide/usage.rst"), "Usage\n").unwrap();
        fs::write(root.join("source/conf.py"), "project = 'x'\n").unwrap();
        fs::write(root.join("README.txt"), "readme\n").unwrap();
        fs::write(root.join("build/html/stale.rst"), "old\n").unwrap();
        fs::write(root.join(".git/notes.rst"), "hidden\n").unwrap();

        let project = DocsProject::open(root).unwrap();
        (dir, project)
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.rst");
        fs::write(&file, "x").unwrap();

        assert!(matches!(DocsProject::open(&file), Err(CoreError::NotADirectory(_))));
        assert!(matches!(
            DocsProject::open(dir.path().join("missing")),
            Err(CoreError::Io(_))
        ));
    }

    #[test]
    fn test_source_files() {
        let (_dir, project) = sample_project();
        let files: Vec<PathBuf> = project
            .source_files()
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(project.root()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            files,
            vec![
                PathBuf::from("README.txt"),
                PathBuf::from("source/guide/usage.rst"),
                PathBuf::from("source/index.rst"),
            ]
        );
    }

    #[test]
    fn test_entry_file() {
        let (_dir, project) = sample_project();
        assert_eq!(project.entry_file(None), project.root().join("source/index.rst"));
        assert_eq!(project.entry_file(Some("README.txt")), project.root().join("README.txt"));
    }

    #[test]
    fn test_html_preview_path() {
        let (_dir, project) = sample_project();
        let root = project.root().to_path_buf();

        assert_eq!(
            project.html_preview_path(root.join("source/guide/usage.rst")),
            root.join("build/html/guide/usage.html")
        );
        assert_eq!(
            project.html_preview_path(root.join("README.txt")),
            root.join("build/html/README.html")
        );
        assert!(project.contains(root.join("source/index.rst")));
    }
}

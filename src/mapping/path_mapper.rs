use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::ext::PathExt;

pub const INPUT_EXTENSIONS: [&str; 2] = ["yaml", "yml"];
pub const OUTPUT_EXTENSION: &str = "xml";

/// How a mirrored destination file is named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NamingPolicy {
    /// Drop the source file stem: `sub/menu.yaml` becomes `sub/.xml`.
    /// Files sharing a directory overwrite each other.
    #[default]
    ClearStem,
    /// Keep the source file stem: `sub/menu.yaml` becomes `sub/menu.xml`
    PreserveStem,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathMapper {
    naming: NamingPolicy,
}

impl PathMapper {
    pub fn new(naming: NamingPolicy) -> Self {
        Self { naming }
    }

    /// An existing regular file with a `.yaml` or `.yml` extension
    pub fn is_eligible(&self, path: &Path) -> bool {
        path.has_extension_in(&INPUT_EXTENSIONS) && path.is_file()
    }

    /// Swaps the extension for `.xml`, naming the file per the [`NamingPolicy`]
    pub fn destination_for(&self, source: &Path) -> PathBuf {
        let mut file_name = match self.naming {
            NamingPolicy::ClearStem => OsString::new(),
            NamingPolicy::PreserveStem => {
                source.file_stem().map(OsString::from).unwrap_or_default()
            }
        };
        file_name.push(".");
        file_name.push(OUTPUT_EXTENSION);
        source.with_file_name(file_name)
    }

    /// Destination of `file` found under `source_root`, with the directory
    /// structure below `source_root` recreated under `destination_root`.
    ///
    /// Returns `None` when `file` is not below `source_root`.
    pub fn mirror(&self, source_root: &Path, destination_root: &Path, file: &Path) -> Option<PathBuf> {
        let renamed = self.destination_for(file);
        let relative = renamed.strip_prefix(source_root).ok()?;
        Some(destination_root.join(relative).normalized())
    }

    /// Destination of a single source file.
    ///
    /// Inside a destination directory the source stem is always kept, whatever
    /// the naming policy. Any other destination is used as is.
    pub fn single_file_destination(
        &self,
        source: &Path,
        destination: &Path,
        destination_is_dir: bool,
    ) -> PathBuf {
        if !destination_is_dir {
            return destination.to_path_buf();
        }
        let mut file_name = source.file_stem().map(OsString::from).unwrap_or_default();
        file_name.push(".");
        file_name.push(OUTPUT_EXTENSION);
        destination.join(file_name)
    }
}

/// Absolute paths are returned unchanged, relative ones are resolved against `cwd`
pub fn resolve_absolute(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn destination_clears_the_stem_by_default() {
        let destination = PathMapper::default().destination_for(Path::new("a/b/c.yaml"));
        assert_eq!(destination, PathBuf::from("a/b/.xml"));
        assert_eq!(destination.file_name().unwrap(), ".xml");
        assert_eq!(destination.parent().unwrap(), Path::new("a/b"));
    }

    #[rstest]
    #[case("a/b/c.yaml", "a/b/c.xml")]
    #[case("menu.yml", "menu.xml")]
    #[case("/abs/dir/title.screen.yaml", "/abs/dir/title.screen.xml")]
    fn destination_can_keep_the_stem(#[case] source: &str, #[case] expected: &str) {
        let mapper = PathMapper::new(NamingPolicy::PreserveStem);
        assert_eq!(mapper.destination_for(Path::new(source)), PathBuf::from(expected));
    }

    #[test]
    fn mirror_recreates_relative_directories() {
        let mapper = PathMapper::default();
        let destination = mapper.mirror(
            Path::new("/src"),
            Path::new("/out"),
            Path::new("/src/sub/deeper/c.yml"),
        );
        assert_eq!(destination, Some(PathBuf::from("/out/sub/deeper/.xml")));
    }

    #[test]
    fn mirror_with_preserved_names() {
        let mapper = PathMapper::new(NamingPolicy::PreserveStem);
        let destination = mapper.mirror(
            Path::new("/src"),
            Path::new("/out"),
            Path::new("/src/a.yaml"),
        );
        assert_eq!(destination, Some(PathBuf::from("/out/a.xml")));
    }

    #[test]
    fn mirror_rejects_files_outside_the_root() {
        let mapper = PathMapper::default();
        let destination = mapper.mirror(
            Path::new("/src"),
            Path::new("/out"),
            Path::new("/elsewhere/a.yaml"),
        );
        assert_eq!(destination, None);
    }

    #[rstest]
    #[case(true, "/out/menu.xml")]
    #[case(false, "/out")]
    fn single_file_destination(#[case] is_dir: bool, #[case] expected: &str) {
        let mapper = PathMapper::default();
        let destination =
            mapper.single_file_destination(Path::new("/src/menu.yaml"), Path::new("/out"), is_dir);
        assert_eq!(destination, PathBuf::from(expected));
    }

    #[rstest]
    #[case("/already/absolute/../x", "/home", "/already/absolute/../x")]
    #[case("rel/file.yaml", "/home/user", "/home/user/rel/file.yaml")]
    #[case("../up.yaml", "/home/user", "/home/up.yaml")]
    #[case(".", "/home/user", "/home/user")]
    fn resolves_absolute_paths(#[case] path: &str, #[case] cwd: &str, #[case] expected: &str) {
        assert_eq!(
            resolve_absolute(Path::new(path), Path::new(cwd)),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn eligibility_requires_an_existing_yaml_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.yaml"), "Name: a").unwrap();
        fs::write(root.join("b.yml"), "Name: b").unwrap();
        fs::write(root.join("c.txt"), "text").unwrap();
        fs::create_dir(root.join("dir.yaml")).unwrap();

        let mapper = PathMapper::default();
        assert!(mapper.is_eligible(&root.join("a.yaml")));
        assert!(mapper.is_eligible(&root.join("b.yml")));
        assert!(!mapper.is_eligible(&root.join("c.txt")));
        assert!(!mapper.is_eligible(&root.join("dir.yaml")));
        assert!(!mapper.is_eligible(&root.join("missing.yaml")));
    }
}

use std::path::{Component, Path, PathBuf};

/// Folds `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last().copied() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    components.push(component);
                }
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

pub trait PathExt {
    /// Lexically normalized copy of the path
    fn normalized(&self) -> PathBuf;

    /// Whether the final extension is one of `extensions` (case-sensitive)
    fn has_extension_in(&self, extensions: &[&str]) -> bool;
}

impl PathExt for Path {
    fn normalized(&self) -> PathBuf {
        normalize_lexically(self)
    }

    fn has_extension_in(&self, extensions: &[&str]) -> bool {
        self.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("/a/./b/../c", "/a/c")]
    #[case("/../a", "/a")]
    #[case("a/../../b", "../b")]
    #[case("./a/b/", "a/b")]
    #[case("/", "/")]
    fn normalizes_components(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_lexically(Path::new(raw)), PathBuf::from(expected));
    }

    #[rstest]
    #[case("layout.yaml", true)]
    #[case("dir/layout.yml", true)]
    #[case("layout.YAML", false)]
    #[case("layout.yaml.bak", false)]
    #[case("yaml", false)]
    #[case(".yaml", false)]
    fn matches_extensions(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(
            Path::new(path).has_extension_in(&["yaml", "yml"]),
            expected
        );
    }
}

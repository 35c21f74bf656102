/// Which files in a diff count as source code.
///
/// A path is eligible when it ends with `extension` and does not end with
/// `test_suffix`. The defaults select Go sources and skip `_test.go` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    pub extension: String,
    pub test_suffix: String,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            extension: ".go".to_string(),
            test_suffix: "_test.go".to_string(),
        }
    }
}

impl SourceFilter {
    /// Whether hunks under `path` should produce changed ranges
    #[must_use]
    pub fn is_eligible(&self, path: &str) -> bool {
        path.ends_with(&self.extension) && !path.ends_with(&self.test_suffix)
    }
}

/// Extract the post-image path from a `diff --git a/<old> b/<new>` line.
///
/// The path is the text after the last space with its `b/` prefix removed,
/// so renames resolve to their new location.
pub fn new_side_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("diff --git ")?;
    let last = rest.rsplit(' ').next().filter(|p| !p.is_empty())?;
    Some(last.strip_prefix("b/").unwrap_or(last))
}

/// Qualify a repository-relative path with the module root.
///
/// The result lives in the same path space as the file names written into a
/// coverage profile (`example.com/m` + `pkg/x.go` → `example.com/m/pkg/x.go`).
pub fn qualify(module_root: &str, path: &str) -> String {
    let root = module_root.trim_end_matches(['/', '\\']);
    let path = path.trim_start_matches(['/', '\\']);

    let joined = if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    };

    joined.replace('\\', "/")
}

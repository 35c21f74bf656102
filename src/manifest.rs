use error_set::error_set;
use std::path::Path;

error_set! {
    /// Errors from resolving the module root
    ManifestError := {
        #[display("Can't find the module manifest {path}")]
        NotFound { path: String },
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("No module declaration in {path}")]
        MissingModule { path: String },
    }
}

/// Read the module path declared by a `go.mod` manifest.
///
/// Coverage profiles name files by module path, so this is the prefix that
/// turns repository-relative diff paths into profile file names.
pub fn module_root(path: &Path) -> Result<String, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ManifestError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            ManifestError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;

    parse_module_line(&text).ok_or_else(|| ManifestError::MissingModule {
        path: path.display().to_string(),
    })
}

/// Module name from the first declaration line, skipping blanks and comments.
///
/// Returns `None` unless that declaration is the `module` directive.
pub fn parse_module_line(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("//"))?;

    let mut tokens = line.splitn(2, char::is_whitespace);
    if tokens.next()? != "module" {
        return None;
    }
    let name = tokens.next()?;
    let name = name.split("//").next().unwrap_or(name).trim();
    let name = name.trim_matches('"');

    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn plain_module_line() {
        assert_eq!(
            parse_module_line("module example.com/m\n\ngo 1.22\n").as_deref(),
            Some("example.com/m")
        );
    }

    #[test]
    fn leading_comments_and_blanks() {
        let text = "// Deprecated: use example.com/v2\n\nmodule example.com/m // legacy\n";
        assert_eq!(parse_module_line(text).as_deref(), Some("example.com/m"));
    }

    #[test]
    fn quoted_module_path() {
        assert_eq!(
            parse_module_line("module \"example.com/m\"\n").as_deref(),
            Some("example.com/m")
        );
    }

    #[test]
    fn empty_manifest() {
        assert_eq!(parse_module_line(""), None);
        assert_eq!(parse_module_line("// only a comment\n"), None);
        assert_eq!(parse_module_line("module\n"), None);
    }

    #[test]
    fn module_keyword_must_be_a_whole_token() {
        assert_eq!(parse_module_line("modulefoo\n"), None);
        assert_eq!(parse_module_line("modules example.com/m\n"), None);
        assert_eq!(
            parse_module_line("module\texample.com/m\n").as_deref(),
            Some("example.com/m")
        );
    }

    #[test]
    fn first_declaration_must_be_module() {
        assert_eq!(parse_module_line("go 1.22\n\nmodule example.com/m\n"), None);
    }

    #[test]
    fn reads_manifest_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("go.mod");
        std::fs::write(&path, "module github.com/acme/svc\n\ngo 1.21\n").unwrap();
        assert_eq!(module_root(&path).unwrap(), "github.com/acme/svc");
    }

    #[test]
    fn missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let result = module_root(&dir.path().join("go.mod"));
        assert!(matches!(result, Err(ManifestError::NotFound { .. })));
    }

    #[test]
    fn manifest_without_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("go.mod");
        std::fs::write(&path, "\n// nothing here\n").unwrap();
        assert!(matches!(
            module_root(&path),
            Err(ManifestError::MissingModule { .. })
        ));
    }
}

use crate::matcher::Selection;
use error_set::error_set;
use std::fmt::Write as _;
use std::path::Path;

error_set! {
    /// Errors from writing the incremental profile
    EmitError := {
        #[display("Failed to write {path}: {message}")]
        WriteFailed { path: String, message: String },
    }
}

/// Mode written on the first line of the incremental profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeHeader {
    /// Always `mode: count`, whatever the input declared
    #[default]
    Count,
    /// Repeat the mode declared by the input profile
    FromInput,
}

impl ModeHeader {
    pub fn resolve(self, input_mode: &str) -> &str {
        match self {
            ModeHeader::Count => "count",
            ModeHeader::FromInput => input_mode,
        }
    }
}

/// Render selections as profile text: the mode line, then one line per block.
pub fn render(mode: &str, selections: &[Selection<'_>]) -> String {
    let mut out = format!("mode: {mode}\n");
    for selection in selections {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}:{}", selection.file, selection.block);
    }
    out
}

/// Create or truncate `path` and write `contents` to it
pub fn write_profile(path: &Path, contents: &str) -> Result<(), EmitError> {
    std::fs::write(path, contents).map_err(|e| EmitError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::CoverageBlock;
    use similar_asserts::assert_eq;

    static BLOCKS: [CoverageBlock; 2] = [
        CoverageBlock {
            start_line: 12,
            start_col: 5,
            end_line: 14,
            end_col: 1,
            num_stmt: 2,
            count: 7,
        },
        CoverageBlock {
            start_line: 16,
            start_col: 2,
            end_line: 18,
            end_col: 3,
            num_stmt: 1,
            count: 0,
        },
    ];

    #[test]
    fn render_without_selections() {
        assert_eq!(render("count", &[]), "mode: count\n");
    }

    #[test]
    fn render_selected_blocks() {
        let selections = [
            Selection {
                file: "example.com/m/pkg/x.go",
                block: &BLOCKS[0],
            },
            Selection {
                file: "example.com/m/pkg/y.go",
                block: &BLOCKS[1],
            },
        ];
        insta::assert_snapshot!(render("count", &selections), @r"
        mode: count
        example.com/m/pkg/x.go:12.5,14.1 2 7
        example.com/m/pkg/y.go:16.2,18.3 1 0
        ");
    }

    #[test]
    fn mode_header_resolution() {
        assert_eq!(ModeHeader::Count.resolve("atomic"), "count");
        assert_eq!(ModeHeader::FromInput.resolve("atomic"), "atomic");
        assert_eq!(ModeHeader::default(), ModeHeader::Count);
    }

    #[test]
    fn write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("increment_coverage.out");
        std::fs::write(&path, "mode: set\nstale:1.1,2.2 1 1\nmore stale lines\n").unwrap();

        write_profile(&path, "mode: count\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mode: count\n");
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("increment_coverage.out");
        let result = write_profile(&path, "mode: count\n");
        assert!(matches!(result, Err(EmitError::WriteFailed { .. })));
    }
}

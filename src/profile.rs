//! Go coverage profiles (`go test -coverprofile`).
//!
//! A profile is a `mode:` line followed by one line per statement block:
//!
//! ```text
//! mode: count
//! example.com/m/pkg/x.go:12.5,14.1 2 7
//! ```
//!
//! Parsing follows `golang.org/x/tools/cover`: blocks are grouped per file,
//! sorted by start position, and blocks reported more than once (for example
//! by several test binaries writing the same file) are merged into one.
//!
//! ```
//! use go_incr_cover::profile::CoverageProfile;
//!
//! let profile = CoverageProfile::parse("mode: set\nm/x.go:3.2,5.10 2 1\n").unwrap();
//! assert_eq!(profile.mode, "set");
//! assert_eq!(profile.files[0].file_name, "m/x.go");
//! assert_eq!(profile.files[0].blocks[0].end_line, 5);
//! ```

use error_set::error_set;
use nom::{
    IResult, Parser,
    character::complete::{char, u32 as number, u64 as execution_count},
    combinator::all_consuming,
    sequence::separated_pair,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

error_set! {
    /// Errors from reading or parsing a coverage profile
    ProfileError := {
        /// The profile file could not be read
        #[display("Failed to read coverage profile {path}: {message}")]
        ReadFailed { path: String, message: String },
        /// First line is not `mode: <mode>`
        #[display("Bad mode line: '{line}'")]
        BadModeLine { line: String },
        /// A block line is not `file:sl.sc,el.ec numStmt count`
        #[display("Line '{line}' doesn't match expected format")]
        MalformedBlock { line: String },
        /// The same block was reported with different statement counts
        #[display("Inconsistent NumStmt for {file}: changed from {previous} to {current}")]
        InconsistentNumStmt { file: String, previous: u32, current: u32 },
    }
}

/// One instrumented span of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageBlock {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_stmt: u32,
    pub count: u64,
}

impl CoverageBlock {
    fn same_span(&self, other: &Self) -> bool {
        self.start_line == other.start_line
            && self.start_col == other.start_col
            && self.end_line == other.end_line
            && self.end_col == other.end_col
    }

    /// Order by start, then end, so identical spans are always adjacent
    fn cmp_span(&self, other: &Self) -> Ordering {
        (self.start_line, self.start_col, self.end_line, self.end_col).cmp(&(
            other.start_line,
            other.start_col,
            other.end_line,
            other.end_col,
        ))
    }
}

/// Renders the part of a profile line after `file:`
impl fmt::Display for CoverageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{},{}.{} {} {}",
            self.start_line, self.start_col, self.end_line, self.end_col, self.num_stmt, self.count
        )
    }
}

/// All blocks recorded for one file, sorted by start position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProfile {
    pub file_name: String,
    pub blocks: Vec<CoverageBlock>,
}

/// A parsed coverage profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageProfile {
    /// Declared mode: `set`, `count` or `atomic`
    pub mode: String,
    /// Per-file blocks, sorted by file name
    pub files: Vec<FileProfile>,
}

impl CoverageProfile {
    /// Read and parse a profile from disk
    pub fn read(path: &Path) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path).map_err(|e| ProfileError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&text)
    }

    /// Parse profile text.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if the first line is not a mode line, a block
    /// line is malformed, or a repeated block changes its statement count.
    pub fn parse(text: &str) -> Result<Self, ProfileError> {
        let mut lines = text.lines();

        let first = lines.next().unwrap_or_default();
        let mode = first
            .strip_prefix("mode: ")
            .filter(|mode| !mode.is_empty())
            .ok_or_else(|| ProfileError::BadModeLine {
                line: first.to_string(),
            })?
            .to_string();

        let mut by_file: BTreeMap<String, Vec<CoverageBlock>> = BTreeMap::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let (file_name, block) = parse_line(line)?;
            by_file.entry(file_name.to_string()).or_default().push(block);
        }

        let files = by_file
            .into_iter()
            .map(|(file_name, blocks)| {
                let blocks = merge_blocks(&file_name, blocks, &mode)?;
                Ok(FileProfile { file_name, blocks })
            })
            .collect::<Result<Vec<_>, ProfileError>>()?;

        Ok(Self { mode, files })
    }

    /// Blocks for `file_name`, if the profile mentions it
    pub fn file(&self, file_name: &str) -> Option<&FileProfile> {
        self.files
            .binary_search_by(|probe| probe.file_name.as_str().cmp(file_name))
            .ok()
            .map(|idx| &self.files[idx])
    }
}

/// Split a block line at its last `:` and parse the position/count part
fn parse_line(line: &str) -> Result<(&str, CoverageBlock), ProfileError> {
    let malformed = || ProfileError::MalformedBlock {
        line: line.to_string(),
    };

    let (file_name, spec) = line
        .rsplit_once(':')
        .filter(|(file_name, _)| !file_name.is_empty())
        .ok_or_else(malformed)?;

    let (_, block) = all_consuming(block_spec)
        .parse(spec)
        .map_err(|_| malformed())?;

    Ok((file_name, block))
}

/// `line.col`
fn position(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(number, char('.'), number).parse(input)
}

/// `sl.sc,el.ec numStmt count`
fn block_spec(input: &str) -> IResult<&str, CoverageBlock> {
    let (rest, ((start_line, start_col), _, (end_line, end_col), _, num_stmt, _, count)) =
        (position, char(','), position, char(' '), number, char(' '), execution_count).parse(input)?;

    Ok((
        rest,
        CoverageBlock {
            start_line,
            start_col,
            end_line,
            end_col,
            num_stmt,
            count,
        },
    ))
}

/// Sort blocks by start and fold repeated spans into one block
fn merge_blocks(
    file_name: &str,
    mut blocks: Vec<CoverageBlock>,
    mode: &str,
) -> Result<Vec<CoverageBlock>, ProfileError> {
    blocks.sort_by(CoverageBlock::cmp_span);

    let mut merged: Vec<CoverageBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last) if last.same_span(&block) => {
                if last.num_stmt != block.num_stmt {
                    return Err(ProfileError::InconsistentNumStmt {
                        file: file_name.to_string(),
                        previous: last.num_stmt,
                        current: block.num_stmt,
                    });
                }
                if mode == "set" {
                    last.count |= block.count;
                } else {
                    last.count = last.count.saturating_add(block.count);
                }
            }
            _ => merged.push(block),
        }
    }

    Ok(merged)
}

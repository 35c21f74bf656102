use error_set::error_set;
use std::path::PathBuf;
use std::process::Command;

pub mod diff;
pub mod emit;
pub mod manifest;
pub mod matcher;
pub mod profile;

pub use diff::{ChangedRange, FileRangeMap, SourceFilter};
pub use emit::{EmitError, ModeHeader};
pub use manifest::ManifestError;
pub use matcher::{OverlapPolicy, Selection};
pub use profile::{CoverageBlock, CoverageProfile, ProfileError};

/// Default input profile, as written by `go test -coverprofile=coverage.out`
pub const DEFAULT_COVERAGE_FILE: &str = "coverage.out";
/// Default output profile
pub const DEFAULT_OUTPUT_FILE: &str = "increment_coverage.out";

error_set! {
    /// Top-level error for incremental coverage runs
    IncrCoverError := {
        ManifestError(ManifestError),
        ProfileError(ProfileError),
        EmitError(EmitError),
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git diff: {message}")]
        DiffFailed { message: String },
        #[display("git diff failed: {stderr}")]
        DiffExitError { stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base revision the diff is taken against
    pub branch: String,
    /// Module path prefixed to diff paths (from `go.mod`)
    pub module_root: String,
    pub coverage_path: PathBuf,
    pub output_path: PathBuf,
    /// Repository `git` runs in
    pub repo_path: PathBuf,
    pub filter: SourceFilter,
    pub overlap: OverlapPolicy,
    pub mode: ModeHeader,
}

impl Config {
    /// Configuration with the default file names, filter and policies
    pub fn new(branch: impl Into<String>, module_root: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            module_root: module_root.into(),
            coverage_path: PathBuf::from(DEFAULT_COVERAGE_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            repo_path: PathBuf::from("."),
            filter: SourceFilter::default(),
            overlap: OverlapPolicy::default(),
            mode: ModeHeader::default(),
        }
    }
}

/// Outcome of filtering a profile against a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Eligible files touched by the diff
    pub changed_files: usize,
    /// Blocks kept in the incremental profile
    pub selected_blocks: usize,
    /// Rendered incremental profile
    pub contents: String,
}

/// Main interface for building incremental coverage profiles
pub struct IncrementalCoverage<'a> {
    config: &'a Config,
}

impl<'a> IncrementalCoverage<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Diff against the base branch, filter the coverage profile and write
    /// the result to the configured output path.
    ///
    /// # Examples
    /// ```no_run
    /// # use go_incr_cover::{Config, IncrementalCoverage};
    /// let config = Config::new("main", "example.com/m");
    /// let summary = IncrementalCoverage::new(&config).run().unwrap();
    /// println!("{} blocks", summary.selected_blocks);
    /// ```
    pub fn run(&self) -> Result<Summary, IncrCoverError> {
        let diff = self.get_raw_diff()?;
        let profile = CoverageProfile::read(&self.config.coverage_path)?;
        log::info!(
            "parsed {} ({} files, mode {})",
            self.config.coverage_path.display(),
            profile.files.len(),
            profile.mode
        );

        let summary = self.filter(&diff, &profile);
        emit::write_profile(&self.config.output_path, &summary.contents)?;
        log::info!(
            "wrote {} blocks to {}",
            summary.selected_blocks,
            self.config.output_path.display()
        );

        Ok(summary)
    }

    /// Restrict `profile` to the blocks touched by `diff_text`.
    ///
    /// Pure: no git invocation and no file access.
    pub fn filter(&self, diff_text: &str, profile: &CoverageProfile) -> Summary {
        let ranges = FileRangeMap::parse(diff_text, &self.config.module_root, &self.config.filter);
        log::info!("{} changed source files", ranges.len());

        let selections = matcher::select_blocks(&ranges, profile, self.config.overlap);
        let mode = self.config.mode.resolve(&profile.mode);
        if mode != profile.mode {
            log::debug!("input profile declares mode {}, writing {mode}", profile.mode);
        }

        Summary {
            changed_files: ranges.len(),
            selected_blocks: selections.len(),
            contents: emit::render(mode, &selections),
        }
    }

    /// Get `git diff <branch> HEAD` with zero context, restricted to added,
    /// copied, modified and renamed files
    fn get_raw_diff(&self) -> Result<String, GitCommandError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.config.repo_path)
            .args([
                "diff",
                "--no-ext-diff",
                "--no-color",
                "--unified=0",
                "--diff-filter=ACMR",
                self.config.branch.as_str(),
                "HEAD",
            ])
            .output()
            .map_err(|e| GitCommandError::DiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::DiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}

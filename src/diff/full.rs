use super::file::{SourceFilter, new_side_path, qualify};
use super::hunk::ChangedRange;
use std::collections::BTreeMap;

/// Changed-line ranges for every eligible file in a diff.
///
/// Keys are module-qualified paths. Iteration is sorted by path so that
/// everything derived from the map is deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileRangeMap {
    files: BTreeMap<String, Vec<ChangedRange>>,
}

impl FileRangeMap {
    /// Extract changed ranges from `git diff --unified=0` output.
    ///
    /// Each `diff --git` line opens a section. Sections for files rejected by
    /// `filter` are skipped until the next `diff --git` line, and hunk headers
    /// seen before any eligible section are ignored.
    pub fn parse(text: &str, module_root: &str, filter: &SourceFilter) -> Self {
        let mut files: BTreeMap<String, Vec<ChangedRange>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            if line.starts_with("diff --git") {
                current = new_side_path(line)
                    .filter(|path| filter.is_eligible(path))
                    .map(|path| qualify(module_root, path));

                match &current {
                    Some(path) => {
                        log::debug!("tracking changes in {path}");
                        files.entry(path.clone()).or_default();
                    }
                    None => log::debug!("skipping section: {line}"),
                }
            } else if line.starts_with("@@") {
                let Some(ranges) = current.as_ref().and_then(|path| files.get_mut(path)) else {
                    continue;
                };

                match ChangedRange::parse_header(line) {
                    Some(range) => ranges.push(range),
                    None => log::warn!("ignoring unrecognised hunk header: {line}"),
                }
            }
        }

        Self { files }
    }

    /// Ranges recorded for `path`, in diff order
    pub fn get(&self, path: &str) -> Option<&[ChangedRange]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Iterate files and their ranges in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ChangedRange])> {
        self.files
            .iter()
            .map(|(path, ranges)| (path.as_str(), ranges.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

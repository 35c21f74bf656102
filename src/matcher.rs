use crate::diff::{ChangedRange, FileRangeMap};
use crate::profile::{CoverageBlock, CoverageProfile};
use std::collections::HashSet;

/// How a changed range decides whether a coverage block belongs to the diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OverlapPolicy {
    /// Select blocks whose last line is at or before `start + length`.
    ///
    /// There is no lower bound: every block that ends before the far end of
    /// the hunk matches, including blocks far above it. This is the rule
    /// existing incremental-coverage pipelines were built against.
    #[default]
    EndBound,
    /// Select blocks that share at least one line with the hunk.
    Intersect,
}

impl OverlapPolicy {
    pub fn overlaps(self, range: &ChangedRange, block: &CoverageBlock) -> bool {
        let block_start = u64::from(block.start_line);
        let block_end = u64::from(block.end_line);

        match self {
            OverlapPolicy::EndBound => block_end <= range.far_end(),
            OverlapPolicy::Intersect => {
                block_start <= range.last_line() && block_end >= u64::from(range.start)
            }
        }
    }
}

/// A block chosen for the incremental profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub file: &'a str,
    pub block: &'a CoverageBlock,
}

/// Pick the profile blocks touched by the diff.
///
/// Files are visited in path order. Within a file, each range scans every
/// block in profile order, and a block chosen by an earlier range is never
/// chosen again, so the output holds at most one entry per block. Files the
/// diff does not mention contribute nothing.
pub fn select_blocks<'a>(
    ranges: &FileRangeMap,
    profile: &'a CoverageProfile,
    policy: OverlapPolicy,
) -> Vec<Selection<'a>> {
    let mut selections = Vec::new();

    for (path, file_ranges) in ranges.iter() {
        let Some(file) = profile.file(path) else {
            log::debug!("{path} changed but has no coverage blocks");
            continue;
        };

        // indices of blocks already emitted for this file
        let mut chosen: HashSet<usize> = HashSet::new();

        for range in file_ranges {
            for (idx, block) in file.blocks.iter().enumerate() {
                if chosen.contains(&idx) || !policy.overlaps(range, block) {
                    continue;
                }
                chosen.insert(idx);
                selections.push(Selection {
                    file: &file.file_name,
                    block,
                });
            }
        }

        log::debug!(
            "{path}: {} of {} blocks selected by {} ranges",
            chosen.len(),
            file.blocks.len(),
            file_ranges.len()
        );
    }

    selections
}

use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::opt,
    sequence::preceded,
};

/// Lines changed on the new side of a single hunk.
///
/// `length` is zero both when git writes an explicit `,0` and when it omits
/// the count for a single-line hunk. Either way the range is anchored at
/// `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    pub start: u32,
    pub length: u32,
}

impl ChangedRange {
    /// Parse a `@@ -A[,B] +C[,D] @@` hunk header.
    ///
    /// Only the `+` group is kept; the `-` group describes the pre-image.
    /// Anything after the closing `@@` (git's function context) is ignored.
    /// Returns `None` for anything that is not a well-formed header.
    pub fn parse_header(header: &str) -> Option<Self> {
        hunk_header(header).ok().map(|(_, range)| range)
    }

    /// `start + length`, the far end used by the end-bound policy.
    pub fn far_end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.length)
    }

    /// Last line touched by the hunk, counting an absent length as one line.
    pub fn last_line(&self) -> u64 {
        u64::from(self.start) + u64::from(self.length.max(1)) - 1
    }
}

/// `N` or `N,M`
fn range_spec(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    (line_number, opt(preceded(char(','), line_number))).parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, ChangedRange> {
    let (rest, (_, _old, _, (start, length), _)) =
        (tag("@@ -"), range_spec, tag(" +"), range_spec, tag(" @@")).parse(input)?;

    Ok((
        rest,
        ChangedRange {
            start,
            length: length.unwrap_or(0),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn range(start: u32, length: u32) -> Option<ChangedRange> {
        Some(ChangedRange { start, length })
    }

    #[test]
    fn header_with_both_counts() {
        assert_eq!(ChangedRange::parse_header("@@ -10,2 +12,3 @@"), range(12, 3));
    }

    #[test]
    fn header_without_new_count() {
        assert_eq!(ChangedRange::parse_header("@@ -136,0 +137 @@"), range(137, 0));
    }

    #[test]
    fn header_without_any_count() {
        assert_eq!(ChangedRange::parse_header("@@ -3 +3 @@"), range(3, 0));
    }

    #[test]
    fn header_with_explicit_zero_count() {
        // Pure deletion inside a modified file
        assert_eq!(ChangedRange::parse_header("@@ -15,2 +14,0 @@"), range(14, 0));
    }

    #[test]
    fn header_with_function_context() {
        assert_eq!(
            ChangedRange::parse_header("@@ -40,0 +41,6 @@ func (s *Server) Close() error {"),
            range(41, 6)
        );
    }

    #[test]
    fn old_side_is_ignored() {
        assert_eq!(
            ChangedRange::parse_header("@@ -1,100 +7,1 @@"),
            ChangedRange::parse_header("@@ -999 +7,1 @@")
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in [
            "@@",
            "@@ -1 @@",
            "@@ +1,2 @@",
            "@@ -1,2 +x,2 @@",
            "@@ -1,2 +3,2",
            "@@@ -1,2 -1,2 +1,3 @@@",
            " @@ -1 +1 @@",
            "@@ -1 +99999999999 @@",
        ] {
            assert_eq!(ChangedRange::parse_header(header), None, "{header}");
        }
    }

    #[test]
    fn far_end_and_last_line() {
        let counted = ChangedRange {
            start: 12,
            length: 3,
        };
        assert_eq!(counted.far_end(), 15);
        assert_eq!(counted.last_line(), 14);

        let single = ChangedRange {
            start: 137,
            length: 0,
        };
        assert_eq!(single.far_end(), 137);
        assert_eq!(single.last_line(), 137);
    }

    #[test]
    fn far_end_does_not_overflow() {
        let huge = ChangedRange {
            start: u32::MAX,
            length: u32::MAX,
        };
        assert_eq!(huge.far_end(), 2 * u64::from(u32::MAX));
    }
}

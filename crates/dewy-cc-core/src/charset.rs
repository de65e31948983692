//! The charset engine (spec.md §4.3): a reduced, sorted sequence of
//! half-open... no, inclusive `[lo, hi]` codepoint ranges, with the usual
//! set algebra. Every mutating operation leaves its result reduced.

use serde::{Deserialize, Serialize};

/// Reserved sentinel for the end-of-input terminal `$`.
pub const END_OF_INPUT: u32 = 0x200000;
/// `0` denotes epsilon when used as a character literal; also a valid NUL codepoint.
pub const EPSILON_CHAR: u32 = 0;
/// Highest valid Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// An inclusive codepoint range `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CpRange {
    pub lo: u32,
    pub hi: u32,
}

impl CpRange {
    pub fn new(lo: u32, hi: u32) -> Self {
        debug_assert!(lo <= hi, "range lo must not exceed hi");
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, cp: u32) -> bool {
        self.lo <= cp && cp <= self.hi
    }
}

/// A reduced, sorted, non-overlapping, non-adjacent sequence of ranges.
///
/// Invariant (checked in debug builds by [`Charset::check_invariants`]):
/// ranges are sorted ascending by `lo`, and for consecutive ranges
/// `r[i].hi + 1 < r[i+1].lo` (a strict gap of at least one codepoint).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Charset {
    ranges: Vec<CpRange>,
}

impl Charset {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn single(cp: u32) -> Self {
        Self { ranges: vec![CpRange::new(cp, cp)] }
    }

    pub fn range(lo: u32, hi: u32) -> Self {
        Self { ranges: vec![CpRange::new(lo, hi)] }
    }

    /// The full alphabet: `[0, MAX_CODEPOINT]` plus the end-of-input sentinel.
    pub fn anyset() -> Self {
        Self::empty().complement()
    }

    pub fn endmarker() -> Self {
        Self::single(END_OF_INPUT)
    }

    /// Build from arbitrary (possibly unsorted, overlapping) ranges, reducing.
    pub fn from_ranges(mut ranges: Vec<CpRange>) -> Self {
        reduce(&mut ranges);
        let charset = Self { ranges };
        charset.check_invariants();
        charset
    }

    pub fn ranges(&self) -> &[CpRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, cp: u32) -> bool {
        // Ranges are sorted and gapped, so binary search on `lo` works.
        match self.ranges.binary_search_by(|r| r.lo.cmp(&cp)) {
            Ok(_) => true,
            Err(insert_at) => insert_at
                .checked_sub(1)
                .map(|i| self.ranges[i].contains(cp))
                .unwrap_or(false),
        }
    }

    pub fn union(&self, other: &Charset) -> Charset {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        reduce(&mut ranges);
        let charset = Charset { ranges };
        charset.check_invariants();
        charset
    }

    /// Complement is taken within `[0, MAX_CODEPOINT]`, not over the
    /// sentinel `END_OF_INPUT` as well — the endmarker is not a codepoint,
    /// so "everything else" never includes it (spec.md §4.3).
    pub fn complement(&self) -> Charset {
        let top = MAX_CODEPOINT;
        let mut out = Vec::new();
        let mut cursor: u32 = 0;
        for r in &self.ranges {
            if cursor > top {
                break;
            }
            if r.lo > cursor {
                out.push(CpRange::new(cursor, (r.lo - 1).min(top)));
            }
            cursor = r.hi.saturating_add(1);
        }
        if cursor <= top {
            out.push(CpRange::new(cursor, top));
        }
        let charset = Charset { ranges: out };
        charset.check_invariants();
        charset
    }

    /// `a ∩ b = ¬(¬a ∪ ¬b)`.
    pub fn intersection(&self, other: &Charset) -> Charset {
        self.complement().union(&other.complement()).complement()
    }

    /// `a − b = a ∩ ¬b`.
    pub fn difference(&self, other: &Charset) -> Charset {
        self.intersection(&other.complement())
    }

    /// Zero-cost in release builds: the body is entirely `debug_assert!`.
    pub fn check_invariants(&self) {
        for w in self.ranges.windows(2) {
            debug_assert!(w[0].lo <= w[1].lo, "ranges must be sorted ascending by lo");
            debug_assert!(
                w[0].hi + 1 < w[1].lo,
                "consecutive ranges must have a strict gap: {:?}, {:?}",
                w[0],
                w[1]
            );
        }
        for r in &self.ranges {
            debug_assert!(r.lo <= r.hi);
        }
    }
}

/// Sort by `lo`, then sweep merging `[a,b]` with `[c,d]` whenever `c <= b+1`.
fn reduce(ranges: &mut Vec<CpRange>) {
    if ranges.is_empty() {
        return;
    }
    ranges.sort_by_key(|r| r.lo);
    let mut merged: Vec<CpRange> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if r.lo <= last.hi + 1 => {
                if r.hi > last.hi {
                    last.hi = r.hi;
                }
            }
            _ => merged.push(r),
        }
    }
    *ranges = merged;
}

#[cfg(test)]
mod charset_tests {
    use super::*;

    #[test]
    fn reduce_merges_adjacent_and_overlapping() {
        let c = Charset::from_ranges(vec![
            CpRange::new(5, 10),
            CpRange::new(11, 12),
            CpRange::new(0, 2),
            CpRange::new(20, 25),
        ]);
        assert_eq!(
            c.ranges(),
            &[CpRange::new(0, 2), CpRange::new(5, 12), CpRange::new(20, 25)]
        );
    }

    #[test]
    fn reduce_is_idempotent() {
        let c = Charset::from_ranges(vec![CpRange::new(0, 5), CpRange::new(3, 9)]);
        let c2 = Charset::from_ranges(c.ranges().to_vec());
        assert_eq!(c, c2);
    }

    #[test]
    fn round_trips_through_json() {
        let c = Charset::from_ranges(vec![CpRange::new(0x61, 0x7a), CpRange::new(0x30, 0x39)]);
        let json = serde_json::to_string(&c).expect("serializes");
        let back: Charset = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(c, back);
    }

    #[test]
    fn complement_is_involutive() {
        let c = Charset::from_ranges(vec![CpRange::new(10, 20), CpRange::new(100, 200)]);
        assert_eq!(c.complement().complement(), c);
    }

    #[test]
    fn anyset_is_complement_of_empty() {
        assert_eq!(Charset::anyset(), Charset::empty().complement());
        assert!(Charset::anyset().contains(0));
        assert!(Charset::anyset().contains(MAX_CODEPOINT));
        assert!(!Charset::anyset().contains(END_OF_INPUT));
    }

    #[test]
    fn membership() {
        let c = Charset::from_ranges(vec![CpRange::new(b'a' as u32, b'z' as u32)]);
        assert!(c.contains(b'm' as u32));
        assert!(!c.contains(b'A' as u32));
    }

    #[test]
    fn intersection_and_difference() {
        let lower = Charset::range(b'a' as u32, b'z' as u32);
        let vowels = Charset::from_ranges(
            "aeiou".bytes().map(|b| CpRange::new(b as u32, b as u32)).collect(),
        );
        let consonants = lower.difference(&vowels);
        assert!(consonants.contains(b'b' as u32));
        assert!(!consonants.contains(b'a' as u32));
        assert_eq!(lower.intersection(&vowels), vowels);
    }
}

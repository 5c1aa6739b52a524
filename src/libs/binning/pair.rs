use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Relative tolerance for two coverage values to count as agreeing
pub const COVG_TOLERANCE: f64 = 0.2;

/// Anything that can be compared as a (virtual) contig: a single contig or a bin.
pub trait Profile {
    fn coverage(&self) -> &[f64];
    fn tetra(&self) -> &[f64];
    fn ref_genomes(&self) -> &BTreeSet<String>;
    fn uni_roles(&self) -> &BTreeMap<String, u32>;
}

/// How the reference-genome sets of a pair relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefCategory {
    /// Both nonempty and identical
    Same,
    /// Both empty
    None,
    /// Exactly one empty
    One,
    /// Both nonempty and different
    Diff,
}

impl RefCategory {
    pub fn of(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Self {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => RefCategory::None,
            (true, false) | (false, true) => RefCategory::One,
            (false, false) if a == b => RefCategory::Same,
            _ => RefCategory::Diff,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            RefCategory::Same => 1.0,
            RefCategory::None => 0.6,
            RefCategory::One => 0.5,
            RefCategory::Diff => 0.0,
        }
    }
}

impl fmt::Display for RefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefCategory::Same => "same",
            RefCategory::None => "none",
            RefCategory::One => "one",
            RefCategory::Diff => "diff",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RefCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same" => Ok(RefCategory::Same),
            "none" => Ok(RefCategory::None),
            "one" => Ok(RefCategory::One),
            "diff" => Ok(RefCategory::Diff),
            _ => Err(format!("unknown reference category '{}'", s)),
        }
    }
}

/// Weight-independent comparison features of two contigs (or bins).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRecord {
    pub covg_frac: f64,
    pub tetra_dot: f64,
    pub ref_category: RefCategory,
    /// Roles present in exactly one side
    pub uni_only_one: u32,
    /// Roles present in both sides
    pub uni_both: u32,
}

impl PairRecord {
    pub fn compare<A: Profile + ?Sized, B: Profile + ?Sized>(a: &A, b: &B) -> Self {
        let (uni_only_one, uni_both) = role_overlap(a.uni_roles(), b.uni_roles());
        Self {
            covg_frac: covg_frac(a.coverage(), b.coverage()),
            tetra_dot: dot(a.tetra(), b.tetra()),
            ref_category: RefCategory::of(a.ref_genomes(), b.ref_genomes()),
            uni_only_one,
            uni_both,
        }
    }
}

/// Fraction of coverage coordinates agreeing within [`COVG_TOLERANCE`].
///
/// Two values agree when `|a - b| <= 0.2 * max(a, b)`. Empty vectors give 0.
///
/// ```
/// use mgbin::libs::binning::pair::covg_frac;
/// assert_eq!(covg_frac(&[20.0, 10.0], &[22.0, 5.0]), 0.5);
/// assert_eq!(covg_frac(&[], &[]), 0.0);
/// ```
pub fn covg_frac(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let agree = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| (*x - *y).abs() <= COVG_TOLERANCE * x.abs().max(y.abs()))
        .count();
    agree as f64 / n as f64
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Returns `(present in exactly one, present in both)`, counting roles with count >= 1.
pub fn role_overlap(a: &BTreeMap<String, u32>, b: &BTreeMap<String, u32>) -> (u32, u32) {
    let mut only_one = 0;
    let mut both = 0;
    for (role, &count) in a {
        if count == 0 {
            continue;
        }
        match b.get(role) {
            Some(&c) if c > 0 => both += 1,
            _ => only_one += 1,
        }
    }
    for (role, &count) in b {
        if count > 0 && a.get(role).map_or(true, |&c| c == 0) {
            only_one += 1;
        }
    }
    (only_one, both)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::binning::Contig;
    use approx::assert_relative_eq;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ref_category() {
        assert_eq!(RefCategory::of(&set(&["g1"]), &set(&["g1"])), RefCategory::Same);
        assert_eq!(RefCategory::of(&set(&[]), &set(&[])), RefCategory::None);
        assert_eq!(RefCategory::of(&set(&["g1"]), &set(&[])), RefCategory::One);
        assert_eq!(RefCategory::of(&set(&[]), &set(&["g1"])), RefCategory::One);
        assert_eq!(RefCategory::of(&set(&["g1"]), &set(&["g1", "g2"])), RefCategory::Diff);

        for cat in [RefCategory::Same, RefCategory::None, RefCategory::One, RefCategory::Diff] {
            assert_eq!(cat.to_string().parse::<RefCategory>().unwrap(), cat);
        }
        assert!("other".parse::<RefCategory>().is_err());
    }

    #[test]
    fn test_covg_frac_tolerance() {
        // 24 vs 20: diff 4 <= 0.2 * 24
        assert_relative_eq!(covg_frac(&[20.0], &[24.0]), 1.0);
        // 26 vs 20: diff 6 > 5.2
        assert_relative_eq!(covg_frac(&[20.0], &[26.0]), 0.0);
        assert_relative_eq!(covg_frac(&[0.0, 3.0], &[0.0, 30.0]), 0.5);
    }

    #[test]
    fn test_role_overlap() {
        let a: BTreeMap<String, u32> = [("R1", 1), ("R2", 2), ("R3", 0)]
            .iter()
            .map(|(r, c)| (r.to_string(), *c))
            .collect();
        let b: BTreeMap<String, u32> = [("R2", 1), ("R3", 1), ("R4", 1)]
            .iter()
            .map(|(r, c)| (r.to_string(), *c))
            .collect();
        // only one: R1, R3, R4; both: R2
        assert_eq!(role_overlap(&a, &b), (3, 1));
        assert_eq!(role_overlap(&b, &a), (3, 1));
    }

    #[test]
    fn test_compare_contigs() {
        let a = Contig::new("a", 10, vec![20.0, 20.0], vec![1.0, 1.0], vec![], vec![]).unwrap();
        let b = Contig::new("b", 10, vec![20.0, 20.0], vec![1.0, 1.0], vec![], vec![]).unwrap();
        let rec = PairRecord::compare(&a, &b);
        assert_relative_eq!(rec.covg_frac, 1.0);
        assert_relative_eq!(rec.tetra_dot, 1.0, epsilon = 1e-12);
        assert_eq!(rec.ref_category, RefCategory::None);
        assert_eq!((rec.uni_only_one, rec.uni_both), (0, 0));
    }
}

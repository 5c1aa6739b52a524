use crate::libs::binning::error::BinError;
use crate::libs::binning::pair::PairRecord;
use std::fmt;
use std::io::BufRead;

/// Parameter names, in the positional order used on the command line
pub const WEIGHT_NAMES: [&str; 6] = ["covg", "tetra", "ref", "uni_penalty", "uni", "min_score"];

/// Weights of the pairwise score.
///
/// `min_score` is compared against the unscaled weighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub covg: f64,
    pub tetra: f64,
    pub reference: f64,
    pub uni_penalty: f64,
    pub uni: f64,
    pub min_score: f64,
}

impl ScoreWeights {
    pub fn new(
        covg: f64,
        tetra: f64,
        reference: f64,
        uni_penalty: f64,
        uni: f64,
        min_score: f64,
    ) -> Result<Self, BinError> {
        Self::from_array([covg, tetra, reference, uni_penalty, uni, min_score])
    }

    pub fn from_array(values: [f64; 6]) -> Result<Self, BinError> {
        for (name, v) in WEIGHT_NAMES.iter().zip(values.iter()) {
            if !v.is_finite() || *v < 0.0 {
                return Err(BinError::InvalidWeights(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }
        Ok(Self {
            covg: values[0],
            tetra: values[1],
            reference: values[2],
            uni_penalty: values[3],
            uni: values[4],
            min_score: values[5],
        })
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.covg,
            self.tetra,
            self.reference,
            self.uni_penalty,
            self.uni,
            self.min_score,
        ]
    }
}

impl fmt::Display for ScoreWeights {
    /// Tab separated, in command-line order
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.to_array().iter().map(|v| format!("{:.4}", v)).collect();
        write!(f, "{}", parts.join("\t"))
    }
}

/// Weights plus the size of the universal-role universe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    pub weights: ScoreWeights,
    pub total_roles: usize,
}

impl Scorer {
    pub fn new(weights: ScoreWeights, total_roles: usize) -> Result<Self, BinError> {
        if total_roles == 0 {
            return Err(BinError::InvalidConfig(
                "total number of universal roles must be positive".to_string(),
            ));
        }
        Ok(Self {
            weights,
            total_roles,
        })
    }

    /// Weighted similarity of a pair; exactly 0 when below `min_score`.
    ///
    /// ```
    /// use mgbin::libs::binning::{PairRecord, RefCategory, ScoreWeights, Scorer};
    /// let w = ScoreWeights::new(5.0, 3.0, 0.0, 1.0, 2.0, 2.0).unwrap();
    /// let scorer = Scorer::new(w, 57).unwrap();
    /// let rec = PairRecord {
    ///     covg_frac: 1.0,
    ///     tetra_dot: 1.0,
    ///     ref_category: RefCategory::None,
    ///     uni_only_one: 0,
    ///     uni_both: 0,
    /// };
    /// assert_eq!(scorer.score(&rec), 8.0);
    /// ```
    pub fn score(&self, rec: &PairRecord) -> f64 {
        let w = &self.weights;

        let covg_score = rec.covg_frac;
        let tetra_score = rec.tetra_dot;
        let ref_score = rec.ref_category.score();
        let uni_raw = (rec.uni_only_one as f64 - w.uni_penalty * rec.uni_both as f64)
            / self.total_roles as f64;
        // shared markers are evidence against merging, never for it
        let uni_score = uni_raw.max(0.0);

        let total = w.covg * covg_score
            + w.tetra * tetra_score
            + w.reference * ref_score
            + w.uni * uni_score;

        if !total.is_finite() || total < w.min_score || total <= 0.0 {
            0.0
        } else {
            total
        }
    }
}

/// Per-parameter search range, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBounds {
    pub lo: [f64; 6],
    pub hi: [f64; 6],
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            lo: [0.0; 6],
            hi: [10.0, 10.0, 10.0, 5.0, 20.0, 10.0],
        }
    }
}

impl WeightBounds {
    pub fn new(lo: [f64; 6], hi: [f64; 6]) -> Result<Self, BinError> {
        for i in 0..6 {
            if !lo[i].is_finite() || !hi[i].is_finite() || lo[i] < 0.0 || lo[i] > hi[i] {
                return Err(BinError::InvalidConfig(format!(
                    "bad bounds for {}: [{}, {}]",
                    WEIGHT_NAMES[i], lo[i], hi[i]
                )));
            }
        }
        Ok(Self { lo, hi })
    }

    /// Read `name lo hi` lines; parameters not listed keep their defaults.
    pub fn from_file(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile)?;
        let defaults = Self::default();
        let mut lo = defaults.lo;
        let mut hi = defaults.hi;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(BinError::parse(infile, idx + 1, "expected: name lo hi").into());
            }
            let i = WEIGHT_NAMES
                .iter()
                .position(|n| *n == parts[0])
                .ok_or_else(|| {
                    BinError::parse(infile, idx + 1, format!("unknown parameter {}", parts[0]))
                })?;
            lo[i] = parts[1]
                .parse()
                .map_err(|_| BinError::parse(infile, idx + 1, "invalid lower bound"))?;
            hi[i] = parts[2]
                .parse()
                .map_err(|_| BinError::parse(infile, idx + 1, "invalid upper bound"))?;
        }

        Ok(Self::new(lo, hi)?)
    }

    pub fn clamp(&self, values: [f64; 6]) -> [f64; 6] {
        let mut out = values;
        for i in 0..6 {
            out[i] = values[i].clamp(self.lo[i], self.hi[i]);
        }
        out
    }
}

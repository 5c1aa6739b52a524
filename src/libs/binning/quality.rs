use crate::libs::binning::bin::Bin;
use crate::libs::binning::error::BinError;
use std::fmt;

/// Marker-role summary of one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinReport {
    pub seed_id: String,
    pub contigs: usize,
    pub length: usize,
    /// Universal roles seen at least once
    pub found: Vec<String>,
    /// Universal roles never seen
    pub missing: Vec<String>,
    /// Universal roles seen more than once, with their counts
    pub duplicated: Vec<(String, u32)>,
    pub good: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub total_roles: usize,
    pub min_unis: usize,
    pub max_dups: usize,
    pub bins: Vec<BinReport>,
}

impl QualityReport {
    pub fn good_bins(&self) -> usize {
        self.bins.iter().filter(|b| b.good).count()
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multi = self.bins.iter().filter(|b| b.contigs > 1).count();
        writeln!(f, "Bins:\t{}", self.bins.len())?;
        writeln!(f, "Multi-contig bins:\t{}", multi)?;
        writeln!(
            f,
            "Good bins:\t{} (>= {} of {} universal roles, <= {} duplicated)",
            self.good_bins(),
            self.min_unis,
            self.total_roles,
            self.max_dups
        )?;
        for b in self.bins.iter().filter(|b| b.contigs > 1 || !b.found.is_empty()) {
            writeln!(
                f,
                "\n{}\t{}\tcontigs={}\tlength={}\tfound={}\tmissing={}\tduplicated={}",
                b.seed_id,
                if b.good { "GOOD" } else { "bad" },
                b.contigs,
                b.length,
                b.found.len(),
                b.missing.len(),
                b.duplicated.len()
            )?;
            if !b.missing.is_empty() {
                writeln!(f, "  missing:\t{}", b.missing.join(","))?;
            }
            if !b.duplicated.is_empty() {
                let dups: Vec<String> = b
                    .duplicated
                    .iter()
                    .map(|(r, n)| format!("{}:{}", r, n))
                    .collect();
                writeln!(f, "  duplicated:\t{}", dups.join(","))?;
            }
        }
        Ok(())
    }
}

/// Turns a report into the scalar fitness maximized by the weight search.
pub trait QualityPolicy: Send + Sync {
    fn quality(&self, report: &QualityReport) -> f64;
}

impl<F> QualityPolicy for F
where
    F: Fn(&QualityReport) -> f64 + Send + Sync,
{
    fn quality(&self, report: &QualityReport) -> f64 {
        self(report)
    }
}

/// Each good bin earns `1 + completeness`. A bad bin loses
/// `dup_penalty / total_roles` per duplicated role beyond `max_dups`, and
/// `fragment_penalty / total_roles` per role it lacks to reach `min_unis`.
/// Bins without any universal role cost nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoodBinPolicy {
    pub dup_penalty: f64,
    pub fragment_penalty: f64,
}

impl Default for GoodBinPolicy {
    fn default() -> Self {
        Self {
            dup_penalty: 1.0,
            fragment_penalty: 1.0,
        }
    }
}

impl QualityPolicy for GoodBinPolicy {
    fn quality(&self, report: &QualityReport) -> f64 {
        let total = report.total_roles.max(1) as f64;
        let mut score = 0.0;
        for b in &report.bins {
            if b.good {
                score += 1.0 + b.found.len() as f64 / total;
                continue;
            }
            if b.duplicated.len() > report.max_dups {
                score -= self.dup_penalty * (b.duplicated.len() - report.max_dups) as f64 / total;
            }
            if !b.found.is_empty() && b.found.len() < report.min_unis {
                score -= self.fragment_penalty * (report.min_unis - b.found.len()) as f64 / total;
            }
        }
        score
    }
}

/// Classifies bins against the universal-role universe.
pub struct Evaluator {
    universe: Vec<String>,
    pub min_unis: usize,
    pub max_dups: usize,
    policy: Box<dyn QualityPolicy>,
}

impl Evaluator {
    pub fn new(universe: Vec<String>, min_unis: usize, max_dups: usize) -> Result<Self, BinError> {
        let mut universe = universe;
        universe.sort();
        universe.dedup();
        if universe.is_empty() {
            return Err(BinError::InvalidConfig(
                "the universal role set is empty".to_string(),
            ));
        }
        Ok(Self {
            universe,
            min_unis,
            max_dups,
            policy: Box::new(GoodBinPolicy::default()),
        })
    }

    pub fn with_policy<P: QualityPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn total_roles(&self) -> usize {
        self.universe.len()
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn classify(&self, bin: &Bin) -> BinReport {
        let mut found = vec![];
        let mut missing = vec![];
        let mut duplicated = vec![];
        for role in &self.universe {
            match bin.uni_roles.get(role).copied().unwrap_or(0) {
                0 => missing.push(role.clone()),
                1 => found.push(role.clone()),
                n => {
                    found.push(role.clone());
                    duplicated.push((role.clone(), n));
                }
            }
        }
        let good = found.len() >= self.min_unis && duplicated.len() <= self.max_dups;

        BinReport {
            seed_id: bin.seed_id.clone(),
            contigs: bin.len(),
            length: bin.length,
            found,
            missing,
            duplicated,
            good,
        }
    }

    pub fn analyze(&self, bins: &[Bin]) -> QualityReport {
        QualityReport {
            total_roles: self.universe.len(),
            min_unis: self.min_unis,
            max_dups: self.max_dups,
            bins: bins.iter().map(|b| self.classify(b)).collect(),
        }
    }

    pub fn quality(&self, bins: &[Bin]) -> f64 {
        self.policy.quality(&self.analyze(bins))
    }
}

use crate::libs::binning::bin::{sort_bins, Bin, RepresentativePolicy};
use crate::libs::binning::contig::Contig;
use crate::libs::binning::error::BinError;
use crate::libs::binning::pair::PairRecord;
use crate::libs::binning::store::PairStore;
use crate::libs::binning::weights::Scorer;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

/// Counters collected during one clustering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub contigs: usize,
    /// Contig pairs with a positive initial score
    pub linked_pairs: usize,
    /// Contig pairs absent from the store, scored as 0
    pub missing_pairs: usize,
    pub merges: usize,
    pub bins: usize,
    pub singletons: usize,
    /// Malformed lines skipped while loading the store
    pub skipped_lines: usize,
}

impl fmt::Display for ClusterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contigs:\t{}", self.contigs)?;
        writeln!(f, "Linked pairs:\t{}", self.linked_pairs)?;
        writeln!(f, "Missing pairs:\t{}", self.missing_pairs)?;
        writeln!(f, "Skipped lines:\t{}", self.skipped_lines)?;
        writeln!(f, "Merges:\t{}", self.merges)?;
        writeln!(f, "Bins:\t{}", self.bins)?;
        write!(f, "Singletons:\t{}", self.singletons)
    }
}

#[derive(Debug, Clone)]
pub struct Clustering {
    /// Final bins, largest first
    pub bins: Vec<Bin>,
    pub stats: ClusterStats,
}

/// Best-first agglomerative merging under a score floor.
///
/// Bins live in an arena addressed by index. A merge retires two slots
/// and appends a new one, so indices of surviving bins never change.
/// Candidate pairs sit in a max-heap; stale entries are skipped lazily.
#[derive(Debug, Clone, Copy)]
pub struct Clusterer {
    pub scorer: Scorer,
    pub policy: RepresentativePolicy,
}

impl Clusterer {
    pub fn new(scorer: Scorer) -> Self {
        Self {
            scorer,
            policy: RepresentativePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RepresentativePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cluster(&self, contigs: &[Contig], store: &PairStore) -> Result<Clustering, BinError> {
        let mut seen = HashSet::new();
        for c in contigs {
            if !seen.insert(c.id.as_str()) {
                return Err(BinError::InvalidConfig(format!("duplicate contig {}", c.id)));
            }
        }

        let mut stats = ClusterStats {
            contigs: contigs.len(),
            skipped_lines: store.skipped(),
            ..Default::default()
        };

        // Lexicographic rank of each slot's seed id, for tie-breaking
        let mut order: Vec<usize> = (0..contigs.len()).collect();
        order.sort_by(|&a, &b| contigs[a].id.cmp(&contigs[b].id));
        let mut seed_rank = vec![0; contigs.len()];
        for (rank, &i) in order.iter().enumerate() {
            seed_rank[i] = rank;
        }

        let mut arena: Vec<Option<Bin>> =
            contigs.iter().map(|c| Some(Bin::from_contig(c))).collect();

        // Only positive scores are queued. Entries touching a retired slot
        // are dropped when popped; scores of surviving pairs never change.
        let mut queue: BinaryHeap<Candidate> = BinaryHeap::new();
        for i in 0..contigs.len() {
            for j in (i + 1)..contigs.len() {
                match store.get(&contigs[i].id, &contigs[j].id) {
                    Some(rec) => {
                        let s = self.scorer.score(rec);
                        if s > 0.0 {
                            queue.push(Candidate::new(s, i, j, &seed_rank));
                        }
                    }
                    None => stats.missing_pairs += 1,
                }
            }
        }
        stats.linked_pairs = queue.len();

        while let Some(Candidate { score, i, j, .. }) = queue.pop() {
            if arena[i].is_none() || arena[j].is_none() {
                continue;
            }
            let a = arena[i]
                .take()
                .ok_or_else(|| BinError::Evaluation(format!("bin slot {} is not active", i)))?;
            let b = arena[j]
                .take()
                .ok_or_else(|| BinError::Evaluation(format!("bin slot {} is not active", j)))?;
            tracing::debug!(
                "Merging {} ({} contigs) and {} ({} contigs), score {:.4}",
                a.seed_id,
                a.len(),
                b.seed_id,
                b.len(),
                score
            );

            let merged = Bin::merge(a, b, self.policy);
            let k = arena.len();
            seed_rank.push(seed_rank[i].min(seed_rank[j]));

            for (l, other) in arena.iter().enumerate() {
                if let Some(other) = other {
                    let s = self.scorer.score(&PairRecord::compare(&merged, other));
                    if s > 0.0 {
                        queue.push(Candidate::new(s, l, k, &seed_rank));
                    }
                }
            }
            arena.push(Some(merged));
            stats.merges += 1;
        }

        let mut bins: Vec<Bin> = arena.into_iter().flatten().collect();
        sort_bins(&mut bins);
        stats.bins = bins.len();
        stats.singletons = bins.iter().filter(|b| b.len() == 1).count();

        Ok(Clustering { bins, stats })
    }
}

/// A scored pair of arena slots.
///
/// Orders by score, then prefers the pair whose (smaller, larger) seed ranks sort first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    seeds: (usize, usize),
    i: usize,
    j: usize,
}

impl Candidate {
    fn new(score: f64, i: usize, j: usize, seed_rank: &[usize]) -> Self {
        let (a, b) = (seed_rank[i], seed_rank[j]);
        Self {
            score,
            seeds: (a.min(b), a.max(b)),
            i,
            j,
        }
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seeds.cmp(&self.seeds))
            .then_with(|| (other.i, other.j).cmp(&(self.i, self.j)))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

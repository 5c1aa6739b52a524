use crate::libs::binning::bin::RepresentativePolicy;
use crate::libs::binning::cluster::Clusterer;
use crate::libs::binning::contig::Contig;
use crate::libs::binning::error::BinError;
use crate::libs::binning::quality::Evaluator;
use crate::libs::binning::store::PairStore;
use crate::libs::binning::weights::{ScoreWeights, Scorer, WeightBounds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Knobs of the genetic search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub population: usize,
    pub generations: usize,
    pub seed: u64,
    /// Individuals drawn per tournament
    pub tournament: usize,
    /// Best individuals copied unchanged into the next generation
    pub elite: usize,
    pub crossover_rate: f64,
    /// Per-parameter mutation probability
    pub mutation_rate: f64,
    /// Mutation step as a fraction of the parameter's range
    pub mutation_scale: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population: 20,
            generations: 10,
            seed: 42,
            tournament: 3,
            elite: 1,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
            mutation_scale: 0.1,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), BinError> {
        if self.population < 2 {
            return Err(BinError::InvalidConfig("population must be at least 2".to_string()));
        }
        if self.generations == 0 {
            return Err(BinError::InvalidConfig("generations must be positive".to_string()));
        }
        if self.tournament == 0 || self.elite >= self.population {
            return Err(BinError::InvalidConfig(
                "tournament must be positive and elite smaller than the population".to_string(),
            ));
        }
        for (name, p) in [
            ("crossover rate", self.crossover_rate),
            ("mutation rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(BinError::InvalidConfig(format!("{} must be in [0, 1]", name)));
            }
        }
        Ok(())
    }
}

/// Progress record of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub index: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_weights: ScoreWeights,
    /// Individuals whose evaluation failed and got the worst fitness
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best: ScoreWeights,
    pub fitness: f64,
    pub history: Vec<Generation>,
}

/// Evolves score weights, using clustering quality as fitness.
///
/// The store is shared read-only; each evaluation builds its own bins.
pub struct WeightSearch<'a> {
    contigs: &'a [Contig],
    store: &'a PairStore,
    evaluator: &'a Evaluator,
    /// Role count used by the score; defaults to the evaluator's universe size
    pub total_roles: usize,
    pub bounds: WeightBounds,
    pub config: SearchConfig,
    pub policy: RepresentativePolicy,
}

impl<'a> WeightSearch<'a> {
    pub fn new(contigs: &'a [Contig], store: &'a PairStore, evaluator: &'a Evaluator) -> Self {
        Self {
            contigs,
            store,
            evaluator,
            total_roles: evaluator.total_roles(),
            bounds: WeightBounds::default(),
            config: SearchConfig::default(),
            policy: RepresentativePolicy::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: WeightBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_total_roles(mut self, total_roles: usize) -> Self {
        self.total_roles = total_roles;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: RepresentativePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cluster with one weight vector and score the bins.
    pub fn fitness(&self, values: [f64; 6]) -> Result<f64, BinError> {
        let weights = ScoreWeights::from_array(values)?;
        let scorer = Scorer::new(weights, self.total_roles)?;
        let clustering = Clusterer::new(scorer)
            .with_policy(self.policy)
            .cluster(self.contigs, self.store)?;
        Ok(self.evaluator.quality(&clustering.bins))
    }

    /// Failed or panicking evaluations score `f64::NEG_INFINITY`.
    fn guarded_fitness(&self, values: [f64; 6]) -> Option<f64> {
        match catch_unwind(AssertUnwindSafe(|| self.fitness(values))) {
            Ok(Ok(f)) if !f.is_nan() => Some(f),
            Ok(Ok(_)) => {
                tracing::warn!("Fitness is NaN for {:?}", values);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Evaluation failed for {:?}: {}", values, e);
                None
            }
            Err(_) => {
                tracing::warn!("Evaluation panicked for {:?}", values);
                None
            }
        }
    }

    pub fn run(&self) -> Result<SearchResult, BinError> {
        self.config.validate()?;
        WeightBounds::new(self.bounds.lo, self.bounds.hi)?;
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let mut population: Vec<[f64; 6]> = (0..cfg.population)
            .map(|_| self.random_individual(&mut rng))
            .collect();

        let mut history = vec![];
        let mut best: Option<([f64; 6], f64)> = None;

        for round in 0..cfg.generations {
            let results: Vec<Option<f64>> = population
                .par_iter()
                .map(|v| self.guarded_fitness(*v))
                .collect();
            let failures = results.iter().filter(|r| r.is_none()).count();
            let fitness: Vec<f64> = results
                .into_iter()
                .map(|r| r.unwrap_or(f64::NEG_INFINITY))
                .collect();

            let ranked = rank(&fitness);
            let top = ranked[0];
            if best.map_or(true, |(_, f)| fitness[top] > f) {
                best = Some((population[top], fitness[top]));
            }

            let finite: Vec<f64> = fitness.iter().copied().filter(|f| f.is_finite()).collect();
            let mean_fitness = if finite.is_empty() {
                f64::NEG_INFINITY
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            };
            let record = Generation {
                index: round + 1,
                best_fitness: fitness[top],
                mean_fitness,
                best_weights: ScoreWeights::from_array(population[top])?,
                failures,
            };
            tracing::info!(
                "Generation {}: best {:.4}, mean {:.4}, failures {}, weights [{}]",
                record.index,
                record.best_fitness,
                record.mean_fitness,
                record.failures,
                record.best_weights
            );
            history.push(record);

            if round + 1 < cfg.generations {
                population = self.breed(&population, &fitness, &ranked, &mut rng);
            }
        }

        let (values, fitness) =
            best.ok_or_else(|| BinError::Evaluation("no generation was evaluated".to_string()))?;
        Ok(SearchResult {
            best: ScoreWeights::from_array(values)?,
            fitness,
            history,
        })
    }

    fn random_individual(&self, rng: &mut StdRng) -> [f64; 6] {
        let mut v = [0.0; 6];
        for (i, x) in v.iter_mut().enumerate() {
            *x = rng.gen_range(self.bounds.lo[i]..=self.bounds.hi[i]);
        }
        v
    }

    fn breed(
        &self,
        population: &[[f64; 6]],
        fitness: &[f64],
        ranked: &[usize],
        rng: &mut StdRng,
    ) -> Vec<[f64; 6]> {
        let cfg = &self.config;
        let mut next: Vec<[f64; 6]> = ranked.iter().take(cfg.elite).map(|&i| population[i]).collect();

        while next.len() < cfg.population {
            let a = population[tournament(fitness, cfg.tournament, rng)];
            let b = population[tournament(fitness, cfg.tournament, rng)];

            let mut child = a;
            if rng.gen_bool(cfg.crossover_rate) {
                for i in 0..6 {
                    let t: f64 = rng.gen();
                    child[i] = t * a[i] + (1.0 - t) * b[i];
                }
            }
            for i in 0..6 {
                if rng.gen_bool(cfg.mutation_rate) {
                    let span = self.bounds.hi[i] - self.bounds.lo[i];
                    child[i] += rng.gen_range(-1.0..=1.0) * cfg.mutation_scale * span;
                }
            }
            next.push(self.bounds.clamp(child));
        }
        next
    }
}

/// Indices sorted by descending fitness, ties by index.
fn rank(fitness: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..fitness.len()).collect();
    idx.sort_by(|&a, &b| {
        fitness[b]
            .partial_cmp(&fitness[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    idx
}

fn tournament(fitness: &[f64], size: usize, rng: &mut StdRng) -> usize {
    let mut winner = rng.gen_range(0..fitness.len());
    for _ in 1..size {
        let challenger = rng.gen_range(0..fitness.len());
        if fitness[challenger] > fitness[winner] {
            winner = challenger;
        }
    }
    winner
}

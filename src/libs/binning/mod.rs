//! Contig binning: pairwise features, scoring, greedy clustering,
//! bin quality and weight search.

pub mod bin;
pub mod cluster;
pub mod contig;
pub mod error;
pub mod pair;
pub mod quality;
pub mod search;
pub mod store;
pub mod weights;

pub use bin::{Bin, RepresentativePolicy};
pub use cluster::{ClusterStats, Clusterer, Clustering};
pub use contig::Contig;
pub use error::BinError;
pub use pair::{PairRecord, Profile, RefCategory};
pub use quality::{BinReport, Evaluator, GoodBinPolicy, QualityPolicy, QualityReport};
pub use search::{SearchConfig, SearchResult, WeightSearch};
pub use store::PairStore;
pub use weights::{ScoreWeights, Scorer, WeightBounds};

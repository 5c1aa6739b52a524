use crate::libs::binning::contig::{
    format_floats, format_roles, parse_floats, parse_list, parse_roles, unit_scale, Contig,
};
use crate::libs::binning::error::BinError;
use crate::libs::binning::pair::Profile;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};
use std::str::FromStr;

/// How a merged bin's coverage and tetra vectors are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepresentativePolicy {
    /// Keep the vectors of the winning seed
    #[default]
    Seed,
    /// Length-weighted mean of both sides
    LengthWeightedMean,
}

impl FromStr for RepresentativePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed" => Ok(RepresentativePolicy::Seed),
            "mean" => Ok(RepresentativePolicy::LengthWeightedMean),
            _ => Err(format!("unknown representative policy '{}'", s)),
        }
    }
}

/// A group of contigs believed to come from one organism.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    /// Id of the founding contig, kept through all merges
    pub seed_id: String,
    /// Member contig ids and their lengths, in merge order
    pub members: IndexMap<String, usize>,
    pub length: usize,
    pub coverage: Vec<f64>,
    pub tetra: Vec<f64>,
    pub ref_genomes: BTreeSet<String>,
    /// Summed role counts of all members
    pub uni_roles: BTreeMap<String, u32>,
}

impl Bin {
    pub fn from_contig(contig: &Contig) -> Self {
        let mut members = IndexMap::new();
        members.insert(contig.id.clone(), contig.length);
        Self {
            seed_id: contig.id.clone(),
            members,
            length: contig.length,
            coverage: contig.coverage.clone(),
            tetra: contig.tetra.clone(),
            ref_genomes: contig.ref_genomes.clone(),
            uni_roles: contig.uni_roles.clone(),
        }
    }

    /// Merge two bins. The smaller seed id survives as the identity.
    pub fn merge(a: Bin, b: Bin, policy: RepresentativePolicy) -> Bin {
        let (mut keep, other) = if a.seed_id <= b.seed_id { (a, b) } else { (b, a) };

        if policy == RepresentativePolicy::LengthWeightedMean {
            let (wk, wo) = (keep.length as f64, other.length as f64);
            keep.coverage = weighted_mean(&keep.coverage, wk, &other.coverage, wo);
            keep.tetra = unit_scale(weighted_mean(&keep.tetra, wk, &other.tetra, wo));
        }

        keep.length += other.length;
        keep.members.extend(other.members);
        keep.ref_genomes.extend(other.ref_genomes);
        for (role, count) in other.uni_roles {
            *keep.uni_roles.entry(role).or_insert(0) += count;
        }
        keep
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, contig_id: &str) -> bool {
        self.members.contains_key(contig_id)
    }

    pub fn to_line(&self) -> String {
        let members = self
            .members
            .iter()
            .map(|(id, len)| format!("{}:{}", id, len))
            .join(",");
        let refs = self.ref_genomes.iter().join(",");
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.seed_id,
            members,
            self.length,
            format_floats(&self.coverage),
            refs,
            format_roles(&self.uni_roles)
        )
    }

    /// Parse a line written by [`Bin::to_line`]. Tetra vectors are not stored.
    pub fn from_line(line: &str, file: &str, line_no: usize) -> Result<Self, BinError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(BinError::parse(file, line_no, "expected at least 4 fields"));
        }

        let mut members = IndexMap::new();
        for item in parse_list(fields[1]) {
            let (id, len) = item
                .rsplit_once(':')
                .and_then(|(id, len)| len.parse::<usize>().ok().map(|l| (id, l)))
                .ok_or_else(|| BinError::parse(file, line_no, format!("bad member '{}'", item)))?;
            members.insert(id.to_string(), len);
        }
        if members.is_empty() {
            return Err(BinError::parse(file, line_no, "bin without members"));
        }
        let length = fields[2]
            .trim()
            .parse::<usize>()
            .map_err(|_| BinError::parse(file, line_no, "invalid length"))?;
        let coverage = parse_floats(fields[3]).map_err(|e| BinError::parse(file, line_no, e))?;
        let ref_genomes = fields
            .get(4)
            .map(|f| parse_list(f))
            .unwrap_or_default()
            .into_iter()
            .collect();
        let mut uni_roles = BTreeMap::new();
        if let Some(f) = fields.get(5) {
            for (role, count) in parse_roles(f).map_err(|e| BinError::parse(file, line_no, e))? {
                *uni_roles.entry(role).or_insert(0) += count;
            }
        }

        Ok(Self {
            seed_id: fields[0].trim().to_string(),
            members,
            length,
            coverage,
            tetra: vec![],
            ref_genomes,
            uni_roles,
        })
    }
}

impl Profile for Bin {
    fn coverage(&self) -> &[f64] {
        &self.coverage
    }
    fn tetra(&self) -> &[f64] {
        &self.tetra
    }
    fn ref_genomes(&self) -> &BTreeSet<String> {
        &self.ref_genomes
    }
    fn uni_roles(&self) -> &BTreeMap<String, u32> {
        &self.uni_roles
    }
}

fn weighted_mean(a: &[f64], wa: f64, b: &[f64], wb: f64) -> Vec<f64> {
    let total = wa + wb;
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x * wa + y * wb) / total)
        .collect()
}

/// Largest bins first, ties by seed id.
pub fn sort_bins(bins: &mut [Bin]) {
    bins.sort_by(|a, b| b.length.cmp(&a.length).then_with(|| a.seed_id.cmp(&b.seed_id)));
}

pub fn write_bins<W: Write + ?Sized>(bins: &[Bin], writer: &mut W) -> std::io::Result<()> {
    for bin in bins {
        writeln!(writer, "{}", bin.to_line())?;
    }
    Ok(())
}

pub fn read_bins(infile: &str) -> anyhow::Result<Vec<Bin>> {
    let reader = crate::reader(infile)?;
    let mut bins = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        bins.push(Bin::from_line(&line, infile, idx + 1)?);
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contig(id: &str, len: usize, covg: f64, roles: &[(&str, u32)]) -> Contig {
        Contig::new(
            id,
            len,
            vec![covg],
            vec![1.0, 0.0],
            vec![format!("g_{}", id)],
            roles.iter().map(|(r, c)| (r.to_string(), *c)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_merge_seed_policy() {
        let a = Bin::from_contig(&contig("b", 100, 10.0, &[("R1", 1), ("R2", 1)]));
        let b = Bin::from_contig(&contig("a", 300, 30.0, &[("R2", 2), ("R3", 1)]));
        let m = Bin::merge(a, b, RepresentativePolicy::Seed);

        assert_eq!(m.seed_id, "a");
        assert_eq!(m.length, 400);
        assert_eq!(m.coverage, vec![30.0]);
        assert_eq!(m.members.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.ref_genomes.len(), 2);
        assert_eq!(m.uni_roles.get("R1"), Some(&1));
        assert_eq!(m.uni_roles.get("R2"), Some(&3));
        assert_eq!(m.uni_roles.get("R3"), Some(&1));
    }

    #[test]
    fn test_merge_mean_policy() {
        let a = Bin::from_contig(&contig("a", 100, 10.0, &[]));
        let b = Bin::from_contig(&contig("b", 300, 30.0, &[]));
        let m = Bin::merge(a, b, RepresentativePolicy::LengthWeightedMean);
        assert_relative_eq!(m.coverage[0], 25.0);
        assert_relative_eq!(m.tetra[0], 1.0);
    }

    #[test]
    fn test_line_round_trip() {
        let a = Bin::from_contig(&contig("a", 100, 10.0, &[("R1", 1)]));
        let b = Bin::from_contig(&contig("b", 50, 12.0, &[("R1", 1), ("R9", 2)]));
        let m = Bin::merge(a, b, RepresentativePolicy::Seed);

        let line = m.to_line();
        assert_eq!(line, "a\ta:100,b:50\t150\t10\tg_a,g_b\tR1:2,R9:2");

        let back = Bin::from_line(&line, "test", 1).unwrap();
        assert_eq!(back.seed_id, "a");
        assert_eq!(back.members, m.members);
        assert_eq!(back.uni_roles, m.uni_roles);
        assert!(Bin::from_line("a\t\t0\t", "test", 1).is_err());
    }

    #[test]
    fn test_sort_bins() {
        let mut bins = vec![
            Bin::from_contig(&contig("z", 10, 1.0, &[])),
            Bin::from_contig(&contig("b", 50, 1.0, &[])),
            Bin::from_contig(&contig("a", 10, 1.0, &[])),
        ];
        sort_bins(&mut bins);
        let ids: Vec<_> = bins.iter().map(|b| b.seed_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z"]);
    }
}

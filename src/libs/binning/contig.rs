use crate::libs::binning::error::BinError;
use crate::libs::binning::pair::Profile;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::BufRead;

/// One assembled contig with the features used for binning.
///
/// Contigs are read once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    pub id: String,
    pub length: usize,
    /// One depth value per sample; same arity for every contig of a run
    pub coverage: Vec<f64>,
    /// Tetranucleotide frequencies, scaled to unit length
    pub tetra: Vec<f64>,
    pub ref_genomes: BTreeSet<String>,
    pub uni_roles: BTreeMap<String, u32>,
}

impl Contig {
    /// Build a contig, rejecting zero lengths and non-finite features.
    ///
    /// ```
    /// use mgbin::libs::binning::Contig;
    /// let c = Contig::new("c1", 1000, vec![20.0], vec![3.0, 4.0], vec![], vec![]).unwrap();
    /// assert!((c.tetra[0] - 0.6).abs() < 1e-12);
    /// assert!((c.tetra[1] - 0.8).abs() < 1e-12);
    /// ```
    pub fn new(
        id: &str,
        length: usize,
        coverage: Vec<f64>,
        tetra: Vec<f64>,
        ref_genomes: Vec<String>,
        uni_roles: Vec<(String, u32)>,
    ) -> Result<Self, BinError> {
        if id.is_empty() {
            return Err(BinError::InvalidConfig("empty contig id".to_string()));
        }
        if length == 0 {
            return Err(BinError::InvalidConfig(format!(
                "contig {} has zero length",
                id
            )));
        }
        if coverage.iter().chain(tetra.iter()).any(|v| !v.is_finite()) {
            return Err(BinError::InvalidConfig(format!(
                "contig {} has a non-finite feature value",
                id
            )));
        }

        let mut roles = BTreeMap::new();
        for (role, count) in uni_roles {
            *roles.entry(role).or_insert(0) += count;
        }

        Ok(Self {
            id: id.to_string(),
            length,
            coverage,
            tetra: unit_scale(tetra),
            ref_genomes: ref_genomes.into_iter().collect(),
            uni_roles: roles,
        })
    }
}

impl Profile for Contig {
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

/// Scale a vector to unit L2 length; an all-zero vector is returned unchanged.
pub fn unit_scale(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

pub(crate) fn parse_floats(field: &str) -> Result<Vec<f64>, String> {
    if field.is_empty() {
        return Ok(vec![]);
    }
    field
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{}'", s))
        })
        .collect()
}

pub(crate) fn parse_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_roles(field: &str) -> Result<Vec<(String, u32)>, String> {
    let mut roles = vec![];
    for item in parse_list(field) {
        let (role, count) = item
            .rsplit_once(':')
            .ok_or_else(|| format!("role entry '{}' lacks a count", item))?;
        let count = count
            .parse::<u32>()
            .map_err(|_| format!("invalid role count in '{}'", item))?;
        roles.push((role.to_string(), count));
    }
    Ok(roles)
}

pub(crate) fn format_floats(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).join(",")
}

pub(crate) fn format_roles(roles: &BTreeMap<String, u32>) -> String {
    roles
        .iter()
        .map(|(role, count)| format!("{}:{}", role, count))
        .join(",")
}

/// Parse one line of a contig list.
///
/// Fields: `id length coverage tetra refGenomes uniRoles`, the last two may be empty.
pub fn parse_contig_line(line: &str, file: &str, line_no: usize) -> Result<Contig, BinError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 4 {
        return Err(BinError::parse(
            file,
            line_no,
            format!("expected at least 4 fields, found {}", fields.len()),
        ));
    }

    let length = fields[1]
        .trim()
        .parse::<usize>()
        .map_err(|_| BinError::parse(file, line_no, format!("invalid length '{}'", fields[1])))?;
    let coverage = parse_floats(fields[2]).map_err(|e| BinError::parse(file, line_no, e))?;
    let tetra = parse_floats(fields[3]).map_err(|e| BinError::parse(file, line_no, e))?;
    let refs = fields.get(4).map(|f| parse_list(f)).unwrap_or_default();
    let roles = match fields.get(5) {
        Some(f) => parse_roles(f).map_err(|e| BinError::parse(file, line_no, e))?,
        None => vec![],
    };

    Contig::new(fields[0].trim(), length, coverage, tetra, refs, roles)
        .map_err(|e| BinError::parse(file, line_no, e.to_string()))
}

/// Read a whole contig list. Any malformed line, duplicated id or
/// inconsistent coverage arity is fatal.
pub fn read_contigs(infile: &str) -> anyhow::Result<Vec<Contig>> {
    let reader = crate::reader(infile)?;
    let mut contigs: Vec<Contig> = vec![];
    let mut seen = HashSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let contig = parse_contig_line(&line, infile, idx + 1)?;

        if let Some(first) = contigs.first() {
            if first.coverage.len() != contig.coverage.len() {
                return Err(BinError::parse(
                    infile,
                    idx + 1,
                    format!(
                        "coverage has {} values, expected {}",
                        contig.coverage.len(),
                        first.coverage.len()
                    ),
                )
                .into());
            }
        }
        if !seen.insert(contig.id.clone()) {
            return Err(
                BinError::parse(infile, idx + 1, format!("duplicate contig {}", contig.id)).into(),
            );
        }
        contigs.push(contig);
    }

    Ok(contigs)
}

/// Read a universal-role list, one role id in the first column of each line.
pub fn read_roles(infile: &str) -> anyhow::Result<Vec<String>> {
    let reader = crate::reader(infile)?;
    let mut roles = BTreeSet::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(role) = line.split('\t').next() {
            roles.insert(role.trim().to_string());
        }
    }
    Ok(roles.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_contig_line() {
        let line = "k1\t2500\t20.0,4.5\t1,1,1,1\tg1,g2\tR1:1,R2:2";
        let c = parse_contig_line(line, "test", 1).unwrap();
        assert_eq!(c.id, "k1");
        assert_eq!(c.length, 2500);
        assert_eq!(c.coverage, vec![20.0, 4.5]);
        assert_relative_eq!(c.tetra[0], 0.5);
        assert_eq!(c.ref_genomes.len(), 2);
        assert_eq!(c.uni_roles.get("R2"), Some(&2));
    }

    #[test]
    fn test_parse_contig_line_empty_optional() {
        let c = parse_contig_line("k2\t10\t1.0\t0,0\t\t", "test", 1).unwrap();
        assert!(c.ref_genomes.is_empty());
        assert!(c.uni_roles.is_empty());
        assert_eq!(c.tetra, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_contig_line_errors() {
        let err = parse_contig_line("k1\tabc\t1.0\t1", "contigs.tsv", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));

        assert!(parse_contig_line("k1\t0\t1.0\t1", "t", 1).is_err());
        assert!(parse_contig_line("k1\t5\t1.0\t1\t\tR1", "t", 1).is_err());
        assert!(parse_contig_line("k1\t5", "t", 1).is_err());
    }

    #[test]
    fn test_repeated_roles_are_summed() {
        let c = Contig::new(
            "k",
            1,
            vec![],
            vec![],
            vec![],
            vec![("R1".to_string(), 1), ("R1".to_string(), 2)],
        )
        .unwrap();
        assert_eq!(c.uni_roles.get("R1"), Some(&3));
    }
}

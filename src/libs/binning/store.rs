use crate::libs::binning::contig::Contig;
use crate::libs::binning::pair::PairRecord;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// File name of the pairwise feature table inside a working directory
pub const SCORES_FILE: &str = "scores.tbl";

/// Raw comparison features of contig pairs, keyed by the two contig ids.
///
/// Built once per dataset and read-only afterwards, so one store can be
/// shared by any number of concurrent clustering runs.
#[derive(Debug, Clone, Default)]
pub struct PairStore {
    // outer key is the lexicographically smaller id
    records: HashMap<String, HashMap<String, PairRecord>>,
    len: usize,
    skipped: usize,
}

impl PairStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare every unordered pair of distinct contigs.
    pub fn build(contigs: &[Contig]) -> Self {
        let n = contigs.len();
        let rows: Vec<Vec<(usize, PairRecord)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| (j, PairRecord::compare(&contigs[i], &contigs[j])))
                    .collect()
            })
            .collect();

        let mut store = Self::new();
        for (i, row) in rows.into_iter().enumerate() {
            for (j, rec) in row {
                store.insert(&contigs[i].id, &contigs[j].id, rec);
            }
        }
        store
    }

    pub fn insert(&mut self, x: &str, y: &str, rec: PairRecord) {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        let old = self
            .records
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), rec);
        if old.is_none() {
            self.len += 1;
        }
    }

    /// Order of the two ids does not matter.
    pub fn get(&self, x: &str, y: &str) -> Option<&PairRecord> {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        self.records.get(a).and_then(|row| row.get(b))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of malformed lines ignored while loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// One pair per line, sorted by ids so the file is stable across runs.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut firsts: Vec<&String> = self.records.keys().collect();
        firsts.sort();
        for a in firsts {
            let row = &self.records[a];
            let mut seconds: Vec<&String> = row.keys().collect();
            seconds.sort();
            for b in seconds {
                let rec = &row[b];
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    a,
                    b,
                    rec.covg_frac,
                    rec.tetra_dot,
                    rec.ref_category,
                    rec.uni_only_one,
                    rec.uni_both
                )?;
            }
        }
        Ok(())
    }

    pub fn save(&self, outfile: &str) -> anyhow::Result<()> {
        let mut writer = crate::writer(outfile)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a feature table. Malformed lines are counted and skipped.
    pub fn read_from<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut store = Self::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_pair_line(&line) {
                Some((x, y, rec)) => store.insert(x, y, rec),
                None => store.skipped += 1,
            }
        }
        Ok(store)
    }

    pub fn load(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile)?;
        Self::read_from(reader)
    }

    /// Load `scores.tbl` from `dir`, or build and save it when absent or `force` is set.
    pub fn open(dir: &Path, contigs: &[Contig], force: bool) -> anyhow::Result<Self> {
        let path = dir.join(SCORES_FILE);
        let file = path.to_string_lossy().to_string();

        if path.is_file() && !force {
            let store = Self::load(&file)?;
            tracing::info!(
                "Loaded {} pair records from {} ({} malformed lines skipped)",
                store.len(),
                file,
                store.skipped()
            );
            return Ok(store);
        }

        tracing::info!("Computing pair features for {} contigs", contigs.len());
        let store = Self::build(contigs);
        store.save(&file)?;
        tracing::info!("Saved {} pair records to {}", store.len(), file);
        Ok(store)
    }
}

fn parse_pair_line(line: &str) -> Option<(&str, &str, PairRecord)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 {
        return None;
    }
    let (x, y) = (fields[0].trim(), fields[1].trim());
    if x.is_empty() || y.is_empty() || x == y {
        return None;
    }

    let covg_frac: f64 = fields[2].trim().parse().ok()?;
    let tetra_dot: f64 = fields[3].trim().parse().ok()?;
    if !covg_frac.is_finite() || !tetra_dot.is_finite() {
        return None;
    }
    let rec = PairRecord {
        covg_frac,
        tetra_dot,
        ref_category: fields[4].trim().parse().ok()?,
        uni_only_one: fields[5].trim().parse().ok()?,
        uni_both: fields[6].trim().parse().ok()?,
    };
    Some((x, y, rec))
}

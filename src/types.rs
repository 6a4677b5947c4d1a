use crate::error::{KolandscapeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sentinel written to `ko_pos` columns for "no position knocked out".
pub const NO_SITE: i64 = -1;

/// Task indices into the configured task list.
pub type TaskSet = BTreeSet<usize>;

/// One flat-file row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert<K: Into<String>, V: ToString>(&mut self, field: K, value: V) {
        self.fields.insert(field.into(), value.to_string());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Required field lookup; absence is a schema error.
    pub fn get(&self, field: &str) -> Result<&str> {
        self.fields
            .get(field)
            .map(|s| s.as_str())
            .ok_or_else(|| {
                KolandscapeError::SchemaMismatch(format!(
                    "missing field '{}' (found: {:?})",
                    field,
                    self.fields.keys().collect::<Vec<_>>()
                ))
            })
    }

    pub fn get_opt(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    pub fn get_i64(&self, field: &str) -> Result<i64> {
        let raw = self.get(field)?;
        raw.trim().parse::<i64>().map_err(|_| {
            KolandscapeError::Format(format!("field '{}' is not an integer: '{}'", field, raw))
        })
    }

    /// Integer counters may be written as floats by some simulator outputs.
    pub fn get_count(&self, field: &str) -> Result<f64> {
        let raw = self.get(field)?;
        raw.trim().parse::<f64>().map_err(|_| {
            KolandscapeError::Format(format!("field '{}' is not numeric: '{}'", field, raw))
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn extend(&mut self, other: &Record) {
        for (k, v) in other.iter() {
            self.fields.insert(k.to_string(), v.to_string());
        }
    }
}

/// Task performance bit-vector, one bit per tracked task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phenotype {
    bits: Vec<bool>,
}

impl Phenotype {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn empty(num_tasks: usize) -> Self {
        Self { bits: vec![false; num_tasks] }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn performs(&self, task: usize) -> bool {
        self.bits.get(task).copied().unwrap_or(false)
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn tasks(&self) -> TaskSet {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Tasks performed by `reference` but not by `self`.
    pub fn lost_from(&self, reference: &Phenotype) -> TaskSet {
        reference.tasks().difference(&self.tasks()).copied().collect()
    }

    /// Tasks performed by `self` but not by `reference`.
    pub fn gained_over(&self, reference: &Phenotype) -> TaskSet {
        self.tasks().difference(&reference.tasks()).copied().collect()
    }

    pub fn bitstring(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bitstring())
    }
}

/// Phenotype and viability observed for one evaluated genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub phenotype: Phenotype,
    pub viable: bool,
}

impl Observation {
    pub fn new(phenotype: Phenotype, viable: bool) -> Self {
        Self { phenotype, viable }
    }

    /// Tasks lost relative to `reference`. Empty for inviable observations:
    /// an inviable knockout only ever counts against viability.
    pub fn tasks_lost(&self, reference: &Observation) -> TaskSet {
        if !self.viable {
            return TaskSet::new();
        }
        self.phenotype.lost_from(&reference.phenotype)
    }
}

/// Unordered pair of distinct sites, stored as `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SitePair {
    low: usize,
    high: usize,
}

impl SitePair {
    pub fn new(a: usize, b: usize) -> Result<Self> {
        if a == b {
            return Err(KolandscapeError::Format(format!(
                "site pair needs two distinct positions, got ({}, {})",
                a, b
            )));
        }
        Ok(Self {
            low: a.min(b),
            high: a.max(b),
        })
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }

    pub fn contains(&self, site: usize) -> bool {
        self.low == site || self.high == site
    }
}

impl fmt::Display for SitePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

/// Which position(s) a knockout variant replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnockoutSite {
    Control,
    Single(usize),
    Pair(SitePair),
}

impl KnockoutSite {
    /// Parse a single `ko_pos` column value.
    pub fn from_ko_pos(raw: &str, genome_len: usize) -> Result<Self> {
        match parse_position(raw, genome_len)? {
            None => Ok(Self::Control),
            Some(pos) => Ok(Self::Single(pos)),
        }
    }

    /// Parse a `(ko_pos_0, ko_pos_1)` column pair. Equal positions encode a
    /// single-site knockout; a `-1` in either column marks the control.
    pub fn from_ko_pos_pair(raw_0: &str, raw_1: &str, genome_len: usize) -> Result<Self> {
        let p0 = parse_position(raw_0, genome_len)?;
        let p1 = parse_position(raw_1, genome_len)?;
        match (p0, p1) {
            (None, _) | (_, None) => Ok(Self::Control),
            (Some(a), Some(b)) if a == b => Ok(Self::Single(a)),
            (Some(a), Some(b)) => Ok(Self::Pair(SitePair::new(a, b)?)),
        }
    }

    /// Column values for the paired knockout table.
    pub fn ko_pos_pair(&self) -> (i64, i64) {
        match self {
            Self::Control => (NO_SITE, NO_SITE),
            Self::Single(p) => (*p as i64, *p as i64),
            Self::Pair(pair) => (pair.low() as i64, pair.high() as i64),
        }
    }

    /// Column value for the single knockout table.
    pub fn ko_pos(&self) -> i64 {
        match self {
            Self::Control => NO_SITE,
            Self::Single(p) => *p as i64,
            Self::Pair(pair) => pair.low() as i64,
        }
    }
}

fn parse_position(raw: &str, genome_len: usize) -> Result<Option<usize>> {
    let trimmed = raw.trim();
    if trimmed == NO_SITE.to_string() {
        return Ok(None);
    }
    match trimmed.parse::<usize>() {
        Ok(pos) if pos < genome_len => Ok(Some(pos)),
        _ => Err(KolandscapeError::Format(format!(
            "invalid knockout position '{}' for genome of length {}",
            raw, genome_len
        ))),
    }
}

use super::genotypes::row_site;
use crate::config::TaskConfig;
use crate::engines::evaluation::{extract_phenotype, KnockoutLayout};
use crate::engines::generation::knockouts::{all_pairs, pair_count};
use crate::error::{KolandscapeError, Result};
use crate::types::{KnockoutSite, Observation, Record, SitePair, TaskSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type SiteSet = BTreeSet<usize>;

/// Evaluated knockouts of one genotype, keyed by knocked-out site(s).
#[derive(Debug, Clone, Default)]
pub struct KnockoutTable {
    genome_len: usize,
    control: Option<Observation>,
    singles: BTreeMap<usize, Observation>,
    pairs: BTreeMap<SitePair, Observation>,
}

impl KnockoutTable {
    pub fn new(genome_len: usize) -> Self {
        Self {
            genome_len,
            ..Self::default()
        }
    }

    /// Build from the back-labelled rows of one genotype.
    pub fn from_rows<'r, I>(
        rows: I,
        layout: KnockoutLayout,
        tasks: &TaskConfig,
        genome_len: usize,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut table = Self::new(genome_len);
        for row in rows {
            let site = row_site(row, layout, genome_len)?;
            let observation = extract_phenotype(row, &tasks.tasks, &tasks.viability_field)?;
            table.insert(site, observation);
        }
        Ok(table)
    }

    /// Record an observation. The first observation of a site wins.
    pub fn insert(&mut self, site: KnockoutSite, observation: Observation) {
        let inserted = match site {
            KnockoutSite::Control => {
                let fresh = self.control.is_none();
                self.control.get_or_insert(observation);
                fresh
            }
            KnockoutSite::Single(pos) => insert_first(&mut self.singles, pos, observation),
            KnockoutSite::Pair(pair) => insert_first(&mut self.pairs, pair, observation),
        };
        if !inserted {
            log::debug!("Ignoring repeated observation of knockout {:?}", site);
        }
    }

    pub fn genome_len(&self) -> usize {
        self.genome_len
    }

    pub fn control(&self) -> Option<&Observation> {
        self.control.as_ref()
    }

    pub fn single(&self, site: usize) -> Option<&Observation> {
        self.singles.get(&site)
    }

    pub fn pair(&self, pair: &SitePair) -> Option<&Observation> {
        self.pairs.get(pair)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&SitePair, &Observation)> {
        self.pairs.iter()
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }
}

fn insert_first<K: Ord>(map: &mut BTreeMap<K, Observation>, key: K, value: Observation) -> bool {
    match map.entry(key) {
        std::collections::btree_map::Entry::Vacant(slot) => {
            slot.insert(value);
            true
        }
        std::collections::btree_map::Entry::Occupied(_) => false,
    }
}

/// Which site pairs a table must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairCoverage {
    /// All `C(n,2)` pairs.
    Complete,
    /// A sampled subset; every observed pair is classified.
    Sampled,
}

/// Outcome of one pair under the redundancy / recovery rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairEffect {
    Neutral,
    /// Neither site alone loses the trait; both together do.
    Redundant,
    /// The knockout of the pair restores a trait lost by a single knockout.
    /// `low` / `high` mark which sites of the pair count as rescuers.
    Recovery { low: bool, high: bool },
}

impl PairEffect {
    /// `lost_low`, `lost_high`: trait lost by each single knockout.
    /// `lost_pair`: trait lost by the double knockout.
    pub fn of(lost_low: bool, lost_high: bool, lost_pair: bool) -> Self {
        match (lost_low, lost_high, lost_pair) {
            (false, false, true) => Self::Redundant,
            (true, false, false) => Self::Recovery { low: false, high: true },
            (false, true, false) => Self::Recovery { low: true, high: false },
            (true, true, false) => Self::Recovery { low: true, high: true },
            _ => Self::Neutral,
        }
    }

    fn apply(&self, pair: &SitePair, redundant: &mut SiteSet, recovery: &mut SiteSet) {
        match *self {
            Self::Neutral => {}
            Self::Redundant => {
                redundant.insert(pair.low());
                redundant.insert(pair.high());
            }
            Self::Recovery { low, high } => {
                if low {
                    recovery.insert(pair.low());
                }
                if high {
                    recovery.insert(pair.high());
                }
            }
        }
    }
}

/// Incremental site classifier for one genotype.
///
/// Coding and viability-critical sites come from the single knockouts and are
/// fixed at construction. Pairs only ever add sites to the redundancy and
/// recovery sets, so the result does not depend on the order pairs arrive in.
#[derive(Debug, Clone)]
pub struct SiteClassifier {
    genome_len: usize,
    control: Observation,
    task_sites: Vec<SiteSet>,
    task_redundancy_sites: Vec<SiteSet>,
    task_recovery_sites: Vec<SiteSet>,
    viability_sites: SiteSet,
    viability_redundancy_sites: SiteSet,
    viability_recovery_sites: SiteSet,
    classified: BTreeSet<SitePair>,
}

impl SiteClassifier {
    /// Requires the control and every single-site knockout.
    pub fn new(table: &KnockoutTable) -> Result<Self> {
        let control = table
            .control()
            .cloned()
            .ok_or_else(|| KolandscapeError::Completeness("no control (ko_pos = -1) row".to_string()))?;
        let num_tasks = control.phenotype.len();

        let mut task_sites = vec![SiteSet::new(); num_tasks];
        let mut viability_sites = SiteSet::new();
        for site in 0..table.genome_len() {
            let single = table.single(site).ok_or_else(|| {
                KolandscapeError::Completeness(format!("no single knockout of site {}", site))
            })?;
            if !single.viable {
                viability_sites.insert(site);
            }
            for task in single.tasks_lost(&control) {
                task_sites[task].insert(site);
            }
        }

        Ok(Self {
            genome_len: table.genome_len(),
            control,
            task_sites,
            task_redundancy_sites: vec![SiteSet::new(); num_tasks],
            task_recovery_sites: vec![SiteSet::new(); num_tasks],
            viability_sites,
            viability_redundancy_sites: SiteSet::new(),
            viability_recovery_sites: SiteSet::new(),
            classified: BTreeSet::new(),
        })
    }

    /// Apply the pair rules to one double knockout. Returns the viability
    /// effect; task rules run only when that effect is neutral and the double
    /// knockout is viable. A pair already classified is ignored.
    pub fn classify_pair(&mut self, pair: SitePair, paired: &Observation) -> Result<PairEffect> {
        if pair.high() >= self.genome_len {
            return Err(KolandscapeError::Format(format!(
                "site pair {} outside genome of length {}",
                pair, self.genome_len
            )));
        }
        if !self.classified.insert(pair) {
            return Ok(PairEffect::Neutral);
        }

        let viability = PairEffect::of(
            self.viability_sites.contains(&pair.low()),
            self.viability_sites.contains(&pair.high()),
            !paired.viable,
        );
        viability.apply(
            &pair,
            &mut self.viability_redundancy_sites,
            &mut self.viability_recovery_sites,
        );
        // An inviable double knockout performs nothing, so it cannot rescue a
        // task even when neither site alone changes viability.
        if viability != PairEffect::Neutral || !paired.viable {
            return Ok(viability);
        }

        let lost = paired.tasks_lost(&self.control);
        for task in 0..self.task_sites.len() {
            let effect = PairEffect::of(
                self.task_sites[task].contains(&pair.low()),
                self.task_sites[task].contains(&pair.high()),
                lost.contains(&task),
            );
            effect.apply(
                &pair,
                &mut self.task_redundancy_sites[task],
                &mut self.task_recovery_sites[task],
            );
        }
        Ok(viability)
    }

    pub fn num_classified(&self) -> usize {
        self.classified.len()
    }

    pub fn finish(self) -> SiteClassification {
        SiteClassification {
            genome_len: self.genome_len,
            control: self.control,
            task_sites: self.task_sites,
            task_redundancy_sites: self.task_redundancy_sites,
            task_recovery_sites: self.task_recovery_sites,
            viability_sites: self.viability_sites,
            viability_redundancy_sites: self.viability_redundancy_sites,
            viability_recovery_sites: self.viability_recovery_sites,
            pairs_classified: self.classified.len(),
        }
    }
}

/// Classify every pair in `table`. All-or-nothing: a missing required
/// observation fails the whole genotype.
pub fn classify(table: &KnockoutTable, coverage: PairCoverage) -> Result<SiteClassification> {
    let mut classifier = SiteClassifier::new(table)?;

    match coverage {
        PairCoverage::Complete => {
            for pair in all_pairs(table.genome_len()) {
                let paired = table.pair(&pair).ok_or_else(|| {
                    KolandscapeError::Completeness(format!("no paired knockout of sites {}", pair))
                })?;
                classifier.classify_pair(pair, paired)?;
            }
            if table.num_pairs() != pair_count(table.genome_len()) {
                log::debug!(
                    "Knockout table holds {} pairs for a {}-site genome",
                    table.num_pairs(),
                    table.genome_len()
                );
            }
        }
        PairCoverage::Sampled => {
            if table.num_pairs() == 0 && table.genome_len() > 1 {
                return Err(KolandscapeError::Completeness(
                    "sampled pairwise table holds no paired knockouts".to_string(),
                ));
            }
            for (pair, paired) in table.pairs() {
                classifier.classify_pair(*pair, paired)?;
            }
        }
    }

    Ok(classifier.finish())
}

/// Final redundancy / recovery / coding sets for one genotype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteClassification {
    genome_len: usize,
    control: Observation,
    task_sites: Vec<SiteSet>,
    task_redundancy_sites: Vec<SiteSet>,
    task_recovery_sites: Vec<SiteSet>,
    viability_sites: SiteSet,
    viability_redundancy_sites: SiteSet,
    viability_recovery_sites: SiteSet,
    pairs_classified: usize,
}

impl SiteClassification {
    pub fn genome_len(&self) -> usize {
        self.genome_len
    }

    pub fn control(&self) -> &Observation {
        &self.control
    }

    pub fn pairs_classified(&self) -> usize {
        self.pairs_classified
    }

    /// Sites whose single knockout loses `task` (nonredundant coding).
    pub fn coding_sites(&self, task: usize) -> &SiteSet {
        &self.task_sites[task]
    }

    pub fn redundant_sites(&self, task: usize) -> &SiteSet {
        &self.task_redundancy_sites[task]
    }

    pub fn recovery_sites(&self, task: usize) -> &SiteSet {
        &self.task_recovery_sites[task]
    }

    pub fn viability_sites(&self) -> &SiteSet {
        &self.viability_sites
    }

    pub fn viability_redundant_sites(&self) -> &SiteSet {
        &self.viability_redundancy_sites
    }

    pub fn viability_recovery_sites(&self) -> &SiteSet {
        &self.viability_recovery_sites
    }

    fn num_tasks(&self) -> usize {
        self.task_sites.len()
    }

    /// Tasks coded by `site`, alone or redundantly.
    pub fn all_coded_tasks(&self, site: usize) -> TaskSet {
        (0..self.num_tasks())
            .filter(|&t| self.task_sites[t].contains(&site) || self.task_redundancy_sites[t].contains(&site))
            .collect()
    }

    pub fn recovered_tasks(&self, site: usize) -> TaskSet {
        (0..self.num_tasks())
            .filter(|&t| self.task_recovery_sites[t].contains(&site))
            .collect()
    }

    pub fn is_multi_task_site(&self, site: usize) -> bool {
        self.all_coded_tasks(site).len() > 1
    }

    pub fn site_records(&self) -> Vec<SiteRecord> {
        (0..self.genome_len)
            .map(|site| SiteRecord {
                site,
                viability: self.viability_sites.contains(&site),
                redundant_viability: self.viability_redundancy_sites.contains(&site),
                viability_recovery: self.viability_recovery_sites.contains(&site),
                coded_tasks: (0..self.num_tasks())
                    .filter(|&t| self.task_sites[t].contains(&site))
                    .collect(),
                redundant_tasks: (0..self.num_tasks())
                    .filter(|&t| self.task_redundancy_sites[t].contains(&site))
                    .collect(),
                recovered_tasks: self.recovered_tasks(site),
                all_coded_tasks: self.all_coded_tasks(site),
            })
            .collect()
    }

    pub fn counts(&self) -> ClassificationCounts {
        let union = |sets: &[SiteSet]| -> SiteSet { sets.iter().flatten().copied().collect() };

        let nonredundant_task = union(&self.task_sites);
        let redundant_task = union(&self.task_redundancy_sites);
        let all_task: SiteSet = nonredundant_task.union(&redundant_task).copied().collect();
        let all_viability: SiteSet = self
            .viability_sites
            .union(&self.viability_redundancy_sites)
            .copied()
            .collect();

        ClassificationCounts {
            num_tasks_performed: self.control.phenotype.tasks().len(),
            num_nonredundant_viability_sites: self.viability_sites.len(),
            num_redundant_viability_sites: self.viability_redundancy_sites.len(),
            num_viability_sites: all_viability.len(),
            num_viability_recovery_sites: self.viability_recovery_sites.len(),
            num_nonredundant_task_sites: nonredundant_task.len(),
            num_redundant_task_sites: redundant_task.len(),
            num_task_coding_sites: all_task.len(),
            num_task_recovery_sites: union(&self.task_recovery_sites).len(),
            num_multi_task_sites: (0..self.genome_len)
                .filter(|&s| self.is_multi_task_site(s))
                .count(),
            task_coding_sites: (0..self.num_tasks())
                .map(|t| self.task_sites[t].union(&self.task_redundancy_sites[t]).count())
                .collect(),
            task_recovery_sites: self.task_recovery_sites.iter().map(|s| s.len()).collect(),
        }
    }

    pub fn report(&self, tasks: &TaskConfig) -> ClassificationReport {
        let names = |set: &TaskSet| -> Vec<String> {
            set.iter().map(|&t| tasks.task_name(t).to_string()).collect()
        };
        ClassificationReport {
            genome_len: self.genome_len,
            tasks_performed: names(&self.control.phenotype.tasks()),
            pairs_classified: self.pairs_classified,
            sites: self
                .site_records()
                .into_iter()
                .map(|r| SiteReport {
                    site: r.site,
                    viability: r.viability,
                    redundant_viability: r.redundant_viability,
                    viability_recovery: r.viability_recovery,
                    coded_tasks: names(&r.coded_tasks),
                    redundant_tasks: names(&r.redundant_tasks),
                    recovered_tasks: names(&r.recovered_tasks),
                    multi_task: r.all_coded_tasks.len() > 1,
                })
                .collect(),
        }
    }
}

/// Per-site view of a [`SiteClassification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub site: usize,
    pub viability: bool,
    pub redundant_viability: bool,
    pub viability_recovery: bool,
    pub coded_tasks: TaskSet,
    pub redundant_tasks: TaskSet,
    pub recovered_tasks: TaskSet,
    pub all_coded_tasks: TaskSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub num_tasks_performed: usize,
    pub num_nonredundant_viability_sites: usize,
    pub num_redundant_viability_sites: usize,
    pub num_viability_sites: usize,
    pub num_viability_recovery_sites: usize,
    pub num_nonredundant_task_sites: usize,
    pub num_redundant_task_sites: usize,
    pub num_task_coding_sites: usize,
    pub num_task_recovery_sites: usize,
    pub num_multi_task_sites: usize,
    /// Coding (nonredundant or redundant) sites per task index.
    pub task_coding_sites: Vec<usize>,
    pub task_recovery_sites: Vec<usize>,
}

impl ClassificationCounts {
    /// Run-summary fields, named after the configured tasks.
    pub fn to_record(&self, tasks: &TaskConfig) -> Record {
        let mut record = Record::new();
        record.insert("num_nonredundant_viability_sites", self.num_nonredundant_viability_sites);
        record.insert("num_redundant_viability_sites", self.num_redundant_viability_sites);
        record.insert("num_viability_sites", self.num_viability_sites);
        record.insert("num_viability_recovery_sites", self.num_viability_recovery_sites);
        record.insert("num_nonredundant_task_sites", self.num_nonredundant_task_sites);
        record.insert("num_redundant_task_sites", self.num_redundant_task_sites);
        record.insert("num_task_coding_sites", self.num_task_coding_sites);
        record.insert("num_task_recovery_sites", self.num_task_recovery_sites);
        record.insert("num_multi_task_sites", self.num_multi_task_sites);
        for (task, name) in tasks.tasks.iter().enumerate() {
            let coding = self.task_coding_sites.get(task).copied().unwrap_or(0);
            let recovery = self.task_recovery_sites.get(task).copied().unwrap_or(0);
            record.insert(format!("num_{}_task_coding_sites", name), coding);
            record.insert(format!("num_{}_task_recovery_sites", name), recovery);
        }
        record
    }
}

/// Serializable per-site report with task names resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub genome_len: usize,
    pub tasks_performed: Vec<String>,
    pub pairs_classified: usize,
    pub sites: Vec<SiteReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub site: usize,
    pub viability: bool,
    pub redundant_viability: bool,
    pub viability_recovery: bool,
    pub coded_tasks: Vec<String>,
    pub redundant_tasks: Vec<String>,
    pub recovered_tasks: Vec<String>,
    pub multi_task: bool,
}

use super::distance::{hamming_dist, simple_match_coeff};
use crate::config::TaskConfig;
use crate::engines::evaluation::extract_phenotype;
use crate::error::{KolandscapeError, Result};
use crate::types::{Observation, Record, TaskSet};
use std::collections::HashMap;

/// Phenotype-distribution key for inviable mutants.
pub const NONVIABLE: &str = "nonviable";

#[derive(Debug, Clone, PartialEq)]
pub struct PhenotypeBucket {
    pub phenotype: String,
    pub count: usize,
    pub is_ancestor: bool,
    /// `None` for the inviable bucket.
    pub match_score_a: Option<usize>,
    pub match_score_b: Option<usize>,
    pub dist_to_ancestor: Option<usize>,
}

/// Statistics over the one-step (or two-step) mutants of a focal genome.
#[derive(Debug, Clone)]
pub struct LandscapeAnalysis {
    task_names: Vec<String>,
    pub total_mutants: usize,
    pub num_viable: usize,
    pub num_nonviable: usize,
    pub occurrence_counts: Vec<usize>,
    /// Symmetric; the diagonal holds occurrence counts.
    pub cooccurrence_counts: Vec<Vec<usize>>,
    pub occurrence_probs: Vec<f64>,
    pub joint_probs: Vec<Vec<f64>>,
    pub pmi: Vec<Vec<f64>>,
    pub jsi: Vec<Vec<f64>>,
    pub npmi: Vec<Vec<f64>>,
    pub expected_npmi: f64,
    pub unexpected_npmi: f64,
    pub num_unique_viable_phenotypes: usize,
    pub entropy_viable_phenotypes: f64,
    pub num_viable_mutants_lose_tasks: usize,
    pub num_viable_mutants_lose_multiple_tasks: usize,
    pub num_viable_mutants_gain_tasks: usize,
    pub num_viable_mutants_gain_multiple_tasks: usize,
    pub num_viable_mutants_improve_env_a: usize,
    pub num_viable_mutants_improve_env_b: usize,
    pub avg_dist_to_ancestor: f64,
    pub avg_match_score_env_a: f64,
    pub avg_match_score_env_b: f64,
    pub avg_match_chg_toward_env_a: f64,
    pub avg_match_chg_toward_env_b: f64,
    pub avg_num_tasks_gained: f64,
    pub avg_num_tasks_lost: f64,
    pub orig_match_score_env_a: usize,
    pub orig_match_score_env_b: usize,
    /// Indexed by Hamming distance, `0..=num_tasks`.
    pub distances_to_env_a: Vec<usize>,
    pub distances_to_env_b: Vec<usize>,
    /// Ancestor first, then in order of first appearance, then inviable.
    pub phenotype_distribution: Vec<PhenotypeBucket>,
}

#[derive(Default)]
struct MutantTotals {
    dist_to_ancestor: usize,
    match_a: usize,
    match_b: usize,
    chg_a: i64,
    chg_b: i64,
    tasks_gained: usize,
    tasks_lost: usize,
}

impl LandscapeAnalysis {
    /// `rows` is the mutant detail table; its last row is the unmutated genome.
    pub fn from_rows(rows: &[Record], tasks: &TaskConfig) -> Result<Self> {
        let Some((orig_row, mutants)) = rows.split_last() else {
            return Err(KolandscapeError::Format("mutant detail file has no rows".to_string()));
        };
        let n = tasks.num_tasks();
        let observe = |row: &Record| extract_phenotype(row, &tasks.tasks, &tasks.viability_field);

        let profile_a = tasks.profile_env_a().bitstring();
        let profile_b = tasks.profile_env_b().bitstring();

        let orig = observe(orig_row)?;
        let orig_bits = orig.phenotype.bitstring();
        let orig_tasks = orig.phenotype.tasks();
        let orig_match_a = simple_match_coeff(&orig_bits, &profile_a)?;
        let orig_match_b = simple_match_coeff(&orig_bits, &profile_b)?;

        let mut analysis = Self {
            task_names: tasks.tasks.clone(),
            total_mutants: mutants.len(),
            num_viable: 0,
            num_nonviable: 0,
            occurrence_counts: vec![0; n],
            cooccurrence_counts: vec![vec![0; n]; n],
            occurrence_probs: vec![0.0; n],
            joint_probs: vec![vec![0.0; n]; n],
            pmi: vec![vec![0.0; n]; n],
            jsi: vec![vec![0.0; n]; n],
            npmi: vec![vec![0.0; n]; n],
            expected_npmi: 0.0,
            unexpected_npmi: 0.0,
            num_unique_viable_phenotypes: 0,
            entropy_viable_phenotypes: 0.0,
            num_viable_mutants_lose_tasks: 0,
            num_viable_mutants_lose_multiple_tasks: 0,
            num_viable_mutants_gain_tasks: 0,
            num_viable_mutants_gain_multiple_tasks: 0,
            num_viable_mutants_improve_env_a: 0,
            num_viable_mutants_improve_env_b: 0,
            avg_dist_to_ancestor: -1.0,
            avg_match_score_env_a: -1.0,
            avg_match_score_env_b: -1.0,
            avg_match_chg_toward_env_a: -1.0,
            avg_match_chg_toward_env_b: -1.0,
            avg_num_tasks_gained: -1.0,
            avg_num_tasks_lost: -1.0,
            orig_match_score_env_a: orig_match_a,
            orig_match_score_env_b: orig_match_b,
            distances_to_env_a: vec![0; n + 1],
            distances_to_env_b: vec![0; n + 1],
            phenotype_distribution: vec![PhenotypeBucket {
                phenotype: orig_bits.clone(),
                count: 1,
                is_ancestor: true,
                match_score_a: Some(orig_match_a),
                match_score_b: Some(orig_match_b),
                dist_to_ancestor: Some(0),
            }],
        };

        let mut bucket_index: HashMap<String, usize> = HashMap::from([(orig_bits.clone(), 0)]);
        let mut viable_counts: HashMap<String, usize> = HashMap::new();
        let mut totals = MutantTotals::default();

        for row in mutants {
            let Observation { phenotype, viable } = observe(row)?;
            if !viable {
                analysis.num_nonviable += 1;
                continue;
            }
            analysis.num_viable += 1;

            for i in 0..n {
                if !phenotype.performs(i) {
                    continue;
                }
                analysis.occurrence_counts[i] += 1;
                for j in (i + 1)..n {
                    if phenotype.performs(j) {
                        analysis.cooccurrence_counts[i][j] += 1;
                        analysis.cooccurrence_counts[j][i] += 1;
                    }
                }
            }

            let bits = phenotype.bitstring();
            let performed = phenotype.tasks();
            let gained: TaskSet = performed.difference(&orig_tasks).copied().collect();
            let lost: TaskSet = orig_tasks.difference(&performed).copied().collect();
            let dist_to_ancestor = hamming_dist(&orig_bits, &bits)?;
            let match_a = simple_match_coeff(&bits, &profile_a)?;
            let match_b = simple_match_coeff(&bits, &profile_b)?;

            analysis.distances_to_env_a[hamming_dist(&bits, &profile_a)?] += 1;
            analysis.distances_to_env_b[hamming_dist(&bits, &profile_b)?] += 1;

            let next = analysis.phenotype_distribution.len();
            let idx = *bucket_index.entry(bits.clone()).or_insert(next);
            if idx == next {
                analysis.phenotype_distribution.push(PhenotypeBucket {
                    phenotype: bits.clone(),
                    count: 0,
                    is_ancestor: false,
                    match_score_a: Some(match_a),
                    match_score_b: Some(match_b),
                    dist_to_ancestor: Some(dist_to_ancestor),
                });
            }
            analysis.phenotype_distribution[idx].count += 1;
            *viable_counts.entry(bits).or_insert(0) += 1;

            analysis.num_viable_mutants_lose_tasks += usize::from(!lost.is_empty());
            analysis.num_viable_mutants_lose_multiple_tasks += usize::from(lost.len() > 1);
            analysis.num_viable_mutants_gain_tasks += usize::from(!gained.is_empty());
            analysis.num_viable_mutants_gain_multiple_tasks += usize::from(gained.len() > 1);
            analysis.num_viable_mutants_improve_env_a += usize::from(match_a > orig_match_a);
            analysis.num_viable_mutants_improve_env_b += usize::from(match_b > orig_match_b);

            totals.dist_to_ancestor += dist_to_ancestor;
            totals.match_a += match_a;
            totals.match_b += match_b;
            totals.chg_a += match_a as i64 - orig_match_a as i64;
            totals.chg_b += match_b as i64 - orig_match_b as i64;
            totals.tasks_gained += gained.len();
            totals.tasks_lost += lost.len();
        }

        analysis.phenotype_distribution.push(PhenotypeBucket {
            phenotype: NONVIABLE.to_string(),
            count: analysis.num_nonviable,
            is_ancestor: false,
            match_score_a: None,
            match_score_b: None,
            dist_to_ancestor: None,
        });

        analysis.finish_averages(&totals);
        analysis.finish_information(tasks);
        analysis.num_unique_viable_phenotypes = viable_counts.len();
        analysis.entropy_viable_phenotypes = entropy(viable_counts.values().copied());
        Ok(analysis)
    }

    fn finish_averages(&mut self, totals: &MutantTotals) {
        let avg = |sum: f64, count: usize| if count > 0 { sum / count as f64 } else { -1.0 };
        let viable = self.num_viable;
        self.avg_dist_to_ancestor = avg(totals.dist_to_ancestor as f64, viable);
        self.avg_match_score_env_a = avg(totals.match_a as f64, viable);
        self.avg_match_score_env_b = avg(totals.match_b as f64, viable);
        self.avg_match_chg_toward_env_a = avg(totals.chg_a as f64, viable);
        self.avg_match_chg_toward_env_b = avg(totals.chg_b as f64, viable);
        self.avg_num_tasks_gained = avg(totals.tasks_gained as f64, self.num_viable_mutants_gain_tasks);
        self.avg_num_tasks_lost = avg(totals.tasks_lost as f64, self.num_viable_mutants_lose_tasks);
    }

    fn finish_information(&mut self, tasks: &TaskConfig) {
        let n = self.occurrence_counts.len();
        for i in 0..n {
            self.cooccurrence_counts[i][i] = self.occurrence_counts[i];
        }
        let prob = |count: usize, total: usize| if total > 0 { count as f64 / total as f64 } else { 0.0 };

        for i in 0..n {
            self.occurrence_probs[i] = prob(self.occurrence_counts[i], self.num_viable);
        }
        for i in 0..n {
            for j in 0..n {
                let joint = prob(self.cooccurrence_counts[i][j], self.num_viable);
                let denom = if i == j {
                    self.occurrence_probs[i]
                } else {
                    self.occurrence_probs[i] * self.occurrence_probs[j]
                };
                let ratio = if denom != 0.0 { joint / denom } else { 0.0 };
                let pmi = if ratio != 0.0 { ratio.log2() } else { 0.0 };
                let jsi = if joint != 0.0 { -joint.log2() } else { 0.0 };

                self.joint_probs[i][j] = joint;
                self.pmi[i][j] = pmi;
                self.jsi[i][j] = jsi;
                self.npmi[i][j] = if jsi != 0.0 { pmi / jsi } else { 0.0 };
            }
        }

        let env_a: Vec<usize> = tasks.env_a_tasks().into_iter().collect();
        let env_b: Vec<usize> = tasks.env_b_tasks().into_iter().collect();
        let within = |set: &[usize]| -> f64 {
            let mut sum = 0.0;
            for (k, &i) in set.iter().enumerate() {
                for &j in &set[k + 1..] {
                    sum += self.npmi[i][j];
                }
            }
            sum
        };
        self.expected_npmi = within(&env_a) + within(&env_b);
        self.unexpected_npmi = env_a
            .iter()
            .flat_map(|&i| env_b.iter().map(move |&j| (i, j)))
            .map(|(i, j)| -self.npmi[i][j])
            .sum();
    }

    pub fn total_npmi(&self) -> f64 {
        self.expected_npmi + self.unexpected_npmi
    }

    pub fn prop_viable(&self) -> f64 {
        if self.total_mutants > 0 {
            self.num_viable as f64 / self.total_mutants as f64
        } else {
            0.0
        }
    }

    /// Run-summary fields.
    pub fn summary_record(&self) -> Record {
        let mut r = Record::new();
        r.insert("total_mutants", self.total_mutants);
        r.insert("num_viable", self.num_viable);
        r.insert("prop_viable", self.prop_viable());
        r.insert("num_unique_viable_phenotypes", self.num_unique_viable_phenotypes);
        r.insert("entropy_viable_phenotypes", self.entropy_viable_phenotypes);
        r.insert("expected_npmi", self.expected_npmi);
        r.insert("unexpected_npmi", self.unexpected_npmi);
        r.insert("total_npmi", self.total_npmi());
        r.insert("num_viable_mutants_lose_tasks", self.num_viable_mutants_lose_tasks);
        r.insert("num_viable_mutants_lose_multiple_tasks", self.num_viable_mutants_lose_multiple_tasks);
        r.insert("num_viable_mutants_gain_tasks", self.num_viable_mutants_gain_tasks);
        r.insert("num_viable_mutants_gain_multiple_tasks", self.num_viable_mutants_gain_multiple_tasks);
        r.insert("num_viable_mutants_improve_env_a", self.num_viable_mutants_improve_env_a);
        r.insert("num_viable_mutants_improve_env_b", self.num_viable_mutants_improve_env_b);
        r.insert("avg_dist_to_ancestor", self.avg_dist_to_ancestor);
        r.insert("avg_match_score_env_a", self.avg_match_score_env_a);
        r.insert("avg_match_score_env_b", self.avg_match_score_env_b);
        r.insert("avg_num_tasks_gained", self.avg_num_tasks_gained);
        r.insert("avg_num_tasks_lost", self.avg_num_tasks_lost);
        r.insert("avg_match_chg_toward_env_a", self.avg_match_chg_toward_env_a);
        r.insert("avg_match_chg_toward_env_b", self.avg_match_chg_toward_env_b);
        r.insert("orig_match_score_env_a", self.orig_match_score_env_a);
        r.insert("orig_match_score_env_b", self.orig_match_score_env_b);
        r
    }

    /// Co-occurrence statistics of tasks `i` and `j`.
    pub fn pair_stats(&self, i: usize, j: usize) -> Record {
        let mut r = Record::new();
        r.insert("task_1_id", i);
        r.insert("task_2_id", j);
        r.insert("task_1_name", &self.task_names[i]);
        r.insert("task_2_name", &self.task_names[j]);
        r.insert("task_1_prob", self.occurrence_probs[i]);
        r.insert("task_2_prob", self.occurrence_probs[j]);
        r.insert("task_1_count", self.occurrence_counts[i]);
        r.insert("task_2_count", self.occurrence_counts[j]);
        r.insert("pmi", self.pmi[i][j]);
        r.insert("npmi", self.npmi[i][j]);
        r.insert("joint_prob", self.joint_probs[i][j]);
        r.insert("joint_count", self.cooccurrence_counts[i][j]);
        r
    }

    /// One row per unordered task pair (`i < j`), then one per task with itself.
    pub fn cooccurrence_rows(&self, run_fields: &Record) -> Vec<Record> {
        let n = self.task_names.len();
        let pairs = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .chain((0..n).map(|i| (i, i)));
        pairs
            .map(|(i, j)| {
                let mut row = run_fields.clone();
                row.extend(&self.pair_stats(i, j));
                row
            })
            .collect()
    }

    pub fn distance_rows(&self, run_fields: &Record, replicate_id: usize) -> Vec<Record> {
        (0..self.distances_to_env_a.len())
            .map(|distance| {
                let mut row = run_fields.clone();
                row.insert("distance", distance);
                row.insert("replicate_id", replicate_id);
                row.insert("count_env_a", self.distances_to_env_a[distance]);
                row.insert("count_env_b", self.distances_to_env_b[distance]);
                row
            })
            .collect()
    }

    pub fn phenotype_rows(&self, run_fields: &Record) -> Vec<Record> {
        let or_missing = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_else(|| "-1".to_string());
        self.phenotype_distribution
            .iter()
            .map(|bucket| {
                let mut row = run_fields.clone();
                row.insert("phenotype", &bucket.phenotype);
                row.insert("count", bucket.count);
                row.insert("is_ancestor", u8::from(bucket.is_ancestor));
                row.insert("match_score_a", or_missing(bucket.match_score_a));
                row.insert("match_score_b", or_missing(bucket.match_score_b));
                row.insert("dist_to_ancestor", or_missing(bucket.dist_to_ancestor));
                row
            })
            .collect()
    }
}

/// Shannon entropy (base 2) of a count distribution; 0 when empty.
pub fn entropy<I: IntoIterator<Item = usize>>(counts: I) -> f64 {
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> TaskConfig {
        TaskConfig {
            tasks: vec!["not".into(), "nand".into(), "and".into(), "ornot".into()],
            env_a: vec!["not".into(), "and".into()],
            env_b: vec!["nand".into(), "ornot".into()],
            ..TaskConfig::default()
        }
    }

    fn mutant(viable: &str, bits: &str) -> Record {
        let mut r = Record::from_pairs([("is_viable_(0/1)", viable)]);
        for (name, bit) in tasks().tasks.iter().zip(bits.chars()) {
            r.insert(name.as_str(), if bit == '1' { "2" } else { "0" });
        }
        r
    }

    fn sample() -> LandscapeAnalysis {
        let rows = vec![
            mutant("1", "1010"),
            mutant("1", "1000"),
            mutant("0", "0000"),
            mutant("1", "1010"),
            mutant("1", "0101"),
            // original
            mutant("1", "1010"),
        ];
        LandscapeAnalysis::from_rows(&rows, &tasks()).unwrap()
    }

    #[test]
    fn test_counts_and_probabilities() {
        let a = sample();
        assert_eq!(a.total_mutants, 5);
        assert_eq!(a.num_viable, 4);
        assert_eq!(a.num_nonviable, 1);
        assert_eq!(a.occurrence_counts, vec![3, 1, 2, 1]);
        assert_eq!(a.cooccurrence_counts[0][2], 2);
        assert_eq!(a.cooccurrence_counts[2][0], 2);
        assert_eq!(a.cooccurrence_counts[0][0], 3);
        assert!((a.occurrence_probs[0] - 0.75).abs() < 1e-12);
        assert!((a.prop_viable() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_pmi_and_npmi() {
        let a = sample();
        // p(not,and) = 0.5, p(not) = 0.75, p(and) = 0.5
        let expected_pmi = (0.5f64 / (0.75 * 0.5)).log2();
        assert!((a.pmi[0][2] - expected_pmi).abs() < 1e-12);
        assert!((a.jsi[0][2] - 1.0).abs() < 1e-12);
        assert!((a.npmi[0][2] - expected_pmi).abs() < 1e-12);
        // never co-occur
        assert_eq!(a.pmi[0][1], 0.0);
        assert_eq!(a.npmi[0][1], 0.0);
        // self pair: p(i,i)/p(i) = 1 -> pmi 0
        assert_eq!(a.pmi[0][0], 0.0);
    }

    #[test]
    fn test_phenotype_distribution_and_entropy() {
        let a = sample();
        assert_eq!(a.num_unique_viable_phenotypes, 3);
        let phenotypes: Vec<_> = a.phenotype_distribution.iter().map(|b| b.phenotype.as_str()).collect();
        assert_eq!(phenotypes, vec!["1010", "1000", "0101", NONVIABLE]);
        // ancestor bucket starts at 1 and gains two identical mutants
        assert_eq!(a.phenotype_distribution[0].count, 3);
        assert_eq!(a.phenotype_distribution[3].count, 1);
        // counts 2,1,1 over 4
        assert!((a.entropy_viable_phenotypes - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_gains_losses_and_averages() {
        let a = sample();
        assert_eq!(a.num_viable_mutants_lose_tasks, 2);
        assert_eq!(a.num_viable_mutants_lose_multiple_tasks, 1);
        assert_eq!(a.num_viable_mutants_gain_tasks, 1);
        assert_eq!(a.num_viable_mutants_gain_multiple_tasks, 1);
        assert_eq!(a.num_viable_mutants_improve_env_b, 2);
        assert_eq!(a.orig_match_score_env_a, 4);
        // losses: 1 + 2 over two losing mutants
        assert!((a.avg_num_tasks_lost - 1.5).abs() < 1e-12);
        assert!((a.avg_num_tasks_gained - 2.0).abs() < 1e-12);
        assert_eq!(a.distances_to_env_a, vec![2, 1, 0, 0, 1]);
    }

    #[test]
    fn test_undefined_averages_are_negative_one() {
        let rows = vec![mutant("0", "0000"), mutant("1", "1010")];
        let a = LandscapeAnalysis::from_rows(&rows, &tasks()).unwrap();
        assert_eq!(a.avg_dist_to_ancestor, -1.0);
        assert_eq!(a.entropy_viable_phenotypes, 0.0);
        assert_eq!(a.expected_npmi, 0.0);
    }

    #[test]
    fn test_row_shapes() {
        let a = sample();
        let run = Record::from_pairs([("RANDOM_SEED", "3")]);
        assert_eq!(a.cooccurrence_rows(&run).len(), 6 + 4);
        assert_eq!(a.distance_rows(&run, 1).len(), 5);
        let phen = a.phenotype_rows(&run);
        assert_eq!(phen.last().unwrap().get("match_score_a").unwrap(), "-1");
    }
}

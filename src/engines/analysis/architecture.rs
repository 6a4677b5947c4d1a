use super::classifier::KnockoutTable;
use super::genotypes::GenotypeRows;
use crate::config::TaskConfig;
use crate::engines::evaluation::KnockoutLayout;
use crate::error::{KolandscapeError, Result};
use crate::types::{Observation, Record, TaskSet};
use rayon::prelude::*;
use serde::Serialize;

/// Single-knockout category of a site, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteCategory {
    Viability,
    EnvAb,
    EnvA,
    EnvB,
    Neutral,
}

impl SiteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viability => "viability",
            Self::EnvAb => "env_ab",
            Self::EnvA => "env_a",
            Self::EnvB => "env_b",
            Self::Neutral => "neutral",
        }
    }
}

/// What a single-site knockout reveals about one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteArchitecture {
    pub site: usize,
    /// Knockout is inviable.
    pub viability: bool,
    /// Tasks lost by a viable knockout.
    pub tasks: TaskSet,
    pub encodes_env_a_task: bool,
    pub encodes_env_b_task: bool,
}

impl SiteArchitecture {
    pub fn category(&self) -> SiteCategory {
        match (self.viability, self.encodes_env_a_task, self.encodes_env_b_task) {
            (true, _, _) => SiteCategory::Viability,
            (false, true, true) => SiteCategory::EnvAb,
            (false, true, false) => SiteCategory::EnvA,
            (false, false, true) => SiteCategory::EnvB,
            (false, false, false) => SiteCategory::Neutral,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenotypeArchitecture {
    pub genotype_id: i64,
    pub tree_depth: String,
    pub update_born: Option<i64>,
    pub control: Observation,
    pub sites: Vec<SiteArchitecture>,
}

impl GenotypeArchitecture {
    pub fn viability_sites(&self) -> usize {
        self.sites.iter().filter(|s| s.viability).count()
    }

    pub fn task_sites(&self) -> usize {
        self.sites.iter().filter(|s| !s.tasks.is_empty()).count()
    }

    pub fn multi_task_sites(&self) -> usize {
        self.sites.iter().filter(|s| s.tasks.len() > 1).count()
    }

    pub fn task_env_a_sites(&self) -> usize {
        self.sites.iter().filter(|s| s.encodes_env_a_task).count()
    }

    pub fn task_env_b_sites(&self) -> usize {
        self.sites.iter().filter(|s| s.encodes_env_b_task).count()
    }

    pub fn num_tasks_performed(&self) -> usize {
        self.control.phenotype.tasks().len()
    }

    /// `extant_*` run-summary fields.
    pub fn extant_summary(&self) -> Record {
        let mut record = Record::new();
        record.insert("extant_num_viability_sites", self.viability_sites());
        record.insert("extant_num_task_sites", self.task_sites());
        record.insert("extant_num_multi_task_sites", self.multi_task_sites());
        record.insert("extant_num_task_env_a_sites", self.task_env_a_sites());
        record.insert("extant_num_task_env_b_sites", self.task_env_b_sites());
        record.insert("extant_num_tasks_performed", self.num_tasks_performed());
        record
    }

    /// One long-form row per site, prefixed with the run's identifying fields.
    pub fn long_form(&self, run_fields: &Record, tasks: &TaskConfig) -> Vec<Record> {
        self.sites
            .iter()
            .map(|site| {
                let mut row = run_fields.clone();
                row.insert("genotype_id", self.genotype_id);
                row.insert("tree_depth", &self.tree_depth);
                row.insert("site", site.site);
                row.insert("cyclic_category", site.category().as_str());
                row.insert("tasks", format!("[{}]", tasks.join_names(&site.tasks)));
                row.insert("viability", u8::from(site.viability));
                row
            })
            .collect()
    }
}

/// Classify every site of one genotype from its single knockouts.
pub fn analyze_sites(table: &KnockoutTable, tasks: &TaskConfig) -> Result<Vec<SiteArchitecture>> {
    let control = table
        .control()
        .ok_or_else(|| KolandscapeError::Completeness("no control (ko_pos = -1) row".to_string()))?;
    let env_a = tasks.env_a_tasks();
    let env_b = tasks.env_b_tasks();

    (0..table.genome_len())
        .map(|site| {
            let knockout = table.single(site).ok_or_else(|| {
                KolandscapeError::Completeness(format!("no single knockout of site {}", site))
            })?;
            let lost = knockout.tasks_lost(control);
            Ok(SiteArchitecture {
                site,
                viability: !knockout.viable,
                encodes_env_a_task: !lost.is_disjoint(&env_a),
                encodes_env_b_task: !lost.is_disjoint(&env_b),
                tasks: lost,
            })
        })
        .collect()
}

pub fn analyze_genotype(
    group: &GenotypeRows,
    tasks: &TaskConfig,
) -> Result<GenotypeArchitecture> {
    let layout = KnockoutLayout::Single;
    let genome_len = group.genome_len(layout, &tasks.sequence_field)?;
    let table = KnockoutTable::from_rows(&group.rows, layout, tasks, genome_len)?;
    let sites = analyze_sites(&table, tasks)?;
    let control = table
        .control()
        .cloned()
        .ok_or_else(|| KolandscapeError::Completeness("no control (ko_pos = -1) row".to_string()))?;

    Ok(GenotypeArchitecture {
        genotype_id: group.genotype_id,
        tree_depth: group.tree_depth(layout)?,
        update_born: group.update_born(layout)?,
        control,
        sites,
    })
}

/// Architecture of every genotype along a lineage, in genotype-id order.
pub fn lineage_architecture(
    groups: &[GenotypeRows],
    tasks: &TaskConfig,
) -> Result<Vec<GenotypeArchitecture>> {
    groups
        .par_iter()
        .map(|group| analyze_genotype(group, tasks))
        .collect()
}

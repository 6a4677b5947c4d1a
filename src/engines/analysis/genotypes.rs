use crate::engines::evaluation::KnockoutLayout;
use crate::error::{KolandscapeError, Result};
use crate::types::{KnockoutSite, Record, NO_SITE};
use std::collections::BTreeMap;

/// All knockout rows that belong to one source genotype.
#[derive(Debug, Clone)]
pub struct GenotypeRows {
    pub genotype_id: i64,
    pub rows: Vec<Record>,
}

impl GenotypeRows {
    /// The unmodified genome's row: `-1` in any `ko_pos` column.
    pub fn control(&self, layout: KnockoutLayout) -> Result<&Record> {
        let is_control = |row: &&Record| -> bool {
            let sentinel = NO_SITE.to_string();
            match layout {
                KnockoutLayout::Single => row.get_opt("ko_pos") == Some(sentinel.as_str()),
                KnockoutLayout::Pairwise => {
                    row.get_opt("ko_pos_0") == Some(sentinel.as_str())
                        || row.get_opt("ko_pos_1") == Some(sentinel.as_str())
                }
            }
        };
        self.rows.iter().find(is_control).ok_or_else(|| {
            KolandscapeError::Completeness(format!(
                "genotype {} has no control row",
                self.genotype_id
            ))
        })
    }

    /// Genome length, taken from the control row's sequence.
    pub fn genome_len(&self, layout: KnockoutLayout, sequence_field: &str) -> Result<usize> {
        Ok(self.control(layout)?.get(sequence_field)?.trim().chars().count())
    }

    /// `update_born` of the control row, if the table carries it.
    pub fn update_born(&self, layout: KnockoutLayout) -> Result<Option<i64>> {
        let control = self.control(layout)?;
        if control.contains("update_born") {
            Ok(Some(control.get_i64("update_born")?))
        } else {
            Ok(None)
        }
    }

    pub fn tree_depth(&self, layout: KnockoutLayout) -> Result<String> {
        Ok(self.control(layout)?.get("tree_depth")?.to_string())
    }
}

/// Split a knockout table by `genotype_id`, ordered by id.
pub fn group_by_genotype(rows: Vec<Record>) -> Result<Vec<GenotypeRows>> {
    let mut groups: BTreeMap<i64, Vec<Record>> = BTreeMap::new();
    for row in rows {
        let id = row.get_i64("genotype_id")?;
        groups.entry(id).or_default().push(row);
    }
    Ok(groups
        .into_iter()
        .map(|(genotype_id, rows)| GenotypeRows { genotype_id, rows })
        .collect())
}

/// Genotype with the greatest `update_born`; the earliest id wins ties.
pub fn extant_index(update_born: &[Option<i64>]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, born) in update_born.iter().enumerate() {
        let born = born.unwrap_or(i64::MIN);
        match best {
            Some((_, best_born)) if born <= best_born => {}
            _ => best = Some((i, born)),
        }
    }
    best.map(|(i, _)| i)
}

/// Site of a back-labelled row; `Control` for the unmodified genome.
pub fn row_site(row: &Record, layout: KnockoutLayout, genome_len: usize) -> Result<KnockoutSite> {
    match layout {
        KnockoutLayout::Single => KnockoutSite::from_ko_pos(row.get("ko_pos")?, genome_len),
        KnockoutLayout::Pairwise => {
            KnockoutSite::from_ko_pos_pair(row.get("ko_pos_0")?, row.get("ko_pos_1")?, genome_len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, ko_pos: &str, seq: &str, born: &str) -> Record {
        Record::from_pairs([
            ("genotype_id", id),
            ("ko_pos", ko_pos),
            ("genome_sequence", seq),
            ("update_born", born),
            ("tree_depth", "4"),
        ])
    }

    #[test]
    fn test_grouping_is_ordered_by_id() {
        let rows = vec![
            row("10", "-1", "abc", "5"),
            row("2", "-1", "ab", "7"),
            row("10", "0", "Xbc", "5"),
        ];
        let groups = group_by_genotype(rows).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].genotype_id, 2);
        assert_eq!(groups[1].rows.len(), 2);
        assert_eq!(groups[1].genome_len(KnockoutLayout::Single, "genome_sequence").unwrap(), 3);
        assert_eq!(groups[0].update_born(KnockoutLayout::Single).unwrap(), Some(7));
    }

    #[test]
    fn test_missing_control() {
        let groups = group_by_genotype(vec![row("0", "1", "Xb", "0")]).unwrap();
        assert!(matches!(
            groups[0].control(KnockoutLayout::Single),
            Err(KolandscapeError::Completeness(_))
        ));
    }

    #[test]
    fn test_extant_first_wins_ties() {
        assert_eq!(extant_index(&[Some(3), Some(9), Some(9)]), Some(1));
        assert_eq!(extant_index(&[None, Some(0)]), Some(1));
        assert_eq!(extant_index(&[None, None]), Some(0));
        assert_eq!(extant_index(&[]), None);
    }
}

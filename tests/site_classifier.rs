use kolandscape::engines::analysis::{
    classify, KnockoutTable, PairCoverage, PairEffect, SiteClassification, SiteClassifier,
};
use kolandscape::engines::generation::knockouts::all_pairs;
use kolandscape::types::{KnockoutSite, Observation, Phenotype, SitePair};
use kolandscape::KolandscapeError;
use std::collections::BTreeSet;

fn obs(viable: bool, tasks: &[bool]) -> Observation {
    Observation::new(Phenotype::new(tasks.to_vec()), viable)
}

/// Complete table whose observations come from `phenotype(knocked_out_sites)`.
fn table_from<F>(genome_len: usize, phenotype: F) -> KnockoutTable
where
    F: Fn(&[usize]) -> Observation,
{
    let mut table = KnockoutTable::new(genome_len);
    table.insert(KnockoutSite::Control, phenotype(&[]));
    for site in 0..genome_len {
        table.insert(KnockoutSite::Single(site), phenotype(&[site]));
    }
    for pair in all_pairs(genome_len) {
        table.insert(KnockoutSite::Pair(pair), phenotype(&[pair.low(), pair.high()]));
    }
    table
}

fn sites(values: &[usize]) -> BTreeSet<usize> {
    values.iter().copied().collect()
}

fn classify_all(table: &KnockoutTable) -> SiteClassification {
    classify(table, PairCoverage::Complete).unwrap()
}

#[test]
fn test_independent_coding_sites() {
    // "AABB": site 0 alone codes task 0, site 2 alone codes task 1
    let table = table_from(4, |ko| obs(true, &[!ko.contains(&0), !ko.contains(&2)]));
    let result = classify_all(&table);

    assert_eq!(result.coding_sites(0), &sites(&[0]));
    assert_eq!(result.coding_sites(1), &sites(&[2]));
    for task in 0..2 {
        assert!(result.redundant_sites(task).is_empty());
        assert!(result.recovery_sites(task).is_empty());
    }
    assert!(result.viability_sites().is_empty());
    assert_eq!(result.pairs_classified(), 6);
}

#[test]
fn test_redundant_pair() {
    let table = table_from(4, |ko| {
        let both = ko.contains(&0) && ko.contains(&1);
        obs(true, &[!both, true])
    });
    let result = classify_all(&table);

    assert!(result.coding_sites(0).is_empty());
    assert_eq!(result.redundant_sites(0), &sites(&[0, 1]));
    assert!(result.all_coded_tasks(0).contains(&0));
    assert!(result.all_coded_tasks(1).contains(&0));
    assert!(result.all_coded_tasks(2).is_empty());
}

#[test]
fn test_recovery_site() {
    let table = table_from(6, |ko| {
        let lost = ko.contains(&3) && !ko.contains(&5);
        obs(true, &[true, !lost])
    });
    let result = classify_all(&table);

    assert_eq!(result.coding_sites(1), &sites(&[3]));
    assert_eq!(result.recovery_sites(1), &sites(&[5]));
    assert!(result.recovered_tasks(5).contains(&1));
    assert!(result.recovered_tasks(3).is_empty());
}

#[test]
fn test_inviable_pair_skips_task_rules() {
    // Site 4 alone loses task 0 and stays viable; sites 4 and 6 together are
    // lethal. Read as task data, the lethal pair would look like site 6
    // rescuing task 0.
    let table = table_from(8, |ko| {
        if ko.contains(&4) && ko.contains(&6) {
            obs(false, &[false, false])
        } else {
            obs(true, &[!ko.contains(&4), true])
        }
    });
    let result = classify_all(&table);

    assert_eq!(result.coding_sites(0), &sites(&[4]));
    assert_eq!(result.viability_redundant_sites(), &sites(&[4, 6]));
    assert!(result.viability_sites().is_empty());
    assert!(!result.recovery_sites(0).contains(&6));
    for task in 0..2 {
        assert!(result.redundant_sites(task).is_empty());
        assert!(result.recovery_sites(task).is_empty());
    }
}

#[test]
fn test_lethal_pair_with_lethal_single_rescues_nothing() {
    // Site 0 is lethal alone and site 1 codes task 0. The double knockout is
    // lethal too, which leaves viability neutral for the pair.
    let table = table_from(3, |ko| {
        if ko.contains(&0) {
            obs(false, &[false])
        } else {
            obs(true, &[!ko.contains(&1)])
        }
    });
    let result = classify_all(&table);

    assert_eq!(result.viability_sites(), &sites(&[0]));
    assert_eq!(result.coding_sites(0), &sites(&[1]));
    assert!(result.viability_recovery_sites().is_empty());
    assert!(result.recovery_sites(0).is_empty());
    assert!(result.recovered_tasks(0).is_empty());
}

#[test]
fn test_viability_recovery_skips_task_rules() {
    // Site 1 is lethal alone; knocking out 2 as well restores viability but
    // loses task 0, which would otherwise look like redundancy.
    let table = table_from(4, |ko| match (ko.contains(&1), ko.contains(&2)) {
        (true, true) => obs(true, &[false, true]),
        (true, false) => obs(false, &[false, false]),
        _ => obs(true, &[true, true]),
    });
    let result = classify_all(&table);

    assert_eq!(result.viability_sites(), &sites(&[1]));
    assert_eq!(result.viability_recovery_sites(), &sites(&[2]));
    assert!(result.redundant_sites(0).is_empty());
    assert!(result.all_coded_tasks(2).is_empty());
}

#[test]
fn test_pair_order_is_symmetric() {
    assert_eq!(SitePair::new(2, 0).unwrap(), SitePair::new(0, 2).unwrap());
    assert!(SitePair::new(3, 3).is_err());

    let forward = table_from(3, |ko| obs(true, &[!(ko.contains(&0) && ko.contains(&2))]));
    let mut reversed = KnockoutTable::new(3);
    reversed.insert(KnockoutSite::Control, obs(true, &[true]));
    for site in 0..3 {
        reversed.insert(KnockoutSite::Single(site), obs(true, &[true]));
    }
    for (p, q) in [(2, 0), (1, 0), (2, 1)] {
        let lost = (p, q) == (2, 0);
        reversed.insert(KnockoutSite::Pair(SitePair::new(p, q).unwrap()), obs(true, &[!lost]));
    }

    assert_eq!(classify_all(&forward), classify_all(&reversed));
}

#[test]
fn test_result_independent_of_pair_order() {
    let table = table_from(6, |ko| {
        let t0 = !(ko.contains(&0) && ko.contains(&4));
        let t1 = !ko.contains(&2) || ko.contains(&5);
        let viable = !(ko.contains(&1) && ko.contains(&3));
        obs(viable, &[t0, t1])
    });

    let pairs: Vec<(SitePair, Observation)> =
        table.pairs().map(|(p, o)| (*p, o.clone())).collect();
    let mut forward = SiteClassifier::new(&table).unwrap();
    for (pair, paired) in &pairs {
        forward.classify_pair(*pair, paired).unwrap();
    }
    let mut backward = SiteClassifier::new(&table).unwrap();
    for (pair, paired) in pairs.iter().rev() {
        backward.classify_pair(*pair, paired).unwrap();
    }

    let forward = forward.finish();
    assert_eq!(forward, backward.finish());
    assert_eq!(forward, classify_all(&table));
    assert_eq!(forward.redundant_sites(0), &sites(&[0, 4]));
    assert_eq!(forward.recovery_sites(1), &sites(&[5]));
    assert_eq!(forward.viability_redundant_sites(), &sites(&[1, 3]));
}

#[test]
fn test_repeated_pair_is_ignored() {
    let table = table_from(3, |_| obs(true, &[true]));
    let mut classifier = SiteClassifier::new(&table).unwrap();
    let pair = SitePair::new(0, 1).unwrap();
    let lethal = obs(false, &[false]);
    assert_eq!(classifier.classify_pair(pair, &lethal).unwrap(), PairEffect::Redundant);
    assert_eq!(
        classifier.classify_pair(pair, &obs(true, &[true])).unwrap(),
        PairEffect::Neutral
    );
    assert_eq!(classifier.num_classified(), 1);
    assert_eq!(classifier.finish().viability_redundant_sites(), &sites(&[0, 1]));
}

#[test]
fn test_missing_pair_is_a_completeness_error() {
    let mut table = KnockoutTable::new(3);
    table.insert(KnockoutSite::Control, obs(true, &[true]));
    for site in 0..3 {
        table.insert(KnockoutSite::Single(site), obs(true, &[true]));
    }
    table.insert(KnockoutSite::Pair(SitePair::new(0, 1).unwrap()), obs(true, &[true]));

    let err = classify(&table, PairCoverage::Complete).unwrap_err();
    assert!(matches!(err, KolandscapeError::Completeness(_)));

    // sampled coverage accepts exactly the pairs present
    let sampled = classify(&table, PairCoverage::Sampled).unwrap();
    assert_eq!(sampled.pairs_classified(), 1);
}

#[test]
fn test_missing_single_knockout_is_a_completeness_error() {
    let mut table = KnockoutTable::new(2);
    table.insert(KnockoutSite::Control, obs(true, &[true]));
    table.insert(KnockoutSite::Single(0), obs(true, &[true]));

    let err = SiteClassifier::new(&table).unwrap_err();
    assert!(matches!(err, KolandscapeError::Completeness(_)));
}

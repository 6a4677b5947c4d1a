use kolandscape::engines::analysis::{
    hamming_dist, simple_match_coeff, KnockoutTable, PairEffect, SiteClassification,
    SiteClassifier,
};
use kolandscape::engines::generation::knockouts::{all_pairs, pair_count};
use kolandscape::engines::generation::{
    build_paired_knockouts, build_single_knockouts, generate_point_mutants, Genome,
};
use kolandscape::types::{KnockoutSite, Observation, Phenotype, SitePair};
use proptest::prelude::*;

const ALPHABET: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

fn obs((viable, t0, t1): (bool, bool, bool)) -> Observation {
    Observation::new(Phenotype::new(vec![t0, t1]), viable)
}

/// Genome length, then one observation per variant: control, singles, pairs.
fn knockout_tables() -> impl Strategy<Value = (usize, Vec<(bool, bool, bool)>)> {
    (2usize..7).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(any::<(bool, bool, bool)>(), 1 + n + pair_count(n)),
        )
    })
}

fn build_table(n: usize, observations: &[(bool, bool, bool)]) -> (KnockoutTable, Vec<(SitePair, Observation)>) {
    let mut table = KnockoutTable::new(n);
    let (control, rest) = observations.split_first().unwrap();
    table.insert(KnockoutSite::Control, obs((true, control.1, control.2)));
    for site in 0..n {
        table.insert(KnockoutSite::Single(site), obs(rest[site]));
    }
    let pairs: Vec<(SitePair, Observation)> = all_pairs(n)
        .into_iter()
        .zip(&rest[n..])
        .map(|(pair, &o)| (pair, obs(o)))
        .collect();
    for (pair, o) in &pairs {
        table.insert(KnockoutSite::Pair(*pair), o.clone());
    }
    (table, pairs)
}

fn is_subset(before: &SiteClassification, after: &SiteClassification) -> bool {
    (0..2).all(|t| {
        before.coding_sites(t).is_subset(after.coding_sites(t))
            && before.redundant_sites(t).is_subset(after.redundant_sites(t))
            && before.recovery_sites(t).is_subset(after.recovery_sites(t))
    }) && before.viability_sites().is_subset(after.viability_sites())
        && before
            .viability_redundant_sites()
            .is_subset(after.viability_redundant_sites())
        && before
            .viability_recovery_sites()
            .is_subset(after.viability_recovery_sites())
}

proptest! {
    #[test]
    fn point_mutants_differ_at_one_site(sequence in "[a-e]{1,12}") {
        let genome = Genome::from(sequence.as_str());
        let mutants = generate_point_mutants(&genome, &ALPHABET).unwrap();
        prop_assert_eq!(mutants.len(), genome.len() * (ALPHABET.len() - 1));
        for mutant in &mutants {
            prop_assert_eq!(mutant.differing_sites(&genome).len(), 1);
        }
    }

    #[test]
    fn knockout_set_sizes(sequence in "[a-z]{0,15}") {
        let genome = Genome::from(sequence.as_str());
        let n = genome.len();

        let singles = build_single_knockouts(&genome, 'X');
        prop_assert_eq!(singles.len(), n + 1);
        prop_assert_eq!(&singles[0].genome, &genome);
        for variant in &singles[1..] {
            prop_assert_eq!(variant.genome.differing_sites(&genome).len(), 1);
        }

        let pairs = build_paired_knockouts(&genome, 'X');
        prop_assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2 + 1);
        for variant in &pairs[1..] {
            prop_assert_eq!(variant.genome.differing_sites(&genome).len(), 2);
        }
    }

    #[test]
    fn classification_ignores_pair_order(
        (n, observations) in knockout_tables(),
        seed in any::<u64>(),
    ) {
        let (table, pairs) = build_table(n, &observations);

        let mut order: Vec<usize> = (0..pairs.len()).collect();
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(seed);
        rand::seq::SliceRandom::shuffle(order.as_mut_slice(), &mut rng);

        let mut canonical = SiteClassifier::new(&table).unwrap();
        for (pair, o) in &pairs {
            canonical.classify_pair(*pair, o).unwrap();
        }
        let mut shuffled = SiteClassifier::new(&table).unwrap();
        for &i in &order {
            shuffled.classify_pair(pairs[i].0, &pairs[i].1).unwrap();
        }

        prop_assert_eq!(canonical.finish(), shuffled.finish());
    }

    #[test]
    fn classification_sets_only_grow(
        (n, observations) in knockout_tables(),
    ) {
        let (table, pairs) = build_table(n, &observations);
        let mut classifier = SiteClassifier::new(&table).unwrap();
        let mut previous = classifier.clone().finish();
        for (pair, o) in pairs.iter().rev() {
            classifier.classify_pair(*pair, o).unwrap();
            let current = classifier.clone().finish();
            prop_assert!(is_subset(&previous, &current));
            previous = current;
        }
    }

    #[test]
    fn match_plus_hamming_is_length(bits in prop::collection::vec(any::<(bool, bool)>(), 0..24)) {
        let a: String = bits.iter().map(|&(x, _)| if x { '1' } else { '0' }).collect();
        let b: String = bits.iter().map(|&(_, y)| if y { '1' } else { '0' }).collect();
        let matches = simple_match_coeff(&a, &b).unwrap();
        let distance = hamming_dist(&a, &b).unwrap();
        prop_assert_eq!(matches + distance, bits.len());
    }

    #[test]
    fn viability_pairs_never_classify_tasks(
        (n, observations) in knockout_tables(),
    ) {
        let (table, pairs) = build_table(n, &observations);
        for (pair, o) in &pairs {
            let mut classifier = SiteClassifier::new(&table).unwrap();
            let effect = classifier.classify_pair(*pair, o).unwrap();
            if effect != PairEffect::Neutral || !o.viable {
                let result = classifier.finish();
                for task in 0..2 {
                    prop_assert!(result.redundant_sites(task).is_empty());
                    prop_assert!(result.recovery_sites(task).is_empty());
                }
            }
        }
    }
}

use crate::engines::generation::genome::Genome;
use crate::types::{KnockoutSite, SitePair};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

/// One genome submitted to the simulator, tagged with the site(s) it knocks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnockoutVariant {
    pub site: KnockoutSite,
    pub genome: Genome,
}

/// Unmodified control followed by one knockout per site (`len + 1` entries).
pub fn build_single_knockouts(genome: &Genome, noop: char) -> Vec<KnockoutVariant> {
    let mut variants = Vec::with_capacity(genome.len() + 1);
    variants.push(control(genome));
    variants.extend((0..genome.len()).map(|pos| KnockoutVariant {
        site: KnockoutSite::Single(pos),
        genome: genome.with_knockouts(&[pos], noop),
    }));
    variants
}

/// Unmodified control followed by every unordered pair of distinct sites,
/// `(0,1), (0,2), .., (n-2,n-1)`: `C(n,2) + 1` entries.
pub fn build_paired_knockouts(genome: &Genome, noop: char) -> Vec<KnockoutVariant> {
    let mut variants = Vec::with_capacity(pair_count(genome.len()) + 1);
    variants.push(control(genome));
    variants.extend(all_pairs(genome.len()).into_iter().map(|pair| pair_variant(genome, pair, noop)));
    variants
}

/// Like [`build_paired_knockouts`] but over a uniform sample of `sample_size`
/// pairs. The sampled pairs are emitted in canonical order.
pub fn sample_paired_knockouts(
    genome: &Genome,
    noop: char,
    sample_size: usize,
    rng: &mut StdRng,
) -> Vec<KnockoutVariant> {
    let pairs = all_pairs(genome.len());
    let sampled: BTreeSet<SitePair> = if sample_size >= pairs.len() {
        pairs.into_iter().collect()
    } else {
        pairs.choose_multiple(rng, sample_size).copied().collect()
    };

    let mut variants = Vec::with_capacity(sampled.len() + 1);
    variants.push(control(genome));
    variants.extend(sampled.into_iter().map(|pair| pair_variant(genome, pair, noop)));
    variants
}

/// Number of unordered site pairs in a genome of length `n`.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

pub fn all_pairs(n: usize) -> Vec<SitePair> {
    let mut pairs = Vec::with_capacity(pair_count(n));
    for a in 0..n {
        pairs.extend(((a + 1)..n).filter_map(|b| SitePair::new(a, b).ok()));
    }
    pairs
}

fn control(genome: &Genome) -> KnockoutVariant {
    KnockoutVariant {
        site: KnockoutSite::Control,
        genome: genome.clone(),
    }
}

fn pair_variant(genome: &Genome, pair: SitePair, noop: char) -> KnockoutVariant {
    KnockoutVariant {
        site: KnockoutSite::Pair(pair),
        genome: genome.with_knockouts(&[pair.low(), pair.high()], noop),
    }
}

/// Builds the knockout sets submitted for one genotype.
pub struct KnockoutSetBuilder {
    noop: char,
    pair_sample_size: Option<usize>,
    rng: StdRng,
}

impl KnockoutSetBuilder {
    pub fn new(noop: char, pair_sample_size: Option<usize>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            noop,
            pair_sample_size,
            rng,
        }
    }

    pub fn noop(&self) -> char {
        self.noop
    }

    pub fn single(&self, genome: &Genome) -> Vec<KnockoutVariant> {
        build_single_knockouts(genome, self.noop)
    }

    /// Control, every single-site knockout, then all (or the sampled) pairs.
    /// Single-site entries are what the pairwise classifier compares pairs against.
    pub fn pairwise(&mut self, genome: &Genome) -> Vec<KnockoutVariant> {
        let paired = match self.pair_sample_size {
            Some(k) => sample_paired_knockouts(genome, self.noop, k, &mut self.rng),
            None => build_paired_knockouts(genome, self.noop),
        };
        let total = paired.len() + genome.len();
        if total > 10_000 {
            log::warn!(
                "Pairwise knockout set for a {}-site genome has {} variants",
                genome.len(),
                total
            );
        }

        let mut variants = build_single_knockouts(genome, self.noop);
        variants.extend(paired.into_iter().skip(1));
        variants
    }
}

use crate::engines::generation::genome::Genome;
use crate::error::{KolandscapeError, Result};

/// All single-site substitutions of `genome` over `alphabet`.
///
/// Position-major, alphabet order within a position, so the output is
/// identical across runs. Yields `len * (alphabet.len() - 1)` genomes.
pub fn generate_point_mutants(genome: &Genome, alphabet: &[char]) -> Result<Vec<Genome>> {
    let mut mutants = Vec::with_capacity(genome.len() * alphabet.len().saturating_sub(1));

    for (pos, &current) in genome.symbols().iter().enumerate() {
        if !alphabet.contains(&current) {
            return Err(KolandscapeError::Configuration(format!(
                "symbol '{}' at site {} is not in the instruction alphabet",
                current, pos
            )));
        }
        for &symbol in alphabet {
            if symbol != current {
                mutants.push(genome.with_substitution(pos, symbol));
            }
        }
    }

    Ok(mutants)
}

/// Mutants within `steps` (1 or 2) substitutions of `genome`.
///
/// For two steps each one-step mutant is followed directly by its own point
/// mutants. The unmutated genome is appended once at the end. Duplicates are
/// kept; every entry is evaluated independently.
pub fn generate_landscape(genome: &Genome, alphabet: &[char], steps: u8) -> Result<Vec<Genome>> {
    let one_step = generate_point_mutants(genome, alphabet)?;

    let mut mutants = match steps {
        1 => one_step,
        2 => {
            let mut all = Vec::new();
            for mutant in one_step {
                let second_step = generate_point_mutants(&mutant, alphabet)?;
                all.push(mutant);
                all.extend(second_step);
            }
            all
        }
        other => {
            return Err(KolandscapeError::Configuration(format!(
                "mutational steps must be 1 or 2, got {}",
                other
            )))
        }
    };

    mutants.push(genome.clone());
    log::debug!("Generated {} landscape genomes ({}-step)", mutants.len(), steps);
    Ok(mutants)
}

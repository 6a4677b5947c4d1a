use crate::error::{KolandscapeError, Result};

/// Number of positions at which `a` and `b` agree.
pub fn simple_match_coeff(a: &str, b: &str) -> Result<usize> {
    let (a, b) = equal_length(a, b)?;
    Ok(a.iter().zip(&b).filter(|(x, y)| x == y).count())
}

/// Number of positions at which `a` and `b` differ.
pub fn hamming_dist(a: &str, b: &str) -> Result<usize> {
    let (a, b) = equal_length(a, b)?;
    Ok(a.iter().zip(&b).filter(|(x, y)| x != y).count())
}

fn equal_length(a: &str, b: &str) -> Result<(Vec<char>, Vec<char>)> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() != b.len() {
        return Err(KolandscapeError::Format(format!(
            "cannot compare strings of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok((a, b))
}

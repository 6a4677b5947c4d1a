use crate::error::{KolandscapeError, Result};
use std::collections::HashMap;
use std::path::Path;

const MAX_INSTRUCTIONS: usize = 52;

/// Bijection between instruction names and the single-character codes used in
/// genome sequences. Codes are assigned in file order: `a..z`, then `A..Z`.
#[derive(Debug, Clone)]
pub struct InstructionMap {
    names: Vec<String>,
    codes: Vec<char>,
    by_name: HashMap<String, char>,
    by_code: HashMap<char, usize>,
}

impl InstructionMap {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KolandscapeError::missing_file(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for line in content.trim().lines() {
            let line = line.trim();
            if !line.starts_with("INST") || line.starts_with("INSTSET") {
                continue;
            }
            let name = line.split_whitespace().nth(1).ok_or_else(|| {
                KolandscapeError::Configuration(format!("instruction line without a name: '{}'", line))
            })?;
            if names.iter().any(|n| n == name) {
                return Err(KolandscapeError::Configuration(format!(
                    "instruction '{}' declared twice",
                    name
                )));
            }
            names.push(name.to_string());
        }

        if names.len() > MAX_INSTRUCTIONS {
            return Err(KolandscapeError::Configuration(format!(
                "{} instructions declared; at most {} can be encoded",
                names.len(),
                MAX_INSTRUCTIONS
            )));
        }

        let codes: Vec<char> = (0..names.len()).map(Self::code_for_index).collect();
        let by_name = names.iter().cloned().zip(codes.iter().copied()).collect();
        let by_code = codes.iter().copied().enumerate().map(|(i, c)| (c, i)).collect();

        Ok(Self {
            names,
            codes,
            by_name,
            by_code,
        })
    }

    fn code_for_index(i: usize) -> char {
        if i < 26 {
            (b'a' + i as u8) as char
        } else {
            (b'A' + (i - 26) as u8) as char
        }
    }

    pub fn code_of(&self, name: &str) -> Option<char> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, code: char) -> Option<&str> {
        self.by_code.get(&code).map(|&i| self.names[i].as_str())
    }

    /// Code for an instruction the pipeline cannot run without.
    pub fn require(&self, name: &str) -> Result<char> {
        self.code_of(name).ok_or_else(|| {
            KolandscapeError::Configuration(format!(
                "'{}' instruction not included in the instruction set. Found instructions: {:?}",
                name, self.names
            ))
        })
    }

    /// Instruction codes in file order.
    pub fn alphabet(&self) -> &[char] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INST_SET: &str = "
INSTSET heads_default:hw_type=0
INST nop-A
INST nop-B
INST nop-C
INST if-n-equ
# INST commented-out
INST nop-X
";

    #[test]
    fn test_codes_follow_file_order() {
        let map = InstructionMap::parse(INST_SET).unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map.code_of("nop-A"), Some('a'));
        assert_eq!(map.code_of("nop-X"), Some('e'));
        assert_eq!(map.name_of('d'), Some("if-n-equ"));
        assert_eq!(map.alphabet(), &['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn test_uppercase_after_26() {
        let content: String = (0..30).map(|i| format!("INST inst-{}\n", i)).collect();
        let map = InstructionMap::parse(&content).unwrap();
        assert_eq!(map.code_of("inst-25"), Some('z'));
        assert_eq!(map.code_of("inst-26"), Some('A'));
        assert_eq!(map.code_of("inst-29"), Some('D'));
    }

    #[test]
    fn test_missing_noop_is_configuration_error() {
        let map = InstructionMap::parse("INST nop-A\nINST nop-B\n").unwrap();
        assert!(matches!(
            map.require("nop-X"),
            Err(KolandscapeError::Configuration(_))
        ));
    }

    #[test]
    fn test_too_many_instructions() {
        let content: String = (0..53).map(|i| format!("INST inst-{}\n", i)).collect();
        assert!(InstructionMap::parse(&content).is_err());
    }
}

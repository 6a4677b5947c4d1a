#![allow(dead_code)]

use kolandscape::config::AppConfig;
use kolandscape::engines::evaluation::{collect_outputs, AnalyzeRequest, Simulator};
use kolandscape::Result;
use std::cell::Cell;
use std::path::{Path, PathBuf};

pub const NOOP: char = 'e';

pub const INST_SET: &str = "INSTSET heads_default:hw_type=0
INST nop-A
INST nop-B
INST nop-C
INST if-n-equ
INST nop-X
";

/// Two genotypes of a lineage; the second is born last.
pub const LINEAGE: &str = "# Legend:
# 1: ID
# 2: Update Born
# 3: Tree Depth
# 4: Genome Sequence

1 0 0 abcdabcd
2 50 3 abcdaacd
";

pub const CMD_LOG: &str = "./avida -set EVENT_FILE events_env-cyclic_rate-10.cfg -set RANDOM_SEED 1 -set COPY_MUT_PROB 0.0025\n";

/// Phenotype of a genome in which `NOOP` marks knocked-out sites:
/// site 0 is lethal alone, sites 6 and 7 are lethal together, site 1 codes
/// `not`, sites 2 and 3 redundantly code `nand`, site 4 codes `and` unless
/// site 5 is knocked out too, and `or` is always performed.
pub fn phenotype(sequence: &str) -> (bool, [u32; 6]) {
    let s: Vec<char> = sequence.chars().collect();
    let ko = |i: usize| s.get(i) == Some(&NOOP);
    let viable = !ko(0) && !(ko(6) && ko(7));
    if !viable {
        return (false, [0; 6]);
    }
    let not = u32::from(!ko(1));
    let nand = u32::from(!(ko(2) && ko(3)));
    let and = u32::from(!(ko(4) && !ko(5)));
    (true, [not, nand, and, 0, 1, 0])
}

const TASK_TITLES: [&str; 6] = ["Not", "Nand", "And", "Ornot", "Or", "Andnot"];

/// Stands in for Avida's analyze mode: reads the script's `LOAD_SEQUENCE`
/// and `DETAIL` commands and writes legend-style detail files.
#[derive(Default)]
pub struct FakeAvida {
    pub calls: Cell<usize>,
}

impl FakeAvida {
    fn legend(column: &str) -> String {
        match column {
            "sequence" => "Genome Sequence".to_string(),
            "viable" => "Is Viable (0/1)".to_string(),
            "gest_time" => "Gestation Time".to_string(),
            other => {
                let index: usize = other.trim_start_matches("task.").parse().unwrap();
                TASK_TITLES[index].to_string()
            }
        }
    }

    fn value(column: &str, sequence: &str) -> String {
        let (viable, tasks) = phenotype(sequence);
        match column {
            "sequence" => sequence.to_string(),
            "viable" => u8::from(viable).to_string(),
            "gest_time" => if viable { "389" } else { "0" }.to_string(),
            other => {
                let index: usize = other.trim_start_matches("task.").parse().unwrap();
                tasks[index].to_string()
            }
        }
    }

    fn write_detail(run_dir: &Path, output: &str, columns: &[&str], sequences: &[String]) {
        let mut content = String::from("#filetype genotype_data\n# Mode 1 Test CPU Analysis\n\n# Legend:\n");
        for (i, column) in columns.iter().enumerate() {
            content.push_str(&format!("# {}: {}\n", i + 1, Self::legend(column)));
        }
        content.push('\n');
        for sequence in sequences {
            let values: Vec<String> = columns.iter().map(|c| Self::value(c, sequence)).collect();
            content.push_str(&values.join(" "));
            content.push('\n');
        }
        let path = run_dir.join(output);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

impl Simulator for FakeAvida {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<PathBuf>> {
        self.calls.set(self.calls.get() + 1);
        let script = std::fs::read_to_string(request.run_dir.join(&request.analyze_file))?;
        let mut batch = Vec::new();
        for line in script.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.first() {
                Some(&"PURGE_BATCH") => batch.clear(),
                Some(&"LOAD_SEQUENCE") => batch.push(tokens[1].to_string()),
                Some(&"DETAIL") => Self::write_detail(&request.run_dir, tokens[1], &tokens[2..], &batch),
                _ => {}
            }
        }
        collect_outputs(&request.run_dir, &request.outputs)
    }
}

pub fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// Config with mutant details written where the landscape aggregation looks.
pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.landscape.analysis_output = "data/mutants.dat".to_string();
    config
}

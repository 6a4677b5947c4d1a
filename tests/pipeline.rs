mod common;

use common::{config, write, FakeAvida, INST_SET, LINEAGE};
use kolandscape::data::connectors::{CsvConnector, DatReader};
use kolandscape::engines::evaluation::{KnockoutPipeline, MutantPipeline, PipelinePaths};
use kolandscape::engines::generation::{ChannelProgressCallback, ConsoleProgressCallback, ProgressMessage};
use kolandscape::KolandscapeError;
use std::path::Path;

fn paths(root: &Path, output: &str) -> PipelinePaths {
    PipelinePaths {
        inst_set: write(&root.join("instset.cfg"), INST_SET),
        input: write(&root.join("lineage.dat"), LINEAGE),
        run_dir: root.to_path_buf(),
        output: root.join("data").join(output),
    }
}

#[test]
fn test_single_knockouts_are_back_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let simulator = FakeAvida::default();
    let (tx, rx) = std::sync::mpsc::channel();
    let mut progress = ChannelProgressCallback::new(tx);

    let report = KnockoutPipeline::new(&config, &simulator)
        .run_single(&paths(dir.path(), "knockouts.csv"), &mut progress)
        .unwrap();

    assert_eq!(report.genotypes, 2);
    assert_eq!(report.variants, 18);
    assert_eq!(simulator.calls.get(), 1);
    let messages: Vec<ProgressMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 2);

    let rows = CsvConnector::load_records(&report.output).unwrap();
    assert_eq!(rows.len(), 18);
    let control = &rows[0];
    assert_eq!(control.get("ko_pos").unwrap(), "-1");
    assert_eq!(control.get("genotype_id").unwrap(), "0");
    assert_eq!(control.get("genome_sequence").unwrap(), "abcdabcd");
    assert_eq!(rows[1].get("genome_sequence").unwrap(), "ebcdabcd");
    assert_eq!(rows[1].get("is_viable_(0/1)").unwrap(), "0");

    let last = &rows[17];
    assert_eq!(last.get("genotype_id").unwrap(), "1");
    assert_eq!(last.get("ko_pos").unwrap(), "7");
    assert_eq!(last.get("update_born").unwrap(), "50");
    assert_eq!(last.get("tree_depth").unwrap(), "3");
}

#[test]
fn test_pairwise_knockouts_cover_every_pair() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let simulator = FakeAvida::default();

    let report = KnockoutPipeline::new(&config, &simulator)
        .run_pairwise(&paths(dir.path(), "pairwise-knockouts.csv"), &mut ConsoleProgressCallback)
        .unwrap();

    // control + 8 singles + C(8,2) pairs, first genotype only
    assert_eq!(report.genotypes, 1);
    assert_eq!(report.variants, 1 + 8 + 28);

    let rows = CsvConnector::load_records(&report.output).unwrap();
    assert_eq!(rows[0].get("ko_pos_0").unwrap(), "-1");
    assert_eq!(rows[0].get("ko_pos_1").unwrap(), "-1");
    assert_eq!(rows[3].get("ko_pos_0").unwrap(), "2");
    assert_eq!(rows[3].get("ko_pos_1").unwrap(), "2");
    assert_eq!(rows[9].get("ko_pos_0").unwrap(), "0");
    assert_eq!(rows[9].get("ko_pos_1").unwrap(), "1");
    assert_eq!(rows[9].get("genome_sequence").unwrap(), "eecdabcd");
}

#[test]
fn test_sampled_pairwise_knockouts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.knockouts.pair_sample_size = Some(5);
    config.knockouts.seed = Some(11);
    config.knockouts.cleanup = true;
    let simulator = FakeAvida::default();

    let report = KnockoutPipeline::new(&config, &simulator)
        .run_pairwise(&paths(dir.path(), "pairwise-knockouts.csv"), &mut ConsoleProgressCallback)
        .unwrap();

    assert_eq!(report.variants, 1 + 8 + 5);
    assert!(!dir.path().join(&config.knockouts.pairwise_analyze_file).exists());
    assert!(!dir.path().join("knockouts/pairwise_knockouts_id-0.dat").exists());
}

#[test]
fn test_missing_noop_instruction() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.knockouts.noop_instruction = "nop-Z".to_string();
    let simulator = FakeAvida::default();

    let err = KnockoutPipeline::new(&config, &simulator)
        .run_single(&paths(dir.path(), "knockouts.csv"), &mut ConsoleProgressCallback)
        .unwrap_err();
    assert!(matches!(err, KolandscapeError::Configuration(_)));
    assert_eq!(simulator.calls.get(), 0);
}

#[test]
fn test_missing_run_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let simulator = FakeAvida::default();
    let mut paths = paths(dir.path(), "knockouts.csv");
    paths.run_dir = dir.path().join("no-such-run");

    let err = KnockoutPipeline::new(&config, &simulator)
        .run_single(&paths, &mut ConsoleProgressCallback)
        .unwrap_err();
    assert!(err.is_skippable());
}

#[test]
fn test_mutant_script_and_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.landscape.dump_dir = dir.path().join("dump").display().to_string();
    let inst_set = write(&dir.path().join("instset.cfg"), INST_SET);
    let input = write(&dir.path().join("dominant.dat"), LINEAGE);

    let pipeline = MutantPipeline::new(&config);
    let report = pipeline.write_script(&inst_set, &input).unwrap();
    assert_eq!(report.mutants, 8 * 4 + 1);
    let script = std::fs::read_to_string(&report.script).unwrap();
    assert!(script.starts_with("PURGE_BATCH"));
    assert_eq!(script.matches("LOAD_SEQUENCE").count(), 33);
    assert!(script.contains("DETAIL data/mutants.dat sequence viable task.0"));

    let run_dir = dir.path().join("RUN_1");
    std::fs::create_dir_all(&run_dir).unwrap();
    let detail = pipeline.analyze(&FakeAvida::default(), &report, &run_dir).unwrap();
    let table = DatReader::read(&detail, false).unwrap();
    assert_eq!(table.len(), 33);
    // the unmutated genome comes last
    assert_eq!(table.rows[32].get("genome_sequence").unwrap(), "abcdabcd");
}

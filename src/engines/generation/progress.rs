/// Progress hooks for the long per-run and per-genotype loops.
pub trait ProgressCallback: Send {
    fn on_run_start(&mut self, run: usize, total: usize, name: &str);
    fn on_run_skipped(&mut self, name: &str, reason: &str);
    fn on_genotype_complete(&mut self, genotype_id: usize, total: usize, variants: usize);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_run_start(&mut self, run: usize, total: usize, name: &str) {
        log::info!("Processing ({}/{}): {}", run + 1, total, name);
    }

    fn on_run_skipped(&mut self, name: &str, reason: &str) {
        log::warn!("Skipping {}: {}", name, reason);
    }

    fn on_genotype_complete(&mut self, genotype_id: usize, total: usize, variants: usize) {
        if genotype_id % 10 == 0 || genotype_id + 1 == total {
            log::info!(
                "  Knockouts built for genotype {}/{} ({} variants)",
                genotype_id + 1,
                total,
                variants
            );
        }
    }
}

/// Forwards progress events over a channel, e.g. to a supervising thread.
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    RunStart { run: usize, total: usize, name: String },
    RunSkipped { name: String, reason: String },
    GenotypeComplete { genotype_id: usize, total: usize, variants: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_run_start(&mut self, run: usize, total: usize, name: &str) {
        let _ = self.sender.send(ProgressMessage::RunStart {
            run,
            total,
            name: name.to_string(),
        });
    }

    fn on_run_skipped(&mut self, name: &str, reason: &str) {
        let _ = self.sender.send(ProgressMessage::RunSkipped {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }

    fn on_genotype_complete(&mut self, genotype_id: usize, total: usize, variants: usize) {
        let _ = self.sender.send(ProgressMessage::GenotypeComplete {
            genotype_id,
            total,
            variants,
        });
    }
}

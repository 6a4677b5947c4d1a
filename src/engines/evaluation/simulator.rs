use crate::config::SimulatorConfig;
use crate::error::{KolandscapeError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One analyze-mode invocation.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Working directory for the simulator process.
    pub run_dir: PathBuf,
    /// Analyze script, as passed on the command line.
    pub analyze_file: PathBuf,
    pub inst_set: Option<PathBuf>,
    /// Detail files the script is expected to produce, relative to `run_dir`.
    pub outputs: Vec<PathBuf>,
}

/// The external simulator, run synchronously.
pub trait Simulator {
    /// Run the analyze script and return the paths of the produced detail files.
    fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<PathBuf>>;
}

pub struct AvidaSimulator {
    config: SimulatorConfig,
}

impl AvidaSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    fn command(&self, request: &AnalyzeRequest) -> Result<Command> {
        let mut cmd = Command::new(&self.config.executable);
        cmd.current_dir(&request.run_dir).args(&self.config.args);

        if let Some(inst_set) = &request.inst_set {
            let inst_set = std::fs::canonicalize(inst_set)
                .map_err(|_| KolandscapeError::missing_file(inst_set))?;
            cmd.arg("-def").arg("INST_SET").arg(inst_set);
        }
        cmd.arg("-set")
            .arg("VERBOSITY")
            .arg("0")
            .arg("-set")
            .arg("ANALYZE_FILE")
            .arg(&request.analyze_file)
            .arg("-a");

        let log = File::create(request.run_dir.join(&self.config.log_file))?;
        cmd.stdout(Stdio::from(log)).stderr(Stdio::null());
        Ok(cmd)
    }

    fn wait(&self, child: &mut std::process::Child) -> Result<ExitStatus> {
        let Some(limit) = self.config.timeout_secs.map(Duration::from_secs) else {
            return Ok(child.wait()?);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                return Err(KolandscapeError::ExternalProcess(format!(
                    "{} timed out after {}s",
                    self.config.executable,
                    limit.as_secs()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Simulator for AvidaSimulator {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<PathBuf>> {
        if !request.run_dir.is_dir() {
            return Err(KolandscapeError::missing_file(&request.run_dir));
        }
        clear_outputs(&request.run_dir, &request.outputs)?;
        let mut cmd = self.command(request)?;
        log::info!(
            "Running analyze mode in {}: {:?}",
            request.run_dir.display(),
            cmd
        );

        let mut child = cmd.spawn().map_err(|e| {
            KolandscapeError::ExternalProcess(format!(
                "failed to start {}: {}",
                self.config.executable, e
            ))
        })?;
        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(KolandscapeError::ExternalProcess(format!(
                "{} exited with {} (see {})",
                self.config.executable,
                status,
                request.run_dir.join(&self.config.log_file).display()
            )));
        }

        collect_outputs(&request.run_dir, &request.outputs)
    }
}

/// Stale detail files from an earlier invocation must not pass for fresh output.
fn clear_outputs(run_dir: &Path, outputs: &[PathBuf]) -> Result<()> {
    for rel in outputs {
        let path = run_dir.join(rel);
        if path.exists() {
            log::debug!("Removing stale output {}", path.display());
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Resolve expected outputs under `run_dir`; any absent file is a `MissingFile`.
pub fn collect_outputs(run_dir: &Path, outputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    outputs
        .iter()
        .map(|rel| {
            let path = run_dir.join(rel);
            if path.exists() {
                Ok(path)
            } else {
                Err(KolandscapeError::missing_file(path))
            }
        })
        .collect()
}

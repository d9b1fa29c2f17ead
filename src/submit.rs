//! Hand rendered wrapper scripts to the batch scheduler
//!
//! The scheduler command inherits stdio, so its job id (or complaint) goes straight to the
//! operator. Its exit status is returned unchanged.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::scheduler::Scheduler;
use crate::wrapper::job::JobPath;
use crate::wrapper::job_request::POWDER_NP;

/// LSF queue for powder generation
static LSF_QUEUE: &str = "psanaq";
/// Keep every slot on one host
static LSF_SPAN: &str = "span[hosts=1]";
/// bsub appends job output here, relative to the working directory
pub static LSF_LOG: &str = "powder.log";

impl JobPath {
    pub fn bsub_arguments(&self) -> Vec<OsString> {
        vec![
            "-q".into(),
            LSF_QUEUE.into(),
            "-n".into(),
            POWDER_NP.to_string().into(),
            "-R".into(),
            LSF_SPAN.into(),
            "-o".into(),
            LSF_LOG.into(),
            Path::new(".").join(self.script_name()).into_os_string(),
        ]
    }

    /// PBS directives live in the wrapper header, so qsub only needs the path
    pub fn qsub_arguments(&self) -> Vec<OsString> {
        vec![self.script_name()]
    }

    /// Schedulers run from the wrapper's directory, so the bare file name is enough
    fn script_name(&self) -> OsString {
        self.path.file_name().map(OsString::from).unwrap_or_else(|| self.path.clone().into_os_string())
    }

    /// Build the scheduler command without running it
    pub fn command(&self, scheduler: Scheduler) -> Command {
        let arguments = match scheduler {
            Scheduler::Lsf => self.bsub_arguments(),
            Scheduler::Pbs => self.qsub_arguments(),
        };

        let mut cmd = Command::new(scheduler.program());
        cmd.args(&arguments);
        if let Some(wd) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            cmd.current_dir(wd);
        }
        cmd
    }

    pub fn submit(&self, scheduler: Scheduler) -> Result<ExitStatus> {
        let status = execute(self.command(scheduler))?;
        if status.success() {
            info!("{} accepted {}", scheduler, self.path.display());
        }
        Ok(status)
    }
}

fn execute(mut cmd: Command) -> Result<ExitStatus> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    info!("Running {program} process");
    info!("{:?}", &cmd);

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute {program}"))?;
    if !status.success() {
        warn!("{program} exited with {status}");
    }

    Ok(status)
}

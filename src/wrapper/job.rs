use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::wrapper::job_request::JobRequest;
use crate::WorkingDirectory;

/// Environment initialisation sourced before the powder generator starts
static ENV_SETUP: &str = "/reg/g/psdm/etc/psconda.sh";
/// Value exported as `facility` for the analysis code
static FACILITY: &str = "LCLS";
/// Fixed wrapper name, every powder submission overwrites it
pub static POWDER_SCRIPT: &str = ".powder.sh";

static PBS_QUEUE: &str = "low";
static PBS_NODES: u32 = 1;
static PBS_PPN: u32 = 24;

/// A JobPath is the path to a wrapper script that's submitted with bsub or qsub
///
/// The scheduler reads the file independently, so it's never read back or deleted here.
#[derive(Debug)]
pub struct JobPath {
    pub path: PathBuf,
}

impl JobRequest {
    /// Render the LSF wrapper and write it to `.powder.sh`
    pub fn create_powder(&self, wd: &WorkingDirectory) -> Result<JobPath> {
        let script = render_powder(self)?;
        let path = wd.path.join(POWDER_SCRIPT);
        info!("Creating powder job in working directory {}", wd.path.display());
        script.write(&path)?;
        Ok(JobPath { path })
    }

    /// Render the PBS wrapper and write it to `.<name>.sh`
    pub fn create_peak2cxi(&self, wd: &WorkingDirectory) -> Result<JobPath> {
        let name = self.name.as_deref().context("peak2cxi jobs need a name")?;
        let script = render_peak2cxi(name, self)?;
        let path = wd.path.join(format!(".{name}.sh"));
        info!("Creating job {} in working directory {}", name, wd.path.display());
        script.write(&path)?;
        Ok(JobPath { path })
    }
}

/// Rendered wrapper script, ready to be written to disk
struct JobTemplate {
    content: String,
}

impl JobTemplate {
    /// Write the wrapper to disk, replacing any previous content, and mark it executable
    fn write(self, out_path: &Path) -> Result<()> {
        if out_path.exists() {
            warn!("{} already exists and will be overwritten", out_path.display());
        }
        info!("Writing wrapper script to {}", out_path.display());

        let mut file = File::create(out_path)
            .with_context(|| format!("Can't create wrapper script {}", out_path.display()))?;
        file.write_all(self.content.as_bytes())
            .with_context(|| format!("Can't write wrapper script {}", out_path.display()))?;
        set_executable(&file)
            .with_context(|| format!("Can't make {} executable", out_path.display()))?;

        Ok(())
    }
}

#[cfg(unix)]
fn set_executable(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Rendering context for the LSF powder wrapper
#[derive(Serialize)]
struct PowderContext {
    time_now: String,
    env_setup: String,
    facility: String,
    launch: String,
}

/// Rendering context for the PBS peak2cxi wrapper
#[derive(Serialize)]
struct Peak2CxiContext {
    name: String,
    queue: String,
    nodes: u32,
    ppn: u32,
    time_now: String,
    launch: String,
}

/// Templates contain shell text, so values must not be HTML escaped
fn template_engine<'a>(name: &'a str, template: &'a str) -> Result<TinyTemplate<'a>> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template(name, template)
        .with_context(|| format!("Invalid {name} template"))?;
    Ok(tt)
}

/// Render the powder wrapper using TinyTemplate
fn render_powder(job: &JobRequest) -> Result<JobTemplate> {
    /// included powder template
    static POWDER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/powder.txt"));
    let tt = template_engine("powder", POWDER)?;

    let context = PowderContext {
        time_now: Utc::now().to_string(),
        env_setup: ENV_SETUP.to_string(),
        facility: FACILITY.to_string(),
        launch: job.launch.command_line(),
    };

    let content = tt.render("powder", &context).context("Rendering powder wrapper")?;
    Ok(JobTemplate { content })
}

/// Render the PBS header and launch line using TinyTemplate
fn render_peak2cxi(name: &str, job: &JobRequest) -> Result<JobTemplate> {
    /// included peak2cxi template
    static PEAK2CXI: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/peak2cxi.txt"));
    let tt = template_engine("peak2cxi", PEAK2CXI)?;

    let context = Peak2CxiContext {
        name: name.to_string(),
        queue: PBS_QUEUE.to_string(),
        nodes: PBS_NODES,
        ppn: PBS_PPN,
        time_now: Utc::now().to_string(),
        launch: job.launch.command_line(),
    };

    let content = tt.render("peak2cxi", &context).context("Rendering peak2cxi wrapper")?;
    Ok(JobTemplate { content })
}

use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{error, info};

use crate::scheduler::Scheduler;
use crate::wrapper::job_request::{JobRequest, Toolchain, MPIRUN, PYTHON};

mod scheduler;
mod submit;
mod wrapper;

/// Directory that wrapper scripts are written to and submitted from
pub struct WorkingDirectory {
    pub path: PathBuf,
}

/// Submit MPI analysis jobs to LSF (bsub) or PBS (qsub)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Options {
    /// MPI launcher used in the wrapper script
    #[arg(long, global = true, env = "MPISUB_MPIRUN", default_value = MPIRUN)]
    mpirun: PathBuf,
    /// Python interpreter used in the wrapper script
    #[arg(long, global = true, env = "MPISUB_PYTHON", default_value = PYTHON)]
    python: PathBuf,
    /// Directory to write wrapper scripts into
    #[arg(long, global = true, default_value = ".")]
    work_dir: PathBuf,
    /// Write the wrapper script but don't submit it
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a peak powder on 12 slots of one LSF host (queue psanaq)
    Powder {
        /// Python program and its arguments, forwarded verbatim
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Convert peaks to CXI files with 2 MPI processes on PBS (queue low)
    Peak2cxi {
        /// Job name, also used for the wrapper file name
        name: String,
        /// Python program and its arguments, forwarded verbatim
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    info!("terve! starting up :)");

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let toolchain = Toolchain { mpirun: cli.options.mpirun, python: cli.options.python };
    let wd = WorkingDirectory { path: cli.options.work_dir };

    let (scheduler, job_path) = match cli.command {
        Commands::Powder { args } => {
            let job = JobRequest::powder(args, &toolchain);
            (Scheduler::Lsf, job.create_powder(&wd)?)
        }
        Commands::Peak2cxi { name, args } => {
            let job = JobRequest::peak2cxi(name, args, &toolchain);
            (Scheduler::Pbs, job.create_peak2cxi(&wd)?)
        }
    };

    if cli.options.dry_run {
        info!("--dry-run set, not submitting to {scheduler}");
        info!("{:?}", job_path.command(scheduler));
        return Ok(0);
    }

    let status = job_path.submit(scheduler)?;
    Ok(exit_code(status))
}

/// The scheduler's exit code becomes ours, a signal maps to failure
fn exit_code(status: ExitStatus) -> u8 {
    match status.code() {
        Some(code) => code.clamp(0, 255) as u8,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn powder_forwards_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["mpisub", "powder", "analyze.py", "--run", "42", "-o", "out.npz"]).unwrap();
        match cli.command {
            Commands::Powder { args } => assert_eq!(args, vec!["analyze.py", "--run", "42", "-o", "out.npz"]),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.options.dry_run);
        assert_eq!(cli.options.work_dir, PathBuf::from("."));
    }

    #[test]
    fn peak2cxi_takes_name_first() {
        let cli = Cli::try_parse_from(["mpisub", "--dry-run", "peak2cxi", "jobA", "analyze.py", "--run", "42"]).unwrap();
        match cli.command {
            Commands::Peak2cxi { name, args } => {
                assert_eq!(name, "jobA");
                assert_eq!(args, vec!["analyze.py", "--run", "42"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(cli.options.dry_run);
    }

    #[test]
    fn program_is_required() {
        assert!(Cli::try_parse_from(["mpisub", "peak2cxi", "jobA"]).is_err());
        assert!(Cli::try_parse_from(["mpisub", "powder"]).is_err());
    }

    #[test]
    fn toolchain_overrides() {
        let cli = Cli::try_parse_from([
            "mpisub", "--mpirun", "/opt/mpi/bin/mpirun", "--python", "python3", "powder", "a.py",
        ])
        .unwrap();
        assert_eq!(cli.options.mpirun, PathBuf::from("/opt/mpi/bin/mpirun"));
        assert_eq!(cli.options.python, PathBuf::from("python3"));
    }

    #[test]
    fn dry_run_writes_wrapper_without_submitting() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "mpisub", "--dry-run", "--mpirun", "mpirun", "--python", "python",
            "--work-dir", dir.path().to_str().unwrap(), "peak2cxi", "jobB", "b.py", "--flush",
        ])
        .unwrap();

        assert_eq!(run(cli).unwrap(), 0);
        let text = std::fs::read_to_string(dir.path().join(".jobB.sh")).unwrap();
        assert!(text.contains("#PBS -N jobB\n"));
        assert!(text.ends_with("mpirun -np 2 python b.py --flush\n"));
    }

    #[cfg(unix)]
    #[test]
    fn scheduler_exit_code_is_ours() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(2 << 8)), 2);
        // killed by SIGKILL
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 1);
    }
}

use std::path::PathBuf;

/// MPI launcher installed on the analysis nodes
pub static MPIRUN: &str = "/reg/neh/home/lixuanxuan/.conda/envs/click/bin/mpirun";
/// Python interpreter with mpi4py available
pub static PYTHON: &str = "/reg/neh/home/lixuanxuan/.conda/envs/click/bin/python";

/// Powder generation always runs on 12 slots of a single LSF host
pub const POWDER_NP: u32 = 12;
/// peak2cxi needs one master and at least one worker rank
pub const PEAK2CXI_NP: u32 = 2;

/// Paths used to build the MPI launch line
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub mpirun: PathBuf,
    pub python: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain { mpirun: PathBuf::from(MPIRUN), python: PathBuf::from(PYTHON) }
    }
}

/// A single `mpirun -np N python ...` invocation
#[derive(Debug, Clone)]
pub struct MpiLaunch {
    pub mpirun: PathBuf,
    pub python: PathBuf,
    pub np: u32,
    pub args: Vec<String>,
}

impl MpiLaunch {
    /// Fixed prefix followed by the operator's tokens, in order and unquoted
    pub fn command_line(&self) -> String {
        let mut line = format!("{} -np {} {}", self.mpirun.display(), self.np, self.python.display());
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone)]
pub struct JobRequest {
    /// PBS job name, also used for the wrapper file name
    pub name: Option<String>,
    pub launch: MpiLaunch,
}

impl JobRequest {
    pub fn powder(args: Vec<String>, toolchain: &Toolchain) -> JobRequest {
        JobRequest { name: None, launch: launch(args, POWDER_NP, toolchain) }
    }

    pub fn peak2cxi(name: String, args: Vec<String>, toolchain: &Toolchain) -> JobRequest {
        JobRequest { name: Some(name), launch: launch(args, PEAK2CXI_NP, toolchain) }
    }
}

fn launch(args: Vec<String>, np: u32, toolchain: &Toolchain) -> MpiLaunch {
    MpiLaunch {
        mpirun: toolchain.mpirun.clone(),
        python: toolchain.python.clone(),
        np,
        args,
    }
}

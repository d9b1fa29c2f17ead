use std::fmt;

/// Batch schedulers that wrapper scripts can be submitted to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scheduler {
    Lsf,
    Pbs,
}

impl Scheduler {
    /// Submission command, resolved on PATH
    pub fn program(&self) -> &'static str {
        match self {
            Scheduler::Lsf => "bsub",
            Scheduler::Pbs => "qsub",
        }
    }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scheduler::Lsf => write!(f, "lsf"),
            Scheduler::Pbs => write!(f, "pbs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programs() {
        assert_eq!(Scheduler::Lsf.program(), "bsub");
        assert_eq!(Scheduler::Pbs.program(), "qsub");
        assert_eq!(Scheduler::Pbs.to_string(), "pbs");
    }
}

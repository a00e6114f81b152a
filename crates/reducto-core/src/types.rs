use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_fail(self) -> bool {
        self == Verdict::Fail
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminateReason {
    BuildFailed,
    BuildTimeout,
    TestTimeout,
}

impl IndeterminateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndeterminateReason::BuildFailed => "build failed",
            IndeterminateReason::BuildTimeout => "build timed out",
            IndeterminateReason::TestTimeout => "test timed out",
        }
    }
}

/// What an evaluation actually observed, before it is collapsed into a
/// [`Verdict`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Reproduced,
    NotReproduced,
    Indeterminate(IndeterminateReason),
}

impl Outcome {
    /// Only a confirmed reproduction counts as `Fail`.
    pub fn verdict(self) -> Verdict {
        match self {
            Outcome::Reproduced => Verdict::Fail,
            Outcome::NotReproduced | Outcome::Indeterminate(_) => Verdict::Pass,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinimizeStats {
    pub initial_len: usize,
    pub final_len: usize,
    pub oracle_calls: u64,
    pub partition_shrinks: u64,
    pub complement_shrinks: u64,
    pub granularity_increases: u64,
    pub final_granularity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleCounters {
    pub evaluations: u64,
    pub reproduced: u64,
    pub not_reproduced: u64,
    pub indeterminate: u64,
}

impl OracleCounters {
    pub fn record(&mut self, outcome: Outcome) {
        self.evaluations += 1;
        match outcome {
            Outcome::Reproduced => self.reproduced += 1,
            Outcome::NotReproduced => self.not_reproduced += 1,
            Outcome::Indeterminate(_) => self.indeterminate += 1,
        }
    }
}

use std::fmt;

pub type RunId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    New,
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Started,
    Pass,
    Fail,
}

impl RunStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "STARTED",
            RunStatus::Pass => "PASS",
            RunStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Shard execution record lifecycle. Transitions are monotonic within a run:
/// NotStarted -> Started -> {Pass, Fail}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    NotStarted,
    Started,
    Pass,
    Fail,
}

impl ShardStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShardStatus::Pass | ShardStatus::Fail)
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            ShardStatus::NotStarted => "NOT_STARTED",
            ShardStatus::Started => "STARTED",
            ShardStatus::Pass => "PASS",
            ShardStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ShardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl std::str::FromStr for ShardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(ShardStatus::NotStarted),
            "STARTED" => Ok(ShardStatus::Started),
            "PASS" => Ok(ShardStatus::Pass),
            "FAIL" => Ok(ShardStatus::Fail),
            other => Err(format!("unrecognized shard status: {other}")),
        }
    }
}

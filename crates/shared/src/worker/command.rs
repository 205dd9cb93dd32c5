use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Messages the page may post to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    /// Activate a waiting worker without waiting for old clients to close
    SkipWaiting,
}

impl WorkerCommand {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "SKIP_WAITING",
        }
    }
}

impl Display for WorkerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown worker command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for WorkerCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_wire_format() {
        assert_eq!(serde_json::to_string(&WorkerCommand::SkipWaiting).unwrap(), "\"SKIP_WAITING\"");
        assert_eq!("SKIP_WAITING".parse::<WorkerCommand>(), Ok(WorkerCommand::SkipWaiting));
        assert_eq!(
            "skipWaiting".parse::<WorkerCommand>(),
            Err(UnknownCommand("skipWaiting".to_string()))
        );
    }
}

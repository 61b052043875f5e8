use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical pipeline stages, in column display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lead,
    Contacted,
    Proposal,
    Won,
    Lost,
}

/// Stage names from the previous pipeline schema. Still present in older
/// records, so they are translated on read rather than rejected.
pub const LEGACY_STAGE_ALIASES: &[(&str, Stage)] = &[
    ("new", Stage::Lead),
    ("qualified", Stage::Contacted),
    ("quoted", Stage::Proposal),
];

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Lead,
        Stage::Contacted,
        Stage::Proposal,
        Stage::Won,
        Stage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Contacted => "contacted",
            Self::Proposal => "proposal",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Column index in display order.
    pub fn index(&self) -> usize {
        match self {
            Self::Lead => 0,
            Self::Contacted => 1,
            Self::Proposal => 2,
            Self::Won => 3,
            Self::Lost => 4,
        }
    }

    /// Won and lost deals are closed and cannot be moved on the board.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// The status a deal carries once it sits in this stage.
    pub fn implied_status(&self) -> DealStatus {
        match self {
            Self::Won => DealStatus::Won,
            Self::Lost => DealStatus::Lost,
            _ => DealStatus::Open,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: canonical names only. Use [`map_stage`] for data coming
/// from the backend.
impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(Self::Lead),
            "contacted" => Ok(Self::Contacted),
            "proposal" => Ok(Self::Proposal),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

/// Translate any stage label into a canonical stage.
///
/// Canonical names pass through, legacy names go through
/// [`LEGACY_STAGE_ALIASES`], and everything else lands in `lead` so that a
/// deal with unexpected data still shows up on the board.
pub fn map_stage(raw: &str) -> Stage {
    if let Ok(stage) = raw.parse::<Stage>() {
        return stage;
    }
    LEGACY_STAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, stage)| *stage)
        .unwrap_or(Stage::Lead)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    #[default]
    Open,
    Won,
    Lost,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Lenient parse for backend data: unknown values count as open.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "won" => Self::Won,
            "lost" => Self::Lost,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

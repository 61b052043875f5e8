use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::stage::{DealStatus, Stage, map_stage};

/// Opaque deal identifier. The backend sends either a string or a number;
/// both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DealId(String);

impl DealId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DealId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DealId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for DealId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A sales opportunity as held by the board.
///
/// `stage` is always canonical: legacy and unknown labels are normalized when
/// the record is read. Fields the board does not model are kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDeal")]
pub struct Deal {
    pub id: DealId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub stage: Stage,
    pub status: DealStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Deal {
    /// Minimal open deal, mostly useful for fixtures.
    pub fn new(id: impl Into<DealId>, stage: Stage) -> Self {
        Self {
            id: id.into(),
            title: None,
            amount: None,
            currency: None,
            stage,
            status: stage.implied_status(),
            next_action_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Column the deal is shown in. A won/lost status outranks the stage
    /// label.
    pub fn display_stage(&self) -> Stage {
        match self.status {
            DealStatus::Won => Stage::Won,
            DealStatus::Lost => Stage::Lost,
            DealStatus::Open => self.stage,
        }
    }

    /// Closed deals are locked on the board.
    pub fn is_locked(&self) -> bool {
        self.display_stage().is_terminal()
    }

    /// Set the stage together with the status it implies.
    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.status = stage.implied_status();
    }
}

#[derive(Deserialize)]
struct RawDeal {
    id: DealId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    amount: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    next_action_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawDeal> for Deal {
    fn from(raw: RawDeal) -> Self {
        let stage = map_stage(raw.stage.as_deref().unwrap_or_default());
        let status = match raw.status.as_deref() {
            Some(s) => DealStatus::from_raw(s),
            None => stage.implied_status(),
        };
        Self {
            id: raw.id,
            title: raw.title,
            amount: raw.amount,
            currency: raw.currency,
            stage,
            status,
            next_action_at: raw.next_action_at,
            extra: raw.extra,
        }
    }
}

/// Amounts arrive as numbers or as decimal strings ("1200.50").
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts RFC 3339 timestamps and bare dates; anything else is dropped.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc()))
}

/// Payload for creating a deal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDeal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// One page of the deal listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealPage {
    pub items: Vec<Deal>,
    #[serde(default)]
    pub total: u64,
}

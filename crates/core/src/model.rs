use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::shape::FIXED_LIST_LEN;

/// Placeholder the model writes for anything it could not determine.
pub const SENTINEL: &str = "-";

/// Upper bound on idea length, in characters.
pub const MAX_IDEA_CHARS: usize = 2000;

/// Inbound request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeaSubmission {
    #[serde(default)]
    pub idea: String,
}

/// Structured analysis of one idea, as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub summary: String,
    pub evaluation: Evaluation,
    #[serde(deserialize_with = "text_list")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub market: Market,
    pub differentiation: Differentiation,
    pub risk: RiskProfile,
    pub feasibility: Feasibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub size_estimation: String,
    #[serde(deserialize_with = "text_list")]
    pub target_users: Vec<String>,
    pub pain_points: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Differentiation {
    pub unique_value: String,
    #[serde(deserialize_with = "competitor_list")]
    pub competitive_landscape: Vec<Competitor>,
    #[serde(deserialize_with = "text_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub competitor: String,
    pub weakness: String,
}

impl Competitor {
    pub fn sentinel() -> Self {
        Self {
            competitor: SENTINEL.to_string(),
            weakness: SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(deserialize_with = "risk_list")]
    pub technical: Vec<Risk>,
    #[serde(deserialize_with = "risk_list")]
    pub market: Vec<Risk>,
    #[serde(deserialize_with = "risk_list")]
    pub regulatory: Vec<Risk>,
    #[serde(deserialize_with = "risk_list")]
    pub financial: Vec<Risk>,
}

impl RiskProfile {
    /// Categories in report order, with their wire names.
    pub fn categories(&self) -> [(RiskCategory, &Vec<Risk>); 4] {
        [
            (RiskCategory::Technical, &self.technical),
            (RiskCategory::Market, &self.market),
            (RiskCategory::Regulatory, &self.regulatory),
            (RiskCategory::Financial, &self.financial),
        ]
    }

    pub fn categories_mut(&mut self) -> [(RiskCategory, &mut Vec<Risk>); 4] {
        [
            (RiskCategory::Technical, &mut self.technical),
            (RiskCategory::Market, &mut self.market),
            (RiskCategory::Regulatory, &mut self.regulatory),
            (RiskCategory::Financial, &mut self.financial),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCategory {
    Technical,
    Market,
    Regulatory,
    Financial,
}

impl RiskCategory {
    pub fn key(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Market => "market",
            Self::Regulatory => "regulatory",
            Self::Financial => "financial",
        }
    }

    /// Heading used in reports.
    pub fn title(self) -> &'static str {
        match self {
            Self::Technical => "기술 리스크",
            Self::Market => "시장 리스크",
            Self::Regulatory => "규제 리스크",
            Self::Financial => "재무 리스크",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub risk: String,
    pub level: RiskLevel,
    pub reason: String,
}

impl Risk {
    pub fn sentinel() -> Self {
        Self {
            risk: SENTINEL.to_string(),
            level: RiskLevel::Undetermined,
            reason: SENTINEL.to_string(),
        }
    }
}

/// Ordinal severity of a risk. `Undetermined` is the sentinel and ranks lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskLevel {
    Undetermined,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Undetermined => SENTINEL,
            Self::Low => "낮음",
            Self::Medium => "중간",
            Self::High => "높음",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "-" => Ok(Self::Undetermined),
            "낮음" | "low" => Ok(Self::Low),
            "중간" | "medium" => Ok(Self::Medium),
            "높음" | "high" => Ok(Self::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.label().to_string()
    }
}

/// Wire paths of the list fields that may arrive as the bare sentinel string.
pub const LIST_FIELDS: [&str; 9] = [
    "evaluation.market.targetUsers",
    "evaluation.differentiation.competitiveLandscape",
    "evaluation.differentiation.strengths",
    "evaluation.differentiation.weaknesses",
    "evaluation.risk.technical",
    "evaluation.risk.market",
    "evaluation.risk.regulatory",
    "evaluation.risk.financial",
    "recommendations",
];

// A list field holding the bare sentinel string decodes to its sentinel list.
fn sentinel_or_list<'de, D, T>(d: D, fill: impl FnOnce() -> Vec<T>) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::String(s) if s.trim() == SENTINEL => Ok(fill()),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    sentinel_or_list(d, || vec![SENTINEL.to_string()])
}

fn competitor_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Competitor>, D::Error> {
    sentinel_or_list(d, || vec![Competitor::sentinel(); FIXED_LIST_LEN])
}

fn risk_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Risk>, D::Error> {
    sentinel_or_list(d, || vec![Risk::sentinel(); FIXED_LIST_LEN])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feasibility {
    pub score: Rating,
    pub scale: Rating,
    pub justification: String,
}

/// Integer field that may carry the sentinel instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Rating {
    Value(i64),
    Undetermined,
}

impl Rating {
    pub fn value(self) -> Option<i64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undetermined => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Undetermined => f.write_str(SENTINEL),
        }
    }
}

impl TryFrom<Value> for Rating {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    return Ok(Self::Value(v));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Self::Value(f as i64))
                    }
                    _ => Err(format!("expected an integer, found {n}")),
                }
            }
            Value::String(s) if s.trim() == SENTINEL => Ok(Self::Undetermined),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Self::Value)
                .map_err(|_| format!("expected an integer, found \"{s}\"")),
            other => Err(format!("expected an integer, found {other}")),
        }
    }
}

impl From<Rating> for Value {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Value(v) => Value::from(v),
            Rating::Undetermined => Value::from(SENTINEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_accepts_labels_aliases_and_sentinel() {
        let levels: Vec<RiskLevel> =
            serde_json::from_str(r#"["낮음","Medium","HIGH","-"]"#).unwrap();
        assert_eq!(
            levels,
            vec![
                RiskLevel::Low,
                RiskLevel::Medium,
                RiskLevel::High,
                RiskLevel::Undetermined
            ]
        );
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), r#""높음""#);
        assert!(serde_json::from_str::<RiskLevel>(r#""critical""#).is_err());
    }

    #[test]
    fn risk_levels_are_ordinal() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::Undetermined < RiskLevel::Low);
    }

    #[test]
    fn rating_keeps_sentinel() {
        let r: Rating = serde_json::from_str(r#""-""#).unwrap();
        assert_eq!(r, Rating::Undetermined);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#""-""#);

        let r: Rating = serde_json::from_str("4.0").unwrap();
        assert_eq!(r, Rating::Value(4));
        assert!(serde_json::from_str::<Rating>("3.5").is_err());
        assert!(serde_json::from_str::<Rating>("true").is_err());
    }

    #[test]
    fn sentinel_string_in_list_field_expands() {
        let risks: RiskProfile = serde_json::from_str(
            r#"{"technical":"-","market":[],"regulatory":" - ","financial":[]}"#,
        )
        .unwrap();
        assert_eq!(risks.technical, vec![Risk::sentinel(); FIXED_LIST_LEN]);
        assert_eq!(risks.regulatory.len(), FIXED_LIST_LEN);
        assert!(risks.market.is_empty());

        let market: Market = serde_json::from_str(
            r#"{"sizeEstimation":"-","targetUsers":"-","painPoints":"-"}"#,
        )
        .unwrap();
        assert_eq!(market.target_users, vec!["-"]);

        let err = serde_json::from_str::<Market>(
            r#"{"sizeEstimation":"-","targetUsers":"모두","painPoints":"-"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected a sequence"));
    }

    #[test]
    fn missing_idea_field_is_empty() {
        let s: IdeaSubmission = serde_json::from_str("{}").unwrap();
        assert!(s.idea.is_empty());
    }
}

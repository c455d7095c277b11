use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidatorError, ValidatorResult};
use crate::model::{Competitor, Rating, Risk, ValidationResult, SENTINEL};

/// Number of competitors and of risks per category the analysis must list.
pub const FIXED_LIST_LEN: usize = 3;
/// Upper bound on recommendations.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// What to do with lists and strings that miss the expected shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPolicy {
    /// Any mismatch is a violation.
    #[default]
    Strict,
    /// Pad, truncate or fill with the sentinel, and record a warning.
    Lenient,
}

impl FromStr for ListPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown list policy '{other}' (expected strict|lenient)")),
        }
    }
}

impl fmt::Display for ListPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        })
    }
}

/// Shape decision for a decoded result. `Warn` means the reply was repaired
/// in place (only under [`ListPolicy::Lenient`], or when a sentinel string
/// stood in for a whole list); `Block` means it cannot be served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Warn,
    Block,
}

/// Result of checking a decoded result against the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeOutcome {
    pub decision: Decision,
    /// One note per repair, naming the field path.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// One note per unrepairable mismatch, naming the field path.
    #[serde(default)]
    pub violations: Vec<String>,
}

impl ShapeOutcome {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            warnings: vec![],
            violations: vec![],
        }
    }

    pub fn warn(mut self, msg: impl Into<String>) -> Self {
        if self.decision != Decision::Block {
            self.decision = Decision::Warn;
        }
        self.warnings.push(msg.into());
        self
    }

    pub fn block(mut self, msg: impl Into<String>) -> Self {
        self.decision = Decision::Block;
        self.violations.push(msg.into());
        self
    }

    /// Joins the violations into one `SchemaViolation`, or hands back the
    /// repair notes.
    pub fn into_result(self) -> ValidatorResult<Vec<String>> {
        match self.decision {
            Decision::Block => Err(ValidatorError::SchemaViolation(self.violations.join("; "))),
            Decision::Allow | Decision::Warn => Ok(self.warnings),
        }
    }
}

/// Checks (and under [`ListPolicy::Lenient`], repairs) the nested shape:
/// non-blank strings, exactly 3 competitors and 3 risks per category,
/// at most 3 recommendations and a score within `0..=scale`. Empty
/// open-ended lists are valid; the lenient policy fills them with `"-"`.
pub fn check_shape(result: &mut ValidationResult, policy: ListPolicy) -> ShapeOutcome {
    let mut c = Checker {
        policy,
        out: ShapeOutcome::allow(),
    };

    c.text(&mut result.summary, "summary");

    let market = &mut result.evaluation.market;
    c.text(&mut market.size_estimation, "evaluation.market.sizeEstimation");
    c.text_list(&mut market.target_users, "evaluation.market.targetUsers", None);
    c.text(&mut market.pain_points, "evaluation.market.painPoints");

    let diff = &mut result.evaluation.differentiation;
    c.text(&mut diff.unique_value, "evaluation.differentiation.uniqueValue");
    let path = "evaluation.differentiation.competitiveLandscape";
    c.exact_len(&mut diff.competitive_landscape, path, Competitor::sentinel);
    for (i, comp) in diff.competitive_landscape.iter_mut().enumerate() {
        c.text(&mut comp.competitor, &format!("{path}[{i}].competitor"));
        c.text(&mut comp.weakness, &format!("{path}[{i}].weakness"));
    }
    c.text_list(&mut diff.strengths, "evaluation.differentiation.strengths", None);
    c.text_list(&mut diff.weaknesses, "evaluation.differentiation.weaknesses", None);

    for (category, risks) in result.evaluation.risk.categories_mut() {
        let path = format!("evaluation.risk.{}", category.key());
        c.exact_len(risks, &path, Risk::sentinel);
        for (i, risk) in risks.iter_mut().enumerate() {
            c.text(&mut risk.risk, &format!("{path}[{i}].risk"));
            c.text(&mut risk.reason, &format!("{path}[{i}].reason"));
        }
    }

    let feas = &result.evaluation.feasibility;
    c.rating(feas.score, feas.scale);
    c.text(
        &mut result.evaluation.feasibility.justification,
        "evaluation.feasibility.justification",
    );

    c.text_list(
        &mut result.recommendations,
        "recommendations",
        Some(MAX_RECOMMENDATIONS),
    );

    c.out
}

struct Checker {
    policy: ListPolicy,
    out: ShapeOutcome,
}

impl Checker {
    fn lenient(&self) -> bool {
        self.policy == ListPolicy::Lenient
    }

    fn warn(&mut self, msg: String) {
        self.out = std::mem::replace(&mut self.out, ShapeOutcome::allow()).warn(msg);
    }

    fn block(&mut self, msg: String) {
        self.out = std::mem::replace(&mut self.out, ShapeOutcome::allow()).block(msg);
    }

    fn text(&mut self, value: &mut String, path: &str) {
        if !value.trim().is_empty() {
            return;
        }
        if self.lenient() {
            *value = SENTINEL.to_string();
            self.warn(format!("{path}: blank value replaced with \"{SENTINEL}\""));
        } else {
            self.block(format!("{path}: blank value (use \"{SENTINEL}\" when undetermined)"));
        }
    }

    fn text_list(&mut self, items: &mut Vec<String>, path: &str, max: Option<usize>) {
        if let Some(max) = max {
            if items.len() > max {
                if self.lenient() {
                    self.warn(format!(
                        "{path}: {} entries truncated to {max}",
                        items.len()
                    ));
                    items.truncate(max);
                } else {
                    self.block(format!(
                        "{path}: expected at most {max} entries, found {}",
                        items.len()
                    ));
                }
            }
        }
        if items.is_empty() && self.lenient() {
            self.warn(format!("{path}: empty list filled with \"{SENTINEL}\""));
            items.push(SENTINEL.to_string());
        }
        for (i, item) in items.iter_mut().enumerate() {
            self.text(item, &format!("{path}[{i}]"));
        }
    }

    fn exact_len<T>(&mut self, items: &mut Vec<T>, path: &str, filler: fn() -> T) {
        let found = items.len();
        if found == FIXED_LIST_LEN {
            return;
        }
        if self.lenient() {
            items.truncate(FIXED_LIST_LEN);
            items.resize_with(FIXED_LIST_LEN, filler);
            self.warn(format!(
                "{path}: {found} entries adjusted to {FIXED_LIST_LEN}"
            ));
        } else {
            self.block(format!(
                "{path}: expected {FIXED_LIST_LEN} entries, found {found}"
            ));
        }
    }

    // Out-of-range numbers cannot be repaired without inventing a score.
    fn rating(&mut self, score: Rating, scale: Rating) {
        if let Rating::Value(s) = scale {
            if s < 1 {
                self.block(format!("evaluation.feasibility.scale: must be >= 1, found {s}"));
                return;
            }
        }
        match (score, scale) {
            (Rating::Value(v), Rating::Value(s)) if v < 0 || v > s => self.block(format!(
                "evaluation.feasibility.score: {v} is outside 0..={s}"
            )),
            (Rating::Value(v), Rating::Undetermined) if v < 0 => {
                self.block(format!("evaluation.feasibility.score: {v} is negative"))
            }
            _ => {}
        }
    }
}

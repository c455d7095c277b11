//! Report layout shared by the terminal renderer and the document exporter.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::model::{Risk, ValidationResult};

pub const REPORT_TITLE: &str = "🚀 아이디어 검증 AI 분석 보고서";

pub const DISCLAIMER: [&str; 2] = [
    "본 보고서는 아이디어 검증 AI(GPT-4.1)를 통해 생성되었습니다.",
    "실제 비즈니스 결정 시에는 전문가와 상담하시기 바랍니다.",
];

/// One paragraph of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Block {
    Title(String),
    Dateline(String),
    Heading1(String),
    Heading2(String),
    Body(String),
    Strong(String),
    Footer(String),
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Block::Title(t)
            | Block::Dateline(t)
            | Block::Heading1(t)
            | Block::Heading2(t)
            | Block::Body(t)
            | Block::Strong(t)
            | Block::Footer(t) => t,
        }
    }
}

/// `2026. 10. 16.`, the way Korean locales print dates.
pub fn display_date(date: Date) -> String {
    format!("{}. {}. {}.", date.year(), u8::from(date.month()), date.day())
}

/// Lays out the full report for `result`.
pub fn blocks(result: &ValidationResult, idea: &str, date: Date) -> Vec<Block> {
    let eval = &result.evaluation;
    let mut out = vec![
        Block::Title(REPORT_TITLE.to_string()),
        Block::Dateline(format!("생성일자: {}", display_date(date))),
        Block::Heading1("📝 분석 대상 아이디어".to_string()),
        Block::Body(idea.trim().to_string()),
        Block::Heading1("📋 핵심 요약".to_string()),
        Block::Body(result.summary.clone()),
    ];

    out.push(Block::Heading1("📈 시장성 분석".to_string()));
    out.push(Block::Heading2("시장 규모".to_string()));
    out.push(Block::Body(eval.market.size_estimation.clone()));
    out.push(Block::Heading2("타깃 고객".to_string()));
    out.extend(eval.market.target_users.iter().map(|u| Block::Body(format!("• {u}"))));
    out.push(Block::Heading2("해결 문제".to_string()));
    out.push(Block::Body(eval.market.pain_points.clone()));

    let diff = &eval.differentiation;
    out.push(Block::Heading1("⭐ 차별성 분석".to_string()));
    out.push(Block::Heading2("고유 가치 제안".to_string()));
    out.push(Block::Body(diff.unique_value.clone()));
    out.push(Block::Heading2("강점".to_string()));
    out.extend(diff.strengths.iter().map(|s| Block::Body(format!("✓ {s}"))));
    out.push(Block::Heading2("약점".to_string()));
    out.extend(diff.weaknesses.iter().map(|w| Block::Body(format!("⚠ {w}"))));
    out.push(Block::Heading2("경쟁사 분석".to_string()));
    out.extend(
        diff.competitive_landscape
            .iter()
            .map(|c| Block::Body(format!("• {}: {}", c.competitor, c.weakness))),
    );

    out.push(Block::Heading1("⚠️ 리스크 분석".to_string()));
    for (category, risks) in eval.risk.categories() {
        out.push(Block::Heading2(category.title().to_string()));
        out.extend(risks.iter().map(|r| Block::Body(risk_line(r))));
    }

    let feas = &eval.feasibility;
    out.push(Block::Heading1("🎯 실현 가능성".to_string()));
    out.push(Block::Strong(format!("점수: {}/{}점", feas.score, feas.scale)));
    out.push(Block::Body(feas.justification.clone()));

    out.push(Block::Heading1("💡 권장 조치".to_string()));
    out.extend(
        result
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, r)| Block::Body(format!("{}. {r}", i + 1))),
    );

    out.extend(DISCLAIMER.iter().map(|d| Block::Footer(d.to_string())));
    out
}

pub fn risk_line(risk: &Risk) -> String {
    format!("[{}] {}: {}", risk.level, risk.risk, risk.reason)
}

/// Plain-text rendering for terminals.
pub fn render_text(blocks: &[Block]) -> String {
    let mut s = String::new();
    for block in blocks {
        // Writing into a String cannot fail.
        let _ = match block {
            Block::Title(t) => writeln!(s, "{t}\n{}", "=".repeat(40)),
            Block::Dateline(t) => writeln!(s, "{t}"),
            Block::Heading1(t) => writeln!(s, "\n{t}\n{}", "-".repeat(40)),
            Block::Heading2(t) => writeln!(s, "\n  [{t}]"),
            Block::Body(t) => writeln!(s, "  {t}"),
            Block::Strong(t) => writeln!(s, "  ** {t} **"),
            Block::Footer(t) => writeln!(s, "\n  {t}"),
        };
    }
    s
}

//! Fixtures shared by the integration tests.

use serde_json::{json, Value};

fn risks(prefix: &str) -> Value {
    json!([
        { "risk": format!("{prefix} 1"), "level": "낮음", "reason": "근거 1" },
        { "risk": format!("{prefix} 2"), "level": "중간", "reason": "근거 2" },
        { "risk": format!("{prefix} 3"), "level": "높음", "reason": "근거 3" }
    ])
}

/// A reply body that satisfies every shape rule.
pub fn valid_value() -> Value {
    json!({
        "summary": "반려동물 건강관리 수요는 크지만 규제 리스크가 있다.",
        "evaluation": {
            "market": {
                "sizeEstimation": "국내 펫헬스케어 시장 약 2조원, CAGR 12%",
                "targetUsers": ["30대 1인 가구 반려인", "다견 가정"],
                "painPoints": "병원 방문 전 증상 판단이 어렵다"
            },
            "differentiation": {
                "uniqueValue": "사진 한 장으로 증상을 1차 분류한다",
                "competitiveLandscape": [
                    { "competitor": "A사", "weakness": "기록 기능 위주" },
                    { "competitor": "B사", "weakness": "오프라인 중심" },
                    { "competitor": "C사", "weakness": "높은 가격" }
                ],
                "strengths": ["낮은 진입 장벽", "데이터 축적"],
                "weaknesses": ["진단 정확도 검증 필요", "수의사 네트워크 부족"]
            },
            "risk": {
                "technical": risks("기술"),
                "market": risks("시장"),
                "regulatory": risks("규제"),
                "financial": risks("재무")
            },
            "feasibility": {
                "score": 3,
                "scale": 5,
                "justification": "프로토타입 제작 가능, 인허가 검토 필요"
            }
        },
        "recommendations": ["수의사 자문단 구성", "MVP 베타 테스트", "-"]
    })
}

/// Same shape, every string the sentinel.
pub fn sentinel_value() -> Value {
    let risk = json!({ "risk": "-", "level": "-", "reason": "-" });
    let risks = json!([risk.clone(), risk.clone(), risk]);
    let comp = json!({ "competitor": "-", "weakness": "-" });
    json!({
        "summary": "-",
        "evaluation": {
            "market": { "sizeEstimation": "-", "targetUsers": ["-"], "painPoints": "-" },
            "differentiation": {
                "uniqueValue": "-",
                "competitiveLandscape": [comp.clone(), comp.clone(), comp],
                "strengths": ["-"],
                "weaknesses": ["-"]
            },
            "risk": {
                "technical": risks.clone(),
                "market": risks.clone(),
                "regulatory": risks.clone(),
                "financial": risks
            },
            "feasibility": { "score": "-", "scale": 5, "justification": "-" }
        },
        "recommendations": ["-"]
    })
}

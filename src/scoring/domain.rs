use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blueprint::Blueprint;

/// Identifier wrapper for assessment sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Identifier wrapper for persisted scoring results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompetencyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndicatorId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

/// Identifier for an assessment taker or team member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an assessment template is trying to establish about its taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentGoal {
    JobFit,
    TeamFit,
}

impl AssessmentGoal {
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentGoal::JobFit => "job_fit",
            AssessmentGoal::TeamFit => "team_fit",
        }
    }
}

/// One submitted answer. The question is loaded together with its owning indicator id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: QuestionRef,
    #[serde(default)]
    pub likert_value: Option<i32>,
    #[serde(default)]
    pub raw_score: Option<f64>,
    #[serde(default)]
    pub skipped: bool,
}

impl Answer {
    pub fn likert(question: QuestionRef, value: i32) -> Self {
        Self {
            question,
            likert_value: Some(value),
            raw_score: None,
            skipped: false,
        }
    }

    pub fn raw(question: QuestionRef, score: f64) -> Self {
        Self {
            question,
            likert_value: None,
            raw_score: Some(score),
            skipped: false,
        }
    }

    pub fn skipped(question: QuestionRef) -> Self {
        Self {
            question,
            likert_value: None,
            raw_score: None,
            skipped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: QuestionId,
    #[serde(default)]
    pub indicator_id: Option<IndicatorId>,
}

/// Behavioral indicator linking questions to the competency they evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    #[serde(default)]
    pub competency_id: Option<CompetencyId>,
    #[serde(default)]
    pub name: String,
}

pub const UNKNOWN_COMPETENCY_ID: &str = "unknown";
pub const UNKNOWN_COMPETENCY_NAME: &str = "Unknown Competency";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
    pub id: CompetencyId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub taxonomy: TaxonomyRefs,
}

impl Competency {
    /// Sentinel bucket for answers whose question chain cannot be resolved.
    pub fn unknown() -> Self {
        Self {
            id: CompetencyId(UNKNOWN_COMPETENCY_ID.to_string()),
            name: UNKNOWN_COMPETENCY_NAME.to_string(),
            category: "unknown".to_string(),
            taxonomy: TaxonomyRefs::default(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id.0 == UNKNOWN_COMPETENCY_ID
    }
}

/// External classification codes attached to a competency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onet_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esco_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_five: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|raw| !raw.trim().is_empty())
}

impl TaxonomyRefs {
    pub fn has_onet(&self) -> bool {
        present(&self.onet_code)
    }

    pub fn has_occupational_ref(&self) -> bool {
        present(&self.onet_code) || present(&self.esco_uri)
    }

    pub fn personality_trait(&self) -> Option<BigFiveTrait> {
        self.big_five.as_deref().and_then(BigFiveTrait::parse)
    }

    pub fn is_empty(&self) -> bool {
        !present(&self.onet_code) && !present(&self.esco_uri) && !present(&self.big_five)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigFiveTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl BigFiveTrait {
    /// Parse a free-form trait label, tolerating case, separators and common synonyms.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphabetic())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "openness" | "opennesstoexperience" => Some(Self::Openness),
            "conscientiousness" => Some(Self::Conscientiousness),
            "extraversion" | "extroversion" => Some(Self::Extraversion),
            "agreeableness" => Some(Self::Agreeableness),
            "neuroticism" | "emotionalstability" => Some(Self::Neuroticism),
            _ => None,
        }
    }
}

/// Assessment definition owning the goal and its optional blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentTemplate {
    pub id: TemplateId,
    #[serde(default)]
    pub name: String,
    pub goal: AssessmentGoal,
    #[serde(default)]
    pub blueprint: Option<Blueprint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: SessionId,
    pub candidate_id: UserId,
    pub template: AssessmentTemplate,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-competency aggregate carried on a scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub category: String,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub questions_answered: u32,
    pub questions_correct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<TaxonomyRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insufficient_evidence: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFitMetrics {
    pub strictness: u8,
    pub effective_threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_code: Option<String>,
    pub benchmark_available: bool,
    pub margin_factor: f64,
    pub evidence_factor: f64,
    pub coverage_factor: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub confidence_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFitMetrics {
    pub saturation_threshold: f64,
    pub pass_threshold: f64,
    pub multiplier: f64,
    pub diversity_count: usize,
    pub saturation_count: usize,
    pub gap_count: usize,
    pub diversity_ratio: f64,
    pub saturation_ratio: f64,
    /// Zero when no team profile was available and scoring fell back to self-reference.
    pub team_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_compatibility: Option<f64>,
    #[serde(default)]
    pub personality_traits: BTreeMap<BigFiveTrait, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalMetrics {
    JobFit(JobFitMetrics),
    TeamFit(TeamFitMetrics),
}

/// Outcome of scoring one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub id: ResultId,
    pub session_id: SessionId,
    pub template_id: TemplateId,
    pub candidate_id: UserId,
    pub goal: AssessmentGoal,
    pub overall_score: f64,
    pub max_score: f64,
    pub overall_percentage: f64,
    pub passed: bool,
    pub competency_scores: Vec<CompetencyScore>,
    pub metrics: GoalMetrics,
    pub completed_at: DateTime<Utc>,
}

impl ScoringResult {
    pub fn team_fit_metrics(&self) -> Option<&TeamFitMetrics> {
        match &self.metrics {
            GoalMetrics::TeamFit(metrics) => Some(metrics),
            GoalMetrics::JobFit(_) => None,
        }
    }

    pub fn job_fit_metrics(&self) -> Option<&JobFitMetrics> {
        match &self.metrics {
            GoalMetrics::JobFit(metrics) => Some(metrics),
            GoalMetrics::TeamFit(_) => None,
        }
    }

    pub fn competency_percentage(&self, competency_id: &CompetencyId) -> Option<f64> {
        self.competency_scores
            .iter()
            .find(|score| &score.competency_id == competency_id)
            .map(|score| score.percentage)
    }
}

/// Snapshot of one member's contribution to a team profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Competency levels on the 0-5 scale.
    #[serde(default)]
    pub competency_levels: BTreeMap<CompetencyId, f64>,
    #[serde(default)]
    pub personality_traits: BTreeMap<BigFiveTrait, f64>,
}

/// Aggregated competency and personality coverage of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team_id: TeamId,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<MemberProfile>,
    #[serde(default)]
    pub saturation: BTreeMap<CompetencyId, f64>,
    #[serde(default)]
    pub personality_traits: BTreeMap<BigFiveTrait, f64>,
    #[serde(default)]
    pub skill_gaps: Vec<CompetencyId>,
}

impl TeamProfile {
    pub fn team_size(&self) -> usize {
        self.members.len()
    }

    /// Competencies the team has no member for count as fully unsaturated.
    pub fn saturation_for(&self, competency_id: &CompetencyId) -> f64 {
        self.saturation.get(competency_id).copied().unwrap_or(0.0)
    }
}

/// External occupational benchmark, e.g. an O*NET occupation's element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkProfile {
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<BenchmarkElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkElement {
    pub name: String,
    #[serde(default)]
    pub element_code: Option<String>,
}

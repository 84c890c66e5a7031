use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::dataset::{DatasetDocument, InMemoryDataset};
use crate::scoring::blueprint::{Blueprint, GoalBlueprint, TeamFitBlueprint};
use crate::scoring::{
    AssessmentGoal, AssessmentTemplate, BenchmarkProfile, Competency, CompetencyId, CompetencyScore,
    GoalMetrics, Indicator, IndicatorId, MemberProfile, ReferenceLookup, RepositoryError,
    ResultId, ScoringResult, SessionId, TaxonomyRefs, TeamFitMetrics, TeamId, TeamProfile,
    TemplateId, UserId,
};
use crate::team::{
    ResultRepository, Team, TeamMember, TeamRepository, TeamStatus, TemplateRepository,
};

pub(super) fn ids(raw: &[&str]) -> Vec<ResultId> {
    raw.iter().map(|id| ResultId(id.to_string())).collect()
}

pub(super) fn score(competency_id: &str, percentage: f64) -> CompetencyScore {
    CompetencyScore {
        competency_id: CompetencyId(competency_id.to_string()),
        competency_name: competency_id.replace('-', " "),
        category: "core".to_string(),
        score: percentage / 100.0,
        max_score: 1.0,
        percentage,
        questions_answered: 1,
        questions_correct: u32::from(percentage >= 50.0),
        taxonomy: None,
        insufficient_evidence: None,
        evidence_note: None,
    }
}

pub(super) fn trait_score(competency_id: &str, percentage: f64, big_five: &str) -> CompetencyScore {
    CompetencyScore {
        taxonomy: Some(TaxonomyRefs {
            onet_code: None,
            esco_uri: None,
            big_five: Some(big_five.to_string()),
        }),
        ..score(competency_id, percentage)
    }
}

/// Team-fit result for a candidate, completed on the given day of March 2026.
pub(super) fn team_result(
    id: &str,
    candidate: &str,
    template: &str,
    scores: Vec<CompetencyScore>,
    day: u32,
) -> ScoringResult {
    let overall_percentage = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|score| score.percentage).sum::<f64>() / scores.len() as f64
    };
    ScoringResult {
        id: ResultId(id.to_string()),
        session_id: SessionId(format!("session-{id}")),
        template_id: TemplateId(template.to_string()),
        candidate_id: UserId(candidate.to_string()),
        goal: AssessmentGoal::TeamFit,
        overall_score: scores.iter().map(|score| score.score).sum(),
        max_score: scores.len() as f64,
        overall_percentage,
        passed: overall_percentage >= 60.0,
        competency_scores: scores,
        metrics: GoalMetrics::TeamFit(TeamFitMetrics {
            saturation_threshold: 0.75,
            pass_threshold: 0.6,
            multiplier: 1.0,
            diversity_count: 0,
            saturation_count: 0,
            gap_count: 0,
            diversity_ratio: 0.0,
            saturation_ratio: 0.0,
            team_size: 0,
            personality_compatibility: None,
            personality_traits: BTreeMap::new(),
            target_role: None,
        }),
        completed_at: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
    }
}

/// Override the ranking inputs of a team-fit fixture.
pub(super) fn with_ranking(
    mut result: ScoringResult,
    overall_percentage: f64,
    diversity_ratio: f64,
    compatibility: Option<f64>,
) -> ScoringResult {
    result.overall_percentage = overall_percentage;
    if let GoalMetrics::TeamFit(metrics) = &mut result.metrics {
        metrics.diversity_ratio = diversity_ratio;
        metrics.personality_compatibility = compatibility;
    }
    result
}

pub(super) fn member(user_id: &str, active: bool) -> TeamMember {
    TeamMember {
        user_id: UserId(user_id.to_string()),
        display_name: user_id.to_string(),
        role: None,
        active,
    }
}

pub(super) fn team(status: TeamStatus, members: Vec<TeamMember>) -> Team {
    Team {
        id: TeamId("team-1".to_string()),
        name: "Platform".to_string(),
        status,
        members,
    }
}

pub(super) fn team_template(id: &str, team_id: Option<&str>) -> AssessmentTemplate {
    AssessmentTemplate {
        id: TemplateId(id.to_string()),
        name: "Team fit".to_string(),
        goal: AssessmentGoal::TeamFit,
        blueprint: team_id.map(|team_id| {
            Blueprint::Typed(GoalBlueprint::TeamFit(TeamFitBlueprint {
                team_id: Some(TeamId(team_id.to_string())),
                ..TeamFitBlueprint::default()
            }))
        }),
    }
}

pub(super) fn job_template(id: &str) -> AssessmentTemplate {
    AssessmentTemplate {
        id: TemplateId(id.to_string()),
        name: "Job fit".to_string(),
        goal: AssessmentGoal::JobFit,
        blueprint: None,
    }
}

pub(super) fn precomputed_profile(saturation: &[(&str, f64)], members: usize) -> TeamProfile {
    TeamProfile {
        team_id: TeamId("team-1".to_string()),
        team_name: "Platform".to_string(),
        members: (0..members)
            .map(|index| MemberProfile {
                user_id: UserId(format!("member-{index}")),
                display_name: format!("Member {index}"),
                role: None,
                competency_levels: BTreeMap::new(),
                personality_traits: BTreeMap::new(),
            })
            .collect(),
        saturation: saturation
            .iter()
            .map(|(id, value)| (CompetencyId(id.to_string()), *value))
            .collect(),
        personality_traits: BTreeMap::new(),
        skill_gaps: Vec::new(),
    }
}

pub(super) fn dataset(document: DatasetDocument) -> Arc<InMemoryDataset> {
    Arc::new(InMemoryDataset::from_document(document))
}

pub(super) fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} +/- {tolerance}, got {actual}"
    );
}

/// Every repository call fails as if the backing store were down.
pub(super) struct OfflineStore;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("store offline".to_string())
}

impl ResultRepository for OfflineStore {
    fn fetch_results(
        &self,
        _ids: &[ResultId],
    ) -> Result<HashMap<ResultId, ScoringResult>, RepositoryError> {
        Err(offline())
    }

    fn completed_results(&self, _user_id: &UserId) -> Result<Vec<ScoringResult>, RepositoryError> {
        Err(offline())
    }
}

impl TemplateRepository for OfflineStore {
    fn fetch_template(
        &self,
        _id: &TemplateId,
    ) -> Result<Option<AssessmentTemplate>, RepositoryError> {
        Err(offline())
    }
}

impl TeamRepository for OfflineStore {
    fn find_team(&self, _id: &TeamId) -> Result<Option<Team>, RepositoryError> {
        Err(offline())
    }
}

impl ReferenceLookup for OfflineStore {
    fn resolve_competencies(
        &self,
        _ids: &[CompetencyId],
    ) -> Result<HashMap<CompetencyId, Competency>, RepositoryError> {
        Err(offline())
    }

    fn resolve_indicators(
        &self,
        _ids: &[IndicatorId],
    ) -> Result<HashMap<IndicatorId, Indicator>, RepositoryError> {
        Err(offline())
    }

    fn team_profile(&self, _team_id: &TeamId) -> Result<Option<TeamProfile>, RepositoryError> {
        Err(offline())
    }

    fn benchmark_profile(&self, _code: &str) -> Result<Option<BenchmarkProfile>, RepositoryError> {
        Err(offline())
    }
}

//! Assessment scoring: normalization, competency aggregation and the per-goal strategies.

pub mod aggregation;
pub mod blueprint;
pub mod confidence;
pub mod domain;
pub mod job_fit;
pub mod normalizer;
pub mod repository;
pub mod resolution;
pub mod team_fit;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::Utc;

pub use aggregation::{aggregate, CompetencyGroup};
pub use blueprint::{Blueprint, GoalBlueprint, JobFitBlueprint, TeamFitBlueprint};
pub use domain::{
    Answer, AssessmentGoal, AssessmentSession, AssessmentTemplate, BenchmarkElement,
    BenchmarkProfile, BigFiveTrait, Competency, CompetencyId, CompetencyScore, ConfidenceLevel,
    GoalMetrics, Indicator, IndicatorId, JobFitMetrics, MemberProfile, QuestionId, QuestionRef,
    ResultId, ScoringResult, SessionId, TaxonomyRefs, TeamFitMetrics, TeamId, TeamProfile,
    TemplateId, UserId,
};
pub use job_fit::JobFitScorer;
pub use normalizer::normalize;
pub use repository::{ReferenceLookup, RepositoryError};
pub use resolution::{CompetencyResolution, ResolutionCache};
pub use team_fit::TeamFitScorer;

/// Absorbs floating-point noise so exact boundaries stay inclusive.
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Inclusive `ratio >= threshold`.
pub(crate) fn meets_threshold(ratio: f64, threshold: f64) -> bool {
    ratio + BOUNDARY_TOLERANCE >= threshold
}

/// Capability shared by every goal-specific scorer.
pub trait ScoringStrategy {
    fn supported_goal(&self) -> AssessmentGoal;
    fn calculate(&self, session: &AssessmentSession, answers: &[Answer]) -> ScoringResult;
}

/// Closed set of scoring strategies, selected by the template's goal.
pub enum ScoringEngine<L: ?Sized> {
    JobFit(JobFitScorer<L>),
    TeamFit(TeamFitScorer<L>),
}

impl<L> ScoringEngine<L>
where
    L: ReferenceLookup + ?Sized,
{
    pub fn for_goal(goal: AssessmentGoal, lookup: Arc<L>, cache: Arc<ResolutionCache>) -> Self {
        match goal {
            AssessmentGoal::JobFit => ScoringEngine::JobFit(JobFitScorer::new(lookup, cache)),
            AssessmentGoal::TeamFit => ScoringEngine::TeamFit(TeamFitScorer::new(lookup, cache)),
        }
    }

    /// Pick the strategy for the session's template and score it.
    pub fn score(
        lookup: Arc<L>,
        cache: Arc<ResolutionCache>,
        session: &AssessmentSession,
        answers: &[Answer],
    ) -> ScoringResult {
        Self::for_goal(session.template.goal, lookup, cache).calculate(session, answers)
    }
}

impl<L> ScoringStrategy for ScoringEngine<L>
where
    L: ReferenceLookup + ?Sized,
{
    fn supported_goal(&self) -> AssessmentGoal {
        match self {
            ScoringEngine::JobFit(scorer) => scorer.supported_goal(),
            ScoringEngine::TeamFit(scorer) => scorer.supported_goal(),
        }
    }

    fn calculate(&self, session: &AssessmentSession, answers: &[Answer]) -> ScoringResult {
        match self {
            ScoringEngine::JobFit(scorer) => scorer.calculate(session, answers),
            ScoringEngine::TeamFit(scorer) => scorer.calculate(session, answers),
        }
    }
}

pub(crate) fn assemble_result(
    session: &AssessmentSession,
    goal: AssessmentGoal,
    groups: &[CompetencyGroup],
    competency_scores: Vec<CompetencyScore>,
    overall_percentage: f64,
    passed: bool,
    metrics: GoalMetrics,
) -> ScoringResult {
    let (overall_score, max_score) = aggregation::totals(groups);
    ScoringResult {
        id: ResultId(format!("result-{}", session.id.0)),
        session_id: session.id.clone(),
        template_id: session.template.id.clone(),
        candidate_id: session.candidate_id.clone(),
        goal,
        overall_score,
        max_score,
        overall_percentage: overall_percentage.clamp(0.0, 100.0),
        passed,
        competency_scores,
        metrics,
        completed_at: session.completed_at.unwrap_or_else(Utc::now),
    }
}

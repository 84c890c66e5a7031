use std::sync::Arc;

use tracing::{debug, info, warn};

use super::aggregation::{aggregate, CompetencyGroup};
use super::blueprint::JobFitSettings;
use super::confidence::{self, ConfidenceFactors};
use super::domain::{
    Answer, AssessmentGoal, AssessmentSession, BenchmarkProfile, GoalMetrics, JobFitMetrics,
    ScoringResult,
};
use super::repository::ReferenceLookup;
use super::resolution::ResolutionCache;
use super::{assemble_result, meets_threshold, ScoringStrategy};

/// Weight for competencies tagged with an occupational (O*NET) code.
pub const TAXONOMY_WEIGHT: f64 = 1.2;
/// Fewer answered questions than this flags a competency as thinly evidenced.
pub const MIN_EVIDENCE_QUESTIONS: u32 = 3;

const BASE_THRESHOLD: f64 = 0.5;
const STRICTNESS_SPAN: f64 = 0.3;

/// Pass threshold for a strictness level in 0..=100.
pub fn effective_threshold(strictness: u8) -> f64 {
    BASE_THRESHOLD + (f64::from(strictness.min(100)) / 100.0) * STRICTNESS_SPAN
}

pub fn competency_weight(group: &CompetencyGroup) -> f64 {
    if group.competency.taxonomy.has_onet() {
        TAXONOMY_WEIGHT
    } else {
        1.0
    }
}

/// Taxonomy-weighted mean of group averages, as a percentage.
pub fn weighted_percentage(groups: &[CompetencyGroup]) -> f64 {
    let (weighted, total_weight) = groups.iter().fold((0.0, 0.0), |(sum, weights), group| {
        let weight = competency_weight(group);
        (sum + weight * group.average(), weights + weight)
    });
    if total_weight > 0.0 {
        (100.0 * weighted / total_weight).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Share of competencies with enough answered questions to trust their average.
pub fn evidence_factor(groups: &[CompetencyGroup]) -> f64 {
    if groups.is_empty() {
        return 0.0;
    }
    let sufficient = groups
        .iter()
        .filter(|group| group.answered >= MIN_EVIDENCE_QUESTIONS)
        .count();
    sufficient as f64 / groups.len() as f64
}

/// Share of benchmark elements matched by a scored competency. Without a usable benchmark
/// coverage is not held against the candidate.
pub fn coverage_factor(groups: &[CompetencyGroup], benchmark: Option<&BenchmarkProfile>) -> f64 {
    let Some(benchmark) = benchmark.filter(|profile| !profile.elements.is_empty()) else {
        return 1.0;
    };
    let matched = benchmark
        .elements
        .iter()
        .filter(|element| {
            groups.iter().any(|group| {
                let competency = &group.competency;
                let code_match = match (&element.element_code, &competency.taxonomy.onet_code) {
                    (Some(element_code), Some(onet_code)) => {
                        element_code.trim().eq_ignore_ascii_case(onet_code.trim())
                    }
                    _ => false,
                };
                code_match || element.name.trim().eq_ignore_ascii_case(competency.name.trim())
            })
        })
        .count();
    matched as f64 / benchmark.elements.len() as f64
}

fn evidence_note(answered: u32) -> String {
    format!(
        "Only {answered} question(s) answered; \
         at least {MIN_EVIDENCE_QUESTIONS} required for a reliable score."
    )
}

/// Score grouped answers against the job-fit rules. Pure apart from the result timestamp.
pub fn score_job_fit(
    session: &AssessmentSession,
    groups: &[CompetencyGroup],
    settings: &JobFitSettings,
    benchmark: Option<&BenchmarkProfile>,
) -> ScoringResult {
    let threshold = effective_threshold(settings.strictness);
    let percentage = weighted_percentage(groups);
    let ratio = percentage / 100.0;
    let passed = !groups.is_empty() && meets_threshold(ratio, threshold);

    let factors = ConfidenceFactors {
        margin: ConfidenceFactors::margin_factor(ratio, threshold),
        evidence: evidence_factor(groups),
        coverage: coverage_factor(groups, benchmark),
    };
    let estimate = confidence::estimate(factors, passed);

    debug!(
        strictness = settings.strictness,
        threshold,
        margin = factors.margin,
        evidence = factors.evidence,
        coverage = factors.coverage,
        "job fit factors"
    );

    let competency_scores = groups
        .iter()
        .map(|group| {
            let mut score = group.to_score();
            let insufficient = group.answered < MIN_EVIDENCE_QUESTIONS;
            score.insufficient_evidence = Some(insufficient);
            if insufficient {
                score.evidence_note = Some(evidence_note(group.answered));
            }
            score
        })
        .collect();

    let metrics = GoalMetrics::JobFit(JobFitMetrics {
        strictness: settings.strictness,
        effective_threshold: threshold,
        taxonomy_code: settings.taxonomy_code.clone(),
        benchmark_available: benchmark.is_some_and(|profile| !profile.elements.is_empty()),
        margin_factor: factors.margin,
        evidence_factor: factors.evidence,
        coverage_factor: factors.coverage,
        confidence: estimate.confidence,
        confidence_level: estimate.level,
        confidence_message: estimate.message,
    });

    assemble_result(
        session,
        AssessmentGoal::JobFit,
        groups,
        competency_scores,
        percentage,
        passed,
        metrics,
    )
}

/// Job-fit strategy: taxonomy-weighted scoring against a strictness-derived threshold.
pub struct JobFitScorer<L: ?Sized> {
    lookup: Arc<L>,
    cache: Arc<ResolutionCache>,
}

impl<L> JobFitScorer<L>
where
    L: ReferenceLookup + ?Sized,
{
    pub fn new(lookup: Arc<L>, cache: Arc<ResolutionCache>) -> Self {
        Self { lookup, cache }
    }

    fn benchmark(&self, code: Option<&str>) -> Option<BenchmarkProfile> {
        let code = code?;
        match self.lookup.benchmark_profile(code) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(code, error = %err, "benchmark lookup failed; assuming full coverage");
                None
            }
        }
    }
}

impl<L> ScoringStrategy for JobFitScorer<L>
where
    L: ReferenceLookup + ?Sized,
{
    fn supported_goal(&self) -> AssessmentGoal {
        AssessmentGoal::JobFit
    }

    fn calculate(&self, session: &AssessmentSession, answers: &[Answer]) -> ScoringResult {
        let settings = JobFitSettings::resolve(session.template.blueprint.as_ref());
        let resolution = self.cache.resolve(self.lookup.as_ref(), answers);
        let groups = aggregate(answers, &resolution);
        let benchmark = self.benchmark(settings.taxonomy_code.as_deref());

        let result = score_job_fit(session, &groups, &settings, benchmark.as_ref());
        info!(
            session = %session.id.0,
            goal = AssessmentGoal::JobFit.label(),
            percentage = result.overall_percentage,
            passed = result.passed,
            "scored session"
        );
        result
    }
}

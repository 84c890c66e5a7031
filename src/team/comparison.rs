use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{ResultRepository, TemplateRepository};
use crate::scoring::blueprint::TeamFitSettings;
use crate::scoring::domain::UNKNOWN_COMPETENCY_ID;
use crate::scoring::team_fit::DIVERSITY_LOWER_BOUND;
use crate::scoring::{
    AssessmentGoal, CompetencyId, ReferenceLookup, RepositoryError, ResultId, ScoringResult,
    TeamId, TeamProfile, TemplateId, UserId,
};

pub const MIN_CANDIDATES: usize = 2;
pub const MAX_CANDIDATES: usize = 5;
/// A candidate covers a gap when their competency percentage reaches this.
pub const GAP_COVERAGE_PERCENTAGE: f64 = 50.0;

/// Input validation failures for a comparison request.
#[derive(Debug, thiserror::Error)]
pub enum ComparisonError {
    #[error("comparison needs between 2 and 5 results, got {found}")]
    InvalidCandidateCount { found: usize },
    #[error("result {0} was supplied more than once")]
    DuplicateResult(ResultId),
    #[error("result {0} not found")]
    ResultNotFound(ResultId),
    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),
    #[error("result {result} belongs to template {found}, expected {expected}")]
    TemplateMismatch {
        result: ResultId,
        expected: TemplateId,
        found: TemplateId,
    },
    #[error("template {template} has goal {goal}; only team_fit templates can be compared")]
    UnsupportedGoal {
        template: TemplateId,
        goal: &'static str,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub result_id: ResultId,
    pub candidate_id: UserId,
    pub overall_percentage: f64,
    pub passed: bool,
    pub diversity_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_compatibility: Option<f64>,
    pub overall_rank: usize,
    pub diversity_rank: usize,
    pub personality_rank: usize,
    pub gaps_covered: Vec<CompetencyId>,
}

/// Team coverage of one competency seen in the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyGapFlag {
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub team_saturation: f64,
    pub is_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCoverage {
    pub competency_id: CompetencyId,
    pub covered_by: Vec<ResultId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_candidate: Option<ResultId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complementarity {
    pub first: ResultId,
    pub second: ResultId,
    pub combined_gaps_covered: usize,
    pub complementarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateComparison {
    pub template_id: TemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub candidates: Vec<CandidateSummary>,
    pub competencies: Vec<CompetencyGapFlag>,
    pub total_gaps: usize,
    pub gap_coverage: Vec<GapCoverage>,
    pub complementarity: Vec<Complementarity>,
}

/// Ranks team-fit candidates and measures how they cover the team's gaps.
pub struct CandidateComparator<R: ?Sized, T: ?Sized, L: ?Sized> {
    results: Arc<R>,
    templates: Arc<T>,
    lookup: Arc<L>,
}

impl<R, T, L> CandidateComparator<R, T, L>
where
    R: ResultRepository + ?Sized,
    T: TemplateRepository + ?Sized,
    L: ReferenceLookup + ?Sized,
{
    pub fn new(results: Arc<R>, templates: Arc<T>, lookup: Arc<L>) -> Self {
        Self {
            results,
            templates,
            lookup,
        }
    }

    pub fn compare_results(
        &self,
        result_ids: &[ResultId],
        template_id: &TemplateId,
    ) -> Result<CandidateComparison, ComparisonError> {
        validate_ids(result_ids)?;

        let mut found = self.results.fetch_results(result_ids)?;
        let mut results = Vec::with_capacity(result_ids.len());
        for id in result_ids {
            let result = found
                .remove(id)
                .ok_or_else(|| ComparisonError::ResultNotFound(id.clone()))?;
            results.push(result);
        }

        for result in &results {
            if &result.template_id != template_id {
                return Err(ComparisonError::TemplateMismatch {
                    result: result.id.clone(),
                    expected: template_id.clone(),
                    found: result.template_id.clone(),
                });
            }
        }

        let template = self
            .templates
            .fetch_template(template_id)?
            .ok_or_else(|| ComparisonError::TemplateNotFound(template_id.clone()))?;
        if template.goal != AssessmentGoal::TeamFit {
            return Err(ComparisonError::UnsupportedGoal {
                template: template_id.clone(),
                goal: template.goal.label(),
            });
        }

        let settings = TeamFitSettings::resolve(template.blueprint.as_ref());
        let team = settings.team_id.as_ref().and_then(|team_id| {
            self.lookup.team_profile(team_id).unwrap_or_else(|err| {
                warn!(
                    team = %team_id,
                    error = %err,
                    "team profile lookup failed; comparing without gaps"
                );
                None
            })
        });

        let comparison = build_comparison(template_id, &results, team.as_ref());
        info!(
            template = %template_id,
            candidates = comparison.candidates.len(),
            gaps = comparison.total_gaps,
            "compared candidates"
        );
        Ok(comparison)
    }
}

fn validate_ids(result_ids: &[ResultId]) -> Result<(), ComparisonError> {
    if !(MIN_CANDIDATES..=MAX_CANDIDATES).contains(&result_ids.len()) {
        return Err(ComparisonError::InvalidCandidateCount {
            found: result_ids.len(),
        });
    }
    let mut seen = HashSet::new();
    for id in result_ids {
        if !seen.insert(id) {
            return Err(ComparisonError::DuplicateResult(id.clone()));
        }
    }
    Ok(())
}

/// 1-based ranks, best first. Ties keep input order; missing values rank last.
pub fn rank_descending(values: &[Option<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| match (values[a], values[b]) {
        (Some(left), Some(right)) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let mut ranks = vec![0; values.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Competencies worth flagging: everything the team profile tracks plus what candidates bring.
fn flag_competencies(results: &[ScoringResult], team: &TeamProfile) -> Vec<CompetencyGapFlag> {
    let mut names: BTreeMap<CompetencyId, String> = team
        .saturation
        .keys()
        .map(|id| (id.clone(), id.0.clone()))
        .collect();
    for score in results.iter().flat_map(|result| &result.competency_scores) {
        if score.competency_id.0 == UNKNOWN_COMPETENCY_ID {
            continue;
        }
        names.insert(score.competency_id.clone(), score.competency_name.clone());
    }

    let mut flags: Vec<CompetencyGapFlag> = names
        .into_iter()
        .map(|(competency_id, competency_name)| {
            let team_saturation = team.saturation_for(&competency_id);
            CompetencyGapFlag {
                competency_id,
                competency_name,
                team_saturation,
                is_gap: team_saturation < DIVERSITY_LOWER_BOUND,
            }
        })
        .collect();
    flags.sort_by(|a, b| {
        a.team_saturation
            .partial_cmp(&b.team_saturation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.competency_id.cmp(&b.competency_id))
    });
    flags
}

/// Rank candidates and compute gap coverage and pairwise complementarity.
pub fn build_comparison(
    template_id: &TemplateId,
    results: &[ScoringResult],
    team: Option<&TeamProfile>,
) -> CandidateComparison {
    let competencies = team
        .map(|profile| flag_competencies(results, profile))
        .unwrap_or_default();
    let gaps: Vec<&CompetencyId> = competencies
        .iter()
        .filter(|flag| flag.is_gap)
        .map(|flag| &flag.competency_id)
        .collect();

    let covered: Vec<BTreeSet<CompetencyId>> = results
        .iter()
        .map(|result| {
            gaps.iter()
                .filter(|gap| {
                    result
                        .competency_percentage(gap)
                        .is_some_and(|percentage| percentage >= GAP_COVERAGE_PERCENTAGE)
                })
                .map(|gap| (*gap).clone())
                .collect()
        })
        .collect();

    let gap_coverage = gaps
        .iter()
        .map(|gap| {
            let mut covered_by = Vec::new();
            let mut best: Option<(&ResultId, f64)> = None;
            for (result, covered_gaps) in results.iter().zip(&covered) {
                if !covered_gaps.contains(*gap) {
                    continue;
                }
                covered_by.push(result.id.clone());
                let percentage = result.competency_percentage(gap).unwrap_or(0.0);
                if best.map_or(true, |(_, top)| percentage > top) {
                    best = Some((&result.id, percentage));
                }
            }
            GapCoverage {
                competency_id: (*gap).clone(),
                covered_by,
                best_candidate: best.map(|(id, _)| id.clone()),
                best_percentage: best.map(|(_, percentage)| percentage),
            }
        })
        .collect();

    let total_gaps = gaps.len();
    let mut complementarity = Vec::new();
    for first in 0..results.len() {
        for second in first + 1..results.len() {
            let combined = covered[first].union(&covered[second]).count();
            let score = if total_gaps == 0 {
                0.0
            } else {
                100.0 * combined as f64 / total_gaps as f64
            };
            complementarity.push(Complementarity {
                first: results[first].id.clone(),
                second: results[second].id.clone(),
                combined_gaps_covered: combined,
                complementarity_score: score,
            });
        }
    }

    let overall: Vec<Option<f64>> = results
        .iter()
        .map(|result| Some(result.overall_percentage))
        .collect();
    let diversity: Vec<Option<f64>> = results
        .iter()
        .map(|result| result.team_fit_metrics().map(|metrics| metrics.diversity_ratio))
        .collect();
    let personality: Vec<Option<f64>> = results
        .iter()
        .map(|result| {
            result
                .team_fit_metrics()
                .and_then(|metrics| metrics.personality_compatibility)
        })
        .collect();
    let overall_ranks = rank_descending(&overall);
    let diversity_ranks = rank_descending(&diversity);
    let personality_ranks = rank_descending(&personality);

    let candidates = results
        .iter()
        .enumerate()
        .map(|(index, result)| CandidateSummary {
            result_id: result.id.clone(),
            candidate_id: result.candidate_id.clone(),
            overall_percentage: result.overall_percentage,
            passed: result.passed,
            diversity_ratio: diversity[index].unwrap_or(0.0),
            personality_compatibility: personality[index],
            overall_rank: overall_ranks[index],
            diversity_rank: diversity_ranks[index],
            personality_rank: personality_ranks[index],
            gaps_covered: covered[index].iter().cloned().collect(),
        })
        .collect();

    CandidateComparison {
        template_id: template_id.clone(),
        team_id: team.map(|profile| profile.team_id.clone()),
        candidates,
        competencies,
        total_gaps,
        gap_coverage,
        complementarity,
    }
}

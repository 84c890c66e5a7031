use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::repository::{ResultRepository, Team, TeamMember, TeamRepository, TeamStatus};
use crate::scoring::domain::UNKNOWN_COMPETENCY_ID;
use crate::scoring::{
    BigFiveTrait, CompetencyId, MemberProfile, RepositoryError, ScoringResult, TeamId,
    TeamProfile,
};

/// Saturation under this marks a competency as a team skill gap.
pub const SKILL_GAP_SATURATION: f64 = 0.3;

const SCALE_MAX: f64 = 5.0;
const PERCENT_PER_SCALE_POINT: f64 = 20.0;

/// Builds team profiles from each active member's most recent completed result.
pub struct TeamProfileAggregator<T: ?Sized, R: ?Sized> {
    teams: Arc<T>,
    results: Arc<R>,
}

impl<T, R> TeamProfileAggregator<T, R>
where
    T: TeamRepository + ?Sized,
    R: ResultRepository + ?Sized,
{
    pub fn new(teams: Arc<T>, results: Arc<R>) -> Self {
        Self { teams, results }
    }

    /// Missing, inactive, or memberless teams have no profile.
    pub fn compute_team_profile(
        &self,
        team_id: &TeamId,
    ) -> Result<Option<TeamProfile>, RepositoryError> {
        compute_team_profile(self.teams.as_ref(), self.results.as_ref(), team_id)
    }
}

/// Load a team and its members' latest results, then aggregate them.
pub fn compute_team_profile<T, R>(
    teams: &T,
    results: &R,
    team_id: &TeamId,
) -> Result<Option<TeamProfile>, RepositoryError>
where
    T: TeamRepository + ?Sized,
    R: ResultRepository + ?Sized,
{
    let Some(team) = teams.find_team(team_id)? else {
        debug!(team = %team_id, "team not found");
        return Ok(None);
    };
    if team.status != TeamStatus::Active {
        debug!(team = %team_id, status = ?team.status, "team not active");
        return Ok(None);
    }

    let mut members = Vec::new();
    for member in team.active_members() {
        let latest = latest_completed(results.completed_results(&member.user_id)?);
        members.push((member.clone(), latest));
    }

    let profile = build_team_profile(&team, &members);
    if let Some(profile) = &profile {
        info!(
            team = %team_id,
            members = profile.team_size(),
            competencies = profile.saturation.len(),
            gaps = profile.skill_gaps.len(),
            "computed team profile"
        );
    }
    Ok(profile)
}

pub fn latest_completed(results: Vec<ScoringResult>) -> Option<ScoringResult> {
    results.into_iter().max_by_key(|result| result.completed_at)
}

/// Convert a percentage onto the 0-5 scale.
pub fn to_scale(percentage: f64) -> f64 {
    (percentage / PERCENT_PER_SCALE_POINT).clamp(0.0, SCALE_MAX)
}

fn member_profile(member: &TeamMember, latest: Option<&ScoringResult>) -> MemberProfile {
    let mut competency_levels = BTreeMap::new();
    let mut trait_sums: BTreeMap<BigFiveTrait, (f64, u32)> = BTreeMap::new();

    let scores = latest
        .iter()
        .flat_map(|result| result.competency_scores.iter())
        .filter(|score| score.competency_id.0 != UNKNOWN_COMPETENCY_ID);
    for score in scores {
        competency_levels.insert(score.competency_id.clone(), to_scale(score.percentage));
        let big_five = score
            .taxonomy
            .as_ref()
            .and_then(|taxonomy| taxonomy.personality_trait());
        if let Some(big_five) = big_five {
            let entry = trait_sums.entry(big_five).or_insert((0.0, 0));
            entry.0 += (score.percentage / 100.0).clamp(0.0, 1.0);
            entry.1 += 1;
        }
    }

    MemberProfile {
        user_id: member.user_id.clone(),
        display_name: member.display_name.clone(),
        role: member.role.clone(),
        competency_levels,
        personality_traits: trait_sums
            .into_iter()
            .map(|(big_five, (sum, count))| (big_five, sum / f64::from(count)))
            .collect(),
    }
}

/// Aggregate the members' latest results into a team profile.
pub fn build_team_profile(
    team: &Team,
    members: &[(TeamMember, Option<ScoringResult>)],
) -> Option<TeamProfile> {
    if team.status != TeamStatus::Active || members.is_empty() {
        return None;
    }

    let profiles: Vec<MemberProfile> = members
        .iter()
        .map(|(member, latest)| member_profile(member, latest.as_ref()))
        .collect();
    let active = profiles.len() as f64;

    let mut levels: BTreeMap<CompetencyId, Vec<f64>> = BTreeMap::new();
    for profile in &profiles {
        for (competency_id, level) in &profile.competency_levels {
            levels.entry(competency_id.clone()).or_default().push(*level);
        }
    }

    let saturation: BTreeMap<CompetencyId, f64> = levels
        .into_iter()
        .map(|(competency_id, scores)| {
            let coverage = scores.len() as f64 / active;
            let average = scores.iter().sum::<f64>() / scores.len() as f64;
            (competency_id, coverage * average / SCALE_MAX)
        })
        .collect();

    let skill_gaps = saturation
        .iter()
        .filter(|(_, value)| **value < SKILL_GAP_SATURATION)
        .map(|(competency_id, _)| competency_id.clone())
        .collect();

    let mut trait_values: BTreeMap<BigFiveTrait, Vec<f64>> = BTreeMap::new();
    for profile in &profiles {
        for (big_five, value) in &profile.personality_traits {
            trait_values.entry(*big_five).or_default().push(*value);
        }
    }
    let personality_traits = trait_values
        .into_iter()
        .map(|(big_five, values)| (big_five, values.iter().sum::<f64>() / values.len() as f64))
        .collect();

    Some(TeamProfile {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        members: profiles,
        saturation,
        personality_traits,
        skill_gaps,
    })
}

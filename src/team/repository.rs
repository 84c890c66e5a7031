use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scoring::{
    AssessmentTemplate, RepositoryError, ResultId, ScoringResult, TeamId, TemplateId, UserId,
};

/// Lifecycle of a team; only active teams are profiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Forming,
    Active,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
    pub status: TeamStatus,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl Team {
    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|member| member.active)
    }
}

/// Persisted scoring results.
pub trait ResultRepository: Send + Sync {
    /// Batch fetch; unknown ids are absent from the map.
    fn fetch_results(
        &self,
        ids: &[ResultId],
    ) -> Result<HashMap<ResultId, ScoringResult>, RepositoryError>;

    /// Every completed result recorded for a user, in no particular order.
    fn completed_results(&self, user_id: &UserId) -> Result<Vec<ScoringResult>, RepositoryError>;
}

pub trait TemplateRepository: Send + Sync {
    fn fetch_template(&self, id: &TemplateId)
        -> Result<Option<AssessmentTemplate>, RepositoryError>;
}

pub trait TeamRepository: Send + Sync {
    fn find_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError>;
}

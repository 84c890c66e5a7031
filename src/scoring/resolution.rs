use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use super::domain::{Answer, Competency, CompetencyId, Indicator, IndicatorId};
use super::repository::ReferenceLookup;

/// Shared cache of resolved indicators and competencies, safe for concurrent scoring calls.
/// Team profiles are not cached here: they change as members record results.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    indicators: RwLock<HashMap<IndicatorId, Indicator>>,
    competencies: RwLock<HashMap<CompetencyId, Competency>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_indicator(&self, id: &IndicatorId) -> Option<Indicator> {
        self.indicators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn get_competency(&self, id: &CompetencyId) -> Option<Competency> {
        self.competencies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn put_indicator(&self, indicator: Indicator) {
        self.indicators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(indicator.id.clone(), indicator);
    }

    pub fn put_competency(&self, competency: Competency) {
        self.competencies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(competency.id.clone(), competency);
    }

    /// Drop every cached entry, e.g. after the competency catalogue changes.
    pub fn clear(&self) {
        self.indicators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.competencies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.indicators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
            + self
                .competencies
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch whatever the cache is missing for these indicators, one batch per entity kind.
    /// Lookup failures are logged and leave the cache as it was.
    pub fn warm<L>(&self, lookup: &L, indicator_ids: &[IndicatorId])
    where
        L: ReferenceLookup + ?Sized,
    {
        let missing_indicators: Vec<IndicatorId> = {
            let cached = self.indicators.read().unwrap_or_else(PoisonError::into_inner);
            unique(indicator_ids.iter().filter(|id| !cached.contains_key(*id)))
        };

        if !missing_indicators.is_empty() {
            match lookup.resolve_indicators(&missing_indicators) {
                Ok(found) => {
                    debug!(
                        requested = missing_indicators.len(),
                        found = found.len(),
                        "resolved indicators"
                    );
                    for indicator in found.into_values() {
                        self.put_indicator(indicator);
                    }
                }
                Err(err) => warn!(error = %err, "indicator lookup failed; continuing without"),
            }
        }

        let missing_competencies: Vec<CompetencyId> = {
            let indicators = self.indicators.read().unwrap_or_else(PoisonError::into_inner);
            let cached = self
                .competencies
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            unique(
                indicator_ids
                    .iter()
                    .filter_map(|id| indicators.get(id))
                    .filter_map(|indicator| indicator.competency_id.as_ref())
                    .filter(|id| !cached.contains_key(*id)),
            )
        };

        if missing_competencies.is_empty() {
            return;
        }

        match lookup.resolve_competencies(&missing_competencies) {
            Ok(found) => {
                debug!(
                    requested = missing_competencies.len(),
                    found = found.len(),
                    "resolved competencies"
                );
                for competency in found.into_values() {
                    self.put_competency(competency);
                }
            }
            Err(err) => warn!(error = %err, "competency lookup failed; continuing without"),
        }
    }

    /// Warm the cache for a session's answers and snapshot the chain for this call.
    pub fn resolve<L>(&self, lookup: &L, answers: &[Answer]) -> CompetencyResolution
    where
        L: ReferenceLookup + ?Sized,
    {
        let indicator_ids: Vec<IndicatorId> = unique(
            answers
                .iter()
                .filter(|answer| !answer.skipped)
                .filter_map(|answer| answer.question.indicator_id.as_ref()),
        );
        self.warm(lookup, &indicator_ids);

        let mut resolution = CompetencyResolution::default();
        for indicator_id in indicator_ids {
            let competency = self
                .get_indicator(&indicator_id)
                .and_then(|indicator| indicator.competency_id)
                .and_then(|competency_id| self.get_competency(&competency_id));
            if let Some(competency) = competency {
                resolution.by_indicator.insert(indicator_id, competency);
            }
        }
        resolution
    }
}

fn unique<'a, T>(ids: impl Iterator<Item = &'a T>) -> Vec<T>
where
    T: Ord + Clone + 'a,
{
    ids.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Per-call view of the answer -> indicator -> competency chain.
#[derive(Debug, Clone)]
pub struct CompetencyResolution {
    by_indicator: HashMap<IndicatorId, Competency>,
    unknown: Competency,
}

impl Default for CompetencyResolution {
    fn default() -> Self {
        Self {
            by_indicator: HashMap::new(),
            unknown: Competency::unknown(),
        }
    }
}

impl CompetencyResolution {
    /// Build a resolution directly from already-loaded reference data.
    pub fn from_parts(indicators: &[Indicator], competencies: &[Competency]) -> Self {
        let by_id: HashMap<&CompetencyId, &Competency> = competencies
            .iter()
            .map(|competency| (&competency.id, competency))
            .collect();
        let by_indicator = indicators
            .iter()
            .filter_map(|indicator| {
                let competency = indicator
                    .competency_id
                    .as_ref()
                    .and_then(|id| by_id.get(id))?;
                Some((indicator.id.clone(), (*competency).clone()))
            })
            .collect();
        Self {
            by_indicator,
            unknown: Competency::unknown(),
        }
    }

    /// Broken or unresolved chains land in the "Unknown Competency" bucket.
    pub fn competency_for(&self, answer: &Answer) -> &Competency {
        answer
            .question
            .indicator_id
            .as_ref()
            .and_then(|id| self.by_indicator.get(id))
            .unwrap_or(&self.unknown)
    }
}

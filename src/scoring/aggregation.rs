use std::collections::HashMap;

use super::domain::{Answer, Competency, CompetencyId, CompetencyScore};
use super::normalizer::normalize;
use super::resolution::CompetencyResolution;

/// Normalized answers collected under one resolved competency.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetencyGroup {
    pub competency: Competency,
    pub score: f64,
    pub answered: u32,
}

impl CompetencyGroup {
    /// Mean normalized score in [0, 1].
    pub fn average(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.score / f64::from(self.answered)
        }
    }

    pub fn percentage(&self) -> f64 {
        self.average() * 100.0
    }

    pub fn to_score(&self) -> CompetencyScore {
        let answered = f64::from(self.answered);
        let taxonomy = &self.competency.taxonomy;
        CompetencyScore {
            competency_id: self.competency.id.clone(),
            competency_name: self.competency.name.clone(),
            category: self.competency.category.clone(),
            score: self.score,
            max_score: answered,
            percentage: self.percentage(),
            questions_answered: self.answered,
            questions_correct: (self.average() * answered).round() as u32,
            taxonomy: (!taxonomy.is_empty()).then(|| taxonomy.clone()),
            insufficient_evidence: None,
            evidence_note: None,
        }
    }
}

/// Group non-skipped answers by competency, in order of first appearance.
/// Empty or fully skipped input yields no groups at all.
pub fn aggregate(answers: &[Answer], resolution: &CompetencyResolution) -> Vec<CompetencyGroup> {
    let mut groups: Vec<CompetencyGroup> = Vec::new();
    let mut index: HashMap<CompetencyId, usize> = HashMap::new();

    for answer in answers.iter().filter(|answer| !answer.skipped) {
        let competency = resolution.competency_for(answer);
        let slot = *index.entry(competency.id.clone()).or_insert_with(|| {
            groups.push(CompetencyGroup {
                competency: competency.clone(),
                score: 0.0,
                answered: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.score += normalize(answer);
        group.answered += 1;
    }

    groups
}

/// Sum of normalized points across groups, and the number of questions they cover.
pub fn totals(groups: &[CompetencyGroup]) -> (f64, f64) {
    groups.iter().fold((0.0, 0.0), |(score, max), group| {
        (score + group.score, max + f64::from(group.answered))
    })
}

use std::collections::BTreeMap;

use crate::team::Team;

const SHORTHAND_MAX_CHARS: usize = 4;
const COORDINATION_WORDS: [&str; 4] = ["RTE", "COORD", "SHARE", "HELP"];
const URGENCY_MARKS: [&str; 2] = ["‼", "!"];

/// Short strings a team has coined, plus running counts of the kinds of
/// terms it has used. Only grows.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmergencyVocabulary {
    pub team: Team,
    terms: BTreeMap<String, String>,
    shorthand_developed: u32,
    coordination_terms: u32,
    urgency_terms: u32,
}

impl EmergencyVocabulary {
    pub fn new(team: Team) -> EmergencyVocabulary {
        EmergencyVocabulary {
            team,
            terms: BTreeMap::new(),
            shorthand_developed: 0,
            coordination_terms: 0,
            urgency_terms: 0,
        }
    }

    pub fn record(&mut self, content: &str) {
        if content.chars().count() <= SHORTHAND_MAX_CHARS && !self.terms.contains_key(content) {
            self.terms.insert(content.to_string(), "Shorthand for emergency communication".to_string());
            self.shorthand_developed += 1;
        }

        let upper = content.to_uppercase();
        if COORDINATION_WORDS.iter().any(|word| upper.contains(word)) {
            self.coordination_terms += 1;
        }
        if URGENCY_MARKS.iter().any(|mark| content.contains(mark)) {
            self.urgency_terms += 1;
        }
    }

    pub fn terms(&self) -> &BTreeMap<String, String> {
        &self.terms
    }

    pub fn shorthand_developed(&self) -> u32 {
        self.shorthand_developed
    }

    pub fn coordination_terms(&self) -> u32 {
        self.coordination_terms
    }

    pub fn urgency_terms(&self) -> u32 {
        self.urgency_terms
    }

    pub fn total(&self) -> u32 {
        self.shorthand_developed + self.coordination_terms + self.urgency_terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_counted_once() {
        let mut vocabulary = EmergencyVocabulary::new(Team::Fire);
        vocabulary.record("GO");
        vocabulary.record("GO");
        vocabulary.record("LONGER1");
        assert_eq!(vocabulary.shorthand_developed(), 1);
        assert_eq!(vocabulary.terms().len(), 1);
    }

    #[test]
    fn term_counters_accumulate() {
        let mut vocabulary = EmergencyVocabulary::new(Team::Police);
        vocabulary.record("RTE-RDY");
        vocabulary.record("HELP!");
        vocabulary.record("‼️F4");
        assert_eq!(vocabulary.coordination_terms(), 2);
        assert_eq!(vocabulary.urgency_terms(), 2);
        assert_eq!(vocabulary.shorthand_developed(), 1);
        assert_eq!(vocabulary.total(), 5);
    }
}

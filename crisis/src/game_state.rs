use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
    allocation::ResourceAllocation,
    config::GameConfig,
    crisis_state::CrisisState,
    message::{CoordinationEvent, Message},
    team::{Team, TeamStatus},
    vocabulary::EmergencyVocabulary,
};

/// Aggregate root of one game. Built at start, mutated in place by each
/// tick, read-only once the game has ended.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameState {
    pub game_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_secs: u64,
    pub crisis: CrisisState,
    pub allocation: ResourceAllocation,
    #[serde(deserialize_with = "every_team")]
    teams: BTreeMap<Team, TeamStatus>,
    pub messages: Vec<Message>,
    pub coordination_events: Vec<CoordinationEvent>,
    pub vocabulary: BTreeMap<Team, EmergencyVocabulary>,
}

fn every_team<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<Team, TeamStatus>, D::Error> {
    let mut teams = BTreeMap::<Team, TeamStatus>::deserialize(deserializer)?;
    for team in Team::ALL {
        teams.entry(team).or_insert_with(|| TeamStatus::new(team));
    }
    Ok(teams)
}

impl GameState {
    pub fn new(config: &GameConfig, start_time: DateTime<Utc>) -> GameState {
        GameState::with_crisis(config, start_time, CrisisState::initial())
    }

    pub fn with_crisis(config: &GameConfig, start_time: DateTime<Utc>, crisis: CrisisState) -> GameState {
        GameState {
            game_id: Uuid::new_v4(),
            start_time,
            duration_secs: config.game_duration_secs,
            crisis,
            allocation: ResourceAllocation::new(),
            teams: Team::ALL.iter().map(|team| (*team, TeamStatus::new(*team))).collect(),
            messages: Vec::new(),
            coordination_events: Vec::new(),
            vocabulary: Team::ALL.iter().map(|team| (*team, EmergencyVocabulary::new(*team))).collect(),
        }
    }

    pub fn teams(&self) -> &BTreeMap<Team, TeamStatus> {
        &self.teams
    }

    pub fn team(&self, team: Team) -> &TeamStatus {
        &self.teams[&team]
    }

    pub fn team_mut(&mut self, team: Team) -> &mut TeamStatus {
        self.teams.entry(team).or_insert_with(|| TeamStatus::new(team))
    }

    pub fn vocabulary_mut(&mut self, team: Team) -> &mut EmergencyVocabulary {
        self.vocabulary.entry(team).or_insert_with(|| EmergencyVocabulary::new(team))
    }

    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        (now - self.start_time).num_seconds().max(0) as u64
    }

    pub fn time_remaining(&self) -> u64 {
        self.duration_secs.saturating_sub(self.crisis.time_elapsed)
    }

    pub fn recent_messages(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    pub fn total_victims_saved(&self) -> u32 {
        self.teams.values().map(|status| status.victims_saved).sum()
    }

    pub fn total_fire_contained(&self) -> u32 {
        self.teams.values().map(|status| status.fire_contained).sum()
    }

    pub fn total_evacuated(&self) -> u32 {
        self.teams.values().map(|status| status.people_evacuated).sum()
    }

    pub fn vocabulary_total(&self) -> u32 {
        self.vocabulary.values().map(EmergencyVocabulary::total).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::location::Location;

    #[test]
    fn every_team_present() {
        let state = GameState::new(&GameConfig::default(), Utc::now());
        assert_eq!(state.teams.len(), 3);
        assert_eq!(state.vocabulary.len(), 3);
        assert_eq!(state.team(Team::Fire).transmissions_used(), 0);
    }

    #[test]
    fn missing_teams_are_restored_on_load() {
        let state = GameState::new(&GameConfig::default(), Utc::now());
        let mut value = serde_json::to_value(&state).unwrap();
        value["teams"] = serde_json::json!({});

        let loaded: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.teams().len(), 3);
        assert_eq!(loaded.team(Team::Police).location, Location::Exterior);
        assert_eq!(loaded.team(Team::Medical).transmissions_used(), 0);
    }

    #[test]
    fn elapsed_never_negative() {
        let start = Utc::now();
        let state = GameState::new(&GameConfig::default(), start);
        assert_eq!(state.elapsed_at(start - Duration::seconds(5)), 0);
        assert_eq!(state.elapsed_at(start + Duration::milliseconds(12_900)), 12);
    }

    #[test]
    fn recent_window_is_tail() {
        let mut state = GameState::new(&GameConfig::default(), Utc::now());
        for content in ["A", "B", "C"] {
            let message = Message::new(Team::Fire, content, Utc::now(), 12).unwrap();
            state.messages.push(message);
        }
        let recent: Vec<_> = state.recent_messages(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(recent, ["B", "C"]);
        assert_eq!(state.recent_messages(10).len(), 3);
    }
}

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{game_state::GameState, orchestrator::EndReason, team::Team};

const LIFE_WEIGHT: f64 = 100.0;
const FIRE_WEIGHT: f64 = 50.0;
const EVACUATION_WEIGHT: f64 = 25.0;
const COORDINATION_WEIGHT: f64 = 10.0;
const VOCABULARY_WEIGHT: f64 = 2.0;
const TIME_GRACE_SECS: u64 = 180;
const TIME_PENALTY_PER_SEC: f64 = 0.1;
const DAMAGE_PENALTY_PER_LEVEL: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TeamPerformance {
    pub victims_saved: u32,
    pub fire_contained: u32,
    pub people_evacuated: u32,
    pub transmissions_used: u32,
    pub coordination_events: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EfficiencyMetrics {
    pub coordination_success_rate: f64,
    pub average_response_time: f64,
    pub resource_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameResult {
    pub game_id: Uuid,
    pub end_reason: EndReason,
    pub duration: u64,
    pub final_score: f64,
    pub lives_saved: u32,
    pub fire_contained: u32,
    pub people_evacuated: u32,
    pub coordination_events: usize,
    pub emergent_vocabulary: BTreeMap<String, u32>,
    pub efficiency: EfficiencyMetrics,
    pub team_performance: BTreeMap<Team, TeamPerformance>,
}

impl GameResult {
    pub fn vocabulary_terms(&self) -> u32 {
        self.emergent_vocabulary.values().sum()
    }
}

/// Weighted outcome of a game, never below zero.
pub fn score(state: &GameState) -> f64 {
    let elapsed = state.crisis.time_elapsed;
    let time_penalty = elapsed.saturating_sub(TIME_GRACE_SECS) as f64 * TIME_PENALTY_PER_SEC;
    let damage = 10u8.saturating_sub(state.crisis.building_stability());
    let damage_penalty = f64::from(damage) * DAMAGE_PENALTY_PER_LEVEL;

    let total = f64::from(state.total_victims_saved()) * LIFE_WEIGHT
        + f64::from(state.total_fire_contained()) * FIRE_WEIGHT
        + f64::from(state.total_evacuated()) * EVACUATION_WEIGHT
        + state.coordination_events.len() as f64 * COORDINATION_WEIGHT
        + f64::from(state.vocabulary_total()) * VOCABULARY_WEIGHT
        - time_penalty
        - damage_penalty;

    total.max(0.0)
}

pub fn result(state: &GameState, end_reason: EndReason) -> GameResult {
    let events = &state.coordination_events;
    let elapsed = state.crisis.time_elapsed;

    let mut emergent_vocabulary = BTreeMap::new();
    for (team, vocabulary) in &state.vocabulary {
        emergent_vocabulary.insert(format!("{team}_shorthand"), vocabulary.shorthand_developed());
        emergent_vocabulary.insert(format!("{team}_coordination"), vocabulary.coordination_terms());
        emergent_vocabulary.insert(format!("{team}_urgency"), vocabulary.urgency_terms());
    }

    let team_performance = state
        .teams()
        .iter()
        .map(|(team, status)| {
            let performance = TeamPerformance {
                victims_saved: status.victims_saved,
                fire_contained: status.fire_contained,
                people_evacuated: status.people_evacuated,
                transmissions_used: status.transmissions_used(),
                coordination_events: events.iter().filter(|event| event.involves(*team)).count(),
            };
            (*team, performance)
        })
        .collect();

    let successes = events.iter().filter(|event| event.is_success()).count();
    let efficiency = EfficiencyMetrics {
        coordination_success_rate: successes as f64 / events.len().max(1) as f64,
        average_response_time: elapsed as f64 / state.messages.len().max(1) as f64,
        resource_utilization: if elapsed == 0 { 0.0 } else { state.allocation.utilization() },
    };

    GameResult {
        game_id: state.game_id,
        end_reason,
        duration: elapsed,
        final_score: score(state),
        lives_saved: state.total_victims_saved(),
        fire_contained: state.total_fire_contained(),
        people_evacuated: state.total_evacuated(),
        coordination_events: events.len(),
        emergent_vocabulary,
        efficiency,
        team_performance,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        config::GameConfig,
        crisis_state::CrisisState,
        message::{CoordinationEvent, CoordinationKind, Message},
    };

    fn state(stability: u8) -> GameState {
        GameState::with_crisis(&GameConfig::default(), Utc::now(), CrisisState::new(0, stability))
    }

    #[test]
    fn weighted_sum() {
        let mut state = state(10);
        state.team_mut(Team::Medical).victims_saved = 3;
        state.team_mut(Team::Fire).fire_contained = 1;
        state.team_mut(Team::Police).people_evacuated = 2;
        state.coordination_events.push(CoordinationEvent::success(
            CoordinationKind::CoordinationSuccess,
            vec![Team::Police],
            Utc::now(),
        ));
        state.vocabulary_mut(Team::Fire).record("GO!");
        // 300 + 50 + 50 + 10 + 2 * (shorthand + urgency)
        assert_eq!(score(&state), 414.0);
    }

    #[test]
    fn penalties_apply_after_grace() {
        let mut state = state(8);
        state.team_mut(Team::Medical).victims_saved = 1;
        state.crisis.time_elapsed = 200;
        // 100 - 0.1 * 20 - 5 * 2
        assert!((score(&state) - 88.0).abs() < 1e-9);
    }

    #[test]
    fn never_negative() {
        let mut state = state(0);
        state.crisis.time_elapsed = u64::MAX / 2;
        assert_eq!(score(&state), 0.0);
    }

    #[test]
    fn result_breakdown() {
        let mut state = state(7);
        state.crisis.time_elapsed = 30;
        state.team_mut(Team::Fire).victims_saved = 1;
        state.team_mut(Team::Medical).victims_saved = 1;
        state.coordination_events.push(CoordinationEvent::success(
            CoordinationKind::SuccessfulRescue,
            vec![Team::Fire, Team::Medical],
            Utc::now(),
        ));
        for content in ["A", "B", "C"] {
            state.messages.push(Message::new(Team::Fire, content, Utc::now(), 12).unwrap());
        }

        let result = result(&state, EndReason::TimeLimit);
        assert_eq!(result.lives_saved, 2);
        assert_eq!(result.duration, 30);
        assert_eq!(result.end_reason, EndReason::TimeLimit);
        assert_eq!(result.efficiency.coordination_success_rate, 1.0);
        assert_eq!(result.efficiency.average_response_time, 10.0);
        assert_eq!(result.team_performance[&Team::Fire].coordination_events, 1);
        assert_eq!(result.team_performance[&Team::Police].coordination_events, 0);
        assert_eq!(result.emergent_vocabulary["MEDICAL_urgency"], 0);
        assert_eq!(result.emergent_vocabulary.len(), 9);
    }

    #[test]
    fn empty_game_has_no_division_by_zero() {
        let state = state(10);
        let result = result(&state, EndReason::Stopped);
        assert_eq!(result.efficiency.coordination_success_rate, 0.0);
        assert_eq!(result.efficiency.average_response_time, 0.0);
        assert_eq!(result.efficiency.resource_utilization, 0.0);
    }
}

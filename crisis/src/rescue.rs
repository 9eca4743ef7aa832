use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    allocation::EvacRoute,
    game_state::GameState,
    location::{Access, Location},
    message::{CoordinationEvent, CoordinationKind},
    team::Team,
};

/// Most victims moved out of one location in one evaluation.
pub const RESCUE_CAP: u32 = 2;
pub const RESCUE_TIME_SAVED: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueOutcome {
    pub location: Location,
    pub rescued: u32,
    pub teams: Vec<Team>,
}

fn can_rescue(state: &GameState, location: Location) -> bool {
    let allocation = &state.allocation;
    match location.access() {
        Access::HighFloor => allocation.ladder_held_by_fire_at(location) && allocation.ambulance_at(location),
        Access::Ground => allocation.ambulance_at(location),
        Access::Exterior => allocation.ambulance_at(location) && allocation.evac_route == EvacRoute::Clear,
        Access::Unreachable => false,
    }
}

/// Credits the teams for `rescued` victims and returns who took part.
fn credit(state: &mut GameState, location: Location, rescued: u32) -> Vec<Team> {
    match location.access() {
        Access::HighFloor => {
            state.team_mut(Team::Fire).victims_saved += rescued / 2;
            state.team_mut(Team::Medical).victims_saved += rescued - rescued / 2;
            vec![Team::Fire, Team::Medical]
        }
        Access::Ground => {
            state.team_mut(Team::Medical).victims_saved += rescued;
            vec![Team::Medical]
        }
        Access::Exterior => {
            state.team_mut(Team::Medical).victims_saved += rescued;
            state.team_mut(Team::Police).people_evacuated += rescued;
            vec![Team::Medical, Team::Police]
        }
        Access::Unreachable => Vec::new(),
    }
}

/// Moves victims out of every location whose rescue precondition holds,
/// at most [`RESCUE_CAP`] per location, and logs one coordination event per
/// rescue.
pub fn evaluate(state: &mut GameState, now: DateTime<Utc>) -> Vec<RescueOutcome> {
    let pending: Vec<(Location, u32)> = state
        .crisis
        .victims()
        .iter()
        .map(|(location, count)| (*location, *count))
        .collect();

    let mut outcomes = Vec::new();
    for (location, count) in pending {
        if count == 0 || !can_rescue(state, location) {
            continue;
        }
        let rescued = state.crisis.remove_victims(location, count.min(RESCUE_CAP));
        if rescued == 0 {
            continue;
        }
        let teams = credit(state, location, rescued);

        let mut event = CoordinationEvent::success(CoordinationKind::SuccessfulRescue, teams.clone(), now);
        event.location = Some(location);
        event.lives_saved = rescued;
        event.time_saved = RESCUE_TIME_SAVED;
        state.coordination_events.push(event);

        info!(%location, rescued, remaining = state.crisis.victims_at(location), "rescue completed");
        outcomes.push(RescueOutcome { location, rescued, teams });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allocation::Resource, config::GameConfig, crisis_state::CrisisState};

    fn state_with(victims: &[(Location, u32)]) -> GameState {
        let mut crisis = CrisisState::new(0, 10);
        for (location, count) in victims {
            crisis.add_victims(*location, *count);
        }
        GameState::with_crisis(&GameConfig::default(), Utc::now(), crisis)
    }

    #[test]
    fn high_floor_needs_fire_ladder_and_ambulance() {
        let mut state = state_with(&[(Location::Floor3, 2)]);
        state.allocation.request(Team::Fire, Resource::Ladder, Location::Floor3, 5);
        assert!(evaluate(&mut state, Utc::now()).is_empty());

        state.allocation.request(Team::Medical, Resource::Ambulance1, Location::Floor3, 5);
        let outcomes = evaluate(&mut state, Utc::now());
        assert_eq!(outcomes, vec![RescueOutcome {
            location: Location::Floor3,
            rescued: 2,
            teams: vec![Team::Fire, Team::Medical],
        }]);
        assert!(state.crisis.is_resolved());
        assert_eq!(state.team(Team::Fire).victims_saved, 1);
        assert_eq!(state.team(Team::Medical).victims_saved, 1);
        assert_eq!(state.coordination_events.len(), 1);
        assert_eq!(state.coordination_events[0].lives_saved, 2);
        assert_eq!(state.coordination_events[0].time_saved, RESCUE_TIME_SAVED);
    }

    #[test]
    fn ladder_held_by_other_team_blocks_high_floor() {
        let mut state = state_with(&[(Location::Floor4, 1)]);
        state.allocation.request(Team::Police, Resource::Ladder, Location::Floor4, 5);
        state.allocation.request(Team::Medical, Resource::Ambulance2, Location::Floor4, 5);
        assert!(evaluate(&mut state, Utc::now()).is_empty());
        assert_eq!(state.crisis.victims_at(Location::Floor4), 1);
    }

    #[test]
    fn odd_high_floor_rescue_favours_medical() {
        let mut state = state_with(&[(Location::Floor4, 1)]);
        state.allocation.request(Team::Fire, Resource::Ladder, Location::Floor4, 5);
        state.allocation.request(Team::Police, Resource::Ambulance2, Location::Floor4, 5);
        evaluate(&mut state, Utc::now());
        assert_eq!(state.team(Team::Fire).victims_saved, 0);
        assert_eq!(state.team(Team::Medical).victims_saved, 1);
    }

    #[test]
    fn rescue_is_capped_per_location() {
        let mut state = state_with(&[(Location::Lobby, 5)]);
        state.allocation.request(Team::Medical, Resource::Ambulance1, Location::Lobby, 5);
        let outcomes = evaluate(&mut state, Utc::now());
        assert_eq!(outcomes[0].rescued, 2);
        assert_eq!(state.crisis.victims_at(Location::Lobby), 3);
        assert_eq!(state.team(Team::Medical).victims_saved, 2);

        evaluate(&mut state, Utc::now());
        evaluate(&mut state, Utc::now());
        assert!(state.crisis.victims().get(&Location::Lobby).is_none());
        assert_eq!(state.team(Team::Medical).victims_saved, 5);
    }

    #[test]
    fn exterior_needs_clear_route() {
        let mut state = state_with(&[(Location::Exterior, 2)]);
        state.allocation.request(Team::Medical, Resource::Ambulance1, Location::Exterior, 5);
        assert!(evaluate(&mut state, Utc::now()).is_empty());

        state.allocation.evac_route = EvacRoute::Clear;
        let outcomes = evaluate(&mut state, Utc::now());
        assert_eq!(outcomes[0].teams, vec![Team::Medical, Team::Police]);
        assert_eq!(state.team(Team::Medical).victims_saved, 2);
        assert_eq!(state.team(Team::Police).people_evacuated, 2);
    }

    #[test]
    fn wings_never_rescued() {
        let mut state = state_with(&[(Location::EastWing, 2), (Location::Floor1, 1)]);
        state.allocation.request(Team::Medical, Resource::Ambulance1, Location::EastWing, 5);
        state.allocation.request(Team::Medical, Resource::Ambulance2, Location::Floor1, 5);
        let outcomes = evaluate(&mut state, Utc::now());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].location, Location::Floor1);
        assert_eq!(state.crisis.victims_at(Location::EastWing), 2);
    }
}

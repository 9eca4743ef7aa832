use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Fire,
    Medical,
    Police,
}

#[derive(Debug, Clone, Copy)]
pub struct TeamProfile {
    pub name: &'static str,
    pub priority_focus: &'static str,
    pub starting_location: Location,
}

impl Team {
    /// Fixed turn order.
    pub const ALL: [Team; 3] = [Team::Fire, Team::Medical, Team::Police];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Fire => "FIRE",
            Team::Medical => "MEDICAL",
            Team::Police => "POLICE",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Team::Fire => "🔥",
            Team::Medical => "🚑",
            Team::Police => "👮",
        }
    }

    pub fn profile(&self) -> TeamProfile {
        match self {
            Team::Fire => TeamProfile {
                name: "Fire Team Alpha",
                priority_focus: "FIRE_SUPPRESSION",
                starting_location: Location::Exterior,
            },
            Team::Medical => TeamProfile {
                name: "Medical Team Bravo",
                priority_focus: "VICTIM_RESCUE",
                starting_location: Location::Lobby,
            },
            Team::Police => TeamProfile {
                name: "Police Team Charlie",
                priority_focus: "EVACUATION_CONTROL",
                starting_location: Location::Exterior,
            },
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TeamStatus {
    pub team: Team,
    pub location: Location,
    pub priority: String,
    pub victims_saved: u32,
    pub fire_contained: u32,
    pub people_evacuated: u32,
    transmissions_used: u32,
    last_transmission: Option<DateTime<Utc>>,
}

impl TeamStatus {
    pub fn new(team: Team) -> TeamStatus {
        let profile = team.profile();
        TeamStatus {
            team,
            location: profile.starting_location,
            priority: profile.priority_focus.to_string(),
            victims_saved: 0,
            fire_contained: 0,
            people_evacuated: 0,
            transmissions_used: 0,
            last_transmission: None,
        }
    }

    pub fn transmissions_used(&self) -> u32 {
        self.transmissions_used
    }

    pub fn last_transmission(&self) -> Option<DateTime<Utc>> {
        self.last_transmission
    }

    /// Gate checked before the team's policy is consulted.
    pub fn may_transmit(&self, max_transmissions: u32, cooldown: Duration, now: DateTime<Utc>) -> bool {
        if self.transmissions_used >= max_transmissions {
            return false;
        }
        match self.last_transmission {
            Some(last) => now - last >= cooldown,
            None => true,
        }
    }

    pub fn record_transmission(&mut self, now: DateTime<Utc>) {
        self.transmissions_used += 1;
        self.last_transmission = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_place_teams() {
        assert_eq!(TeamStatus::new(Team::Medical).location, Location::Lobby);
        assert_eq!(TeamStatus::new(Team::Police).priority, "EVACUATION_CONTROL");
    }

    #[test]
    fn gate_closes_at_max_transmissions() {
        let now = Utc::now();
        let mut status = TeamStatus::new(Team::Fire);
        status.record_transmission(now - Duration::seconds(10));
        status.record_transmission(now - Duration::seconds(10));
        assert!(!status.may_transmit(2, Duration::zero(), now));
        assert!(status.may_transmit(3, Duration::zero(), now));
    }

    #[test]
    fn gate_respects_cooldown() {
        let now = Utc::now();
        let mut status = TeamStatus::new(Team::Police);
        status.record_transmission(now);
        assert!(!status.may_transmit(10, Duration::seconds(1), now + Duration::milliseconds(500)));
        assert!(status.may_transmit(10, Duration::seconds(1), now + Duration::seconds(1)));
    }
}

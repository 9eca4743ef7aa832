use chrono::{DateTime, Utc};

use crate::{
    allocation::Resource,
    classifier,
    error::MessageError,
    location::Location,
    team::Team,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ResourceRequest,
    StatusUpdate,
    UrgentAlert,
    Coordination,
}

/// One radio transmission. Created once, appended to the game log, never
/// edited.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub team: Team,
    pub content: String,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    pub is_urgent: bool,
    pub target_team: Option<Team>,
    pub location: Option<Location>,
}

impl Message {
    pub fn new(team: Team, content: &str, timestamp: DateTime<Utc>, max_chars: usize) -> Result<Message, MessageError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MessageError::Empty);
        }
        let chars = content.chars().count();
        if chars > max_chars {
            return Err(MessageError::TooLong { chars, max: max_chars });
        }

        let classification = classifier::classify(content);
        Ok(Message {
            team,
            content: content.to_string(),
            kind: classification.kind,
            timestamp,
            is_urgent: classification.is_urgent,
            target_team: classification.target_team,
            location: classification.location,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinationKind {
    ResourceSharing,
    CoordinationSuccess,
    SuccessfulRescue,
}

pub const OUTCOME_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CoordinationEvent {
    pub kind: CoordinationKind,
    pub teams: Vec<Team>,
    pub resource: Option<Resource>,
    pub location: Option<Location>,
    pub timestamp: DateTime<Utc>,
    pub outcome: String,
    pub lives_saved: u32,
    pub time_saved: u32,
}

impl CoordinationEvent {
    pub fn success(kind: CoordinationKind, teams: Vec<Team>, timestamp: DateTime<Utc>) -> CoordinationEvent {
        CoordinationEvent {
            kind,
            teams,
            resource: None,
            location: None,
            timestamp,
            outcome: OUTCOME_SUCCESS.to_string(),
            lives_saved: 0,
            time_saved: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == OUTCOME_SUCCESS
    }

    pub fn involves(&self, team: Team) -> bool {
        self.teams.contains(&team)
    }
}

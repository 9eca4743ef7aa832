//! Literal keyword rules that turn a short radio message into tags.
//!
//! Every table is evaluated top to bottom against the upper-cased text and
//! the first matching rule wins.

use crate::{
    allocation::{EvacRoute, Resource},
    location::Location,
    message::MessageKind,
    team::Team,
};

#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    Any(&'static [&'static str]),
    All(&'static [&'static str]),
}

impl Pattern {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Pattern::Any(needles) => needles.iter().any(|needle| text.contains(needle)),
            Pattern::All(needles) => needles.iter().all(|needle| text.contains(needle)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    pub pattern: Pattern,
    pub value: T,
}

const fn any<T>(needles: &'static [&'static str], value: T) -> Rule<T> {
    Rule { pattern: Pattern::Any(needles), value }
}

const fn all<T>(needles: &'static [&'static str], value: T) -> Rule<T> {
    Rule { pattern: Pattern::All(needles), value }
}

pub const KIND_RULES: &[Rule<MessageKind>] = &[
    any(&["?"], MessageKind::ResourceRequest),
    any(&["‼", "!"], MessageKind::UrgentAlert),
    any(&["RTE", "EVAC", "CLEAR", "BLOCK"], MessageKind::Coordination),
];

pub const URGENCY_MARKERS: Pattern = Pattern::Any(&["‼", "!", "URGENT", "EMERGENCY", "HELP"]);

pub const TARGET_RULES: &[Rule<Team>] = &[
    any(&["FIRE", "L→"], Team::Fire),
    any(&["MED", "AMB"], Team::Medical),
    any(&["POL", "RTE"], Team::Police),
];

pub const LOCATION_RULES: &[Rule<Location>] = &[
    any(&["F1"], Location::Floor1),
    any(&["F2"], Location::Floor2),
    any(&["F3"], Location::Floor3),
    any(&["F4"], Location::Floor4),
    any(&["EW"], Location::EastWing),
    any(&["WW"], Location::WestWing),
    any(&["LB"], Location::Lobby),
    any(&["EXT"], Location::Exterior),
];

pub const RESOURCE_RULES: &[Rule<Resource>] = &[
    any(&["L→", "LADDER"], Resource::Ladder),
    all(&["AMB", "1"], Resource::Ambulance1),
    any(&["AMB"], Resource::Ambulance2),
];

pub const EVAC_ROUTE_RULES: &[Rule<EvacRoute>] = &[
    any(&["BLOCK"], EvacRoute::Blocked),
    any(&["CLR", "CLEAR"], EvacRoute::Clear),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: MessageKind,
    pub is_urgent: bool,
    pub target_team: Option<Team>,
    pub location: Option<Location>,
}

pub fn first_match<T: Copy>(rules: &[Rule<T>], text: &str) -> Option<T> {
    let text = text.to_uppercase();
    rules.iter().find(|rule| rule.pattern.matches(&text)).map(|rule| rule.value)
}

pub fn kind(text: &str) -> MessageKind {
    first_match(KIND_RULES, text).unwrap_or(MessageKind::StatusUpdate)
}

pub fn is_urgent(text: &str) -> bool {
    URGENCY_MARKERS.matches(&text.to_uppercase())
}

pub fn target_team(text: &str) -> Option<Team> {
    first_match(TARGET_RULES, text)
}

pub fn location(text: &str) -> Option<Location> {
    first_match(LOCATION_RULES, text)
}

pub fn resource(text: &str) -> Option<Resource> {
    first_match(RESOURCE_RULES, text)
}

pub fn evac_route(text: &str) -> Option<EvacRoute> {
    first_match(EVAC_ROUTE_RULES, text)
}

pub fn classify(text: &str) -> Classification {
    Classification {
        kind: kind(text),
        is_urgent: is_urgent(text),
        target_team: target_team(text),
        location: location(text),
    }
}

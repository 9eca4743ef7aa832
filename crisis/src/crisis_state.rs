use std::collections::{BTreeMap, BTreeSet};

use crate::location::Location;

pub const LEVEL_MAX: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrisisEventKind {
    FireSpreading,
    VictimFound,
    GasPressure,
    StructureCollapse,
    AmbulanceDelayed,
    EvacRouteBlocked,
}

impl CrisisEventKind {
    pub const ALL: [CrisisEventKind; 6] = [
        CrisisEventKind::FireSpreading,
        CrisisEventKind::VictimFound,
        CrisisEventKind::GasPressure,
        CrisisEventKind::StructureCollapse,
        CrisisEventKind::AmbulanceDelayed,
        CrisisEventKind::EvacRouteBlocked,
    ];

    pub fn headline(&self) -> &'static str {
        match self {
            CrisisEventKind::FireSpreading => "Fire spreading",
            CrisisEventKind::VictimFound => "Victim found",
            CrisisEventKind::GasPressure => "Gas pressure building",
            CrisisEventKind::StructureCollapse => "Structure collapse on floor 2",
            CrisisEventKind::AmbulanceDelayed => "Ambulance arrival delayed",
            CrisisEventKind::EvacRouteBlocked => "Evac route blocked by debris",
        }
    }
}

/// Timeline state of the incident. Gas pressure and stability stay in
/// `0..=10` and the victim map never holds a zero entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrisisState {
    pub fire_locations: BTreeSet<Location>,
    victims: BTreeMap<Location, u32>,
    pub blocked_routes: BTreeSet<Location>,
    gas_pressure: u8,
    building_stability: u8,
    pub time_elapsed: u64,
    pub events: Vec<CrisisEventKind>,
}

impl CrisisState {
    pub fn new(gas_pressure: u8, building_stability: u8) -> CrisisState {
        CrisisState {
            fire_locations: BTreeSet::new(),
            victims: BTreeMap::new(),
            blocked_routes: BTreeSet::new(),
            gas_pressure: gas_pressure.min(LEVEL_MAX),
            building_stability: building_stability.min(LEVEL_MAX),
            time_elapsed: 0,
            events: Vec::new(),
        }
    }

    /// The opening scenario: an apartment building after a gas explosion.
    pub fn initial() -> CrisisState {
        let mut state = CrisisState::new(3, 7);
        state.fire_locations.extend([Location::Floor2, Location::EastWing]);
        state.add_victims(Location::Floor3, 2);
        state.add_victims(Location::Floor4, 1);
        state.add_victims(Location::Lobby, 3);
        state.blocked_routes.insert(Location::Floor1);
        state
    }

    pub fn victims(&self) -> &BTreeMap<Location, u32> {
        &self.victims
    }

    pub fn victims_at(&self, location: Location) -> u32 {
        self.victims.get(&location).copied().unwrap_or(0)
    }

    pub fn total_victims(&self) -> u32 {
        self.victims.values().sum()
    }

    pub fn is_resolved(&self) -> bool {
        self.victims.is_empty()
    }

    pub fn add_victims(&mut self, location: Location, count: u32) {
        if count == 0 {
            return;
        }
        *self.victims.entry(location).or_insert(0) += count;
    }

    /// Removes up to `count` victims and returns how many were removed.
    pub fn remove_victims(&mut self, location: Location, count: u32) -> u32 {
        let Some(present) = self.victims.get_mut(&location) else { return 0 };
        let removed = count.min(*present);
        *present -= removed;
        if *present == 0 {
            self.victims.remove(&location);
        }
        removed
    }

    pub fn gas_pressure(&self) -> u8 {
        self.gas_pressure
    }

    pub fn building_stability(&self) -> u8 {
        self.building_stability
    }

    pub fn raise_gas_pressure(&mut self, amount: u8) {
        self.gas_pressure = self.gas_pressure.saturating_add(amount).min(LEVEL_MAX);
    }

    /// Drops stability by one unless it already sits at or below `floor`.
    pub fn weaken_structure(&mut self, floor: u8) {
        if self.building_stability > floor {
            self.building_stability -= 1;
        }
    }

    pub fn is_critical(&self) -> bool {
        self.gas_pressure >= 7 || self.building_stability <= 3
    }
}

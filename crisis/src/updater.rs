use rand::{seq::SliceRandom, Rng};
use tracing::info;

use crate::{
    config::GameConfig,
    crisis_state::{CrisisEventKind, CrisisState},
    location::Location,
};

const FIRE_SPREAD_TARGETS: [Location; 2] = [Location::Floor3, Location::WestWing];
const VICTIM_FOUND_TARGETS: [Location; 2] = [Location::Floor2, Location::Floor4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredEvent {
    pub kind: CrisisEventKind,
    pub location: Option<Location>,
}

/// Drives the scripted timeline. The flash-event schedule and the
/// deterioration schedule keep their own due times; each fires at most once
/// per call however far `elapsed` has jumped.
#[derive(Debug, Clone)]
pub struct CrisisUpdater {
    event_interval: u64,
    next_event_at: u64,
    deterioration_interval: u64,
    next_deterioration_at: u64,
    stability_floor: u8,
    gas_event_increment: u8,
}

impl CrisisUpdater {
    pub fn new(config: &GameConfig) -> CrisisUpdater {
        CrisisUpdater {
            event_interval: config.crisis_event_interval_secs,
            next_event_at: config.crisis_event_interval_secs,
            deterioration_interval: config.deterioration_interval_secs,
            next_deterioration_at: config.deterioration_interval_secs,
            stability_floor: config.stability_floor,
            gas_event_increment: config.gas_event_increment,
        }
    }

    pub fn tick(&mut self, state: &mut CrisisState, elapsed: u64, rng: &mut impl Rng) -> Option<FiredEvent> {
        state.time_elapsed = elapsed;

        let fired = if self.event_interval > 0 && elapsed >= self.next_event_at {
            self.next_event_at += self.event_interval;
            Some(self.trigger(state, rng))
        } else {
            None
        };

        if self.deterioration_interval > 0 && elapsed >= self.next_deterioration_at {
            self.next_deterioration_at += self.deterioration_interval;
            state.raise_gas_pressure(1);
            state.weaken_structure(self.stability_floor);
        }

        fired
    }

    fn trigger(&self, state: &mut CrisisState, rng: &mut impl Rng) -> FiredEvent {
        let kind = CrisisEventKind::ALL[rng.gen_range(0..CrisisEventKind::ALL.len())];
        state.events.push(kind);

        let location = match kind {
            CrisisEventKind::FireSpreading => {
                let location = *FIRE_SPREAD_TARGETS.choose(rng).unwrap_or(&Location::Floor3);
                state.fire_locations.insert(location);
                Some(location)
            }
            CrisisEventKind::VictimFound => {
                let location = *VICTIM_FOUND_TARGETS.choose(rng).unwrap_or(&Location::Floor4);
                state.add_victims(location, 1);
                Some(location)
            }
            CrisisEventKind::GasPressure => {
                state.raise_gas_pressure(self.gas_event_increment);
                None
            }
            CrisisEventKind::StructureCollapse
            | CrisisEventKind::AmbulanceDelayed
            | CrisisEventKind::EvacRouteBlocked => None,
        };

        info!(event = ?kind, ?location, elapsed = state.time_elapsed, "crisis event");
        FiredEvent { kind, location }
    }
}

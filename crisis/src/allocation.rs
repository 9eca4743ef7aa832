use std::fmt;

use tracing::debug;

use crate::{location::Location, team::Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Ladder,
    #[serde(rename = "AMBULANCE_1")]
    Ambulance1,
    #[serde(rename = "AMBULANCE_2")]
    Ambulance2,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Ladder, Resource::Ambulance1, Resource::Ambulance2];

    pub fn is_ambulance(&self) -> bool {
        matches!(self, Resource::Ambulance1 | Resource::Ambulance2)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Ladder => f.write_str("ladder"),
            Resource::Ambulance1 => f.write_str("ambulance 1"),
            Resource::Ambulance2 => f.write_str("ambulance 2"),
        }
    }
}

/// An exclusive, timed hold on one resource. Owner, location and remaining
/// time only ever exist together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Lease {
    pub owner: Team,
    pub location: Location,
    pub remaining_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvacRoute {
    Clear,
    Blocked,
    Partial,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceAllocation {
    ladder: Option<Lease>,
    ambulance_1: Option<Lease>,
    ambulance_2: Option<Lease>,
    pub evac_route: EvacRoute,
    pub evac_route_controller: Option<Team>,
}

impl ResourceAllocation {
    pub fn new() -> ResourceAllocation {
        ResourceAllocation {
            ladder: None,
            ambulance_1: None,
            ambulance_2: None,
            evac_route: EvacRoute::Blocked,
            evac_route_controller: None,
        }
    }

    pub fn lease(&self, resource: Resource) -> Option<&Lease> {
        self.slot(resource).as_ref()
    }

    pub fn owner(&self, resource: Resource) -> Option<Team> {
        self.lease(resource).map(|lease| lease.owner)
    }

    pub fn location(&self, resource: Resource) -> Option<Location> {
        self.lease(resource).map(|lease| lease.location)
    }

    pub fn remaining_secs(&self, resource: Resource) -> Option<u32> {
        self.lease(resource).map(|lease| lease.remaining_secs)
    }

    pub fn is_leased(&self, resource: Resource) -> bool {
        self.lease(resource).is_some()
    }

    pub fn ambulance_at(&self, location: Location) -> bool {
        self.location(Resource::Ambulance1) == Some(location)
            || self.location(Resource::Ambulance2) == Some(location)
    }

    pub fn ladder_held_by_fire_at(&self, location: Location) -> bool {
        self.lease(Resource::Ladder)
            .is_some_and(|lease| lease.owner == Team::Fire && lease.location == location)
    }

    /// Grants the resource if nobody holds it. A held resource is left
    /// untouched and the request is refused; callers retry with a new message.
    pub fn request(&mut self, team: Team, resource: Resource, location: Location, duration_secs: u32) -> bool {
        let slot = self.slot_mut(resource);
        if slot.is_some() {
            return false;
        }
        *slot = Some(Lease {
            owner: team,
            location,
            remaining_secs: duration_secs,
        });
        true
    }

    /// Counts every lease down by `step_secs` and releases the ones that run
    /// out. Returns the resources that became free.
    pub fn tick(&mut self, step_secs: u32) -> Vec<Resource> {
        let mut released = Vec::new();
        for resource in Resource::ALL {
            let slot = self.slot_mut(resource);
            let expired_owner = match slot.as_mut() {
                Some(lease) => {
                    lease.remaining_secs = lease.remaining_secs.saturating_sub(step_secs);
                    (lease.remaining_secs == 0).then_some(lease.owner)
                }
                None => continue,
            };
            if let Some(owner) = expired_owner {
                debug!(%resource, %owner, "lease expired");
                *slot = None;
                released.push(resource);
            }
        }
        released
    }

    /// Share of the three resources currently held, weighted 0.4 for the
    /// ladder and 0.3 per ambulance.
    pub fn utilization(&self) -> f64 {
        let mut utilization = 0.0;
        if self.is_leased(Resource::Ladder) {
            utilization += 0.4;
        }
        if self.is_leased(Resource::Ambulance1) {
            utilization += 0.3;
        }
        if self.is_leased(Resource::Ambulance2) {
            utilization += 0.3;
        }
        utilization
    }

    fn slot(&self, resource: Resource) -> &Option<Lease> {
        match resource {
            Resource::Ladder => &self.ladder,
            Resource::Ambulance1 => &self.ambulance_1,
            Resource::Ambulance2 => &self.ambulance_2,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut Option<Lease> {
        match resource {
            Resource::Ladder => &mut self.ladder,
            Resource::Ambulance1 => &mut self.ambulance_1,
            Resource::Ambulance2 => &mut self.ambulance_2,
        }
    }
}

impl Default for ResourceAllocation {
    fn default() -> Self {
        ResourceAllocation::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_sets_whole_lease() {
        let mut allocation = ResourceAllocation::new();
        assert!(allocation.request(Team::Fire, Resource::Ladder, Location::Floor3, 5));
        assert_eq!(
            allocation.lease(Resource::Ladder),
            Some(&Lease { owner: Team::Fire, location: Location::Floor3, remaining_secs: 5 })
        );
    }

    #[test]
    fn second_request_is_refused_without_mutation() {
        let mut allocation = ResourceAllocation::new();
        assert!(allocation.request(Team::Fire, Resource::Ladder, Location::Floor3, 5));
        assert!(!allocation.request(Team::Medical, Resource::Ladder, Location::Floor4, 30));
        assert_eq!(allocation.owner(Resource::Ladder), Some(Team::Fire));
        assert_eq!(allocation.location(Resource::Ladder), Some(Location::Floor3));
        assert_eq!(allocation.remaining_secs(Resource::Ladder), Some(5));
    }

    #[test]
    fn ambulances_are_independent() {
        let mut allocation = ResourceAllocation::new();
        assert!(allocation.request(Team::Medical, Resource::Ambulance1, Location::Lobby, 5));
        assert!(allocation.request(Team::Police, Resource::Ambulance2, Location::Exterior, 5));
        assert!(allocation.ambulance_at(Location::Lobby));
        assert!(allocation.ambulance_at(Location::Exterior));
        assert!(!allocation.ambulance_at(Location::Floor2));
    }

    #[test]
    fn tick_releases_at_zero() {
        let mut allocation = ResourceAllocation::new();
        allocation.request(Team::Fire, Resource::Ladder, Location::Floor4, 20);
        assert!(allocation.tick(10).is_empty());
        assert_eq!(allocation.remaining_secs(Resource::Ladder), Some(10));
        assert_eq!(allocation.tick(10), vec![Resource::Ladder]);
        assert!(allocation.lease(Resource::Ladder).is_none());
        assert!(allocation.request(Team::Medical, Resource::Ladder, Location::Floor1, 5));
    }

    #[test]
    fn tick_saturates_short_leases() {
        let mut allocation = ResourceAllocation::new();
        allocation.request(Team::Medical, Resource::Ambulance2, Location::Floor1, 5);
        assert_eq!(allocation.tick(10), vec![Resource::Ambulance2]);
        assert_eq!(allocation.owner(Resource::Ambulance2), None);
        assert_eq!(allocation.location(Resource::Ambulance2), None);
        assert_eq!(allocation.remaining_secs(Resource::Ambulance2), None);
    }

    #[test]
    fn ladder_must_belong_to_fire() {
        let mut allocation = ResourceAllocation::new();
        allocation.request(Team::Medical, Resource::Ladder, Location::Floor3, 5);
        assert!(!allocation.ladder_held_by_fire_at(Location::Floor3));
    }

    #[test]
    fn utilization_weights() {
        let mut allocation = ResourceAllocation::new();
        assert_eq!(allocation.utilization(), 0.0);
        allocation.request(Team::Fire, Resource::Ladder, Location::Floor3, 5);
        allocation.request(Team::Medical, Resource::Ambulance1, Location::Floor3, 5);
        assert!((allocation.utilization() - 0.7).abs() < 1e-9);
    }
}

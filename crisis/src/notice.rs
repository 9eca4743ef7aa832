use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    allocation::Resource,
    crisis_state::CrisisEventKind,
    game_state::GameState,
    location::Location,
    score::GameResult,
    team::Team,
};

/// Aggregate view of a running game, as answered to a status query.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatusReport {
    pub game_id: Uuid,
    pub elapsed: u64,
    pub remaining: u64,
    pub gas_pressure: u8,
    pub building_stability: u8,
    pub victims_remaining: u32,
    pub victims_saved: u32,
    pub fire_contained: u32,
    pub people_evacuated: u32,
    pub coordination_events: usize,
    pub messages: usize,
}

impl StatusReport {
    pub fn from_state(state: &GameState) -> StatusReport {
        StatusReport {
            game_id: state.game_id,
            elapsed: state.crisis.time_elapsed,
            remaining: state.time_remaining(),
            gas_pressure: state.crisis.gas_pressure(),
            building_stability: state.crisis.building_stability(),
            victims_remaining: state.crisis.total_victims(),
            victims_saved: state.total_victims_saved(),
            fire_contained: state.total_fire_contained(),
            people_evacuated: state.total_evacuated(),
            coordination_events: state.coordination_events.len(),
            messages: state.messages.len(),
        }
    }
}

/// Something worth telling the people watching. Delivery is best effort.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    GameStarted { game_id: Uuid, duration_secs: u64 },
    MessageRelayed { team: Team, content: String, urgent: bool },
    ResourceGranted { team: Team, resource: Resource, location: Location },
    ResourceDenied { team: Team, resource: Resource },
    RescueCompleted { location: Location, rescued: u32, teams: Vec<Team> },
    CrisisFlash {
        kind: CrisisEventKind,
        location: Option<Location>,
        elapsed: u64,
        gas_pressure: u8,
        building_stability: u8,
    },
    CriticalAlert { gas_pressure: u8, building_stability: u8 },
    Status(StatusReport),
    GameEnded(Box<GameResult>),
}

fn clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::GameStarted { duration_secs, .. } => write!(
                f,
                "🚨 EMERGENCY RESPONSE MISSION STARTED 🚨 3 teams deployed to apartment building explosion. \
                 {} to coordinate and save lives! Teams: Fire 🔥 | Medical 🚑 | Police 👮",
                clock(*duration_secs)
            ),
            Notice::MessageRelayed { team, content, urgent } => {
                let urgency = if *urgent { "‼️" } else { "" };
                write!(f, "{} {team}: {urgency}`{content}`", team.icon())
            }
            Notice::ResourceGranted { team, resource, location } => {
                write!(f, "✅ RESOURCE GRANTED: {team} gets {resource} at {location}")
            }
            Notice::ResourceDenied { team, resource } => {
                write!(f, "❌ RESOURCE CONFLICT: {resource} already in use, {team} must wait")
            }
            Notice::RescueCompleted { location, rescued, teams } => {
                let teams = teams.iter().map(Team::as_str).collect::<Vec<_>>().join(" + ");
                write!(f, "🆘 RESCUE: {rescued} victim(s) saved at {location} by {teams}")
            }
            Notice::CrisisFlash { kind, location, elapsed, gas_pressure, building_stability } => {
                write!(f, "🚨 CRISIS UPDATE 🚨 {}", kind.headline())?;
                if let Some(location) = location {
                    write!(f, " at {location}")?;
                }
                write!(f, " | Time: {} | Gas: {gas_pressure}/10 | Building: {building_stability}/10", clock(*elapsed))
            }
            Notice::CriticalAlert { gas_pressure, building_stability } => write!(
                f,
                "⚠️ CRITICAL: Gas {gas_pressure}/10 | Building {building_stability}/10"
            ),
            Notice::Status(report) => write!(
                f,
                "📊 STATUS: {} elapsed, {} remaining | 🔥 Fire: {} contained | 🚑 Victims: {} saved, {} waiting | \
                 👮 Evacuated: {} | Coordination events: {}",
                clock(report.elapsed),
                clock(report.remaining),
                report.fire_contained,
                report.victims_saved,
                report.victims_remaining,
                report.people_evacuated,
                report.coordination_events
            ),
            Notice::GameEnded(result) => {
                write!(
                    f,
                    "🏁 EMERGENCY RESPONSE MISSION COMPLETE ({}) 🏁 ⏱️ Duration: {}s | 🏆 Score: {:.1} | \
                     🚑 Lives saved: {} | 🔥 Fire contained: {} | 👮 Evacuated: {} | 🤝 Coordination events: {} | \
                     📚 Emergent vocabulary: {} terms",
                    result.end_reason,
                    result.duration,
                    result.final_score,
                    result.lives_saved,
                    result.fire_contained,
                    result.people_evacuated,
                    result.coordination_events,
                    result.vocabulary_terms()
                )?;
                for (team, performance) in &result.team_performance {
                    write!(
                        f,
                        "\n{} {team}: {} saved | {} fire contained | {} evacuated | {} transmissions",
                        team.icon(),
                        performance.victims_saved,
                        performance.fire_contained,
                        performance.people_evacuated,
                        performance.transmissions_used
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Receiver of fire-and-forget notices. The engine never reads anything back.
pub trait NotificationSink: Send {
    fn notify(&self, notice: Notice);
}

impl NotificationSink for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        // A closed channel only means nobody is listening any more.
        let _ = self.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_marks_urgency() {
        let notice = Notice::MessageRelayed { team: Team::Medical, content: "3V-F4".into(), urgent: true };
        assert_eq!(notice.to_string(), "🚑 MEDICAL: ‼️`3V-F4`");
    }

    #[test]
    fn crisis_flash_names_location() {
        let notice = Notice::CrisisFlash {
            kind: CrisisEventKind::FireSpreading,
            location: Some(Location::WestWing),
            elapsed: 75,
            gas_pressure: 5,
            building_stability: 6,
        };
        assert_eq!(
            notice.to_string(),
            "🚨 CRISIS UPDATE 🚨 Fire spreading at WW | Time: 1:15 | Gas: 5/10 | Building: 6/10"
        );
    }

    #[test]
    fn game_summary_lists_every_team() {
        let mut state = GameState::new(&crate::config::GameConfig::default(), chrono::Utc::now());
        state.team_mut(Team::Medical).victims_saved = 2;
        state.team_mut(Team::Police).people_evacuated = 1;
        let result = crate::score::result(&state, crate::orchestrator::EndReason::TimeLimit);

        let text = Notice::GameEnded(Box::new(result)).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("🏁 EMERGENCY RESPONSE MISSION COMPLETE (time limit)"));
        assert_eq!(lines[1], "🔥 FIRE: 0 saved | 0 fire contained | 0 evacuated | 0 transmissions");
        assert_eq!(lines[2], "🚑 MEDICAL: 2 saved | 0 fire contained | 0 evacuated | 0 transmissions");
        assert_eq!(lines[3], "👮 POLICE: 0 saved | 0 fire contained | 1 evacuated | 0 transmissions");
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        sender.notify(Notice::CriticalAlert { gas_pressure: 7, building_stability: 3 });
    }
}

// src/events.rs

use crate::error::{check_aligned, Result};
use crate::types::{EventConfig, InterceptionCredit, PlayerId, Team, TeamAssignmentFrame};

/// Detects passes and interceptions from the confirmed possession sequence
/// and the per-frame team assignment.
pub struct EventDetector {
    config: EventConfig,
}

/// Holder state carried across frames. `previous_holder` tracks the last
/// frame with a confirmed holder, which is not necessarily the immediately
/// preceding frame.
#[derive(Debug, Clone, Copy, Default)]
struct HolderState {
    previous_holder: Option<PlayerId>,
    previous_holder_frame: usize,
}

impl EventDetector {
    pub fn new(config: EventConfig) -> Self {
        Self { config }
    }

    /// Per-frame pass events: the ball moved to a teammate. The emitted team
    /// is the passing (and receiving) team.
    pub fn detect_passes(
        &self,
        possession: &[Option<PlayerId>],
        team_assignments: &[TeamAssignmentFrame],
    ) -> Result<Vec<Option<Team>>> {
        self.scan(possession, team_assignments, |previous_team, current_team| {
            if previous_team == current_team {
                Some(previous_team)
            } else {
                None
            }
        })
    }

    /// Per-frame interception events: the ball moved to an opponent. Which
    /// side is credited depends on `EventConfig::interception_credit`.
    pub fn detect_interceptions(
        &self,
        possession: &[Option<PlayerId>],
        team_assignments: &[TeamAssignmentFrame],
    ) -> Result<Vec<Option<Team>>> {
        let credit = self.config.interception_credit;
        self.scan(possession, team_assignments, move |previous_team, current_team| {
            if previous_team != current_team {
                Some(match credit {
                    InterceptionCredit::NewHolder => current_team,
                    InterceptionCredit::PreviousHolder => previous_team,
                })
            } else {
                None
            }
        })
    }

    /// Shared holder-transition scan. `classify` sees the previous and
    /// current holders' teams (both known) only for frames where possession
    /// changed hands; everything else stays the sentinel.
    fn scan(
        &self,
        possession: &[Option<PlayerId>],
        team_assignments: &[TeamAssignmentFrame],
        classify: impl Fn(Team, Team) -> Option<Team>,
    ) -> Result<Vec<Option<Team>>> {
        check_aligned(
            "possession",
            possession.len(),
            "team_assignments",
            team_assignments.len(),
        )?;

        let mut events: Vec<Option<Team>> = vec![None; possession.len()];
        let mut state = HolderState::default();

        for frame in 1..possession.len() {
            if let Some(holder) = possession[frame - 1] {
                state.previous_holder = Some(holder);
                state.previous_holder_frame = frame - 1;
            }

            let (previous_holder, current_holder) = match (state.previous_holder, possession[frame]) {
                (Some(previous), Some(current)) => (previous, current),
                _ => continue,
            };
            if previous_holder == current_holder {
                continue;
            }

            let previous_team = team_assignments[state.previous_holder_frame].get(&previous_holder);
            let current_team = team_assignments[frame].get(&current_holder);
            if let (Some(&previous_team), Some(&current_team)) = (previous_team, current_team) {
                events[frame] = classify(previous_team, current_team);
            }
        }

        Ok(events)
    }
}

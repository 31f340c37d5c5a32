//! Configuration resolver: turns the validated mode selectors into the
//! transition and action tables the engine executes.
//!
//! The tables are pure data. Resolution is deterministic and side-effect-free;
//! it never touches hardware or storage. Out-of-range selectors are rejected
//! by config validation before a `Mode` can exist.

use std::collections::HashMap;
use std::time::Duration;

use strum::Display;

use super::event::ButtonEvent;
use super::level;
use super::state::SwitchState;

/// How the button drives the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DimMode {
    /// Plain on/off toggling.
    OnOff,
    /// The toggling edge cycles through the dim levels, then off.
    Cycle,
    /// Toggling on/off at the stored level; holding the button dims.
    Hold,
}

impl TryFrom<u8> for DimMode {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(DimMode::OnOff),
            1 => Ok(DimMode::Cycle),
            2 => Ok(DimMode::Hold),
            other => Err(other),
        }
    }
}

/// Which raw edges are semantically meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EventMode {
    /// Every press toggles.
    Press,
    /// Every release toggles.
    Release,
    /// On by press, off by the release of the following press.
    PressRelease,
    /// On by release, off by the following press.
    ReleasePress,
}

impl TryFrom<u8> for EventMode {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(EventMode::Press),
            1 => Ok(EventMode::Release),
            2 => Ok(EventMode::PressRelease),
            3 => Ok(EventMode::ReleasePress),
            other => Err(other),
        }
    }
}

/// Dimming direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepSign {
    Up,
    Down,
}

impl TryFrom<i8> for StepSign {
    type Error = i8;

    fn try_from(raw: i8) -> Result<Self, i8> {
        match raw {
            1 => Ok(StepSign::Up),
            -1 => Ok(StepSign::Down),
            other => Err(other),
        }
    }
}

/// Immutable switch configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Mode {
    pub dim_mode: DimMode,
    pub event_mode: EventMode,

    /// Number of discrete non-zero brightness steps. 1 for plain on/off.
    pub levels: u32,

    pub step: StepSign,

    /// Perceptual brightness correction exponent, >= 1.0.
    pub exponent: f64,

    /// Hold threshold and repeat cadence. Present iff `dim_mode` is `Hold`.
    pub hold: Option<Duration>,
}

impl Mode {
    /// Advance a dim index one step in the configured direction.
    ///
    /// Wraps rather than saturates: `levels -> 1` going up and `1 -> levels`
    /// going down, never landing on 0, so repeated cycling stays meaningful.
    pub fn step_index(&self, index: u32) -> u32 {
        match self.step {
            StepSign::Up => {
                if index >= self.levels {
                    1
                } else {
                    index + 1
                }
            }
            StepSign::Down => {
                if index <= 1 {
                    self.levels
                } else {
                    index - 1
                }
            }
        }
    }

    /// Whether another dim step remains before the cycle is exhausted.
    ///
    /// Selects between the two arms of a [`Target::Dynamic`] entry.
    pub fn can_step(&self, index: u32) -> bool {
        match self.step {
            StepSign::Up => index < self.levels,
            StepSign::Down => index > 1,
        }
    }

    /// Physical output value for a dim index, with brightness correction.
    pub fn output_value(&self, index: u32) -> f64 {
        level::corrected(f64::from(index) / f64::from(self.levels), self.exponent)
    }
}

/// The physical effect bound to a resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Action {
    /// State commits, output untouched.
    None,
    /// Drive the light to zero. Does not alter the dim index.
    Off,
    /// Drive the light to the value derived from the current dim index.
    OnRestore,
    /// Advance the dim index and drive the light to the resulting value.
    DimStep,
}

/// A transition-table entry.
///
/// `Dynamic` replaces the original table's numeric sentinel: some modes map
/// two physical causes onto one logical "on" state, and the correct outcome
/// depends on dim progress rather than on the event/state pair alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Fixed(SwitchState),
    Dynamic {
        /// Taken while another dim step remains.
        dimming: SwitchState,
        /// Taken once the cycle is exhausted; the dim index resets to 0.
        exhausted: SwitchState,
    },
}

/// Transition and action tables for one `(dim_mode, event_mode)` combination.
#[derive(Debug, Clone)]
pub struct Tables {
    pub(crate) transitions: HashMap<(ButtonEvent, SwitchState), Target>,
    pub(crate) actions: HashMap<SwitchState, Action>,
}

impl Tables {
    /// Build the table pair for the mode's exact selector combination.
    pub fn resolve(mode: &Mode) -> Tables {
        use Action as A;
        use ButtonEvent as E;
        use SwitchState as S;
        use Target::Fixed as F;

        let dyn_ = |dimming, exhausted| Target::Dynamic { dimming, exhausted };

        let (transitions, actions): (
            Vec<(E, S, Target)>,
            Vec<(S, A)>,
        ) = match (mode.dim_mode, mode.event_mode) {
            (DimMode::OnOff, EventMode::Press) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByPress, F(S::OffByPress)),
                    (E::Press, S::OffByPress, F(S::OnByPress)),
                ],
                vec![(S::OnByPress, A::OnRestore), (S::OffByPress, A::Off)],
            ),
            (DimMode::OnOff, EventMode::Release) => (
                vec![
                    (E::Release, S::OffByRelease, F(S::OnByRelease)),
                    (E::Release, S::OnByRelease, F(S::OffByRelease)),
                ],
                vec![(S::OnByRelease, A::OnRestore), (S::OffByRelease, A::Off)],
            ),
            (DimMode::OnOff, EventMode::PressRelease) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByRelease, F(S::OnByPress2)),
                    (E::Release, S::OnByPress, F(S::OnByRelease)),
                    (E::Release, S::OnByPress2, F(S::OffByRelease)),
                ],
                vec![
                    (S::OnByPress, A::OnRestore),
                    (S::OnByPress2, A::None),
                    (S::OnByRelease, A::None),
                    (S::OffByRelease, A::Off),
                ],
            ),
            (DimMode::OnOff, EventMode::ReleasePress) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OffByPress)),
                    (E::Press, S::OnByRelease, F(S::OffByPress2)),
                    (E::Release, S::OffByPress, F(S::OnByRelease)),
                    (E::Release, S::OffByPress2, F(S::OffByRelease)),
                ],
                vec![
                    (S::OffByPress, A::None),
                    (S::OffByPress2, A::Off),
                    (S::OnByRelease, A::OnRestore),
                    (S::OffByRelease, A::None),
                ],
            ),
            (DimMode::Cycle, EventMode::Press) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByPress, dyn_(S::OnByPress, S::OffByPress)),
                    (E::Press, S::OffByPress, F(S::OnByPress)),
                ],
                vec![(S::OnByPress, A::DimStep), (S::OffByPress, A::Off)],
            ),
            (DimMode::Cycle, EventMode::Release) => (
                vec![
                    (E::Release, S::OffByRelease, F(S::OnByRelease)),
                    (E::Release, S::OnByRelease, dyn_(S::OnByRelease, S::OffByRelease)),
                ],
                vec![(S::OnByRelease, A::DimStep), (S::OffByRelease, A::Off)],
            ),
            (DimMode::Cycle, EventMode::PressRelease) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByRelease, dyn_(S::OnByPress2, S::OffByPress2)),
                    (E::Release, S::OnByPress, F(S::OnByRelease)),
                    (E::Release, S::OnByPress2, F(S::OnByRelease)),
                    (E::Release, S::OffByPress2, F(S::OffByRelease)),
                ],
                vec![
                    (S::OnByPress, A::DimStep),
                    (S::OnByPress2, A::DimStep),
                    (S::OffByPress2, A::Off),
                    (S::OnByRelease, A::None),
                    (S::OffByRelease, A::None),
                ],
            ),
            (DimMode::Cycle, EventMode::ReleasePress) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OffByPress)),
                    (E::Press, S::OnByRelease, F(S::OnByPress)),
                    (E::Release, S::OffByPress, F(S::OnByRelease)),
                    (E::Release, S::OnByPress, dyn_(S::OnByRelease, S::OffByRelease)),
                ],
                vec![
                    (S::OffByPress, A::None),
                    (S::OnByPress, A::None),
                    (S::OnByRelease, A::DimStep),
                    (S::OffByRelease, A::Off),
                ],
            ),
            (DimMode::Hold, EventMode::Press) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByRelease, F(S::OffByPress)),
                    (E::Release, S::OnByPress, F(S::OnByRelease)),
                    (E::Release, S::OffByPress, F(S::OffByRelease)),
                    (E::Release, S::OnByHold, F(S::OnByRelease)),
                    (E::Release, S::OffByHold, F(S::OffByRelease)),
                    (E::Hold, S::OnByPress, F(S::OnByHold)),
                    (E::Hold, S::OnByHold, F(S::OnByHold)),
                    (E::Hold, S::OffByPress, F(S::OffByHold)),
                    (E::Hold, S::OffByHold, F(S::OffByHold)),
                ],
                vec![
                    (S::OnByPress, A::OnRestore),
                    (S::OffByPress, A::Off),
                    (S::OnByRelease, A::None),
                    (S::OffByRelease, A::None),
                    (S::OnByHold, A::DimStep),
                    (S::OffByHold, A::None),
                ],
            ),
            (DimMode::Hold, EventMode::Release) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OffByPress)),
                    (E::Press, S::OnByRelease, F(S::OnByPress2)),
                    (E::Release, S::OffByPress, F(S::OnByRelease)),
                    (E::Release, S::OnByPress2, F(S::OffByRelease)),
                    (E::Release, S::OnByHold, F(S::OnByRelease)),
                    (E::Hold, S::OffByPress, F(S::OnByHold)),
                    (E::Hold, S::OnByPress2, F(S::OnByHold)),
                    (E::Hold, S::OnByHold, F(S::OnByHold)),
                ],
                vec![
                    (S::OffByPress, A::None),
                    (S::OnByPress2, A::None),
                    (S::OnByRelease, A::OnRestore),
                    (S::OffByRelease, A::Off),
                    (S::OnByHold, A::DimStep),
                ],
            ),
            (DimMode::Hold, EventMode::PressRelease) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OnByPress)),
                    (E::Press, S::OnByRelease, F(S::OnByPress2)),
                    (E::Release, S::OnByPress, F(S::OnByRelease)),
                    (E::Release, S::OnByPress2, F(S::OffByRelease)),
                    (E::Release, S::OnByHold, F(S::OnByRelease)),
                    (E::Hold, S::OnByPress, F(S::OnByHold)),
                    (E::Hold, S::OnByPress2, F(S::OnByHold)),
                    (E::Hold, S::OnByHold, F(S::OnByHold)),
                ],
                vec![
                    (S::OnByPress, A::OnRestore),
                    (S::OnByPress2, A::None),
                    (S::OnByRelease, A::None),
                    (S::OffByRelease, A::Off),
                    (S::OnByHold, A::DimStep),
                ],
            ),
            (DimMode::Hold, EventMode::ReleasePress) => (
                vec![
                    (E::Press, S::OffByRelease, F(S::OffByPress)),
                    (E::Press, S::OnByRelease, F(S::OffByPress2)),
                    (E::Release, S::OffByPress, F(S::OnByRelease)),
                    (E::Release, S::OffByPress2, F(S::OffByRelease)),
                    (E::Release, S::OnByHold, F(S::OnByRelease)),
                    (E::Hold, S::OffByPress, F(S::OnByHold)),
                    (E::Hold, S::OnByHold, F(S::OnByHold)),
                ],
                vec![
                    (S::OffByPress, A::None),
                    (S::OffByPress2, A::Off),
                    (S::OnByRelease, A::OnRestore),
                    (S::OffByRelease, A::None),
                    (S::OnByHold, A::DimStep),
                ],
            ),
        };

        Tables {
            transitions: transitions
                .into_iter()
                .map(|(event, state, target)| ((event, state), target))
                .collect(),
            actions: actions.into_iter().collect(),
        }
    }

    /// Look up the target for an event in a state. `None` means no-op.
    pub fn transition(&self, event: ButtonEvent, state: SwitchState) -> Option<Target> {
        self.transitions.get(&(event, state)).copied()
    }

    /// Look up the action bound to a state. `None` marks a corrupt table:
    /// a reachable state every valid mode must bind an action to.
    pub fn action(&self, state: SwitchState) -> Option<Action> {
        self.actions.get(&state).copied()
    }

    /// All defined transition entries, for integrity checks.
    pub fn entries(&self) -> impl Iterator<Item = (ButtonEvent, SwitchState, Target)> + '_ {
        self.transitions
            .iter()
            .map(|(&(event, state), &target)| (event, state, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(dim_mode: DimMode, event_mode: EventMode) -> Mode {
        Mode {
            dim_mode,
            event_mode,
            levels: 3,
            step: StepSign::Up,
            exponent: 1.0,
            hold: match dim_mode {
                DimMode::Hold => Some(Duration::from_millis(1500)),
                _ => None,
            },
        }
    }

    const DIM_MODES: [DimMode; 3] = [DimMode::OnOff, DimMode::Cycle, DimMode::Hold];
    const EVENT_MODES: [EventMode; 4] = [
        EventMode::Press,
        EventMode::Release,
        EventMode::PressRelease,
        EventMode::ReleasePress,
    ];

    #[test]
    fn every_transition_target_has_an_action() {
        for dim_mode in DIM_MODES {
            for event_mode in EVENT_MODES {
                let tables = Tables::resolve(&mode(dim_mode, event_mode));
                for (event, state, target) in tables.entries() {
                    let targets = match target {
                        Target::Fixed(next) => vec![next],
                        Target::Dynamic { dimming, exhausted } => vec![dimming, exhausted],
                    };
                    for next in targets {
                        assert!(
                            tables.action(next).is_some(),
                            "{dim_mode}/{event_mode}: {event} in {state} leads to {next} with no action"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn dynamic_targets_only_in_cycle_mode() {
        for dim_mode in DIM_MODES {
            for event_mode in EVENT_MODES {
                let tables = Tables::resolve(&mode(dim_mode, event_mode));
                let has_dynamic = tables
                    .entries()
                    .any(|(_, _, t)| matches!(t, Target::Dynamic { .. }));
                assert_eq!(has_dynamic, dim_mode == DimMode::Cycle, "{dim_mode}/{event_mode}");
            }
        }
    }

    #[test]
    fn hold_entries_only_in_hold_mode() {
        for dim_mode in DIM_MODES {
            for event_mode in EVENT_MODES {
                let tables = Tables::resolve(&mode(dim_mode, event_mode));
                let has_hold = tables
                    .entries()
                    .any(|(event, _, _)| event == ButtonEvent::Hold);
                assert_eq!(has_hold, dim_mode == DimMode::Hold, "{dim_mode}/{event_mode}");
            }
        }
    }

    #[test]
    fn initial_state_has_an_entry_in_every_mode() {
        // The machine must be able to leave OffByRelease under any mode,
        // otherwise the device could never turn on.
        for dim_mode in DIM_MODES {
            for event_mode in EVENT_MODES {
                let tables = Tables::resolve(&mode(dim_mode, event_mode));
                let reachable = ButtonEvent::ALL
                    .iter()
                    .any(|&e| tables.transition(e, SwitchState::INITIAL).is_some());
                assert!(reachable, "{dim_mode}/{event_mode}: initial state is a trap");
            }
        }
    }

    #[test]
    fn step_index_wraps_never_to_zero() {
        for levels in 1u32..=5 {
            let m = Mode {
                levels,
                ..mode(DimMode::Cycle, EventMode::Press)
            };
            assert_eq!(m.step_index(levels), 1, "levels = {levels}");

            let down = Mode {
                step: StepSign::Down,
                ..m
            };
            assert_eq!(down.step_index(1), levels, "levels = {levels}");
        }
    }

    #[test]
    fn can_step_is_direction_aware() {
        let up = mode(DimMode::Cycle, EventMode::Press);
        assert!(up.can_step(1));
        assert!(up.can_step(2));
        assert!(!up.can_step(3));

        let down = Mode {
            step: StepSign::Down,
            ..up
        };
        assert!(down.can_step(3));
        assert!(down.can_step(2));
        assert!(!down.can_step(1));
    }

    #[test]
    fn output_value_applies_correction() {
        let m = Mode {
            exponent: 2.0,
            levels: 2,
            ..mode(DimMode::Cycle, EventMode::Press)
        };
        assert!((m.output_value(1) - 0.25).abs() < 1e-12);
        assert_eq!(m.output_value(2), 1.0);
    }

    #[test]
    fn selector_conversions_reject_out_of_range() {
        assert_eq!(DimMode::try_from(3), Err(3));
        assert_eq!(EventMode::try_from(4), Err(4));
        assert_eq!(StepSign::try_from(0), Err(0));
        assert_eq!(StepSign::try_from(-1), Ok(StepSign::Down));
    }
}

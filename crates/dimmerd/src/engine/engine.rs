use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::event::ButtonEvent;
use super::state::SwitchState;
use super::tables::Action;
use super::tables::DimMode;
use super::tables::Mode;
use super::tables::Tables;
use super::tables::Target;
use crate::device::Light;
use crate::store::LevelStore;

/// The state machine engine.
///
/// Owns the current logical state and dim index, and on each incoming button
/// event looks up the transition, resolves dynamic targets from dim progress,
/// and executes the bound action against the light output and the optional
/// level store. Events are processed one at a time, run to completion; the
/// engine is driven by a single task so no further synchronization is needed.
pub struct Engine {
    mode: Mode,
    tables: Tables,
    state: SwitchState,
    dim_index: u32,
    light: Box<dyn Light>,
    store: Option<Box<dyn LevelStore>>,
}

impl Engine {
    /// Build an engine from a validated mode.
    ///
    /// In hold mode the dim index is restored from the store, clamped to
    /// `[0, levels]`, defaulting to fully bright when absent or unreadable.
    pub fn new(mode: Mode, light: Box<dyn Light>, store: Option<Box<dyn LevelStore>>) -> Self {
        let tables = Tables::resolve(&mode);

        let dim_index = match mode.dim_mode {
            // Cycling starts from off; the first step lands on the first level.
            DimMode::Cycle => 0,
            DimMode::OnOff => mode.levels,
            DimMode::Hold => {
                let restored = store.as_ref().and_then(|s| s.load());
                match restored {
                    Some(level) => {
                        let clamped = level.min(mode.levels);
                        if clamped != level {
                            warn!("stored dim level {level} exceeds {}; clamped", mode.levels);
                        }
                        info!("restored dim level {clamped}");
                        clamped
                    }
                    None => mode.levels,
                }
            }
        };

        Self {
            mode,
            tables,
            state: SwitchState::INITIAL,
            dim_index,
            light,
            store,
        }
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn dim_index(&self) -> u32 {
        self.dim_index
    }

    /// Process one button event to completion.
    ///
    /// Events with no transition entry for the current state are no-ops.
    /// Hardware refusal is logged but the state still commits, so a partial
    /// output failure cannot desynchronize the machine from future events.
    pub fn handle_event(&mut self, event: ButtonEvent) {
        let Some(target) = self.tables.transition(event, self.state) else {
            trace!("{event} in {} has no transition, ignoring", self.state);
            return;
        };

        let next = match target {
            Target::Fixed(next) => next,
            Target::Dynamic { dimming, exhausted } => {
                if self.mode.can_step(self.dim_index) {
                    dimming
                } else {
                    self.dim_index = 0;
                    exhausted
                }
            }
        };

        let Some(action) = self.tables.action(next) else {
            // Corrupt table: fail safe to the initial state instead of
            // applying an unknown action.
            error!(
                "no action bound to {next} ({event} in {}); resetting state machine",
                self.state
            );
            self.state = SwitchState::INITIAL;
            return;
        };

        self.apply(action);
        self.state = next;
        debug!(
            "{event}: -> {next}, action {action}, dim level {}",
            self.dim_index
        );
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Off => {
                // The dim index survives an off/on cycle by design of the
                // stored-level restore; only dim steps mutate it.
                if let Err(e) = self.light.off() {
                    warn!("failed to switch light off: {e}");
                }
            }
            Action::OnRestore => {
                let value = self.mode.output_value(self.dim_index);
                if let Err(e) = self.light.set_value(value) {
                    warn!("failed to restore light to {value:.3}: {e}");
                }
            }
            Action::DimStep => {
                self.dim_index = self.mode.step_index(self.dim_index);
                let value = self.mode.output_value(self.dim_index);
                if let Err(e) = self.light.set_value(value) {
                    warn!("failed to dim light to {value:.3}: {e}");
                }
                if self.mode.dim_mode == DimMode::Hold {
                    if let Some(store) = &self.store {
                        if let Err(e) = store.save(self.dim_index) {
                            warn!("failed to persist dim level {}: {e}", self.dim_index);
                        }
                    }
                }
            }
        }
    }

    /// Unconditionally drive the light off, independent of logical state.
    ///
    /// Called exactly once during shutdown, after any in-flight event has
    /// completed.
    pub fn force_off(&mut self) {
        info!("forcing light off");
        if let Err(e) = self.light.off() {
            warn!("failed to switch light off during shutdown: {e}");
        }
    }
}

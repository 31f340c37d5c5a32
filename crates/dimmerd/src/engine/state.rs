use strum::Display;

/// Logical device states, named after the light level and the edge that
/// caused it.
///
/// The `2` variants distinguish the second press/release of a combined-edge
/// cycle from the first, so that alternating edges can alternate the light.
/// Not every state is reachable under every mode; reachability is defined by
/// the mode's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SwitchState {
    /// Light off, button released. The initial state.
    OffByRelease,
    OnByPress,
    OnByRelease,
    OffByPress,
    OnByPress2,
    OffByPress2,
    OnByHold,
    OffByHold,
}

impl SwitchState {
    pub const INITIAL: SwitchState = SwitchState::OffByRelease;
}

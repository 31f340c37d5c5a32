use strum::Display;

/// Debounced notifications from the physical button.
///
/// `Hold` fires after the configured hold duration while the button stays
/// pressed, and repeats at that cadence. The input layer produces it only
/// when the active mode carries a hold duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ButtonEvent {
    Press,
    Release,
    Hold,
}

impl ButtonEvent {
    pub const ALL: [ButtonEvent; 3] = [ButtonEvent::Press, ButtonEvent::Release, ButtonEvent::Hold];
}

//! Debounced button input and hold generation.
//!
//! The pump polls a raw level sampler, debounces it, and delivers
//! [`ButtonEvent`]s into the engine channel. Delivery through a single
//! bounded channel serializes events before they reach the engine, so
//! concurrent edges can never interleave inside event handling.

use std::io;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::warn;

use crate::engine::ButtonEvent;

/// Raw sampling cadence. Debounce windows are multiples of this in practice.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Turns raw level samples into clean press/release edges.
///
/// A level change only commits once it has stayed stable for the whole
/// debounce window; shorter glitches are discarded.
pub struct Debouncer {
    window: Duration,
    level: bool,
    pending: Option<(bool, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            level: false,
            pending: None,
        }
    }

    /// Feed one raw sample. Returns the new debounced level on a committed
    /// edge (`true` = pressed), `None` otherwise.
    pub fn sample(&mut self, raw: bool, now: Instant) -> Option<bool> {
        if raw == self.level {
            self.pending = None;
            return None;
        }

        match self.pending {
            Some((candidate, since)) if candidate == raw => {
                if now.duration_since(since) >= self.window {
                    self.level = raw;
                    self.pending = None;
                    Some(raw)
                } else {
                    None
                }
            }
            _ => {
                self.pending = Some((raw, now));
                None
            }
        }
    }
}

/// Read a sysfs GPIO value file as an active level.
///
/// `active_low` inverts the electrical level, matching a button wired to
/// ground with a pull-up.
pub fn sysfs_sampler(
    path: std::path::PathBuf,
    active_low: bool,
) -> impl FnMut() -> io::Result<bool> + Send {
    move || {
        let raw = std::fs::read_to_string(&path)?;
        let high = match raw.trim() {
            "0" => false,
            "1" => true,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected GPIO value {other:?}"),
                ))
            }
        };
        Ok(high != active_low)
    }
}

/// Poll the sampler, debounce, and deliver button events until the engine
/// side closes the channel.
///
/// When `hold` is set, a button kept pressed emits [`ButtonEvent::Hold`]
/// after that duration and repeats at the same cadence until release; each
/// repetition is one ordinary event for the engine.
pub async fn run_button<S>(
    mut sample: S,
    debounce: Duration,
    hold: Option<Duration>,
    tx: mpsc::Sender<ButtonEvent>,
) where
    S: FnMut() -> io::Result<bool> + Send,
{
    let mut debouncer = Debouncer::new(debounce);
    let mut next_hold: Option<tokio::time::Instant> = None;

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = tokio::time::Instant::now();

        let raw = match sample() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to sample button input: {e}");
                continue;
            }
        };

        if let Some(pressed) = debouncer.sample(raw, now.into_std()) {
            let event = if pressed {
                next_hold = hold.map(|d| now + d);
                ButtonEvent::Press
            } else {
                next_hold = None;
                ButtonEvent::Release
            };
            debug!("button {event}");
            if tx.send(event).await.is_err() {
                return;
            }
        }

        if let Some(at) = next_hold {
            if now >= at {
                // Schedule from the deadline, not from now, to keep the
                // repeat cadence free of polling jitter.
                next_hold = hold.map(|d| at + d);
                if tx.send(ButtonEvent::Hold).await.is_err() {
                    return;
                }
            }
        }
    }
}

//! Broadcast-delay buffering
//!
//! When delay mode is on, live snapshots are held in a FIFO queue and
//! shown to the consumer only after the configured delay has elapsed, so
//! the display lags real time the way a television broadcast does. Until
//! the first release the live data is masked with a pending placeholder.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::constants::delay::PENDING_MESSAGE;
use crate::data_fetcher::models::{Snapshot, SportDetail};

pub struct DelayBuffer {
    delay: Duration,
    queue: VecDeque<Snapshot>,
    activated_at: Option<Instant>,
    last_released: Option<Snapshot>,
}

impl DelayBuffer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            queue: VecDeque::new(),
            activated_at: None,
            last_released: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Routes one cycle's live snapshot through the buffer and returns what
    /// should be published this cycle.
    ///
    /// `delay_wanted` is the per-cycle decision (user toggle AND a team is
    /// currently playing). While the delay window has not yet elapsed since
    /// activation the caller gets a masked placeholder; afterwards the
    /// oldest held snapshot is released, one per cycle, in arrival order.
    /// When delay stops being wanted the queue is dropped and the live
    /// snapshot passes straight through.
    pub fn process(&mut self, live: Snapshot, delay_wanted: bool) -> Snapshot {
        if !delay_wanted {
            if self.is_active() {
                info!(
                    "Delay mode deactivated, dropping {} held snapshots",
                    self.queue.len()
                );
                self.reset();
            }
            return live;
        }

        let activated_at = *self.activated_at.get_or_insert_with(|| {
            info!("Delay mode activated, holding snapshots for {:?}", self.delay);
            Instant::now()
        });

        self.queue.push_back(live.clone());

        if activated_at.elapsed() < self.delay {
            debug!(
                "Delay pending: {:?} of {:?} elapsed, {} snapshots held",
                activated_at.elapsed(),
                self.delay,
                self.queue.len()
            );
            return mask_pending(&live);
        }

        self.release(&live)
    }

    /// Pops the oldest held snapshot. The queue should never be dry here
    /// (each cycle enqueues before it releases), but if it is, redisplay
    /// the newest snapshot the consumer has already seen rather than leak
    /// live data early or blank the display.
    fn release(&mut self, live: &Snapshot) -> Snapshot {
        match self.queue.pop_front() {
            Some(released) => {
                self.last_released = Some(released.clone());
                released
            }
            None => {
                warn!("Delay queue empty at release time, redisplaying last snapshot");
                match &self.last_released {
                    Some(previous) => previous.clone(),
                    None => mask_pending(live),
                }
            }
        }
    }

    /// Clears held snapshots and the activation state
    pub fn reset(&mut self) {
        self.queue.clear();
        self.activated_at = None;
        self.last_released = None;
    }
}

/// Masks every currently-playing team's entry with the pending placeholder;
/// teams without a live game pass through unchanged.
fn mask_pending(live: &Snapshot) -> Snapshot {
    let mut masked = live.clone();
    let playing = masked.teams_currently_playing.clone();
    for (info, playing) in masked.team_info.iter_mut().zip(playing) {
        if playing {
            info.base.home_score.clear();
            info.base.away_score.clear();
            info.base.top_info.clear();
            info.base.bottom_info = PENDING_MESSAGE.to_string();
            info.detail = SportDetail::None;
        }
    }
    masked
}

use std::time::Duration;
use tracing::{debug, info, trace};

use crate::error::{PovError, Result};
use crate::state::{ChangeCause, Playback, SceneChange};
use crate::timer::{FrameRequest, TimerId, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    // Tagged with the entry it was armed for so a stale cue can be recognised.
    Advance { entry: u64 },
}

/// Drives scene selection and per-scene progress.
///
/// Time is always passed in by the caller as an offset from an arbitrary
/// origin, which keeps every transition a deterministic function of the
/// timestamps it is given. The advance timer and the frame request belong to
/// the scene currently on screen: entering another scene cancels and re-arms
/// both inside the same call that changes `index`.
#[derive(Debug)]
pub struct SceneController {
    len: usize,
    dwell: Duration,
    playback: Playback,
    dwell_start: Duration,
    entry: u64,
    timers: Timers<Cue>,
    advance: Option<TimerId>,
    frame: FrameRequest,
    running: bool,
}

impl SceneController {
    /// Starts on scene 0 at `now`.
    pub fn new(len: usize, dwell: Duration, now: Duration) -> Result<Self> {
        Self::starting_at(len, dwell, 0, now)
    }

    pub fn starting_at(len: usize, dwell: Duration, index: usize, now: Duration) -> Result<Self> {
        if len == 0 {
            return Err(PovError::EmptyCatalog);
        }
        if dwell.is_zero() {
            return Err(PovError::ZeroDwell);
        }
        if index >= len {
            return Err(PovError::SceneOutOfRange { index, len });
        }

        let mut controller = Self {
            len,
            dwell,
            playback: Playback { index, progress: 0.0 },
            dwell_start: now,
            entry: 0,
            timers: Timers::new(),
            advance: None,
            frame: FrameRequest::default(),
            running: true,
        };
        controller.enter(index, now, ChangeCause::Start);
        Ok(controller)
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    #[cfg(test)]
    pub fn current_index(&self) -> usize {
        self.playback.index
    }

    #[cfg(test)]
    pub fn progress(&self) -> f32 {
        self.playback.progress
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fraction of the dwell elapsed at `now`, clamped to [0, 1].
    pub fn progress_at(&self, now: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.dwell_start);
        (elapsed.as_secs_f64() / self.dwell.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Per-frame update: fires a due advance timer, then refreshes progress.
    pub fn update(&mut self, now: Duration) -> Option<SceneChange> {
        if !self.running {
            return None;
        }

        let mut change = None;
        for cue in self.timers.poll(now) {
            match cue {
                Cue::Advance { entry } if entry == self.entry => {
                    let next = (self.playback.index + 1) % self.len;
                    change = Some(self.enter(next, now, ChangeCause::AutoAdvance));
                }
                Cue::Advance { entry } => {
                    trace!(entry, current = self.entry, "dropping stale advance cue");
                }
            }
        }

        self.tick(now);
        change
    }

    /// Progress refresh for the armed frame request. Repeated calls with the
    /// same `now` yield the same value.
    pub fn tick(&mut self, now: Duration) -> f32 {
        if self.frame.deliver() {
            self.playback.progress = self.progress_at(now);
        }
        self.playback.progress
    }

    /// Selects scene `index` immediately. Out-of-range indices are rejected
    /// and leave the current scene and its timers untouched.
    pub fn jump_to(&mut self, index: usize, now: Duration) -> Result<SceneChange> {
        if index >= self.len {
            return Err(PovError::SceneOutOfRange { index, len: self.len });
        }
        if !self.running {
            return Err(PovError::ControllerStopped);
        }
        Ok(self.enter(index, now, ChangeCause::Jump))
    }

    /// Jumps `delta` scenes forward or backward, wrapping around the catalog.
    pub fn step(&mut self, delta: isize, now: Duration) -> Result<SceneChange> {
        let target = (self.playback.index as isize + delta).rem_euclid(self.len as isize) as usize;
        self.jump_to(target, now)
    }

    /// Releases the advance timer and the frame request. Updates after this
    /// are no-ops.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.timers.cancel_all();
        self.advance = None;
        self.frame.cancel();
        debug!(index = self.playback.index, "scene controller stopped");
    }

    fn enter(&mut self, index: usize, now: Duration, cause: ChangeCause) -> SceneChange {
        if let Some(previous) = self.advance.take() {
            if self.timers.cancel(previous) {
                trace!(?previous, "cancelled pending advance");
            }
        }

        let from = match cause {
            ChangeCause::Start => None,
            _ => Some(self.playback.index),
        };

        self.entry += 1;
        self.playback = Playback { index, progress: 0.0 };
        self.dwell_start = now;
        self.advance = Some(self.timers.arm(now + self.dwell, Cue::Advance { entry: self.entry }));
        self.frame.request();

        info!(?from, to = index, ?cause, at_ms = now.as_millis() as u64, "entered scene");
        SceneChange { from, to: index, cause }
    }
}

impl Drop for SceneController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

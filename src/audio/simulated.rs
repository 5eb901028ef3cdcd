//! An in-memory audio resource that behaves like a streamed track.

use super::resource::{
    AudioResource, EventHub, PlayFuture, ResourceEvent, Subscription, SubscriptionId,
};
use crate::error::PlaybackError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Builder for [`SimulatedTrack`].
#[derive(Debug, Clone)]
pub struct SimulatedTrackBuilder {
    length: Duration,
    buffering: Duration,
    looping: bool,
    rejected_plays: usize,
}

impl SimulatedTrackBuilder {
    /// Track length. Only matters when looping is off.
    pub fn length(mut self, length: Duration) -> Self {
        self.length = length;
        self
    }

    /// Delay between [`SimulatedTrack::load`] and the ready signal.
    pub fn buffering(mut self, buffering: Duration) -> Self {
        self.buffering = buffering;
        self
    }

    /// Loop forever instead of ending. On by default.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Refuse the first `count` play requests with
    /// [`PlaybackError::NotAllowed`], the way a browser autoplay policy does.
    pub fn reject_plays(mut self, count: usize) -> Self {
        self.rejected_plays = count;
        self
    }

    /// Finishes the track.
    pub fn build(self) -> SimulatedTrack {
        SimulatedTrack {
            inner: Arc::new(Inner {
                hub: EventHub::new(),
                length: self.length,
                buffering: self.buffering,
                looping: self.looping,
                state: Mutex::new(TrackState {
                    rejections_left: self.rejected_plays,
                    ..TrackState::default()
                }),
            }),
        }
    }
}

impl Default for SimulatedTrackBuilder {
    fn default() -> Self {
        Self {
            length: Duration::from_secs(180),
            buffering: Duration::from_millis(800),
            looping: true,
            rejected_plays: 0,
        }
    }
}

#[derive(Debug, Default)]
struct TrackState {
    ready: bool,
    playing: bool,
    position: Duration,
    started_at: Option<Instant>,
    // Bumped on every play/pause so a stale end timer can tell it lost.
    generation: u64,
    rejections_left: usize,
    play_requests: usize,
    pause_requests: usize,
}

impl TrackState {
    fn settle_position(&mut self, length: Duration) {
        if let Some(started) = self.started_at.take() {
            self.position += started.elapsed();
            if !length.is_zero() && self.position >= length {
                let wrapped = self.position.as_nanos() % length.as_nanos();
                self.position = Duration::from_nanos(wrapped as u64);
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    hub: EventHub,
    length: Duration,
    buffering: Duration,
    looping: bool,
    state: Mutex<TrackState>,
}

impl Inner {
    fn finish(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            if !state.playing || state.generation != generation {
                return;
            }
            state.playing = false;
            state.started_at = None;
            state.position = Duration::ZERO;
        }
        debug!("simulated track ended");
        self.hub.emit(ResourceEvent::Ended);
    }
}

/// A track that buffers, plays and ends on timers without touching an audio
/// device.
///
/// Cloning yields another handle to the same track. Timers run on the tokio
/// runtime, so [`play`](AudioResource::play) must be driven from inside one.
///
/// ```rust
/// use festival_widgets::audio::SimulatedTrack;
/// use std::time::Duration;
///
/// let track = SimulatedTrack::builder()
///     .length(Duration::from_secs(240))
///     .looping(false)
///     .build();
/// assert!(!track.is_ready());
///
/// track.mark_ready();
/// assert!(track.is_ready());
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedTrack {
    inner: Arc<Inner>,
}

impl SimulatedTrack {
    /// Starts a builder with a three minute looping track.
    pub fn builder() -> SimulatedTrackBuilder {
        SimulatedTrackBuilder::default()
    }

    /// Starts buffering; the ready signal follows after the buffering delay.
    ///
    /// Outside a tokio runtime there is nothing to wait on, so the track
    /// becomes ready immediately.
    pub fn load(&self) {
        let Ok(handle) = Handle::try_current() else {
            debug!("no runtime for buffering, track ready immediately");
            self.mark_ready();
            return;
        };
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            sleep(inner.buffering).await;
            SimulatedTrack { inner }.mark_ready();
        });
    }

    /// Marks the track as buffered and notifies listeners.
    pub fn mark_ready(&self) {
        self.inner.state.lock().ready = true;
        self.inner.hub.emit(ResourceEvent::CanPlayThrough);
    }

    /// Whether the track has buffered.
    pub fn is_ready(&self) -> bool {
        self.inner.state.lock().ready
    }

    /// Whether the track is audible.
    pub fn is_playing(&self) -> bool {
        self.inner.state.lock().playing
    }

    /// Whether the track loops.
    pub fn is_looping(&self) -> bool {
        self.inner.looping
    }

    /// Number of play requests received so far.
    pub fn play_requests(&self) -> usize {
        self.inner.state.lock().play_requests
    }

    /// Number of pause requests received so far.
    pub fn pause_requests(&self) -> usize {
        self.inner.state.lock().pause_requests
    }

    /// Number of live subscriptions.
    pub fn subscribers(&self) -> usize {
        self.inner.hub.len()
    }
}

impl AudioResource for SimulatedTrack {
    fn play(&self) -> PlayFuture {
        let inner = Arc::clone(&self.inner);
        let issued = inner.state.lock().generation;
        Box::pin(async move {
            let (generation, remaining) = {
                let mut state = inner.state.lock();
                state.play_requests += 1;
                if state.generation != issued {
                    // A pause arrived before the request could start.
                    return Err(PlaybackError::Aborted);
                }
                if !state.ready {
                    return Err(PlaybackError::NotReady);
                }
                if state.rejections_left > 0 {
                    state.rejections_left -= 1;
                    return Err(PlaybackError::NotAllowed(
                        "playback requires a user gesture".to_string(),
                    ));
                }
                if state.playing {
                    return Ok(());
                }
                state.playing = true;
                state.started_at = Some(Instant::now());
                state.generation += 1;
                (state.generation, inner.length.saturating_sub(state.position))
            };

            if !inner.looping {
                let timer = Arc::clone(&inner);
                tokio::spawn(async move {
                    sleep(remaining).await;
                    timer.finish(generation);
                });
            }
            Ok(())
        })
    }

    fn pause(&self) {
        let mut state = self.inner.state.lock();
        state.pause_requests += 1;
        state.generation += 1;
        if state.playing {
            state.playing = false;
            state.settle_position(self.inner.length);
        }
    }

    fn subscribe(&self) -> Subscription {
        let subscription = self.inner.hub.subscribe();
        // Late listeners still learn that the track is buffered.
        if self.is_ready() {
            self.inner
                .hub
                .notify(subscription.id(), ResourceEvent::CanPlayThrough);
        }
        subscription
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.hub.unsubscribe(id);
    }
}

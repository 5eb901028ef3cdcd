//! The music toggle model.

use super::keymap::{default_key_map, KeyMap};
use super::resource::{AudioResource, ResourceEvent, SubscriptionId};
use crate::error::{PlaybackError, PlaybackResult};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Model as BubbleTeaModel, Msg};
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

// Internal ID management for toggle instances
static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Where the toggle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The resource has not reported that it can play through yet.
    NotReady,
    /// Ready and silent.
    Paused,
    /// A play request is in flight and has not been confirmed.
    Starting,
    /// The resource confirmed playback.
    Playing,
}

/// Snapshot of the toggle's two user-visible flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Playback was requested and confirmed.
    pub is_playing: bool,
    /// The resource can play through.
    pub is_ready: bool,
}

/// A resource lifecycle event routed to one toggle.
#[derive(Debug, Clone)]
pub struct ResourceEventMsg {
    /// The toggle whose subscription produced the event.
    pub id: i64,
    /// What happened.
    pub event: ResourceEvent,
    tag: i64,
}

/// Outcome of a play request issued by [`Model::toggle`].
#[derive(Debug)]
pub struct PlayResultMsg {
    /// The toggle that issued the request.
    pub id: i64,
    /// Sequence number of the request; only the latest one is applied.
    pub request: i64,
    /// What the resource answered.
    pub result: PlaybackResult,
}

/// Visual styles for each state of the toggle.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Shown while waiting for the resource.
    pub loading: Style,
    /// Shown while paused.
    pub paused: Style,
    /// Shown while playing or starting.
    pub playing: Style,
    /// Shown for the play failure notice.
    pub notice: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            loading: Style::new().faint(true),
            paused: Style::new().bold(true).foreground(Color::from("#D4AF37")),
            playing: Style::new().bold(true).foreground(Color::from("#B22222")),
            notice: Style::new().foreground(Color::from("#E57373")),
        }
    }
}

/// Play/pause control bound to a single audio resource.
///
/// The toggle subscribes to the resource in [`init`](Model::init) and gives
/// the subscription back in [`detach`](Model::detach), which also runs on
/// drop. Starting playback is a two step affair: [`toggle`](Model::toggle)
/// sends the request and the toggle only reports playing once the resource
/// confirms it. A refused request leaves the toggle paused and shows a
/// notice; the user can simply try again.
pub struct Model {
    resource: Arc<dyn AudioResource>,
    status: Status,
    last_error: Option<PlaybackError>,
    id: i64,
    request: i64,
    tag: i64,
    subscription: Option<SubscriptionId>,
    events: Option<Arc<AsyncMutex<UnboundedReceiver<ResourceEvent>>>>,
    focus: bool,

    /// Key bindings, active while focused.
    pub keymap: KeyMap,
    /// Visual styles.
    pub styles: Styles,
    /// Label offered while paused.
    pub play_label: String,
    /// Label offered while playing.
    pub pause_label: String,
    /// Label shown while the resource buffers.
    pub loading_label: String,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("last_error", &self.last_error)
            .field("subscription", &self.subscription)
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a toggle for `resource`. Nothing is subscribed until
    /// [`init`](Model::init) runs.
    pub fn new(resource: Arc<dyn AudioResource>) -> Self {
        let mut model = Self {
            resource,
            status: Status::NotReady,
            last_error: None,
            id: next_id(),
            request: 0,
            tag: 0,
            subscription: None,
            events: None,
            focus: false,
            keymap: default_key_map(),
            styles: Styles::default(),
            play_label: "Play Devotional Music".to_string(),
            pause_label: "Pause Music".to_string(),
            loading_label: "Loading music".to_string(),
        };
        model.sync_keymap();
        model
    }

    /// Unique id of this toggle.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The two user-visible flags.
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            is_ready: self.is_ready(),
        }
    }

    /// Whether the resource can play through.
    pub fn is_ready(&self) -> bool {
        self.status != Status::NotReady
    }

    /// Whether playback was confirmed and has not stopped since.
    pub fn is_playing(&self) -> bool {
        self.status == Status::Playing
    }

    /// The refusal from the most recent failed play request, cleared by the
    /// next successful one.
    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// Subscribes to the resource and returns the command that waits for its
    /// first event. Calling it again while attached only re-arms listening.
    pub fn init(&mut self) -> Option<Cmd> {
        if self.subscription.is_none() {
            let (id, events) = self.resource.subscribe().into_parts();
            debug!(toggle = self.id, subscription = id.get(), "subscribed to audio resource");
            self.subscription = Some(id);
            self.events = Some(Arc::new(AsyncMutex::new(events)));
            self.tag += 1;
        }
        self.listen()
    }

    /// Unsubscribes from the resource and silences it if it was audible.
    /// Safe to call more than once.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.resource.unsubscribe(id);
            debug!(toggle = self.id, subscription = id.get(), "unsubscribed from audio resource");
        }
        self.events = None;
        self.tag += 1;

        if matches!(self.status, Status::Playing | Status::Starting) {
            self.resource.pause();
            self.set_status(Status::Paused);
        }
        self.request += 1;
    }

    /// The resource can play through. Idempotent.
    pub fn on_resource_ready(&mut self) {
        if self.status == Status::NotReady {
            self.set_status(Status::Paused);
        }
    }

    /// The resource reached the end of the track.
    pub fn on_playback_ended(&mut self) {
        if matches!(self.status, Status::Playing | Status::Starting) {
            self.request += 1;
            self.set_status(Status::Paused);
        }
    }

    /// Starts or stops playback.
    ///
    /// - not ready: nothing happens;
    /// - playing: the resource is paused right away;
    /// - paused: a play request is sent and the returned command delivers its
    ///   outcome as a [`PlayResultMsg`];
    /// - starting: the pending request is abandoned and the resource paused.
    pub fn toggle(&mut self) -> Option<Cmd> {
        match self.status {
            Status::NotReady => {
                debug!(toggle = self.id, "toggle ignored, resource not ready");
                None
            }
            Status::Playing | Status::Starting => {
                self.resource.pause();
                self.request += 1;
                self.set_status(Status::Paused);
                None
            }
            Status::Paused => {
                self.request += 1;
                self.set_status(Status::Starting);
                Some(self.play_cmd())
            }
        }
    }

    fn play_cmd(&self) -> Cmd {
        let id = self.id;
        let request = self.request;
        let play = self.resource.play();

        Box::pin(async move {
            let result = play.await;
            Some(Box::new(PlayResultMsg {
                id,
                request,
                result,
            }) as Msg)
        })
    }

    fn listen(&self) -> Option<Cmd> {
        let events = Arc::clone(self.events.as_ref()?);
        let id = self.id;
        let tag = self.tag;

        Some(Box::pin(async move {
            let event = events.lock().await.recv().await?;
            Some(Box::new(ResourceEventMsg { id, event, tag }) as Msg)
        }))
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            debug!(toggle = self.id, from = ?self.status, to = ?status, "music toggle state changed");
            self.status = status;
        }
        self.sync_keymap();
    }

    // The toggle key is unavailable until the track can play, like a
    // disabled button.
    fn sync_keymap(&mut self) {
        let ready = self.is_ready();
        self.keymap.toggle.set_enabled(ready);
    }

    fn apply_play_result(&mut self, request: i64, result: &PlaybackResult) {
        if request != self.request || self.status != Status::Starting {
            // The user changed their mind while the request was in flight.
            if result.is_ok() && matches!(self.status, Status::Paused | Status::NotReady) {
                debug!(toggle = self.id, "pausing after late play confirmation");
                self.resource.pause();
            }
            return;
        }

        match result {
            Ok(()) => {
                self.last_error = None;
                self.set_status(Status::Playing);
            }
            Err(e) => {
                warn!(toggle = self.id, error = %e, "play request rejected");
                self.last_error = Some(e.clone());
                self.set_status(Status::Paused);
            }
        }
    }

    /// Handles resource events, play outcomes and, while focused, key
    /// presses.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(event_msg) = msg.downcast_ref::<ResourceEventMsg>() {
            if event_msg.id != self.id || event_msg.tag != self.tag {
                return None;
            }
            match event_msg.event {
                ResourceEvent::CanPlayThrough => self.on_resource_ready(),
                ResourceEvent::Ended => self.on_playback_ended(),
            }
            return self.listen();
        }

        if let Some(result_msg) = msg.downcast_ref::<PlayResultMsg>() {
            if result_msg.id == self.id {
                self.apply_play_result(result_msg.request, &result_msg.result);
            }
            return None;
        }

        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.focus && self.keymap.toggle.matches(key_msg) {
                return self.toggle();
            }
        }

        None
    }

    /// Renders the button label for the current state, followed by the
    /// failure notice when the last play request was refused.
    pub fn view(&self) -> String {
        let button = match self.status {
            Status::NotReady => self
                .styles
                .loading
                .render(&format!("◌ {}…", self.loading_label)),
            Status::Paused => self.styles.paused.render(&format!("▶ {}", self.play_label)),
            Status::Starting => self.styles.playing.render(&format!("▶ {}…", self.play_label)),
            Status::Playing => self
                .styles
                .playing
                .render(&format!("❚❚ {} ♪", self.pause_label)),
        };

        let button = if self.focus {
            format!("> {}", button)
        } else {
            format!("  {}", button)
        };

        match &self.last_error {
            Some(e) if self.status == Status::Paused => format!(
                "{}\n{}",
                button,
                self.styles
                    .notice
                    .render(&format!("  Could not start the music: {}", e))
            ),
            _ => button,
        }
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.detach();
    }
}

impl BubbleTeaModel for Model {
    fn init() -> (Self, Option<Cmd>) {
        let track = super::SimulatedTrack::builder().build();
        track.load();
        let mut model = Self::new(Arc::new(track));
        model.focus = true;
        let cmd = Model::init(&mut model);
        (model, cmd)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        self.update(msg)
    }

    fn view(&self) -> String {
        self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::resource::{EventHub, PlayFuture, Subscription};
    use crossterm::event::{KeyCode, KeyModifiers};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        hub: EventHub,
        plays: Mutex<usize>,
        pauses: Mutex<usize>,
        unsubscribes: Mutex<Vec<SubscriptionId>>,
        answers: Mutex<VecDeque<PlaybackResult>>,
    }

    impl Recorder {
        fn plays(&self) -> usize {
            *self.plays.lock()
        }

        fn pauses(&self) -> usize {
            *self.pauses.lock()
        }

        fn answer_next(&self, result: PlaybackResult) {
            self.answers.lock().push_back(result);
        }
    }

    impl AudioResource for Recorder {
        fn play(&self) -> PlayFuture {
            *self.plays.lock() += 1;
            let answer = self.answers.lock().pop_front().unwrap_or(Ok(()));
            Box::pin(async move { answer })
        }

        fn pause(&self) {
            *self.pauses.lock() += 1;
        }

        fn subscribe(&self) -> Subscription {
            self.hub.subscribe()
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.unsubscribes.lock().push(id);
            self.hub.unsubscribe(id);
        }
    }

    fn toggle_with_recorder() -> (Model, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let model = Model::new(recorder.clone());
        (model, recorder)
    }

    async fn run(cmd: Option<Cmd>) -> Msg {
        cmd.expect("command").await.expect("message")
    }

    fn key(code: KeyCode) -> KeyMsg {
        KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_initial_state() {
        let (model, _) = toggle_with_recorder();
        assert_eq!(model.status(), Status::NotReady);
        assert_eq!(model.state(), PlaybackState::default());
        assert!(!model.keymap.toggle.enabled());
    }

    #[test]
    fn test_toggle_while_not_ready_is_noop() {
        let (mut model, recorder) = toggle_with_recorder();
        assert!(model.toggle().is_none());
        assert!(model.toggle().is_none());
        assert!(!model.is_playing());
        assert_eq!(recorder.plays(), 0);
        assert_eq!(recorder.pauses(), 0);
    }

    #[test]
    fn test_ready_is_idempotent() {
        let (mut model, _) = toggle_with_recorder();
        model.on_resource_ready();
        model.on_resource_ready();
        assert_eq!(model.status(), Status::Paused);
        assert!(model.keymap.toggle.enabled());
    }

    #[tokio::test]
    async fn test_play_confirmed_then_paused() {
        let (mut model, recorder) = toggle_with_recorder();
        model.on_resource_ready();

        let cmd = model.toggle();
        assert_eq!(model.status(), Status::Starting);
        assert!(!model.is_playing());

        model.update(run(cmd).await);
        assert!(model.is_playing());

        assert!(model.toggle().is_none());
        assert!(!model.is_playing());
        assert_eq!(recorder.plays(), 1);
        assert_eq!(recorder.pauses(), 1);
    }

    #[test]
    fn test_double_toggle_issues_one_pause() {
        let (mut model, recorder) = toggle_with_recorder();
        model.on_resource_ready();

        let _pending = model.toggle();
        model.toggle();

        assert!(!model.is_playing());
        assert_eq!(model.status(), Status::Paused);
        assert_eq!(recorder.pauses(), 1);
    }

    #[tokio::test]
    async fn test_ended_resets_playing() {
        let (mut model, _) = toggle_with_recorder();
        model.on_resource_ready();
        let cmd = model.toggle();
        model.update(run(cmd).await);
        assert!(model.is_playing());

        model.on_playback_ended();
        assert!(!model.is_playing());
        assert!(model.is_ready());
    }

    #[tokio::test]
    async fn test_rejected_play_stays_paused() {
        let (mut model, recorder) = toggle_with_recorder();
        let refusal = PlaybackError::NotAllowed("autoplay".into());
        recorder.answer_next(Err(refusal.clone()));
        model.on_resource_ready();

        let cmd = model.toggle();
        model.update(run(cmd).await);
        assert!(!model.is_playing());
        assert_eq!(model.status(), Status::Paused);
        assert_eq!(model.last_error(), Some(&refusal));
        assert!(model.view().contains("Could not start the music"));

        // Trying again works and clears the notice.
        let cmd = model.toggle();
        model.update(run(cmd).await);
        assert!(model.is_playing());
        assert!(model.last_error().is_none());
        assert_eq!(recorder.plays(), 2);
    }

    #[tokio::test]
    async fn test_late_confirmation_is_reconciled() {
        let (mut model, recorder) = toggle_with_recorder();
        model.on_resource_ready();

        let cmd = model.toggle();
        model.toggle();
        assert_eq!(recorder.pauses(), 1);

        model.update(run(cmd).await);
        assert!(!model.is_playing());
        assert_eq!(recorder.pauses(), 2);
    }

    #[tokio::test]
    async fn test_events_arrive_through_subscription() {
        let (mut model, recorder) = toggle_with_recorder();
        let listen = model.init();
        assert_eq!(recorder.hub.len(), 1);

        recorder.hub.emit(ResourceEvent::CanPlayThrough);
        let next = model.update(run(listen).await);
        assert!(model.is_ready());
        assert!(next.is_some());

        let play = model.toggle();
        model.update(run(play).await);
        assert!(model.is_playing());

        recorder.hub.emit(ResourceEvent::Ended);
        model.update(run(next).await);
        assert!(!model.is_playing());
    }

    #[tokio::test]
    async fn test_detach_unsubscribes_once() {
        let (mut model, recorder) = toggle_with_recorder();
        let listen = model.init();

        model.detach();
        model.detach();
        assert_eq!(recorder.unsubscribes.lock().len(), 1);
        assert!(recorder.hub.is_empty());

        // The listening command finishes without a message.
        assert!(listen.expect("command").await.is_none());
    }

    #[tokio::test]
    async fn test_events_from_old_subscription_are_ignored() {
        let (mut model, recorder) = toggle_with_recorder();
        let _listen = model.init();
        recorder.hub.emit(ResourceEvent::CanPlayThrough);

        let stale = ResourceEventMsg {
            id: model.id(),
            event: ResourceEvent::CanPlayThrough,
            tag: model.tag - 1,
        };
        assert!(model.update(Box::new(stale)).is_none());
        assert!(!model.is_ready());
    }

    #[test]
    fn test_drop_detaches() {
        let recorder = Arc::new(Recorder::default());
        {
            let mut model = Model::new(recorder.clone());
            let _ = model.init();
            model.on_resource_ready();
        }
        assert_eq!(recorder.unsubscribes.lock().len(), 1);
    }

    #[test]
    fn test_key_toggles_only_when_focused() {
        let (mut model, recorder) = toggle_with_recorder();
        model.on_resource_ready();

        assert!(model.update(Box::new(key(KeyCode::Char(' ')))).is_none());
        assert_eq!(model.status(), Status::Paused);

        model.focus();
        assert!(model.focused());
        assert!(model.update(Box::new(key(KeyCode::Char(' ')))).is_some());
        assert_eq!(model.status(), Status::Starting);
        assert_eq!(recorder.plays(), 1);

        model.blur();
        assert!(!model.focused());
    }

    #[test]
    fn test_foreign_play_result_is_ignored() {
        let (mut model, _) = toggle_with_recorder();
        model.on_resource_ready();
        let _pending = model.toggle();

        let foreign = PlayResultMsg {
            id: model.id() + 100,
            request: model.request,
            result: Ok(()),
        };
        model.update(Box::new(foreign));
        assert_eq!(model.status(), Status::Starting);
    }

    #[test]
    fn test_view_labels() {
        let (mut model, _) = toggle_with_recorder();
        model.styles = Styles {
            loading: Style::new(),
            paused: Style::new(),
            playing: Style::new(),
            notice: Style::new(),
        };
        assert_eq!(model.view(), "  ◌ Loading music…");

        model.on_resource_ready();
        assert_eq!(model.view(), "  ▶ Play Devotional Music");

        model.status = Status::Playing;
        model.focus();
        assert_eq!(model.view(), "> ❚❚ Pause Music ♪");
    }
}

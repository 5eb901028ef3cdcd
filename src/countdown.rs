//! Countdown component for Bubble Tea applications.
//!
//! Counts down to a fixed wall-clock date-time and reports the time left as
//! whole days, hours, minutes and seconds. The widget recomputes from the
//! current clock on every tick instead of decrementing a stored duration, so
//! a clock correction simply shows up on the next tick.
//!
//! # Basic Usage
//!
//! ```rust
//! use festival_widgets::countdown::{new, KALI_PUJA_2025};
//! use chrono::NaiveDate;
//!
//! // Count down to the festival evening
//! let countdown = new(*KALI_PUJA_2025);
//!
//! // Or to any other local date-time
//! let target = NaiveDate::from_ymd_opt(2026, 10, 20)
//!     .and_then(|d| d.and_hms_opt(18, 0, 0))
//!     .unwrap();
//! let countdown = new(target);
//! assert!(!countdown.active());
//! ```
//!
//! # bubbletea-rs Integration
//!
//! The countdown only ticks while it is active. Call [`Model::activate`] when
//! the hosting view comes up and [`Model::deactivate`] when it goes away;
//! ticks scheduled before a deactivation are dropped.
//!
//! ```rust
//! use bubbletea_rs::{Model as BubbleTeaModel, Msg, Cmd};
//! use festival_widgets::countdown::{new, Model, ReachedMsg, KALI_PUJA_2025};
//!
//! struct Home {
//!     countdown: Model,
//!     started: bool,
//! }
//!
//! impl BubbleTeaModel for Home {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let mut countdown = new(*KALI_PUJA_2025);
//!         let cmd = countdown.activate();
//!         (Self { countdown, started: false }, Some(cmd))
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         if let Some(reached) = msg.downcast_ref::<ReachedMsg>() {
//!             if reached.id == self.countdown.id() {
//!                 self.started = true;
//!             }
//!         }
//!         // Always forward, the countdown keeps its schedule alive from here
//!         self.countdown.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.countdown.view()
//!     }
//! }
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Model as BubbleTeaModel, Msg};
use chrono::{Local, NaiveDate, NaiveDateTime, ParseError};
use lipgloss_extras::lipgloss::AdaptiveColor;
use lipgloss_extras::prelude::*;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::debug;

// Internal ID management for countdown instances
static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Kali Puja 2025: November 1 2025, 18:00 local time.
pub static KALI_PUJA_2025: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(2025, 11, 1)
        .and_then(|d| d.and_hms_opt(18, 0, 0))
        .expect("festival date is a valid calendar date")
});

const TARGET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a local target date-time such as `2025-11-01T18:00:00`.
///
/// Seconds are optional and a space may replace the `T` separator.
///
/// ```rust
/// use festival_widgets::countdown::{parse_target, KALI_PUJA_2025};
///
/// assert_eq!(parse_target("2025-11-01 18:00").unwrap(), *KALI_PUJA_2025);
/// assert!(parse_target("next friday").is_err());
/// ```
pub fn parse_target(s: &str) -> Result<NaiveDateTime, ParseError> {
    let s = s.trim();
    let mut parsed = NaiveDateTime::parse_from_str(s, TARGET_FORMATS[0]);
    for format in &TARGET_FORMATS[1..] {
        if parsed.is_ok() {
            break;
        }
        parsed = NaiveDateTime::parse_from_str(s, format);
    }
    parsed
}

/// Time left until the target, split into display units.
///
/// Always derived from a single millisecond delta; never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RemainingDuration {
    /// Whole days left.
    pub days: u64,
    /// Hours past the whole days, `0..=23`.
    pub hours: u8,
    /// Minutes past the whole hours, `0..=59`.
    pub minutes: u8,
    /// Seconds past the whole minutes, `0..=59`.
    pub seconds: u8,
}

impl RemainingDuration {
    /// Nothing left.
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Splits a millisecond delta into days, hours, minutes and seconds,
    /// rounding down. A delta of zero or less yields [`Self::ZERO`].
    ///
    /// ```rust
    /// use festival_widgets::countdown::RemainingDuration;
    ///
    /// let r = RemainingDuration::from_millis(90_061_500);
    /// assert_eq!((r.days, r.hours, r.minutes, r.seconds), (1, 1, 1, 1));
    /// ```
    pub fn from_millis(delta: i64) -> Self {
        if delta <= 0 {
            return Self::ZERO;
        }
        Self {
            days: (delta / MS_PER_DAY) as u64,
            hours: ((delta % MS_PER_DAY) / MS_PER_HOUR) as u8,
            minutes: ((delta % MS_PER_HOUR) / MS_PER_MINUTE) as u8,
            seconds: ((delta % MS_PER_MINUTE) / MS_PER_SECOND) as u8,
        }
    }

    /// Total whole seconds represented by the four fields.
    pub fn total_seconds(&self) -> u64 {
        self.days * 86_400
            + u64::from(self.hours) * 3_600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }

    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for RemainingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Message delivered on every countdown tick.
///
/// Carries the wall-clock reading taken when the tick fired. Ticks are
/// filtered by `id` and by an internal tag that changes on every
/// activation and deactivation, so a schedule from an earlier mount never
/// drives the widget.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// The countdown this tick belongs to.
    pub id: i64,
    /// Local wall-clock time at which the tick fired.
    pub now: NaiveDateTime,
    tag: i64,
}

/// Sent once when a tick first observes the target as reached.
///
/// Forward it to the countdown after inspecting it; the countdown resumes its
/// schedule from this message.
#[derive(Debug, Clone)]
pub struct ReachedMsg {
    /// The countdown that reached its target.
    pub id: i64,
}

/// Construction options, applied in order by [`new_with_options`].
pub enum CountdownOption {
    /// Tick interval, one second by default.
    WithInterval(Duration),
    /// Style of the numeric cells.
    WithStyle(Box<Style>),
    /// Style of the unit labels.
    WithLabelStyle(Box<Style>),
}

impl CountdownOption {
    fn apply(&self, m: &mut Model) {
        match self {
            CountdownOption::WithInterval(interval) => m.interval = *interval,
            CountdownOption::WithStyle(style) => m.style = style.as_ref().clone(),
            CountdownOption::WithLabelStyle(style) => m.label_style = style.as_ref().clone(),
        }
    }
}

/// Sets the tick interval.
pub fn with_interval(interval: Duration) -> CountdownOption {
    CountdownOption::WithInterval(interval)
}

/// Sets the style of the numeric cells.
pub fn with_style(style: Style) -> CountdownOption {
    CountdownOption::WithStyle(Box::new(style))
}

/// Sets the style of the unit labels.
pub fn with_label_style(style: Style) -> CountdownOption {
    CountdownOption::WithLabelStyle(Box::new(style))
}

/// Countdown to a fixed local date-time.
///
/// # State
///
/// - **Active**: ticks are scheduled and processed. Set by [`Model::activate`],
///   cleared by [`Model::deactivate`].
/// - **Remaining**: the last value computed while the target was still ahead.
///   Zero until the first tick, so a countdown started after its target
///   shows zeros.
/// - **Reached**: whether the most recent tick found the target in the past.
///
/// Every instance has its own id; several countdowns can run side by side.
#[derive(Debug, Clone)]
pub struct Model {
    /// The local date-time being counted down to.
    pub target: NaiveDateTime,
    /// Time between ticks.
    pub interval: Duration,
    /// Style of the numeric cells.
    pub style: Style,
    /// Style of the unit labels.
    pub label_style: Style,
    id: i64,
    tag: i64,
    active: bool,
    remaining: RemainingDuration,
    reached: bool,
}

impl Model {
    /// Creates an inactive countdown with a one-second interval and the
    /// festival styling (gold digits, muted labels).
    pub fn new(target: NaiveDateTime) -> Self {
        Self {
            target,
            interval: Duration::from_secs(1),
            style: Style::new().bold(true).foreground(Color::from("#D4AF37")),
            label_style: Style::new().foreground(AdaptiveColor {
                Light: "#6B6B6B",
                Dark: "#BDBDBD",
            }),
            id: next_id(),
            tag: 0,
            active: false,
            remaining: RemainingDuration::ZERO,
            reached: false,
        }
    }

    /// Creates a countdown and applies `opts` in order.
    pub fn new_with_options(target: NaiveDateTime, opts: &[CountdownOption]) -> Self {
        let mut m = Self::new(target);
        for opt in opts {
            opt.apply(&mut m);
        }
        m
    }

    /// Unique id of this countdown.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether ticks are currently being processed.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Whether the last tick found the target reached.
    pub fn reached(&self) -> bool {
        self.reached
    }

    /// The value shown to the user.
    pub fn remaining(&self) -> RemainingDuration {
        self.remaining
    }

    /// Starts the countdown: computes the current value right away and
    /// returns the command for the next tick.
    ///
    /// Calling it again restarts the schedule; ticks from the previous one
    /// are rejected.
    pub fn activate(&mut self) -> Cmd {
        self.active = true;
        self.tag += 1;
        debug!(id = self.id, target = %self.target, "countdown activated");
        self.advance(Local::now().naive_local());
        self.schedule()
    }

    /// Stops the countdown. Pending ticks are rejected when they arrive.
    pub fn deactivate(&mut self) {
        if self.active {
            debug!(id = self.id, "countdown deactivated");
        }
        self.active = false;
        self.tag += 1;
    }

    /// Recomputes the remaining time for `now` and returns it.
    ///
    /// While the target lies ahead the value is derived from
    /// `target - now`. Once `now` is at or past the target the last value is
    /// held unchanged until the target is ahead again (for example after the
    /// clock is set back).
    pub fn tick(&mut self, now: NaiveDateTime) -> RemainingDuration {
        self.advance(now);
        self.remaining
    }

    /// Builds a tick message for this countdown's current schedule.
    ///
    /// Useful for hosts driving the countdown from their own clock.
    pub fn tick_msg(&self, now: NaiveDateTime) -> TickMsg {
        TickMsg {
            id: self.id,
            now,
            tag: self.tag,
        }
    }

    // Returns true when this call is the one that first sees the target reached.
    fn advance(&mut self, now: NaiveDateTime) -> bool {
        let delta = self.target.signed_duration_since(now).num_milliseconds();
        if delta > 0 {
            self.remaining = RemainingDuration::from_millis(delta);
            self.reached = false;
            return false;
        }
        if self.reached {
            return false;
        }
        self.reached = true;
        debug!(id = self.id, "countdown reached its target");
        true
    }

    fn schedule(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;

        bubbletea_tick(self.interval, move |_| {
            Box::new(TickMsg {
                id,
                now: Local::now().naive_local(),
                tag,
            }) as Msg
        })
    }

    fn reached_cmd(&self) -> Cmd {
        let id = self.id;
        bubbletea_tick(Duration::from_nanos(1), move |_| {
            Box::new(ReachedMsg { id }) as Msg
        })
    }

    /// Processes tick and reached messages addressed to this countdown.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(tick_msg) = msg.downcast_ref::<TickMsg>() {
            if !self.active || tick_msg.id != self.id {
                return None;
            }

            // A different tag means the tick belongs to an earlier schedule.
            if tick_msg.tag != self.tag {
                return None;
            }

            if self.advance(tick_msg.now) {
                return Some(self.reached_cmd());
            }
            return Some(self.schedule());
        }

        if let Some(reached) = msg.downcast_ref::<ReachedMsg>() {
            if self.active && reached.id == self.id {
                return Some(self.schedule());
            }
        }

        None
    }

    /// Renders the four units as zero-padded cells, e.g.
    /// `05 Days  03 Hours  59 Minutes  07 Seconds`.
    pub fn view(&self) -> String {
        let r = self.remaining;
        let cells = [
            (r.days, "Days"),
            (u64::from(r.hours), "Hours"),
            (u64::from(r.minutes), "Minutes"),
            (u64::from(r.seconds), "Seconds"),
        ];

        cells
            .iter()
            .map(|(value, unit)| {
                format!(
                    "{} {}",
                    self.style.render(&format!("{:02}", value)),
                    self.label_style.render(unit)
                )
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

impl BubbleTeaModel for Model {
    fn init() -> (Self, Option<Cmd>) {
        let mut model = Self::default();
        let cmd = model.activate();
        (model, Some(cmd))
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        self.update(msg)
    }

    fn view(&self) -> String {
        self.view()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(*KALI_PUJA_2025)
    }
}

/// Creates an inactive countdown to `target` with default settings.
pub fn new(target: NaiveDateTime) -> Model {
    Model::new(target)
}

/// Creates an inactive countdown to `target` with the given options.
pub fn new_with_options(target: NaiveDateTime, opts: &[CountdownOption]) -> Model {
    Model::new_with_options(target, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn plain(target: NaiveDateTime) -> Model {
        new_with_options(
            target,
            &[with_style(Style::new()), with_label_style(Style::new())],
        )
    }

    fn active(target: NaiveDateTime) -> Model {
        let mut m = plain(target);
        m.active = true;
        m.tag = 1;
        m
    }

    #[test]
    fn test_one_second_past_a_day_before() {
        let mut m = plain(at("2025-11-01T18:00:00"));
        let r = m.tick(at("2025-10-31T18:00:01"));
        assert_eq!(
            r,
            RemainingDuration {
                days: 0,
                hours: 23,
                minutes: 59,
                seconds: 59
            }
        );
    }

    #[test]
    fn test_target_reached_exactly() {
        let target = at("2025-11-01T18:00:00");
        let mut m = plain(target);
        assert_eq!(m.tick(target), RemainingDuration::ZERO);
        assert!(m.reached());

        for later in [
            target + TimeDelta::seconds(1),
            target + TimeDelta::hours(5),
            target + TimeDelta::days(40),
        ] {
            assert_eq!(m.tick(later), RemainingDuration::ZERO);
        }
    }

    #[test]
    fn test_decomposition_matches_whole_seconds() {
        let target = *KALI_PUJA_2025;
        let deltas_ms: [i64; 8] = [
            1,
            999,
            1_000,
            59_999,
            3_600_000,
            86_399_999,
            86_400_000 * 3 + 3_723_456,
            86_400_000 * 400 + 1,
        ];
        let mut m = plain(target);
        for delta in deltas_ms {
            let now = target - TimeDelta::milliseconds(delta);
            let r = m.tick(now);
            assert_eq!(r.total_seconds(), (delta / 1000) as u64, "delta {delta}");
            assert!(r.hours < 24 && r.minutes < 60 && r.seconds < 60);
        }
    }

    #[test]
    fn test_last_value_held_after_target() {
        let target = at("2025-11-01T18:00:00");
        let mut m = plain(target);

        let before = m.tick(target - TimeDelta::milliseconds(1_500));
        assert_eq!(before.seconds, 1);

        let after = m.tick(target + TimeDelta::seconds(3));
        assert_eq!(after, before);
        assert_eq!(m.remaining().seconds, 1);
        assert!(m.reached());

        assert_eq!(m.tick(target + TimeDelta::days(2)), before);
    }

    #[test]
    fn test_coarse_interval_holds_value_across_crossing() {
        let target = at("2025-11-01T18:00:00");
        let mut m = new_with_options(
            target,
            &[
                with_interval(Duration::from_secs(5)),
                with_style(Style::new()),
                with_label_style(Style::new()),
            ],
        );

        let last = m.tick(target - TimeDelta::milliseconds(4_200));
        assert_eq!(last.seconds, 4);

        let after = m.tick(target + TimeDelta::milliseconds(800));
        assert_eq!(after, last);
        assert_eq!(m.view(), "00 Days  00 Hours  00 Minutes  04 Seconds");
    }

    #[test]
    fn test_clock_set_back_recomputes() {
        let target = at("2025-11-01T18:00:00");
        let mut m = plain(target);
        m.tick(target + TimeDelta::minutes(1));
        assert!(m.reached());

        let r = m.tick(target - TimeDelta::minutes(2));
        assert_eq!(r.minutes, 2);
        assert!(!m.reached());
    }

    #[test]
    fn test_unique_ids() {
        let a = new(*KALI_PUJA_2025);
        let b = new(*KALI_PUJA_2025);
        assert_ne!(a.id(), b.id());
        assert!(a.id() > 0);
    }

    #[test]
    fn test_options() {
        let m = new_with_options(*KALI_PUJA_2025, &[with_interval(Duration::from_millis(250))]);
        assert_eq!(m.interval, Duration::from_millis(250));
        assert!(!m.active());

        let d = Model::default();
        assert_eq!(d.target, *KALI_PUJA_2025);
        assert_eq!(d.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_inactive_rejects_ticks() {
        let target = at("2025-11-01T18:00:00");
        let mut m = plain(target);
        let msg = m.tick_msg(at("2025-10-31T18:00:00"));
        assert!(m.update(Box::new(msg)).is_none());
        assert_eq!(m.remaining(), RemainingDuration::ZERO);
    }

    #[test]
    fn test_active_tick_updates_and_reschedules() {
        let target = at("2025-11-01T18:00:00");
        let mut m = active(target);
        let msg = m.tick_msg(at("2025-10-30T17:00:00"));
        assert!(m.update(Box::new(msg)).is_some());
        assert_eq!(m.remaining().days, 2);
        assert_eq!(m.remaining().hours, 1);
    }

    #[test]
    fn test_wrong_id_is_rejected() {
        let target = at("2025-11-01T18:00:00");
        let mut m = active(target);
        let mut msg = m.tick_msg(at("2025-10-30T17:00:00"));
        msg.id += 999;
        assert!(m.update(Box::new(msg)).is_none());
        assert_eq!(m.remaining(), RemainingDuration::ZERO);
    }

    #[test]
    fn test_deactivate_drops_pending_ticks() {
        let target = at("2025-11-01T18:00:00");
        let mut m = active(target);
        let pending = m.tick_msg(at("2025-10-30T17:00:00"));

        m.deactivate();
        assert!(!m.active());
        assert!(m.update(Box::new(pending.clone())).is_none());

        // A fresh activation must not revive the old schedule either.
        m.active = true;
        assert!(m.update(Box::new(pending)).is_none());
        assert_eq!(m.remaining(), RemainingDuration::ZERO);
    }

    #[test]
    fn test_activate_bumps_tag() {
        let mut m = plain(*KALI_PUJA_2025);
        let before = m.tick_msg(*KALI_PUJA_2025);
        let _cmd = m.activate();
        assert!(m.active());
        assert_ne!(m.tick_msg(*KALI_PUJA_2025).tag, before.tag);
    }

    #[test]
    fn test_reached_message_is_sent_once() {
        let target = at("2025-11-01T18:00:00");
        let mut m = active(target);

        let crossing = m.tick_msg(target + TimeDelta::seconds(1));
        assert!(m.update(Box::new(crossing)).is_some());
        assert!(m.reached());

        // The follow-up ReachedMsg resumes the schedule.
        assert!(m.update(Box::new(ReachedMsg { id: m.id() })).is_some());
        assert!(m.update(Box::new(ReachedMsg { id: m.id() + 1 })).is_none());

        // Later ticks keep the value held and do not cross again.
        let later = m.tick_msg(target + TimeDelta::seconds(2));
        assert!(m.update(Box::new(later)).is_some());
        assert!(m.reached());
        assert!(m.remaining().is_zero());
    }

    #[test]
    fn test_instances_are_independent() {
        let target = at("2025-11-01T18:00:00");
        let mut a = active(target);
        let mut b = active(target);

        let msg = a.tick_msg(at("2025-10-31T18:00:00"));
        assert!(b.update(Box::new(msg.clone())).is_none());
        assert!(a.update(Box::new(msg)).is_some());
        assert_eq!(a.remaining().days, 1);
        assert!(b.remaining().is_zero());
    }

    #[test]
    fn test_view_pads_units() {
        let mut m = plain(at("2025-11-01T18:00:00"));
        m.tick(at("2025-10-27T14:54:53"));
        assert_eq!(m.view(), "05 Days  03 Hours  05 Minutes  07 Seconds");
    }

    #[test]
    fn test_display() {
        let r = RemainingDuration::from_millis(86_400_000 + 61_000);
        assert_eq!(r.to_string(), "01d 00h 01m 01s");
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("2025-11-01T18:00:00").unwrap(), *KALI_PUJA_2025);
        assert_eq!(parse_target(" 2025-11-01 18:00 ").unwrap(), *KALI_PUJA_2025);
        assert!(parse_target("2025-13-01T18:00:00").is_err());
    }
}

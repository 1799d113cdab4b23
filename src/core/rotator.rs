//! Rotating presenter — cycles a variant set on a timer.
//!
//! A [`Rotator`] is owned by the page component that displays it. The
//! owner drives it from its event loop by calling [`Rotator::poll`]
//! (or [`Rotator::tick`] straight from a timer callback); at most one
//! tick is ever scheduled, and [`Rotator::dispose`] cancels it for good.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::variants::VariantSet;
use crate::schema::context::Context;

/// Monotonic time source, as an offset from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock. Clones share the same time, so a test (or a
/// JS host) can keep one handle and give the other to the rotator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorState {
    /// No variants to show.
    Idle,
    /// Showing the variant at this index.
    Displaying(usize),
    /// Torn down; terminal.
    Disposed,
}

/// Cycles through a [`VariantSet`], exposing the current rendered copy.
#[derive(Debug)]
pub struct Rotator<C: Clock = SystemClock> {
    variants: Option<VariantSet>,
    context: Context,
    interval: Option<Duration>,
    resolve: bool,
    state: RotatorState,
    next_due: Option<Duration>,
    rendered: String,
    rng: StdRng,
    clock: C,
}

/// Builder for constructing a `Rotator`.
pub struct RotatorBuilder<C: Clock = SystemClock> {
    variants: Option<VariantSet>,
    context: Context,
    interval: Option<Duration>,
    resolve: bool,
    seed: Option<u64>,
    clock: C,
}

/// Rotator over `variants` advancing every `interval_ms`, on the system
/// clock. An empty list gives an idle rotator; `0` disables rotation.
pub fn create_rotator<S: AsRef<str>>(variants: &[S], interval_ms: u64) -> Rotator {
    let mut builder = Rotator::builder().interval(Duration::from_millis(interval_ms));
    if let Ok(set) = VariantSet::from_strs(variants) {
        builder = builder.variants(set);
    }
    builder.build()
}

impl Rotator<SystemClock> {
    pub fn builder() -> RotatorBuilder<SystemClock> {
        RotatorBuilder {
            variants: None,
            context: Context::new(),
            interval: None,
            resolve: true,
            seed: None,
            clock: SystemClock::new(),
        }
    }
}

impl<C: Clock> Rotator<C> {
    /// The copy currently on display. Empty while idle.
    pub fn current(&self) -> &str {
        &self.rendered
    }

    pub fn state(&self) -> RotatorState {
        self.state
    }

    pub fn index(&self) -> Option<usize> {
        match self.state {
            RotatorState::Displaying(i) => Some(i),
            _ => None,
        }
    }

    /// When the pending tick is due, if one is scheduled.
    pub fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    pub fn is_disposed(&self) -> bool {
        self.state == RotatorState::Disposed
    }

    /// Fire the tick if it is due. Returns whether the display changed.
    ///
    /// However many intervals have elapsed, a poll advances at most one
    /// step and reschedules from now.
    pub fn poll(&mut self) -> bool {
        match self.next_due {
            Some(due) if self.clock.now() >= due => self.tick(),
            _ => false,
        }
    }

    /// Timer callback: advance to the next variant and reschedule.
    /// No-op when idle, disposed, or when rotation is disabled.
    pub fn tick(&mut self) -> bool {
        let RotatorState::Displaying(index) = self.state else {
            return false;
        };
        if self.next_due.is_none() {
            return false;
        }
        let Some(len) = self.variants.as_ref().map(VariantSet::len) else {
            return false;
        };

        let next = (index + 1) % len;
        self.state = RotatorState::Displaying(next);
        self.rendered = self.render_index(next);
        self.schedule();
        debug!(index = next, "rotated to next variant");
        true
    }

    /// Swap in a new variant set and restart at index 0. The pending tick,
    /// if any, is replaced rather than added to. Ignored once disposed.
    pub fn load(&mut self, variants: VariantSet) {
        if self.state == RotatorState::Disposed {
            return;
        }
        self.variants = Some(variants);
        self.state = RotatorState::Displaying(0);
        self.rendered = self.render_index(0);
        self.schedule();
    }

    /// Cancel the pending tick. Later `tick`/`poll` calls change nothing.
    pub fn dispose(&mut self) {
        if self.state != RotatorState::Disposed {
            debug!("rotator disposed");
        }
        self.next_due = None;
        self.state = RotatorState::Disposed;
    }

    fn schedule(&mut self) {
        self.next_due = match (&self.variants, self.interval) {
            (Some(set), Some(interval)) if set.rotates() && !interval.is_zero() => {
                Some(self.clock.now().saturating_add(interval))
            }
            _ => None,
        };
    }

    fn render_index(&mut self, index: usize) -> String {
        let Some(ref set) = self.variants else {
            return String::new();
        };
        let template = set.get(index);
        if self.resolve {
            template.render(&self.context, &mut self.rng)
        } else {
            template.source()
        }
    }
}

impl<C: Clock> RotatorBuilder<C> {
    pub fn variants(mut self, variants: VariantSet) -> Self {
        self.variants = Some(variants);
        self
    }

    /// Time between rotations. Zero disables rotation.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn interval_ms(self, ms: u64) -> Self {
        self.interval(Duration::from_millis(ms))
    }

    /// `false` shows the raw template text instead of rendering it.
    pub fn resolve(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clock<D: Clock>(self, clock: D) -> RotatorBuilder<D> {
        RotatorBuilder {
            variants: self.variants,
            context: self.context,
            interval: self.interval,
            resolve: self.resolve,
            seed: self.seed,
            clock,
        }
    }

    pub fn build(self) -> Rotator<C> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = if self.variants.is_some() {
            RotatorState::Displaying(0)
        } else {
            RotatorState::Idle
        };

        let mut rotator = Rotator {
            variants: self.variants,
            context: self.context,
            interval: self.interval,
            resolve: self.resolve,
            state,
            next_due: None,
            rendered: String::new(),
            rng,
            clock: self.clock,
        };
        rotator.rendered = rotator.render_index(0);
        rotator.schedule();
        rotator
    }
}

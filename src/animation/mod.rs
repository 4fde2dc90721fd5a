pub mod easing;

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use crate::windowing::{ClientId, events::Ctx};

/// A shared numeric cell an animation writes through.
///
/// Handles are cheap to clone and all clones observe the same value. Two
/// handles refer to the same animation target when they share an allocation,
/// which is what [`Scheduler::register`] uses to replace running animations.
#[derive(Clone, Default)]
pub struct AnimatedValue(Arc<AtomicU64>);

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn same(&self, other: &AnimatedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnimatedValue").field(&self.get()).finish()
    }
}

pub type Easing = fn(f64) -> f64;
pub type OnDone = Box<dyn FnOnce(&mut Ctx<'_>) + Send>;

/// An animation request: move `value` to `target` over `length`.
pub struct Tween {
    value: AnimatedValue,
    target: f64,
    length: Duration,
    easing: Option<Easing>,
    relayout: bool,
    on_done: Option<OnDone>,
}

impl Tween {
    pub fn new(value: &AnimatedValue, target: f64, length: Duration) -> Self {
        Self {
            value: value.clone(),
            target,
            length,
            easing: None,
            relayout: false,
            on_done: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Re-run layout for the owning client once the animation lands.
    pub fn relayout(mut self) -> Self {
        self.relayout = true;
        self
    }

    pub fn on_done(mut self, done: impl FnOnce(&mut Ctx<'_>) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(done));
        self
    }
}

struct Animation {
    client: ClientId,
    value: AnimatedValue,
    start: f64,
    target: f64,
    length: Duration,
    easing: Option<Easing>,
    started: Instant,
    relayout: bool,
    on_done: Option<OnDone>,
}

impl Animation {
    fn progress(&self, now: Instant) -> f64 {
        if self.length.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        (elapsed / self.length.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// An animation that reached its target during a tick.
pub struct Finished {
    pub client: ClientId,
    pub relayout: bool,
    pub on_done: Option<OnDone>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Registered {
    New,
    /// An entry already drove this value; it was restarted in place and
    /// stays accounted to the client that first registered it.
    Replaced { owner: ClientId },
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Animation>,
}

impl Scheduler {
    /// Starts driving `tween.value`. If something already drives it, that
    /// entry is restarted from the value's current position instead.
    pub fn register(&mut self, client: ClientId, tween: Tween, now: Instant) -> Registered {
        let start = tween.value.get();
        if let Some(existing) = self.entries.iter_mut().find(|a| a.value.same(&tween.value)) {
            existing.start = start;
            existing.target = tween.target;
            existing.length = tween.length;
            existing.easing = tween.easing;
            existing.started = now;
            existing.relayout = tween.relayout;
            existing.on_done = tween.on_done;
            return Registered::Replaced {
                owner: existing.client,
            };
        }

        self.entries.push(Animation {
            client,
            value: tween.value,
            start,
            target: tween.target,
            length: tween.length,
            easing: tween.easing,
            started: now,
            relayout: tween.relayout,
            on_done: tween.on_done,
        });
        Registered::New
    }

    /// Advances every entry to `now`, returning the ones that landed.
    pub fn tick(&mut self, now: Instant) -> Vec<Finished> {
        let mut finished = Vec::new();
        self.entries.retain_mut(|a| {
            let scalar = a.progress(now);
            if scalar >= 1.0 {
                a.value.set(a.target);
                finished.push(Finished {
                    client: a.client,
                    relayout: a.relayout,
                    on_done: a.on_done.take(),
                });
                return false;
            }
            let eased = a.easing.map_or(scalar, |f| f(scalar));
            a.value.set(a.start + (a.target - a.start) * eased);
            true
        });
        finished
    }

    /// Snaps every animation of `client` to its target and drops it without
    /// running completion callbacks. Returns how many were cancelled.
    pub fn cancel_client(&mut self, client: ClientId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|a| {
            if a.client == client {
                a.value.set(a.target);
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    pub fn is_animating(&self, value: &AnimatedValue) -> bool {
        self.entries.iter().any(|a| a.value.same(value))
    }

    /// Whether an in-flight entry of `client` asked for relayout.
    pub fn relayouts(&self, client: ClientId) -> bool {
        self.entries.iter().any(|a| a.client == client && a.relayout)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn linear_midpoint_then_exact_target() {
        let client = ClientId::new(1);
        let value = AnimatedValue::new(0.0);
        let mut scheduler = Scheduler::default();
        let t0 = Instant::now();

        scheduler.register(client, Tween::new(&value, 100.0, ms(100)), t0);
        assert!(scheduler.tick(t0 + ms(50)).is_empty());
        assert!((value.get() - 50.0).abs() < 1e-6);

        let done = scheduler.tick(t0 + ms(100));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].client, client);
        assert_eq!(value.get(), 100.0);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn lands_exactly_despite_awkward_fractions() {
        let value = AnimatedValue::new(0.1);
        let mut scheduler = Scheduler::default();
        let t0 = Instant::now();
        scheduler.register(
            ClientId::new(1),
            Tween::new(&value, 0.7, ms(3)).easing(easing::ease_in_out_sine),
            t0,
        );
        scheduler.tick(t0 + ms(1));
        scheduler.tick(t0 + ms(2));
        scheduler.tick(t0 + ms(30));
        assert_eq!(value.get(), 0.7);
        assert_eq!(scheduler.len(), 0);
    }

    #[test]
    fn reregistering_replaces_instead_of_duplicating() {
        let value = AnimatedValue::new(0.0);
        let mut scheduler = Scheduler::default();
        let t0 = Instant::now();
        let a = ClientId::new(1);

        assert_eq!(
            scheduler.register(a, Tween::new(&value, 10.0, ms(100)), t0),
            Registered::New
        );
        scheduler.tick(t0 + ms(50));
        assert_eq!(
            scheduler.register(a, Tween::new(&value, 0.0, ms(100)), t0 + ms(50)),
            Registered::Replaced { owner: a }
        );
        assert_eq!(scheduler.len(), 1);

        // restarted from the value it had reached
        scheduler.tick(t0 + ms(100));
        assert!((value.get() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn zero_length_lands_on_first_tick() {
        let value = AnimatedValue::new(3.0);
        let mut scheduler = Scheduler::default();
        let t0 = Instant::now();
        scheduler.register(ClientId::new(2), Tween::new(&value, -3.0, Duration::ZERO), t0);
        assert_eq!(scheduler.tick(t0).len(), 1);
        assert_eq!(value.get(), -3.0);
    }

    #[test]
    fn cancel_client_snaps_only_its_entries() {
        let mine = AnimatedValue::new(0.0);
        let theirs = AnimatedValue::new(0.0);
        let mut scheduler = Scheduler::default();
        let t0 = Instant::now();
        scheduler.register(ClientId::new(1), Tween::new(&mine, 5.0, ms(100)), t0);
        scheduler.register(ClientId::new(2), Tween::new(&theirs, 5.0, ms(100)), t0);

        assert_eq!(scheduler.cancel_client(ClientId::new(1)), 1);
        assert_eq!(mine.get(), 5.0);
        assert_eq!(theirs.get(), 0.0);
        assert!(scheduler.is_animating(&theirs));
        assert!(!scheduler.is_animating(&mine));
    }
}

use std::{io, time::Duration};

use log::warn;

use crate::{
    reactor::{Poller, Timer},
    windowing::{ClientId, Ctx},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimeoutId(u64);

impl TimeoutId {
    pub(crate) fn token(self) -> u64 {
        self.0
    }
}

pub type TimeoutCallback = Box<dyn FnMut(&mut Ctx<'_>) + Send>;

struct Timeout {
    id: TimeoutId,
    client: ClientId,
    timer: Timer,
    repeat: bool,
    callback: Option<TimeoutCallback>,
}

/// Timers registered with the render loop's poller. Each one is keyed in the
/// poller by its id, so ids never collide with [`Timeouts::RESERVED`] tokens.
pub struct Timeouts {
    entries: Vec<Timeout>,
    next: u64,
}

/// A due timeout, taken out of the table while it runs.
pub(crate) struct Due {
    pub id: TimeoutId,
    pub client: ClientId,
    pub callback: TimeoutCallback,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next: Self::RESERVED,
        }
    }
}

impl Timeouts {
    /// Tokens below this belong to the reactor itself.
    pub const RESERVED: u64 = 16;

    pub fn add(
        &mut self,
        poller: &Poller,
        client: ClientId,
        delay: Duration,
        repeat: bool,
        callback: TimeoutCallback,
    ) -> io::Result<TimeoutId> {
        let id = TimeoutId(self.next);
        let timer = Timer::new(delay, repeat.then_some(delay))?;
        poller.add(timer.as_raw_fd(), id.0)?;
        self.next += 1;
        self.entries.push(Timeout {
            id,
            client,
            timer,
            repeat,
            callback: Some(callback),
        });
        Ok(id)
    }

    pub fn remove(&mut self, poller: &Poller, id: TimeoutId) -> bool {
        let Some(index) = self.entries.iter().position(|t| t.id == id) else {
            return false;
        };
        let timeout = self.entries.swap_remove(index);
        if let Err(err) = poller.delete(timeout.timer.as_raw_fd()) {
            warn!("failed to deregister {id:?}: {err}");
        }
        true
    }

    pub fn remove_client(&mut self, poller: &Poller, client: ClientId) -> usize {
        let ids: Vec<TimeoutId> = self
            .entries
            .iter()
            .filter(|t| t.client == client)
            .map(|t| t.id)
            .collect();
        ids.into_iter().filter(|id| self.remove(poller, *id)).count()
    }

    pub fn contains(&self, id: TimeoutId) -> bool {
        self.entries.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the expiration behind `token` and hands out its callback.
    /// One-shot timeouts are dropped right away; repeating ones wait for
    /// [`Timeouts::restore`].
    pub(crate) fn take_due(&mut self, poller: &Poller, token: u64) -> Option<Due> {
        let index = self.entries.iter().position(|t| t.id.0 == token)?;
        let entry = &mut self.entries[index];
        if entry.timer.read() == 0 {
            return None;
        }
        let due = Due {
            id: entry.id,
            client: entry.client,
            callback: entry.callback.take()?,
        };
        if !entry.repeat {
            self.remove(poller, due.id);
        }
        Some(due)
    }

    /// Puts a repeating callback back unless the timeout was removed while
    /// it ran.
    pub(crate) fn restore(&mut self, id: TimeoutId, callback: TimeoutCallback) {
        if let Some(entry) = self.entries.iter_mut().find(|t| t.id == id) {
            entry.callback.get_or_insert(callback);
        }
    }
}

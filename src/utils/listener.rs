// SPDX-License-Identifier: GPL-3.0-only

//! Signal/listener plumbing for the surface and view model.
//!
//! Every subscription is an explicit [`Listener`] object; dropping it (or
//! calling [`Listener::detach`]) removes the back-edge from the signal, so a
//! record that owns listeners cannot be freed while still registered.
//! Callbacks receive the compositor state as `&mut D`, mirroring how the
//! event loop hands dispatch data to every source.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Callback<D, E> = Box<dyn FnMut(&mut D, &E)>;

struct Entry<D, E> {
    alive: Rc<Cell<bool>>,
    callback: Rc<RefCell<Callback<D, E>>>,
}

impl<D, E> Clone for Entry<D, E> {
    fn clone(&self) -> Self {
        Self {
            alive: self.alive.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// A broadcast signal. Cloning yields another handle onto the same
/// subscriber list, so a signal can be emitted without borrowing the
/// structure that owns it.
pub struct Signal<D, E> {
    entries: Rc<RefCell<Vec<Entry<D, E>>>>,
}

impl<D, E> Clone for Signal<D, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<D, E> Default for Signal<D, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, E> Signal<D, E> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register `callback`; it stays registered until the returned
    /// [`Listener`] is dropped or detached.
    #[must_use = "dropping the listener unsubscribes it"]
    pub fn subscribe(&self, callback: impl FnMut(&mut D, &E) + 'static) -> Listener {
        let alive = Rc::new(Cell::new(true));
        self.entries.borrow_mut().push(Entry {
            alive: alive.clone(),
            callback: Rc::new(RefCell::new(Box::new(callback))),
        });
        Listener { alive }
    }

    /// Invoke every live subscriber. The list is snapshotted first, so a
    /// callback may subscribe or unsubscribe (itself included) mid-emit.
    pub fn emit(&self, data: &mut D, event: &E) {
        let snapshot: Vec<Entry<D, E>> = self.entries.borrow().clone();
        for entry in snapshot {
            if !entry.alive.get() {
                continue;
            }
            // skip re-entrant emission into a callback already running
            if let Ok(mut callback) = entry.callback.try_borrow_mut() {
                callback(data, event);
            }
        }
        self.entries.borrow_mut().retain(|e| e.alive.get());
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.entries.borrow().iter().filter(|e| e.alive.get()).count()
    }
}

/// Handle for one subscription. Detaches on drop.
pub struct Listener {
    alive: Rc<Cell<bool>>,
}

impl Listener {
    pub fn detach(self) {
        // drop does the work
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("alive", &self.alive.get())
            .finish()
    }
}

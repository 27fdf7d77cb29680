// SPDX-License-Identifier: GPL-3.0-only

//! The seat contract the desktop core sees.
//!
//! Input devices, grabs and keymaps live in the input subsystem proper; the
//! core only needs cursor positions, last-activity timestamps and a way to
//! hand focus to a view.

use indexmap::IndexMap;

use crate::desktop::ViewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeatId(pub u32);

#[derive(Debug)]
pub struct Seat {
    pub id: SeatId,
    pub name: String,
    pub cursor_x: f64,
    pub cursor_y: f64,
    /// Timestamp of the last input event, (seconds, nanoseconds).
    pub last_event: (i64, i64),
    pub focus: Option<ViewId>,
}

/// Decides which seats focus a newly mapped view.
pub type FocusPolicy = Box<dyn FnMut(&mut IndexMap<SeatId, Seat>, ViewId)>;

pub struct Input {
    seats: IndexMap<SeatId, Seat>,
    next_seat_id: u32,
    focus_policy: FocusPolicy,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            seats: IndexMap::new(),
            next_seat_id: 1,
            // TODO pick the seat that saw the last input event instead of
            // focusing every seat
            focus_policy: Box::new(|seats, view| {
                for seat in seats.values_mut() {
                    seat.focus = Some(view);
                }
            }),
        }
    }

    /// Replace the default focus-everything policy.
    pub fn set_focus_policy(&mut self, policy: FocusPolicy) {
        self.focus_policy = policy;
    }

    pub fn add_seat(&mut self, name: &str) -> SeatId {
        let id = SeatId(self.next_seat_id);
        self.next_seat_id += 1;
        self.seats.insert(
            id,
            Seat {
                id,
                name: name.to_owned(),
                cursor_x: 0.0,
                cursor_y: 0.0,
                last_event: (0, 0),
                focus: None,
            },
        );
        id
    }

    pub fn remove_seat(&mut self, id: SeatId) {
        self.seats.shift_remove(&id);
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.values()
    }

    pub fn first_seat(&self) -> Option<SeatId> {
        self.seats.keys().next().copied()
    }

    /// The seat that saw input most recently, seconds then nanoseconds.
    pub fn most_recent_seat(&self) -> Option<&Seat> {
        self.seats.values().max_by_key(|seat| seat.last_event)
    }

    pub fn set_cursor(&mut self, id: SeatId, x: f64, y: f64) {
        if let Some(seat) = self.seats.get_mut(&id) {
            seat.cursor_x = x;
            seat.cursor_y = y;
        }
    }

    pub fn note_activity(&mut self, id: SeatId, sec: i64, nsec: i64) {
        if let Some(seat) = self.seats.get_mut(&id) {
            seat.last_event = (sec, nsec);
        }
    }

    /// Apply the focus policy for a newly mapped view.
    pub fn focus_view(&mut self, view: ViewId) {
        (self.focus_policy)(&mut self.seats, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_seat_orders_by_sec_then_nsec() {
        let mut input = Input::new();
        let a = input.add_seat("seat-a");
        let b = input.add_seat("seat-b");
        input.note_activity(a, 10, 999);
        input.note_activity(b, 11, 0);
        assert_eq!(input.most_recent_seat().unwrap().id, b);

        input.note_activity(a, 11, 1);
        assert_eq!(input.most_recent_seat().unwrap().id, a);
    }

    #[test]
    fn default_policy_focuses_every_seat() {
        let mut input = Input::new();
        let a = input.add_seat("seat-a");
        let b = input.add_seat("seat-b");
        input.focus_view(ViewId(7));
        assert_eq!(input.seat(a).unwrap().focus, Some(ViewId(7)));
        assert_eq!(input.seat(b).unwrap().focus, Some(ViewId(7)));
    }
}

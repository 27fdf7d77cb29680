// SPDX-License-Identifier: GPL-3.0-only

//! Server-side decoration bookkeeping.
//!
//! The default mode is client-side; the core only draws borders and a
//! titlebar around views whose surface explicitly asked for server-side
//! decorations through the decoration extension.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::wayland::surface::{Surface, SurfaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationMode {
    ClientSide,
    ServerSide,
}

#[derive(Debug)]
pub struct DecorationManager {
    default_mode: Cell<DecorationMode>,
    modes: RefCell<HashMap<SurfaceId, DecorationMode>>,
}

impl Default for DecorationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DecorationManager {
    pub fn new() -> Self {
        Self {
            default_mode: Cell::new(DecorationMode::ClientSide),
            modes: RefCell::new(HashMap::new()),
        }
    }

    pub fn default_mode(&self) -> DecorationMode {
        self.default_mode.get()
    }

    pub fn set_default_mode(&self, mode: DecorationMode) {
        self.default_mode.set(mode);
    }

    /// Record the mode a client requested for one of its surfaces.
    pub fn set_surface_mode(&self, surface: &Surface, mode: DecorationMode) {
        self.modes.borrow_mut().insert(surface.id(), mode);
    }

    pub fn surface_released(&self, surface: &Surface) {
        self.modes.borrow_mut().remove(&surface.id());
    }

    pub fn mode_for(&self, surface: &Surface) -> DecorationMode {
        self.modes
            .borrow()
            .get(&surface.id())
            .copied()
            .unwrap_or_else(|| self.default_mode.get())
    }
}

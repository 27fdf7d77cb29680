// SPDX-License-Identifier: GPL-3.0-only

use calloop::{LoopHandle, LoopSignal};

use crate::config::Config;
use crate::desktop::Desktop;
use crate::input::Input;
use crate::wayland::surface::{Surface, WlSubsurface};

/// The main compositor state, dispatched to every event-loop callback.
pub struct State {
    pub loop_handle: LoopHandle<'static, State>,
    pub loop_signal: LoopSignal,
    pub should_stop: bool,
    pub config: Config,
    pub desktop: Desktop,
    pub input: Input,
}

impl State {
    pub fn new(
        config: Config,
        loop_handle: LoopHandle<'static, State>,
        loop_signal: LoopSignal,
    ) -> Self {
        Self {
            loop_handle,
            loop_signal,
            should_stop: false,
            config,
            desktop: Desktop::new(),
            input: Input::new(),
        }
    }

    /// Apply a surface's pending state and notify its commit listeners.
    /// Damage is cleared once the fan-out ran.
    pub fn commit_surface(&mut self, surface: &Surface) {
        surface.apply_pending();
        let commit = surface.commit_signal();
        commit.emit(self, &());
        surface.clear_damage();
    }

    /// Link a new subsurface under `parent` and announce it; views watching
    /// the parent pick it up as a child.
    pub fn add_subsurface(
        &mut self,
        parent: &Surface,
        surface: Surface,
        x: f64,
        y: f64,
    ) -> WlSubsurface {
        let sub = WlSubsurface::new(parent, surface, x, y);
        parent.link_subsurface(sub.clone());
        let announce = parent.new_subsurface_signal();
        announce.emit(self, &sub);
        sub
    }

    /// The protocol object for a subsurface went away.
    pub fn destroy_subsurface(&mut self, sub: &WlSubsurface) {
        if let Some(parent) = sub.parent() {
            parent.unlink_subsurface(sub);
        }
        let destroy = sub.destroy_signal();
        destroy.emit(self, &());
    }

    /// A surface was destroyed by its client. Shell layers react by
    /// removing the views they created for it.
    pub fn destroy_surface(&mut self, surface: &Surface) {
        let destroy = surface.destroy_signal();
        destroy.emit(self, &());
    }
}

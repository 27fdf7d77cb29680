// SPDX-License-Identifier: GPL-3.0-only

//! Per-output state: fullscreen linkage and the damage accumulator the
//! renderer drains, plus the desktop-side fan-out helpers.

use std::cell::{Cell, RefCell};

use tracing::trace;

use super::{Desktop, OutputId, ViewId};
use crate::utils::geometry::{Rect, rotated_extents};

/// Damage accumulated for one output since the renderer last drained it.
/// Advisory: the renderer clips and coalesces as it sees fit.
#[derive(Debug, Default)]
pub struct DamageTracker {
    whole: Cell<bool>,
    rects: RefCell<Vec<Rect>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageSnapshot {
    pub whole: bool,
    pub rects: Vec<Rect>,
}

impl DamageTracker {
    pub fn add(&self, rect: Rect) {
        self.rects.borrow_mut().push(rect);
    }

    pub fn add_whole(&self) {
        self.whole.set(true);
    }

    pub fn is_damaged(&self) -> bool {
        self.whole.get() || !self.rects.borrow().is_empty()
    }

    /// Drain accumulated damage, leaving the tracker clean.
    pub fn take(&self) -> DamageSnapshot {
        DamageSnapshot {
            whole: self.whole.replace(false),
            rects: std::mem::take(&mut *self.rects.borrow_mut()),
        }
    }
}

/// The desktop's record for one output.
#[derive(Debug)]
pub struct OutputBinding {
    pub id: OutputId,
    pub name: String,
    pub fullscreen_view: Option<ViewId>,
    pub damage: DamageTracker,
}

impl OutputBinding {
    pub fn new(id: OutputId, name: String) -> Self {
        Self {
            id,
            name,
            fullscreen_view: None,
            damage: DamageTracker::default(),
        }
    }
}

impl Desktop {
    /// Recompute a view's per-output intersections and queue enter/leave
    /// events for the transitions. `before` of `None` means the view had no
    /// prior geometry, so only enters can fire.
    pub fn update_view_outputs(&self, id: ViewId, before: Option<&Rect>) {
        let Some(view) = self.view(id) else {
            return;
        };
        let after = view.rect();
        for (output, _) in self.output_bindings() {
            let intersected =
                before.is_some_and(|rect| self.layout.intersects(Some(output), rect));
            let intersects = self.layout.intersects(Some(output), &after);
            if intersected && !intersects {
                trace!(view = id.0, output = output.0, "surface leaves output");
                view.surface().send_leave(output);
            }
            if !intersected && intersects {
                trace!(view = id.0, output = output.0, "surface enters output");
                view.surface().send_enter(output);
            }
        }
    }

    /// Mark a view's full footprint dirty on every output it overlaps.
    pub fn damage_whole_view(&self, id: ViewId) {
        let Some(view) = self.view(id) else {
            return;
        };
        let footprint = rotated_extents(&view.deco_rect(), view.rotation);
        for (output, binding) in self.output_bindings() {
            if self.layout.intersects(Some(output), &footprint) {
                binding.damage.add(footprint);
            }
        }
    }

    /// Union only the surface-reported damage into intersecting outputs.
    /// Rotated views fall back to whole-view damage.
    pub fn apply_view_damage(&self, id: ViewId) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.rotation != 0.0 {
            self.damage_whole_view(id);
            return;
        }
        let damage = view.surface().damage();
        if damage.is_empty() {
            return;
        }
        for rect in damage {
            let layout_rect = Rect::new(
                rect.x + view.x as i32,
                rect.y + view.y as i32,
                rect.width,
                rect.height,
            );
            for (output, binding) in self.output_bindings() {
                if self.layout.intersects(Some(output), &layout_rect) {
                    binding.damage.add(layout_rect);
                }
            }
        }
    }

    pub fn damage_whole_output(&self, output: OutputId) {
        if let Some(binding) = self.output(output) {
            binding.damage.add_whole();
        }
    }
}

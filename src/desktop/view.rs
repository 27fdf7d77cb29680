// SPDX-License-Identifier: GPL-3.0-only

//! Per-window state and the operations that mutate it.
//!
//! A view is a mapped toplevel: one primary surface plus the subsurface and
//! popup trees hanging off it. Geometry operations funnel through
//! `update_view_position`/`update_view_size` so damage is always bracketed
//! around the mutation, and every geometry change ends with an output
//! intersection sweep so enter/leave events stay paired.

use bitflags::bitflags;
use tracing::debug;

use super::surface_tree::ViewChild;
use super::{Desktop, OutputId, ViewId};
use crate::shell::Shell;
use crate::state::State;
use crate::utils::geometry::{Rect, rotate_into_surface};
use crate::utils::listener::{Listener, Signal};
use crate::wayland::decoration::DecorationMode;
use crate::wayland::surface::Surface;

/// Geometry stashed when entering maximize or fullscreen, replayed exactly
/// on the way back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SavedGeometry {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub width: u32,
    pub height: u32,
}

/// A move-resize whose position half waits for the client to commit the
/// requested size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMoveResize {
    pub update_x: bool,
    pub update_y: bool,
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
}

bitflags! {
    /// Decoration regions under a surface-local point. Near corners an edge
    /// pair may be set at once; callers must cope.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DecoPart: u8 {
        const TITLEBAR = 1 << 0;
        const LEFT_BORDER = 1 << 1;
        const RIGHT_BORDER = 1 << 2;
        const TOP_BORDER = 1 << 3;
        const BOTTOM_BORDER = 1 << 4;
    }
}

pub struct View {
    pub id: ViewId,
    surface: Surface,
    pub shell: Shell,
    /// Layout-space position of the surface's top-left corner.
    pub x: f64,
    pub y: f64,
    /// Last committed surface size.
    pub width: u32,
    pub height: u32,
    /// Rotation about the surface center, radians. Zero while maximized or
    /// fullscreen.
    pub rotation: f64,
    pub maximized: bool,
    pub decorated: bool,
    pub border_width: i32,
    pub titlebar_height: i32,
    /// Set iff this view is the named output's fullscreen view.
    pub fullscreen_output: Option<OutputId>,
    pub(crate) saved: SavedGeometry,
    pub(crate) pending_move_resize: Option<PendingMoveResize>,
    pub(crate) children: Vec<ViewChild>,
    destroy: Signal<State, ViewId>,
    pub(crate) commit_listener: Option<Listener>,
    pub(crate) new_subsurface_listener: Option<Listener>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id.0)
            .field("shell", &self.shell)
            .field("position", &(self.x, self.y))
            .field("size", &(self.width, self.height))
            .field("rotation", &self.rotation)
            .finish()
    }
}

impl View {
    pub(crate) fn new(id: ViewId, surface: Surface, shell: Shell) -> Self {
        let (width, height) = surface.size();
        Self {
            id,
            surface,
            shell,
            x: 0.0,
            y: 0.0,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
            rotation: 0.0,
            maximized: false,
            decorated: false,
            border_width: 0,
            titlebar_height: 0,
            fullscreen_output: None,
            saved: SavedGeometry::default(),
            pending_move_resize: None,
            children: Vec::new(),
            destroy: Signal::new(),
            commit_listener: None,
            new_subsurface_listener: None,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Interior box in layout coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, self.width as i32, self.height as i32)
    }

    /// Interior box expanded by the decorations when decorated.
    pub fn deco_rect(&self) -> Rect {
        let mut rect = self.rect();
        if !self.decorated {
            return rect;
        }
        rect.x -= self.border_width;
        rect.y -= self.border_width + self.titlebar_height;
        rect.width += self.border_width * 2;
        rect.height += self.border_width * 2 + self.titlebar_height;
        rect
    }

    pub fn saved(&self) -> SavedGeometry {
        self.saved
    }

    pub fn destroy_signal(&self) -> Signal<State, ViewId> {
        self.destroy.clone()
    }

    /// Classify a surface-local point against the decoration regions.
    /// The titlebar sits above the surface (negative sy), borders wrap the
    /// surface plus titlebar.
    pub fn deco_part_at(&self, sx: f64, sy: f64) -> DecoPart {
        if !self.decorated {
            return DecoPart::empty();
        }

        let (sw, sh) = self.surface.size();
        let sw = sw as f64;
        let sh = sh as f64;
        let bw = self.border_width as f64;
        let titlebar = self.titlebar_height as f64;

        if sx > 0.0 && sx < sw && sy < 0.0 && sy > -titlebar {
            return DecoPart::TITLEBAR;
        }

        let mut parts = DecoPart::empty();
        if sy >= -(titlebar + bw) && sy <= sh + bw {
            if sx < 0.0 && sx > -bw {
                parts |= DecoPart::LEFT_BORDER;
            } else if sx > sw && sx < sw + bw {
                parts |= DecoPart::RIGHT_BORDER;
            }
        }

        if sx >= -bw && sx <= sw + bw {
            if sy > sh && sy <= sh + bw {
                parts |= DecoPart::BOTTOM_BORDER;
            } else if sy >= -(titlebar + bw) && sy < 0.0 {
                parts |= DecoPart::TOP_BORDER;
            }
        }

        // TODO classify corners once the renderer draws resize handles

        parts
    }

    /// Map a layout-space point into this view's surface coordinates,
    /// undoing the render rotation.
    pub(crate) fn surface_coords(&self, lx: f64, ly: f64) -> (f64, f64) {
        let sx = lx - self.x;
        let sy = ly - self.y;
        if self.rotation == 0.0 {
            return (sx, sy);
        }
        let (sw, sh) = self.surface.size();
        rotate_into_surface(sx, sy, sw, sh, self.rotation)
    }
}

impl Desktop {
    /// Move the surface's top-left corner, damaging the old and new
    /// footprints. No-op when the position is unchanged.
    pub fn update_view_position(&mut self, id: ViewId, x: f64, y: f64) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.x == x && view.y == y {
            return;
        }
        self.damage_whole_view(id);
        if let Some(view) = self.view_mut(id) {
            view.x = x;
            view.y = y;
        }
        self.damage_whole_view(id);
    }

    /// Adopt a newly committed surface size, damage-bracketed like a move.
    pub fn update_view_size(&mut self, id: ViewId, width: u32, height: u32) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.width == width && view.height == height {
            return;
        }
        self.damage_whole_view(id);
        if let Some(view) = self.view_mut(id) {
            view.width = width;
            view.height = height;
        }
        self.damage_whole_view(id);
    }

    pub fn move_view(&mut self, id: ViewId, x: f64, y: f64) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.x == x && view.y == y {
            return;
        }
        let before = view.rect();
        // the shell may forward the move to its window (X11); the core
        // position updates either way
        view.shell.request_move(x, y, (view.width, view.height));
        self.update_view_position(id, x, y);
        self.update_view_outputs(id, Some(&before));
    }

    pub fn resize_view(&mut self, id: ViewId, width: u32, height: u32) {
        let Some(view) = self.view(id) else {
            return;
        };
        let before = view.rect();
        view.shell.request_resize((view.x, view.y), width, height);
        self.update_view_outputs(id, Some(&before));
    }

    /// Move and resize together. Without shell support the position is
    /// parked in `pending_move_resize` and applied when the client commits
    /// the requested size, which keeps resize-from-edge atomic.
    pub fn move_resize_view(&mut self, id: ViewId, x: f64, y: f64, width: u32, height: u32) {
        let Some(view) = self.view(id) else {
            return;
        };
        let update_x = x != view.x;
        let update_y = y != view.y;
        if !update_x && !update_y {
            self.resize_view(id, width, height);
            return;
        }

        if view.shell.request_move_resize(x, y, width, height) {
            let before = view.rect();
            self.update_view_position(id, x, y);
            self.update_view_outputs(id, Some(&before));
            return;
        }

        if let Some(view) = self.view_mut(id) {
            view.pending_move_resize = Some(PendingMoveResize {
                update_x,
                update_y,
                x,
                y,
                width,
                height,
            });
        }
        self.resize_view(id, width, height);
    }

    pub fn activate_view(&self, id: ViewId, activated: bool) {
        if let Some(view) = self.view(id) {
            view.shell.request_activate(activated);
        }
    }

    pub fn close_view(&self, id: ViewId) {
        if let Some(view) = self.view(id) {
            view.shell.request_close();
        }
    }

    pub fn rotate_view(&mut self, id: ViewId, rotation: f64) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.rotation == rotation {
            return;
        }
        self.damage_whole_view(id);
        if let Some(view) = self.view_mut(id) {
            view.rotation = rotation;
        }
        self.damage_whole_view(id);
    }

    /// The output under the view's center, via the layout's closest point.
    pub fn view_output(&self, id: ViewId) -> Option<OutputId> {
        let view = self.view(id)?;
        let rect = view.rect();
        let (px, py) = self.layout.closest_point(
            None,
            view.x + rect.width as f64 / 2.0,
            view.y + rect.height as f64 / 2.0,
        );
        self.layout.output_at(px, py)
    }

    pub fn maximize_view(&mut self, id: ViewId, maximized: bool) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.maximized == maximized {
            return;
        }

        view.shell.request_maximize(maximized);

        if !view.maximized && maximized {
            let rect = view.rect();
            let saved = SavedGeometry {
                x: view.x,
                y: view.y,
                rotation: view.rotation,
                width: rect.width as u32,
                height: rect.height as u32,
            };
            if let Some(view) = self.view_mut(id) {
                view.maximized = true;
                view.saved = saved;
            }

            if let Some(rect) = self.view_output(id).and_then(|o| self.layout.get_box(o)) {
                self.move_resize_view(
                    id,
                    rect.x as f64,
                    rect.y as f64,
                    rect.width as u32,
                    rect.height as u32,
                );
                self.rotate_view(id, 0.0);
            }
            return;
        }

        // restore
        let saved = view.saved;
        if let Some(view) = self.view_mut(id) {
            view.maximized = false;
        }
        self.move_resize_view(id, saved.x, saved.y, saved.width, saved.height);
        self.rotate_view(id, saved.rotation);
    }

    /// Enter or leave fullscreen. Moving a fullscreen view between outputs
    /// is not supported; the call is a no-op when the state already matches.
    pub fn set_view_fullscreen(&mut self, id: ViewId, fullscreen: bool, output: Option<OutputId>) {
        let Some(view) = self.view(id) else {
            return;
        };
        let was_fullscreen = view.fullscreen_output.is_some();
        if was_fullscreen == fullscreen {
            return;
        }

        view.shell.request_fullscreen(fullscreen);

        if !was_fullscreen && fullscreen {
            let Some(output) = output.or_else(|| self.view_output(id)) else {
                return;
            };
            if self.output(output).is_none() {
                return;
            }

            let view = self.view(id).expect("view checked above");
            let rect = view.rect();
            let saved = SavedGeometry {
                x: view.x,
                y: view.y,
                rotation: view.rotation,
                width: rect.width as u32,
                height: rect.height as u32,
            };
            if let Some(view) = self.view_mut(id) {
                view.saved = saved;
            }

            if let Some(rect) = self.layout.get_box(output) {
                self.move_resize_view(
                    id,
                    rect.x as f64,
                    rect.y as f64,
                    rect.width as u32,
                    rect.height as u32,
                );
                self.rotate_view(id, 0.0);
            }

            if let Some(binding) = self.output_mut(output) {
                binding.fullscreen_view = Some(id);
            }
            if let Some(view) = self.view_mut(id) {
                view.fullscreen_output = Some(output);
            }
            self.damage_whole_output(output);
            return;
        }

        // leave fullscreen
        let saved = view.saved;
        let previous = view.fullscreen_output.expect("was_fullscreen");
        self.move_resize_view(id, saved.x, saved.y, saved.width, saved.height);
        self.rotate_view(id, saved.rotation);

        self.damage_whole_output(previous);
        if let Some(binding) = self.output_mut(previous) {
            binding.fullscreen_view = None;
        }
        if let Some(view) = self.view_mut(id) {
            view.fullscreen_output = None;
        }
    }

    /// Center the view on the output under the cursor of the most recently
    /// active seat. False when there is no seat or the layout is empty.
    pub fn center_view(&mut self, id: ViewId, input: &crate::input::Input) -> bool {
        let Some(view) = self.view(id) else {
            return false;
        };
        let rect = view.rect();

        let Some(seat) = input.most_recent_seat() else {
            return false;
        };
        let Some(output) = self.layout.output_at(seat.cursor_x, seat.cursor_y) else {
            // empty layout, or the cursor is off every output
            return false;
        };
        let Some(entry) = self.layout.get(output).copied() else {
            return false;
        };

        let x = (entry.width - rect.width) as f64 / 2.0 + entry.x as f64;
        let y = (entry.height - rect.height) as f64 / 2.0 + entry.y as f64;
        self.move_view(id, x, y);
        true
    }

    /// Toggle server-side decorations on a view (driven by the decoration
    /// extension).
    pub fn set_view_decorated(&mut self, id: ViewId, decorated: bool) {
        let Some(view) = self.view(id) else {
            return;
        };
        if view.decorated == decorated {
            return;
        }
        self.damage_whole_view(id);
        if let Some(view) = self.view_mut(id) {
            view.decorated = decorated;
        }
        self.damage_whole_view(id);
    }

    /// React to a commit on a view's primary surface: fan out damage, adopt
    /// the committed size, and land a pending move-resize whose size the
    /// client just acknowledged.
    pub(crate) fn handle_view_commit(&mut self, id: ViewId) {
        let Some(view) = self.view(id) else {
            return;
        };
        let before = view.rect();
        let surface = view.surface().clone();
        self.apply_view_damage(id);

        let (width, height) = surface.size();
        let (width, height) = (width.max(0) as u32, height.max(0) as u32);
        self.update_view_size(id, width, height);

        let pending = self.view(id).and_then(|view| view.pending_move_resize);
        if let Some(pending) = pending {
            if pending.width == width && pending.height == height {
                if let Some(view) = self.view(id) {
                    let x = if pending.update_x { pending.x } else { view.x };
                    let y = if pending.update_y { pending.y } else { view.y };
                    self.update_view_position(id, x, y);
                }
                if let Some(view) = self.view_mut(id) {
                    view.pending_move_resize = None;
                }
            }
        }

        self.update_view_outputs(id, Some(&before));
    }
}

impl State {
    /// Bind a freshly mapped shell surface to the desktop. The new view is
    /// frontmost in Z-order.
    pub fn add_view(&mut self, shell: Shell, surface: Surface) -> ViewId {
        let id = self.desktop.alloc_view_id();
        debug!(view = id.0, ?shell, "Adding view");

        let mut view = View::new(id, surface.clone(), shell);
        view.decorated = self
            .desktop
            .globals
            .decoration_manager
            .mode_for(&surface)
            == DecorationMode::ServerSide;
        view.border_width = self.config.border_width;
        view.titlebar_height = self.config.titlebar_height;

        view.commit_listener = Some(
            surface
                .commit_signal()
                .subscribe(move |state: &mut State, _| {
                    state.desktop.handle_view_commit(id);
                }),
        );
        view.new_subsurface_listener = Some(surface.new_subsurface_signal().subscribe(
            move |state: &mut State, sub| {
                state.desktop.add_subsurface_child(id, sub.clone());
            },
        ));

        self.desktop.insert_view_front(view);

        // adopt subsurfaces that existed before the view was mapped
        for sub in surface.subsurfaces() {
            self.desktop.add_subsurface_child(id, sub);
        }

        self.desktop.damage_whole_view(id);
        id
    }

    /// Post-mapping setup: focus, center, initial output evaluation.
    pub fn setup_view(&mut self, id: ViewId) {
        self.input.focus_view(id);
        self.desktop.center_view(id, &self.input);
        self.desktop.update_view_outputs(id, None);
    }

    /// Unmap and destroy a view. Emits the view's destroy signal, releases
    /// every listener the view or its children registered, and clears the
    /// fullscreen linkage.
    pub fn remove_view(&mut self, id: ViewId) {
        let Some(destroy) = self.desktop.view(id).map(|view| view.destroy_signal()) else {
            return;
        };
        debug!(view = id.0, "Removing view");
        self.desktop.damage_whole_view(id);
        destroy.emit(self, &id);

        let Some(mut view) = self.desktop.take_view(id) else {
            return;
        };
        view.new_subsurface_listener = None;
        view.commit_listener = None;
        // children drop their commit/new-subsurface/destroy listeners
        view.children.clear();

        if let Some(output) = view.fullscreen_output {
            if let Some(binding) = self.desktop.output_mut(output) {
                binding.fullscreen_view = None;
            }
        }
    }
}

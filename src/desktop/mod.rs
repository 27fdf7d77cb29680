// SPDX-License-Identifier: GPL-3.0-only

pub mod layout;
pub mod output;
pub mod surface_tree;
pub mod view;

use indexmap::IndexMap;
use tracing::debug;

use self::layout::{LayoutEntry, OutputLayout};
use self::output::OutputBinding;
use self::view::{DecoPart, View};
use crate::utils::geometry::Rect;
use crate::wayland::Globals;
use crate::wayland::surface::Surface;
use crate::xwayland::XBridge;

pub use self::surface_tree::ChildId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub u32);

/// Result of a pointer lookup: the view, the concrete surface under the
/// point (`None` when a decoration was hit), and surface-local coordinates.
#[derive(Debug, Clone)]
pub struct ViewHit {
    pub view: ViewId,
    pub surface: Option<Surface>,
    pub sx: f64,
    pub sy: f64,
    pub deco: DecoPart,
}

/// The aggregate of views and outputs. Views are held in an
/// insertion-ordered arena; iteration order is Z-order with index 0 on top.
pub struct Desktop {
    views: IndexMap<ViewId, View>,
    outputs: IndexMap<OutputId, OutputBinding>,
    pub layout: OutputLayout,
    pub globals: Globals,
    pub xwayland: Option<XBridge>,
    next_view_id: u64,
    next_output_id: u32,
    next_child_id: u64,
}

impl Default for Desktop {
    fn default() -> Self {
        Self::new()
    }
}

impl Desktop {
    pub fn new() -> Self {
        debug!("Initializing desktop");
        Self {
            views: IndexMap::new(),
            outputs: IndexMap::new(),
            layout: OutputLayout::new(),
            globals: Globals::new(),
            xwayland: None,
            next_view_id: 1,
            next_output_id: 1,
            next_child_id: 1,
        }
    }

    pub(crate) fn alloc_view_id(&mut self) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        id
    }

    pub(crate) fn alloc_child_id(&mut self) -> ChildId {
        let id = ChildId(self.next_child_id);
        self.next_child_id += 1;
        id
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(&id)
    }

    /// Views front to back.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub(crate) fn insert_view_front(&mut self, view: View) {
        self.views.shift_insert(0, view.id, view);
    }

    pub(crate) fn take_view(&mut self, id: ViewId) -> Option<View> {
        self.views.shift_remove(&id)
    }

    /// Raise a view to the front of the Z-order.
    pub fn raise_view(&mut self, id: ViewId) {
        if let Some(view) = self.views.shift_remove(&id) {
            self.views.shift_insert(0, id, view);
        }
    }

    pub fn output(&self, id: OutputId) -> Option<&OutputBinding> {
        self.outputs.get(&id)
    }

    pub(crate) fn output_mut(&mut self, id: OutputId) -> Option<&mut OutputBinding> {
        self.outputs.get_mut(&id)
    }

    pub fn output_bindings(&self) -> impl Iterator<Item = (OutputId, &OutputBinding)> {
        self.outputs.iter().map(|(id, binding)| (*id, binding))
    }

    /// Linear lookup by the backend's output name.
    pub fn output_from_name(&self, name: &str) -> Option<OutputId> {
        self.outputs
            .iter()
            .find(|(_, binding)| binding.name == name)
            .map(|(id, _)| *id)
    }

    /// The backend announced a new output; bind it, place it in the layout,
    /// and let the layout reaction relocate stranded views.
    pub fn add_output(&mut self, name: &str, entry: LayoutEntry) -> OutputId {
        let id = OutputId(self.next_output_id);
        self.next_output_id += 1;
        debug!(output = id.0, name, "Adding output");
        self.outputs.insert(id, OutputBinding::new(id, name.to_owned()));
        self.layout.add(id, entry);
        self.damage_whole_output(id);
        self.handle_layout_change();
        id
    }

    pub fn move_output(&mut self, id: OutputId, x: i32, y: i32) {
        self.layout.move_output(id, x, y);
        self.damage_whole_output(id);
        self.handle_layout_change();
    }

    pub fn remove_output(&mut self, id: OutputId) {
        let Some(binding) = self.outputs.shift_remove(&id) else {
            return;
        };
        debug!(output = id.0, name = %binding.name, "Removing output");
        // the fullscreen back-pointer must not dangle
        if let Some(view) = binding.fullscreen_view {
            if let Some(view) = self.views.get_mut(&view) {
                view.fullscreen_output = None;
            }
        }
        self.layout.remove(id);
        self.handle_layout_change();
    }

    /// Relocate any view that no longer touches an output to the center of
    /// the layout's center output. Partially visible views stay put.
    pub(crate) fn handle_layout_change(&mut self) {
        let Some(center) = self.layout.center_output() else {
            return;
        };
        let Some(center_rect) = self.layout.get_box(center) else {
            return;
        };
        let center_x = (center_rect.x + center_rect.width / 2) as f64;
        let center_y = (center_rect.y + center_rect.height / 2) as f64;

        let ids: Vec<ViewId> = self.views.keys().copied().collect();
        for id in ids {
            let Some(view) = self.view(id) else {
                continue;
            };
            let rect = view.rect();
            if self.layout.intersects(None, &rect) {
                continue;
            }
            self.move_view(
                id,
                center_x - (rect.width / 2) as f64,
                center_y - (rect.height / 2) as f64,
            );
        }
    }

    /// Hit-test the desktop at a layout-space point. A fullscreen view
    /// shadows everything else on its output.
    pub fn view_at(&self, lx: f64, ly: f64) -> Option<ViewHit> {
        if let Some(output) = self.layout.output_at(lx, ly) {
            if let Some(binding) = self.output(output) {
                if let Some(fullscreen) = binding.fullscreen_view {
                    return self.view_hit(fullscreen, lx, ly);
                }
            }
        }

        self.views
            .keys()
            .find_map(|id| self.view_hit(*id, lx, ly))
    }

    /// Hit-test one view: popups, then subsurfaces, then decorations, then
    /// the primary surface's input region. Returned coordinates are local
    /// to the hit surface.
    fn view_hit(&self, id: ViewId, lx: f64, ly: f64) -> Option<ViewHit> {
        let view = self.view(id)?;
        // wl_shell popups are reached through their parent's lookup
        if view.shell.is_popup() {
            return None;
        }

        let (sx, sy) = view.surface_coords(lx, ly);

        if let Some((surface, px, py)) = view.shell.popup_at(sx, sy) {
            return Some(ViewHit {
                view: id,
                surface: Some(surface),
                sx: sx - px,
                sy: sy - py,
                deco: DecoPart::empty(),
            });
        }

        if let Some((surface, ox, oy)) = view.surface().subsurface_at(sx, sy) {
            return Some(ViewHit {
                view: id,
                surface: Some(surface),
                sx: sx - ox,
                sy: sy - oy,
                deco: DecoPart::empty(),
            });
        }

        let deco = view.deco_part_at(sx, sy);
        if !deco.is_empty() {
            return Some(ViewHit {
                view: id,
                surface: None,
                sx,
                sy,
                deco,
            });
        }

        let (width, height) = view.surface().size();
        if Rect::new(0, 0, width, height).contains_point(sx, sy)
            && view.surface().accepts_input(sx, sy)
        {
            return Some(ViewHit {
                view: id,
                surface: Some(view.surface().clone()),
                sx,
                sy,
                deco: DecoPart::empty(),
            });
        }

        None
    }
}

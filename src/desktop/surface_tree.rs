// SPDX-License-Identifier: GPL-3.0-only

//! View children: subsurfaces and shell popups bound to a view.
//!
//! A child owns its listener registrations; dropping the record detaches
//! them, so destroying a view (or one child) cannot leave a callback wired
//! to a surface the desktop no longer tracks.

use tracing::trace;

use super::{Desktop, ViewId};
use crate::state::State;
use crate::utils::listener::Listener;
use crate::wayland::surface::{Surface, WlSubsurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildId(pub u64);

enum ChildKind {
    /// Unlinks itself when the protocol object's destroy signal fires.
    Subsurface {
        handle: WlSubsurface,
        _destroy: Listener,
    },
    /// Popups are unlinked by the shell layer that created them.
    Popup,
}

pub struct ViewChild {
    pub id: ChildId,
    surface: Surface,
    kind: ChildKind,
    _commit: Listener,
    _new_subsurface: Listener,
}

impl ViewChild {
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn subsurface(&self) -> Option<&WlSubsurface> {
        match &self.kind {
            ChildKind::Subsurface { handle, .. } => Some(handle),
            ChildKind::Popup => None,
        }
    }
}

impl std::fmt::Debug for ViewChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewChild")
            .field("id", &self.id.0)
            .field("surface", &self.surface)
            .finish()
    }
}

impl Desktop {
    fn child_listeners(
        &mut self,
        view: ViewId,
        surface: &Surface,
    ) -> (ChildId, Listener, Listener) {
        let id = self.alloc_child_id();
        let commit = surface
            .commit_signal()
            .subscribe(move |state: &mut State, _| {
                state.desktop.apply_view_damage(view);
            });
        let new_subsurface = surface.new_subsurface_signal().subscribe(
            move |state: &mut State, nested: &WlSubsurface| {
                // nested trees: a subsurface of a subsurface still belongs
                // to the same view
                state.desktop.add_subsurface_child(view, nested.clone());
            },
        );
        (id, commit, new_subsurface)
    }

    /// Bind a subsurface to a view. Registered automatically for existing
    /// and newly announced subsurfaces of the view's surface tree.
    pub(crate) fn add_subsurface_child(&mut self, view: ViewId, sub: WlSubsurface) {
        if self.view(view).is_none() {
            return;
        }
        let surface = sub.surface().clone();
        let (id, commit, new_subsurface) = self.child_listeners(view, &surface);
        let destroy = sub
            .destroy_signal()
            .subscribe(move |state: &mut State, _| {
                state.desktop.remove_view_child(view, id);
            });
        trace!(view = view.0, child = id.0, "Adding subsurface child");
        let child = ViewChild {
            id,
            surface,
            kind: ChildKind::Subsurface {
                handle: sub,
                _destroy: destroy,
            },
            _commit: commit,
            _new_subsurface: new_subsurface,
        };
        if let Some(view) = self.view_mut(view) {
            view.children.push(child);
        }
    }

    /// Bind a popup surface to a view; the shell layer owns the popup's
    /// lifetime and removes the child when the popup goes away.
    pub fn add_popup_child(&mut self, view: ViewId, surface: Surface) -> Option<ChildId> {
        self.view(view)?;
        let (id, commit, new_subsurface) = self.child_listeners(view, &surface);
        let child = ViewChild {
            id,
            surface,
            kind: ChildKind::Popup,
            _commit: commit,
            _new_subsurface: new_subsurface,
        };
        self.view_mut(view)?.children.push(child);
        Some(id)
    }

    /// Unlink one child and release its listeners. Safe to call for a child
    /// that is already gone.
    pub fn remove_view_child(&mut self, view: ViewId, child: ChildId) {
        let present = self
            .view(view)
            .is_some_and(|v| v.children.iter().any(|c| c.id == child));
        if !present {
            return;
        }
        self.damage_whole_view(view);
        if let Some(view) = self.view_mut(view) {
            view.children.retain(|c| c.id != child);
        }
    }
}

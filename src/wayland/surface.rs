// SPDX-License-Identifier: GPL-3.0-only

//! The surface model the protocol layer drives.
//!
//! Wire parsing lives outside this crate; what the desktop core needs from a
//! surface is its committed size, input region, pending damage, the
//! subsurface tree, and the commit/new-subsurface/destroy signals views and
//! view children subscribe to. Outgoing events (output enter/leave) queue on
//! the surface and are drained by the protocol layer.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::desktop::OutputId;
use crate::state::State;
use crate::utils::geometry::Rect;
use crate::utils::listener::Signal;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Events the core queues for the protocol layer to put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Enter(OutputId),
    Leave(OutputId),
}

#[derive(Default)]
struct SurfaceState {
    width: i32,
    height: i32,
    /// `None` means the whole surface accepts input.
    input_region: Option<Vec<Rect>>,
    /// Damage accumulated since the last fan-out, surface-local.
    damage: Vec<Rect>,
}

#[derive(Default)]
struct PendingState {
    size: Option<(i32, i32)>,
    input_region: Option<Option<Vec<Rect>>>,
    damage: Vec<Rect>,
}

struct SurfaceInner {
    id: SurfaceId,
    current: RefCell<SurfaceState>,
    pending: RefCell<PendingState>,
    subsurfaces: RefCell<Vec<WlSubsurface>>,
    events: RefCell<Vec<SurfaceEvent>>,
    commit: Signal<State, ()>,
    new_subsurface: Signal<State, WlSubsurface>,
    destroy: Signal<State, ()>,
}

/// Cheap-clone handle onto one surface. Equality is identity.
#[derive(Clone)]
pub struct Surface {
    inner: Rc<SurfaceInner>,
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Surface {}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.current.borrow();
        f.debug_struct("Surface")
            .field("id", &self.inner.id.0)
            .field("size", &(state.width, state.height))
            .finish()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SurfaceInner {
                id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
                current: RefCell::new(SurfaceState::default()),
                pending: RefCell::new(PendingState::default()),
                subsurfaces: RefCell::new(Vec::new()),
                events: RefCell::new(Vec::new()),
                commit: Signal::new(),
                new_subsurface: Signal::new(),
                destroy: Signal::new(),
            }),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.inner.id
    }

    pub fn size(&self) -> (i32, i32) {
        let state = self.inner.current.borrow();
        (state.width, state.height)
    }

    /// Pending-state setters, called by the protocol layer before a commit.
    pub fn set_pending_size(&self, width: i32, height: i32) {
        self.inner.pending.borrow_mut().size = Some((width, height));
    }

    pub fn set_pending_input_region(&self, region: Option<Vec<Rect>>) {
        self.inner.pending.borrow_mut().input_region = Some(region);
    }

    pub fn add_pending_damage(&self, rect: Rect) {
        self.inner.pending.borrow_mut().damage.push(rect);
    }

    /// Move pending state into current. [`State::commit_surface`] calls this
    /// before emitting the commit signal.
    pub(crate) fn apply_pending(&self) {
        let mut pending = self.inner.pending.borrow_mut();
        let mut current = self.inner.current.borrow_mut();
        if let Some((width, height)) = pending.size.take() {
            current.width = width;
            current.height = height;
        }
        if let Some(region) = pending.input_region.take() {
            current.input_region = region;
        }
        current.damage.append(&mut pending.damage);
    }

    /// Committed damage, surface-local. Valid until the fan-out clears it.
    pub fn damage(&self) -> Vec<Rect> {
        self.inner.current.borrow().damage.clone()
    }

    pub(crate) fn clear_damage(&self) {
        self.inner.current.borrow_mut().damage.clear();
    }

    /// Whether a surface-local point falls in the input region. The default
    /// (no explicit region) accepts input over the whole surface.
    pub fn accepts_input(&self, sx: f64, sy: f64) -> bool {
        let state = self.inner.current.borrow();
        match &state.input_region {
            None => true,
            Some(rects) => rects.iter().any(|r| r.contains_point(sx, sy)),
        }
    }

    pub fn subsurfaces(&self) -> Vec<WlSubsurface> {
        self.inner.subsurfaces.borrow().clone()
    }

    /// Find the topmost subsurface under a surface-local point, descending
    /// into nested trees. Returns the hit surface and its accumulated offset
    /// relative to `self`.
    pub fn subsurface_at(&self, sx: f64, sy: f64) -> Option<(Surface, f64, f64)> {
        for sub in self.inner.subsurfaces.borrow().iter().rev() {
            let (px, py) = sub.position();
            // nested subsurfaces sit above their parent
            if let Some((surface, nx, ny)) = sub.surface().subsurface_at(sx - px, sy - py) {
                return Some((surface, px + nx, py + ny));
            }
            let (width, height) = sub.surface().size();
            if Rect::new(0, 0, width, height).contains_point(sx - px, sy - py) {
                return Some((sub.surface().clone(), px, py));
            }
        }
        None
    }

    pub(crate) fn link_subsurface(&self, sub: WlSubsurface) {
        self.inner.subsurfaces.borrow_mut().push(sub);
    }

    pub(crate) fn unlink_subsurface(&self, sub: &WlSubsurface) {
        self.inner
            .subsurfaces
            .borrow_mut()
            .retain(|s| !s.same(sub));
    }

    /// Queue output enter/leave events for the protocol layer.
    pub(crate) fn send_enter(&self, output: OutputId) {
        self.inner.events.borrow_mut().push(SurfaceEvent::Enter(output));
    }

    pub(crate) fn send_leave(&self, output: OutputId) {
        self.inner.events.borrow_mut().push(SurfaceEvent::Leave(output));
    }

    /// Drain queued wire events.
    pub fn take_events(&self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut *self.inner.events.borrow_mut())
    }

    pub fn commit_signal(&self) -> Signal<State, ()> {
        self.inner.commit.clone()
    }

    pub fn new_subsurface_signal(&self) -> Signal<State, WlSubsurface> {
        self.inner.new_subsurface.clone()
    }

    pub fn destroy_signal(&self) -> Signal<State, ()> {
        self.inner.destroy.clone()
    }

    /// Live listener count across the surface's signals, for leak checks.
    pub fn listener_count(&self) -> usize {
        self.inner.commit.listener_count()
            + self.inner.new_subsurface.listener_count()
            + self.inner.destroy.listener_count()
    }
}

struct SubsurfaceInner {
    surface: Surface,
    parent: Weak<SurfaceInner>,
    position: Cell<(f64, f64)>,
    destroy: Signal<State, ()>,
}

/// A child surface positioned relative to a parent.
#[derive(Clone)]
pub struct WlSubsurface {
    inner: Rc<SubsurfaceInner>,
}

impl std::fmt::Debug for WlSubsurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WlSubsurface")
            .field("surface", &self.inner.surface)
            .field("position", &self.inner.position.get())
            .finish()
    }
}

impl WlSubsurface {
    pub(crate) fn new(parent: &Surface, surface: Surface, x: f64, y: f64) -> Self {
        Self {
            inner: Rc::new(SubsurfaceInner {
                surface,
                parent: Rc::downgrade(&parent.inner),
                position: Cell::new((x, y)),
                destroy: Signal::new(),
            }),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.inner.surface
    }

    pub fn parent(&self) -> Option<Surface> {
        self.inner.parent.upgrade().map(|inner| Surface { inner })
    }

    pub fn position(&self) -> (f64, f64) {
        self.inner.position.get()
    }

    pub fn set_position(&self, x: f64, y: f64) {
        self.inner.position.set((x, y));
    }

    pub fn destroy_signal(&self) -> Signal<State, ()> {
        self.inner.destroy.clone()
    }

    pub fn destroy_listener_count(&self) -> usize {
        self.inner.destroy.listener_count()
    }

    pub(crate) fn same(&self, other: &WlSubsurface) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Shell dispatch for views.
//!
//! Each view is backed by exactly one shell kind. The protocol encoders live
//! outside this crate; capabilities the desktop invokes queue
//! [`ShellRequest`]s on the shell surface, and the external shell layer
//! drains them onto the wire. A capability a shell does not implement is
//! skipped, never an error.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::utils::geometry::Rect;
use crate::wayland::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    XdgShellV6,
    WlShell,
    Xwayland,
}

/// Protocol-bound requests queued by the desktop core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellRequest {
    /// Ask the client to take this size; the new size lands on commit.
    Configure { width: u32, height: u32 },
    /// Atomic X11 window configure.
    ConfigureWindow {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    SetMaximized(bool),
    SetFullscreen(bool),
    SetActivated(bool),
    Close,
}

struct PopupInner {
    surface: Surface,
    position: Cell<(f64, f64)>,
    children: RefCell<Vec<ShellPopup>>,
}

/// A transient surface positioned relative to its parent shell surface.
/// Popups nest; hit-testing descends into children first.
#[derive(Clone)]
pub struct ShellPopup {
    inner: Rc<PopupInner>,
}

impl std::fmt::Debug for ShellPopup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellPopup")
            .field("surface", &self.inner.surface)
            .field("position", &self.inner.position.get())
            .finish()
    }
}

impl ShellPopup {
    pub fn new(surface: Surface, x: f64, y: f64) -> Self {
        Self {
            inner: Rc::new(PopupInner {
                surface,
                position: Cell::new((x, y)),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.inner.surface
    }

    pub fn position(&self) -> (f64, f64) {
        self.inner.position.get()
    }

    pub fn set_position(&self, x: f64, y: f64) {
        self.inner.position.set((x, y));
    }

    pub fn add_child(&self, popup: ShellPopup) {
        self.inner.children.borrow_mut().push(popup);
    }
}

fn popup_at(popups: &[ShellPopup], sx: f64, sy: f64) -> Option<(Surface, f64, f64)> {
    for popup in popups.iter().rev() {
        let (px, py) = popup.position();
        let children = popup.inner.children.borrow();
        if let Some((surface, nx, ny)) = popup_at(&children, sx - px, sy - py) {
            return Some((surface, px + nx, py + ny));
        }
        let (width, height) = popup.surface().size();
        if Rect::new(0, 0, width, height).contains_point(sx - px, sy - py) {
            return Some((popup.surface().clone(), px, py));
        }
    }
    None
}

struct ShellSurfaceInner {
    requests: RefCell<Vec<ShellRequest>>,
    popups: RefCell<Vec<ShellPopup>>,
}

impl ShellSurfaceInner {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            requests: RefCell::new(Vec::new()),
            popups: RefCell::new(Vec::new()),
        })
    }
}

/// An xdg-shell-v6 toplevel.
#[derive(Clone)]
pub struct XdgSurfaceV6 {
    inner: Rc<ShellSurfaceInner>,
}

impl Default for XdgSurfaceV6 {
    fn default() -> Self {
        Self::new()
    }
}

impl XdgSurfaceV6 {
    pub fn new() -> Self {
        Self {
            inner: ShellSurfaceInner::new(),
        }
    }

    pub fn add_popup(&self, popup: ShellPopup) {
        self.inner.popups.borrow_mut().push(popup);
    }

    pub fn remove_popup(&self, popup: &ShellPopup) {
        self.inner
            .popups
            .borrow_mut()
            .retain(|p| !Rc::ptr_eq(&p.inner, &popup.inner));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlShellRole {
    Toplevel,
    Popup,
}

/// A legacy wl_shell surface.
#[derive(Clone)]
pub struct WlShellSurface {
    inner: Rc<ShellSurfaceInner>,
    role: WlShellRole,
}

impl WlShellSurface {
    pub fn new(role: WlShellRole) -> Self {
        Self {
            inner: ShellSurfaceInner::new(),
            role,
        }
    }

    pub fn role(&self) -> WlShellRole {
        self.role
    }

    pub fn add_popup(&self, popup: ShellPopup) {
        self.inner.popups.borrow_mut().push(popup);
    }
}

/// An Xwayland window, configured through the X window manager.
#[derive(Clone)]
pub struct X11Surface {
    inner: Rc<ShellSurfaceInner>,
}

impl Default for X11Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl X11Surface {
    pub fn new() -> Self {
        Self {
            inner: ShellSurfaceInner::new(),
        }
    }
}

/// Tagged shell variant carried by every view.
#[derive(Clone)]
pub enum Shell {
    XdgV6(XdgSurfaceV6),
    Wl(WlShellSurface),
    X11(X11Surface),
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind())
    }
}

impl Shell {
    pub fn kind(&self) -> ShellKind {
        match self {
            Shell::XdgV6(_) => ShellKind::XdgShellV6,
            Shell::Wl(_) => ShellKind::WlShell,
            Shell::X11(_) => ShellKind::Xwayland,
        }
    }

    fn inner(&self) -> &Rc<ShellSurfaceInner> {
        match self {
            Shell::XdgV6(s) => &s.inner,
            Shell::Wl(s) => &s.inner,
            Shell::X11(s) => &s.inner,
        }
    }

    fn push(&self, request: ShellRequest) {
        self.inner().requests.borrow_mut().push(request);
    }

    /// wl_shell popups are never top-level hit-test candidates; they are
    /// reached through their parent's popup lookup.
    pub fn is_popup(&self) -> bool {
        matches!(self, Shell::Wl(s) if s.role == WlShellRole::Popup)
    }

    /// Find a popup under a point in the view's surface coordinates.
    pub fn popup_at(&self, sx: f64, sy: f64) -> Option<(Surface, f64, f64)> {
        match self {
            Shell::XdgV6(_) | Shell::Wl(_) => {
                let popups = self.inner().popups.borrow();
                popup_at(&popups, sx, sy)
            }
            Shell::X11(_) => None,
        }
    }

    /// Shell-specific mover. Returns true when the shell handled the move
    /// itself (the position still updates through the core).
    pub fn request_move(&self, x: f64, y: f64, size: (u32, u32)) -> bool {
        match self {
            Shell::X11(_) => {
                self.push(ShellRequest::ConfigureWindow {
                    x: x as i32,
                    y: y as i32,
                    width: size.0,
                    height: size.1,
                });
                true
            }
            _ => false,
        }
    }

    /// Ask the shell for a new size. The committed size changes when the
    /// client's next matching commit arrives.
    pub fn request_resize(&self, position: (f64, f64), width: u32, height: u32) {
        match self {
            Shell::XdgV6(_) | Shell::Wl(_) => {
                self.push(ShellRequest::Configure { width, height });
            }
            Shell::X11(_) => {
                self.push(ShellRequest::ConfigureWindow {
                    x: position.0 as i32,
                    y: position.1 as i32,
                    width,
                    height,
                });
            }
        }
    }

    /// Atomic move-resize, only supported by X11 windows.
    pub fn request_move_resize(&self, x: f64, y: f64, width: u32, height: u32) -> bool {
        match self {
            Shell::X11(_) => {
                self.push(ShellRequest::ConfigureWindow {
                    x: x as i32,
                    y: y as i32,
                    width,
                    height,
                });
                true
            }
            _ => false,
        }
    }

    pub fn request_activate(&self, activated: bool) {
        match self {
            Shell::XdgV6(_) | Shell::X11(_) => {
                self.push(ShellRequest::SetActivated(activated));
            }
            Shell::Wl(_) => {}
        }
    }

    pub fn request_maximize(&self, maximized: bool) {
        match self {
            Shell::XdgV6(_) | Shell::X11(_) => {
                self.push(ShellRequest::SetMaximized(maximized));
            }
            Shell::Wl(_) => {}
        }
    }

    pub fn request_fullscreen(&self, fullscreen: bool) {
        match self {
            Shell::XdgV6(_) | Shell::X11(_) => {
                self.push(ShellRequest::SetFullscreen(fullscreen));
            }
            Shell::Wl(_) => {}
        }
    }

    pub fn request_close(&self) {
        match self {
            Shell::XdgV6(_) | Shell::X11(_) => self.push(ShellRequest::Close),
            Shell::Wl(_) => {}
        }
    }

    /// Drain queued protocol requests.
    pub fn take_requests(&self) -> Vec<ShellRequest> {
        std::mem::take(&mut *self.inner().requests.borrow_mut())
    }
}

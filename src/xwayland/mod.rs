// SPDX-License-Identifier: GPL-3.0-only

//! Supervisor for the Xwayland server process.
//!
//! The bridge claims an X11 display, shares a Wayland client socket with a
//! forked X server, and exposes a window-manager socket to the X11
//! window-manager layer. Readiness is signalled by the X server through an
//! intermediate child that forwards SIGUSR1; the supervisor consumes it via
//! a calloop signal source, so the loop never blocks on startup.
//!
//! If the X server dies after running for a while the bridge restarts it;
//! deaths within the first five seconds leave it down, which keeps a
//! persistently crashing server from looping.

pub mod cursor;
pub mod sockets;

use std::cell::Cell;
use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::rc::Rc;
use std::time::{Duration, Instant};

use calloop::RegistrationToken;
use calloop::signals::{Signal as LoopSignalKind, Signals};
use nix::errno::Errno;
use nix::sys::signal::{SigHandler, SigSet, SigmaskHow, Signal, kill, sigprocmask};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvpe, fork, getppid};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::input::SeatId;
use crate::state::State;
use crate::utils::listener::{Listener, Signal as EventSignal};

pub use self::sockets::{DisplayDirs, SocketError, open_display_sockets, unlink_display_sockets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Starting,
    Running,
    Terminating,
    Restarting,
}

/// Cursor image deferred until the window manager is up.
#[derive(Debug, Clone)]
pub struct XCursorImage {
    pub pixels: Vec<u8>,
    pub stride: u32,
    pub width: u32,
    pub height: u32,
    pub hotspot_x: i32,
    pub hotspot_y: i32,
}

/// The X window manager built once the server is ready. The protocol
/// encoder lives outside this crate.
pub trait Xwm {
    fn set_cursor(&mut self, cursor: &XCursorImage);
    fn set_seat(&mut self, seat: Option<SeatId>);
}

/// Narrow contract to the display layer: registering the bridge's Wayland
/// client and constructing the window manager over the wm socket.
pub trait DisplayBroker {
    fn register_client(&mut self, fd: OwnedFd) -> anyhow::Result<ClientHandle>;
    /// Tear down a client the bridge still owns. Not called for clients
    /// that are already dying.
    fn destroy_client(&mut self, client: &ClientHandle);
    fn create_wm(&mut self, wm_fd: OwnedFd, display: i32) -> anyhow::Result<Box<dyn Xwm>>;
}

struct ClientInner {
    destroy: EventSignal<State, ()>,
    alive: Cell<bool>,
}

/// Handle onto the Wayland client backing the X server connection.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Rc<ClientInner>,
}

impl Default for ClientHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientHandle {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ClientInner {
                destroy: EventSignal::new(),
                alive: Cell::new(true),
            }),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    pub fn destroy_signal(&self) -> EventSignal<State, ()> {
        self.inner.destroy.clone()
    }

    /// The protocol layer announces the client's destruction here.
    pub fn emit_destroyed(&self, state: &mut State) {
        if !self.inner.alive.replace(false) {
            return;
        }
        let destroy = self.inner.destroy.clone();
        destroy.emit(state, &());
    }
}

#[derive(Debug, Error)]
pub enum XBridgeError {
    #[error("the X bridge is not enabled")]
    NotEnabled,
    #[error("the X bridge is already up")]
    AlreadyUp,
    #[error("XDG_RUNTIME_DIR is not set")]
    NoRuntimeDir,
    #[error(transparent)]
    Sockets(#[from] SocketError),
    #[error("failed to create socketpair: {0}")]
    SocketPair(nix::Error),
    #[error("failed to register the Xwayland client: {0}")]
    Client(anyhow::Error),
    #[error("failed to install the SIGUSR1 source: {0}")]
    SignalSource(String),
    #[error("fork failed: {0}")]
    Fork(nix::Error),
}

/// How long the X server must have been up for a crash to trigger a
/// restart rather than staying down.
const RESTART_FLOOR: Duration = Duration::from_secs(5);

pub struct XBridge {
    state: BridgeState,
    pub display: i32,
    dirs: DisplayDirs,
    broker: Box<dyn DisplayBroker>,
    x_fd: [Option<OwnedFd>; 2],
    wl_fd: [Option<OwnedFd>; 2],
    wm_fd: [Option<OwnedFd>; 2],
    client: Option<ClientHandle>,
    client_destroy: Option<Listener>,
    sigusr1_token: Option<RegistrationToken>,
    pid: Option<Pid>,
    server_start: Option<Instant>,
    cursor: Option<XCursorImage>,
    xwm: Option<Box<dyn Xwm>>,
    seat: Option<SeatId>,
    ready: EventSignal<State, ()>,
}

impl std::fmt::Debug for XBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XBridge")
            .field("state", &self.state)
            .field("display", &self.display)
            .field("pid", &self.pid)
            .finish()
    }
}

impl XBridge {
    pub fn new(broker: Box<dyn DisplayBroker>, dirs: DisplayDirs) -> Self {
        Self {
            state: BridgeState::Idle,
            display: -1,
            dirs,
            broker,
            x_fd: [None, None],
            wl_fd: [None, None],
            wm_fd: [None, None],
            client: None,
            client_destroy: None,
            sigusr1_token: None,
            pid: None,
            server_start: None,
            cursor: None,
            xwm: None,
            seat: None,
            ready: EventSignal::new(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// One-shot signal fired when the X server and its window manager are
    /// up; reinitialized after firing.
    pub fn ready_signal(&self) -> EventSignal<State, ()> {
        self.ready.clone()
    }

    /// Set the cursor X clients see. Applied immediately when the wm is
    /// built, deferred until readiness otherwise.
    pub fn set_cursor(&mut self, cursor: XCursorImage) {
        if let Some(xwm) = self.xwm.as_mut() {
            xwm.set_cursor(&cursor);
            return;
        }
        self.cursor = Some(cursor);
    }

    /// Bind (or unbind) the seat the window manager routes input through.
    pub fn set_seat(&mut self, seat: Option<SeatId>) {
        self.seat = seat;
        if let Some(xwm) = self.xwm.as_mut() {
            xwm.set_seat(seat);
        }
    }

    fn should_restart(uptime: Duration) -> bool {
        uptime >= RESTART_FLOOR
    }
}

impl State {
    /// Create the bridge, hand it the theme cursor, and start the server.
    pub fn xwayland_enable(&mut self, broker: Box<dyn DisplayBroker>) -> anyhow::Result<()> {
        self.xwayland_enable_with_dirs(broker, DisplayDirs::default())
    }

    pub fn xwayland_enable_with_dirs(
        &mut self,
        broker: Box<dyn DisplayBroker>,
        dirs: DisplayDirs,
    ) -> anyhow::Result<()> {
        let mut bridge = XBridge::new(broker, dirs);
        if let Some(cursor) = cursor::load_default_cursor(
            self.config.cursor_theme.as_deref(),
            self.config.cursor_size,
        ) {
            bridge.set_cursor(cursor);
        }
        self.desktop.xwayland = Some(bridge);
        self.xwayland_start()?;
        Ok(())
    }

    /// The Starting sequence: claim a display, wire the sockets, register
    /// the Wayland client, install the readiness source, double-fork.
    pub fn xwayland_start(&mut self) -> Result<(), XBridgeError> {
        let Some(bridge) = self.desktop.xwayland.as_mut() else {
            return Err(XBridgeError::NotEnabled);
        };
        if !matches!(bridge.state, BridgeState::Idle | BridgeState::Restarting) {
            return Err(XBridgeError::AlreadyUp);
        }
        let Some(runtime_dir) = self.config.xdg_runtime_dir.clone() else {
            return Err(XBridgeError::NoRuntimeDir);
        };
        bridge.state = BridgeState::Starting;

        let sockets = match open_display_sockets(&bridge.dirs) {
            Ok(sockets) => sockets,
            Err(err) => {
                self.xwayland_finish();
                return Err(err.into());
            }
        };
        let bridge = self.desktop.xwayland.as_mut().expect("bridge just set");
        bridge.display = sockets.display;
        let [x0, x1] = sockets.fds;
        bridge.x_fd = [Some(x0), Some(x1)];

        let pairs = (socketpair_cloexec(), socketpair_cloexec());
        let ((wl0, wl1), (wm0, wm1)) = match pairs {
            (Ok(wl), Ok(wm)) => (wl, wm),
            (Err(err), _) | (_, Err(err)) => {
                error!("failed to create socketpair: {err}");
                self.xwayland_finish();
                return Err(XBridgeError::SocketPair(err));
            }
        };

        let bridge = self.desktop.xwayland.as_mut().expect("bridge just set");
        bridge.wm_fd = [Some(wm0), Some(wm1)];
        bridge.server_start = Some(Instant::now());

        // wl0 belongs to the display from here on
        let client = match bridge.broker.register_client(wl0) {
            Ok(client) => client,
            Err(err) => {
                error!("failed to register the Xwayland client: {err}");
                self.xwayland_finish();
                return Err(XBridgeError::Client(err));
            }
        };

        // no stale $DISPLAY while the server starts
        unsafe { std::env::remove_var("DISPLAY") };

        bridge.client_destroy = Some(client.destroy_signal().subscribe(
            |state: &mut State, _| {
                state.xwayland_client_destroyed();
            },
        ));
        bridge.client = Some(client);
        bridge.wl_fd = [None, Some(wl1)];

        let signals = match Signals::new(&[LoopSignalKind::SIGUSR1]) {
            Ok(signals) => signals,
            Err(err) => {
                self.xwayland_finish();
                return Err(XBridgeError::SignalSource(err.to_string()));
            }
        };
        let token = match self
            .loop_handle
            .insert_source(signals, |_, _, state: &mut State| {
                state.xwayland_ready();
            }) {
            Ok(token) => token,
            Err(err) => {
                let err = err.to_string();
                self.xwayland_finish();
                return Err(XBridgeError::SignalSource(err));
            }
        };
        let bridge = self.desktop.xwayland.as_mut().expect("bridge just set");
        bridge.sigusr1_token = Some(token);

        let pid = {
            let x_fd = [
                bridge.x_fd[0].as_ref().expect("set above").as_raw_fd(),
                bridge.x_fd[1].as_ref().expect("set above").as_raw_fd(),
            ];
            let wl_fd = bridge.wl_fd[1].as_ref().expect("set above").as_raw_fd();
            let wm_fd = bridge.wm_fd[1].as_ref().expect("set above").as_raw_fd();
            match spawn_xserver(bridge.display, x_fd, wl_fd, wm_fd, &runtime_dir) {
                Ok(pid) => pid,
                Err(err) => {
                    error!("failed to fork the Xwayland intermediate: {err}");
                    self.xwayland_finish();
                    return Err(err);
                }
            }
        };
        info!(display = bridge.display, ?pid, "Xwayland starting");
        bridge.pid = Some(pid);

        // close our copies of the descriptors that now belong to the child
        bridge.x_fd = [None, None];
        bridge.wl_fd[1] = None;
        bridge.wm_fd[1] = None;

        Ok(())
    }

    /// SIGUSR1 from the intermediate child: the X server is listening.
    fn xwayland_ready(&mut self) {
        let Some(bridge) = self.desktop.xwayland.as_mut() else {
            return;
        };
        let Some(pid) = bridge.pid.take() else {
            return;
        };

        let status = loop {
            match waitpid(pid, None) {
                Ok(status) => break status,
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    error!("waitpid for Xwayland fork failed: {err}");
                    return;
                }
            }
        };
        if !matches!(status, WaitStatus::Exited(_, 0)) {
            error!("Xwayland startup failed, not setting up the window manager");
            return;
        }
        debug!("Xserver is ready");

        let display = bridge.display;
        let Some(wm_fd) = bridge.wm_fd[0].take() else {
            return;
        };
        let xwm = match bridge.broker.create_wm(wm_fd, display) {
            Ok(xwm) => xwm,
            Err(err) => {
                error!("failed to create the X window manager: {err}");
                self.xwayland_finish();
                return;
            }
        };
        let bridge = self.desktop.xwayland.as_mut().expect("still set");
        bridge.xwm = Some(xwm);
        if let Some(seat) = bridge.seat {
            bridge.xwm.as_mut().expect("just set").set_seat(Some(seat));
        }

        if let Some(token) = bridge.sigusr1_token.take() {
            self.loop_handle.remove(token);
        }

        let bridge = self.desktop.xwayland.as_mut().expect("still set");
        if let Some(cursor) = bridge.cursor.take() {
            bridge.xwm.as_mut().expect("just set").set_cursor(&cursor);
        }

        unsafe { std::env::set_var("DISPLAY", format!(":{display}")) };
        bridge.state = BridgeState::Running;

        // ready fires once per start; rearm for the next one
        let ready = bridge.ready.clone();
        ready.emit(self, &());
        if let Some(bridge) = self.desktop.xwayland.as_mut() {
            bridge.ready = EventSignal::new();
        }
    }

    /// The X server's Wayland client went away: tear down, and restart
    /// unless the server died within the restart floor.
    pub fn xwayland_client_destroyed(&mut self) {
        let Some(bridge) = self.desktop.xwayland.as_mut() else {
            return;
        };
        // the client is destroying itself; drop our side only
        bridge.client = None;
        bridge.client_destroy = None;
        let restart = bridge
            .server_start
            .is_some_and(|start| XBridge::should_restart(start.elapsed()));

        self.xwayland_finish();

        if restart {
            info!("Restarting Xwayland");
            if let Some(bridge) = self.desktop.xwayland.as_mut() {
                bridge.state = BridgeState::Restarting;
            }
            if let Err(err) = self.xwayland_start() {
                error!("failed to restart Xwayland: {err}");
            }
        }
    }

    /// The display itself is going down; the client is already dying, so
    /// only drop our references before tearing down.
    pub fn xwayland_display_destroyed(&mut self) {
        if let Some(bridge) = self.desktop.xwayland.as_mut() {
            bridge.client = None;
            bridge.client_destroy = None;
        }
        self.xwayland_finish();
        self.desktop.xwayland = None;
    }

    /// Release everything the bridge holds. The X server itself is not
    /// killed: it exits on SIGPIPE once our ends of the wm/wl sockets
    /// close, which is safer than signalling a possibly recycled pid.
    pub fn xwayland_finish(&mut self) {
        let Some(bridge) = self.desktop.xwayland.as_mut() else {
            return;
        };
        if bridge.state == BridgeState::Idle && bridge.display == -1 {
            return;
        }
        bridge.state = BridgeState::Terminating;

        bridge.cursor = None;
        bridge.xwm = None;

        bridge.client_destroy = None;
        if let Some(client) = bridge.client.take() {
            bridge.broker.destroy_client(&client);
        }

        if let Some(token) = bridge.sigusr1_token.take() {
            self.loop_handle.remove(token);
        }

        let bridge = self.desktop.xwayland.as_mut().expect("still set");
        bridge.x_fd = [None, None];
        bridge.wl_fd = [None, None];
        bridge.wm_fd = [None, None];
        bridge.pid = None;

        if bridge.display >= 0 {
            unlink_display_sockets(&bridge.dirs, bridge.display);
        }
        bridge.display = -1;
        unsafe { std::env::remove_var("DISPLAY") };
        bridge.state = BridgeState::Idle;
    }
}

fn socketpair_cloexec() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::sys::socket::socketpair(
        nix::sys::socket::AddressFamily::Unix,
        nix::sys::socket::SockType::Stream,
        None,
        nix::sys::socket::SockFlag::SOCK_CLOEXEC,
    )
}

/// Fork the intermediate child that supervises the X server exec. Argv and
/// envp are built before forking so the children only run exec-safe code.
fn spawn_xserver(
    display_num: i32,
    x_fd: [RawFd; 2],
    wl_fd: RawFd,
    wm_fd: RawFd,
    runtime_dir: &std::path::Path,
) -> Result<Pid, XBridgeError> {
    let argv: Vec<CString> = [
        "Xwayland".to_owned(),
        format!(":{display_num}"),
        "-rootless".to_owned(),
        "-terminate".to_owned(),
        "-listen".to_owned(),
        format!("{}", x_fd[0]),
        "-listen".to_owned(),
        format!("{}", x_fd[1]),
        "-wm".to_owned(),
        format!("{wm_fd}"),
    ]
    .into_iter()
    .map(|arg| CString::new(arg).expect("no interior NUL"))
    .collect();

    // everything but XDG_RUNTIME_DIR is cleared from the child environment
    let envp: Vec<CString> = [
        format!("XDG_RUNTIME_DIR={}", runtime_dir.display()),
        format!("WAYLAND_SOCKET={wl_fd}"),
    ]
    .into_iter()
    .map(|var| CString::new(var).expect("no interior NUL"))
    .collect();

    debug!(
        "WAYLAND_SOCKET={} Xwayland :{} -rootless -terminate -listen {} -listen {} -wm {}",
        wl_fd, display_num, x_fd[0], x_fd[1], wm_fd
    );

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => Ok(child),
        Ok(ForkResult::Child) => intermediate_child([x_fd[0], x_fd[1], wl_fd, wm_fd], argv, envp),
        Err(err) => Err(XBridgeError::Fork(err)),
    }
}

/// The double-fork middle: block SIGUSR1/SIGCHLD, fork the X server, wait
/// for whichever arrives first and forward readiness to the supervisor.
/// Exits nonzero when the server died before signalling.
fn intermediate_child(fds: [RawFd; 4], argv: Vec<CString>, envp: Vec<CString>) -> ! {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGUSR1);
    mask.add(Signal::SIGCHLD);
    let _ = sigprocmask(SigmaskHow::SIG_BLOCK, Some(&mask), None);

    let server = match unsafe { fork() } {
        Ok(ForkResult::Child) => exec_xserver(fds, &argv, &envp),
        Ok(ForkResult::Parent { child }) => child,
        Err(_) => unsafe { libc::_exit(1) },
    };

    let signal = mask.wait().unwrap_or(Signal::SIGCHLD);
    let _ = kill(getppid(), Signal::SIGUSR1);
    if signal == Signal::SIGCHLD {
        let _ = waitpid(server, None);
        unsafe { libc::_exit(1) }
    }
    unsafe { libc::_exit(0) }
}

fn exec_xserver(fds: [RawFd; 4], argv: &[CString], envp: &[CString]) -> ! {
    // the listening and wm/wl descriptors must survive the exec
    for fd in fds {
        unsafe { libc::fcntl(fd, libc::F_SETFD, 0) };
    }
    // an ignored SIGUSR1 makes the X server signal its parent when ready
    let _ = unsafe { nix::sys::signal::signal(Signal::SIGUSR1, SigHandler::SigIgn) };
    let _ = execvpe(&argv[0], argv, envp);
    unsafe { libc::_exit(1) }
}

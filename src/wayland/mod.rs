// SPDX-License-Identifier: GPL-3.0-only

pub mod decoration;
pub mod surface;

use std::cell::Cell;

use tracing::debug;

use self::decoration::DecorationManager;
use self::surface::Surface;

/// The wl_compositor global: surfaces enter the model through here.
#[derive(Debug, Default)]
pub struct CompositorGlobal {
    created: Cell<u64>,
}

impl CompositorGlobal {
    pub fn create_surface(&self) -> Surface {
        self.created.set(self.created.get() + 1);
        Surface::new()
    }

    pub fn surfaces_created(&self) -> u64 {
        self.created.get()
    }
}

/// Capability-announcement global for screen capture requests.
#[derive(Debug, Default)]
pub struct Screenshooter;

/// Per-output gamma table control handle.
#[derive(Debug, Default)]
pub struct GammaControlManager;

/// Primary-selection (middle-click paste) device manager handle.
#[derive(Debug, Default)]
pub struct PrimarySelectionManager;

/// Idle-notification global; inhibitors keep outputs awake.
#[derive(Debug, Default)]
pub struct IdleManager {
    inhibitors: Cell<u32>,
}

impl IdleManager {
    pub fn inhibit(&self) {
        self.inhibitors.set(self.inhibitors.get() + 1);
    }

    pub fn uninhibit(&self) {
        self.inhibitors.set(self.inhibitors.get().saturating_sub(1));
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibitors.get() > 0
    }
}

/// The protocol globals the desktop instantiates at creation.
#[derive(Debug)]
pub struct Globals {
    pub compositor: CompositorGlobal,
    pub decoration_manager: DecorationManager,
    pub screenshooter: Screenshooter,
    pub gamma_control: GammaControlManager,
    pub primary_selection: PrimarySelectionManager,
    pub idle: IdleManager,
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

impl Globals {
    pub fn new() -> Self {
        debug!("Creating protocol globals");
        Self {
            compositor: CompositorGlobal::default(),
            decoration_manager: DecorationManager::new(),
            screenshooter: Screenshooter,
            gamma_control: GammaControlManager,
            primary_selection: PrimarySelectionManager,
            idle: IdleManager::default(),
        }
    }
}

//! Overlay chrome visibility.
//!
//! Four regions (top controls, both sidebars, bottom info bar) plus the
//! cinema flag. The top controls carry their own inactivity timer; the
//! machine only records its deadline and the owning actor sleeps until it.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Below this width the sidebars start hidden.
pub const NARROW_VIEWPORT_WIDTH: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChromeState {
    pub controls_visible: bool,
    pub left_sidebar_visible: bool,
    pub right_sidebar_visible: bool,
    pub bottom_bar_visible: bool,
    pub cinema_mode: bool,
}

impl Default for ChromeState {
    fn default() -> Self {
        Self {
            controls_visible: true,
            left_sidebar_visible: true,
            right_sidebar_visible: true,
            bottom_bar_visible: true,
            cinema_mode: false,
        }
    }
}

impl ChromeState {
    pub fn sidebars_visible(&self) -> bool {
        self.left_sidebar_visible || self.right_sidebar_visible
    }

    fn set_panels(&mut self, visible: bool) {
        self.left_sidebar_visible = visible;
        self.right_sidebar_visible = visible;
        self.bottom_bar_visible = visible;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub is_mobile: bool,
}

impl Viewport {
    fn is_narrow(&self) -> bool {
        self.is_mobile || self.width < NARROW_VIEWPORT_WIDTH
    }
}

#[derive(Debug)]
pub struct ChromeMachine {
    state: ChromeState,
    hide_delay: Duration,
    hide_deadline: Option<Instant>,
    single_item: bool,
}

impl ChromeMachine {
    pub fn new(hide_delay: Duration, single_item: bool) -> Self {
        Self {
            state: ChromeState::default(),
            hide_delay,
            hide_deadline: None,
            single_item,
        }
    }

    pub fn state(&self) -> ChromeState {
        self.state
    }

    /// When the controls auto-hide fires next, if armed.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// Controls start visible, so the inactivity timer starts with them.
    pub fn mount(&mut self, now: Instant) {
        self.state.controls_visible = true;
        self.arm(now);
    }

    pub fn pointer_moved(&mut self, now: Instant) -> bool {
        let before = self.state;
        self.state.controls_visible = true;
        if !self.state.cinema_mode {
            self.state.set_panels(true);
        }
        self.arm(now);
        self.state != before
    }

    pub fn toggle_cinema(&mut self, now: Instant) {
        self.state.cinema_mode = !self.state.cinema_mode;
        // Entering hides every panel, leaving brings them all back
        self.state.set_panels(!self.state.cinema_mode);
        self.state.controls_visible = true;
        self.arm(now);
        debug!(cinema = self.state.cinema_mode, "Cinema mode toggled");
    }

    /// Returns false when suppressed for a single-item playlist.
    pub fn toggle_sidebars(&mut self) -> bool {
        if self.single_item {
            debug!("Sidebar toggle ignored for single-item playlist");
            return false;
        }
        let visible = !self.state.sidebars_visible();
        self.state.left_sidebar_visible = visible;
        self.state.right_sidebar_visible = visible;
        true
    }

    /// Returns false when suppressed for a single-item playlist.
    pub fn toggle_bottom_bar(&mut self) -> bool {
        if self.single_item {
            debug!("Bottom bar toggle ignored for single-item playlist");
            return false;
        }
        self.state.bottom_bar_visible = !self.state.bottom_bar_visible;
        true
    }

    /// Narrow or mobile viewports hide the sidebars; wide ones leave them be.
    pub fn apply_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport.is_narrow() && self.state.sidebars_visible() {
            self.state.left_sidebar_visible = false;
            self.state.right_sidebar_visible = false;
            return true;
        }
        false
    }

    /// Called when the hide deadline is reached. Returns true if the
    /// controls were hidden.
    pub fn hide_expired(&mut self, now: Instant) -> bool {
        match self.hide_deadline {
            Some(deadline) if now >= deadline => {
                self.hide_deadline = None;
                let changed = self.state.controls_visible;
                self.state.controls_visible = false;
                changed
            }
            _ => false,
        }
    }

    pub fn cancel_timer(&mut self) {
        self.hide_deadline = None;
    }

    fn arm(&mut self, now: Instant) {
        self.hide_deadline = Some(now + self.hide_delay);
    }
}

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Visibility of the host page's own chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub sidebar_visible: bool,
    pub header_visible: bool,
    pub scroll_locked: bool,
}

impl LayoutSnapshot {
    /// Layout while a player owns the viewport
    pub const TAKEOVER: Self = Self {
        sidebar_visible: false,
        header_visible: false,
        scroll_locked: true,
    };
}

impl Default for LayoutSnapshot {
    fn default() -> Self {
        Self {
            sidebar_visible: true,
            header_visible: true,
            scroll_locked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TakeoverToken(u64);

/// Host page side of the fullscreen takeover protocol.
///
/// A player pushes a takeover to own the viewport and pops it with the same
/// token when it goes away. The host restores whatever layout was in place
/// before the matching push.
pub trait LayoutHost: Send + Sync {
    fn push_takeover(&self) -> TakeoverToken;
    fn pop_takeover(&self, token: TakeoverToken);
}

#[derive(Debug)]
struct StackInner {
    current: LayoutSnapshot,
    // (token, layout to restore when this entry pops)
    entries: Vec<(TakeoverToken, LayoutSnapshot)>,
    next_token: u64,
}

/// In-memory [`LayoutHost`] keeping a stack of saved layouts.
#[derive(Debug)]
pub struct LayoutStack {
    inner: Mutex<StackInner>,
}

impl LayoutStack {
    pub fn new(initial: LayoutSnapshot) -> Self {
        Self {
            inner: Mutex::new(StackInner {
                current: initial,
                entries: Vec::new(),
                next_token: 1,
            }),
        }
    }

    pub fn current(&self) -> LayoutSnapshot {
        self.lock().current
    }

    pub fn depth(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StackInner> {
        // A poisoned stack still holds valid snapshots
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for LayoutStack {
    fn default() -> Self {
        Self::new(LayoutSnapshot::default())
    }
}

impl LayoutHost for LayoutStack {
    fn push_takeover(&self) -> TakeoverToken {
        let mut inner = self.lock();
        let token = TakeoverToken(inner.next_token);
        inner.next_token += 1;
        let saved = inner.current;
        inner.entries.push((token, saved));
        inner.current = LayoutSnapshot::TAKEOVER;
        debug!(depth = inner.entries.len(), "Layout takeover pushed");
        token
    }

    fn pop_takeover(&self, token: TakeoverToken) {
        let mut inner = self.lock();
        let Some(position) = inner.entries.iter().position(|(t, _)| *t == token) else {
            warn!(?token, "Pop for unknown layout takeover");
            return;
        };

        let (_, saved) = inner.entries.remove(position);
        if position == inner.entries.len() {
            // Top of the stack: restore what was there before the push
            inner.current = saved;
        } else {
            // Popped out of order: the entry above now restores our saved layout
            inner.entries[position].1 = saved;
        }
        debug!(depth = inner.entries.len(), "Layout takeover popped");
    }
}

/// Held by a mounted player. Dropping it pops the takeover, so the host
/// layout comes back on every exit path.
pub struct LayoutTakeover {
    host: Arc<dyn LayoutHost>,
    token: Option<TakeoverToken>,
}

impl LayoutTakeover {
    pub fn acquire(host: Arc<dyn LayoutHost>) -> Self {
        let token = host.push_takeover();
        Self {
            host,
            token: Some(token),
        }
    }

    pub fn release(mut self) {
        self.pop();
    }

    fn pop(&mut self) {
        if let Some(token) = self.token.take() {
            self.host.pop_takeover(token);
        }
    }
}

impl Drop for LayoutTakeover {
    fn drop(&mut self) {
        self.pop();
    }
}

impl std::fmt::Debug for LayoutTakeover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutTakeover")
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takeover_hides_chrome_and_restores_exactly() {
        let initial = LayoutSnapshot {
            sidebar_visible: false,
            header_visible: true,
            scroll_locked: false,
        };
        let stack = Arc::new(LayoutStack::new(initial));

        let guard = LayoutTakeover::acquire(stack.clone());
        assert_eq!(stack.current(), LayoutSnapshot::TAKEOVER);
        assert_eq!(stack.depth(), 1);

        guard.release();
        assert_eq!(stack.current(), initial);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn drop_pops_takeover() {
        let stack = Arc::new(LayoutStack::default());
        {
            let _guard = LayoutTakeover::acquire(stack.clone());
            assert!(stack.current().scroll_locked);
        }
        assert_eq!(stack.current(), LayoutSnapshot::default());
    }

    #[test]
    fn out_of_order_pops_still_restore_original() {
        let stack = Arc::new(LayoutStack::default());
        let first = LayoutTakeover::acquire(stack.clone());
        let second = LayoutTakeover::acquire(stack.clone());

        first.release();
        assert_eq!(stack.current(), LayoutSnapshot::TAKEOVER);

        second.release();
        assert_eq!(stack.current(), LayoutSnapshot::default());
    }

    #[test]
    fn unknown_token_is_ignored() {
        let stack = LayoutStack::default();
        stack.pop_takeover(TakeoverToken(99));
        assert_eq!(stack.current(), LayoutSnapshot::default());
    }
}

//! Keyboard Shortcuts
//!
//! Matches key events against an ordered list of shortcut chords and invokes
//! the first match. Listeners are attached to a `KeyEventSource` and are
//! detached when their `ListenerGuard` drops, so a binding can never outlive
//! the component that created it.
//!
//! Matching rules:
//! - keys compare case-insensitively
//! - the modifier set must match exactly; an unspecified modifier must be up
//! - registration order decides, and only the first match fires

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Modifier keys held during a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Human-readable prefix such as "Ctrl+Shift+"
    pub fn label(&self) -> String {
        let mut label = String::new();
        if self.ctrl {
            label.push_str("Ctrl+");
        }
        if self.meta {
            label.push_str("Meta+");
        }
        if self.alt {
            label.push_str("Alt+");
        }
        if self.shift {
            label.push_str("Shift+");
        }
        label
    }
}

/// A key press as delivered by the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
            default_prevented: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// Suppress the host's default handling of this key
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A key chord bound to an action
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardShortcut<A> {
    key: String,
    pub modifiers: Modifiers,
    pub action: A,
    pub description: String,
}

impl<A> KeyboardShortcut<A> {
    /// A shortcut with no modifiers
    pub fn new(key: impl Into<String>, action: A, description: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            modifiers: Modifiers::NONE,
            action,
            description: description.into(),
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// Lowercased key this shortcut listens for
    pub fn key(&self) -> &str {
        &self.key
    }

    /// "Ctrl+=", "Shift+G", ...
    pub fn chord_label(&self) -> String {
        let mut key = self.key.clone();
        if key.chars().count() == 1 {
            key = key.to_uppercase();
        }
        format!("{}{}", self.modifiers.label(), key)
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.modifiers == event.modifiers && self.key == event.key.to_lowercase()
    }
}

/// Ordered shortcut table
#[derive(Debug, Clone)]
pub struct ShortcutDispatcher<A> {
    shortcuts: Vec<KeyboardShortcut<A>>,
}

impl<A> ShortcutDispatcher<A> {
    pub fn new(shortcuts: Vec<KeyboardShortcut<A>>) -> Self {
        Self { shortcuts }
    }

    pub fn shortcuts(&self) -> &[KeyboardShortcut<A>] {
        &self.shortcuts
    }

    /// Find the first matching shortcut. On a match the event's default is
    /// prevented and the action returned; otherwise the event is untouched.
    pub fn dispatch(&self, event: &mut KeyEvent) -> Option<&A> {
        let shortcut = self.shortcuts.iter().find(|s| s.matches(event))?;
        event.prevent_default();
        tracing::debug!(chord = %shortcut.chord_label(), "Shortcut matched");
        Some(&shortcut.action)
    }
}

type ListenerFn = Box<dyn FnMut(&mut KeyEvent) + Send>;

struct ListenerSlot {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Arc<Mutex<ListenerFn>>,
}

#[derive(Default)]
struct ListenerTable {
    next_id: AtomicU64,
    slots: Mutex<Vec<ListenerSlot>>,
}

/// Stand-in for the window's keydown event target
#[derive(Clone, Default)]
pub struct KeyEventSource {
    table: Arc<ListenerTable>,
}

/// Keeps a listener attached; dropping it detaches the listener
#[must_use = "the listener is detached as soon as the guard is dropped"]
pub struct ListenerGuard {
    table: Weak<ListenerTable>,
    id: u64,
    active: Arc<AtomicBool>,
}

impl KeyEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a keydown listener
    pub fn add_listener<F>(&self, listener: F) -> ListenerGuard
    where
        F: FnMut(&mut KeyEvent) + Send + 'static,
    {
        let id = self.table.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        let callback: ListenerFn = Box::new(listener);

        if let Ok(mut slots) = self.table.slots.lock() {
            slots.push(ListenerSlot {
                id,
                active: Arc::clone(&active),
                callback: Arc::new(Mutex::new(callback)),
            });
        }

        ListenerGuard {
            table: Arc::downgrade(&self.table),
            id,
            active,
        }
    }

    /// Deliver a key event to every attached listener, returning it afterwards
    pub fn emit(&self, mut event: KeyEvent) -> KeyEvent {
        // Snapshot so listeners may detach themselves or others while running
        let snapshot: Vec<(Arc<AtomicBool>, Arc<Mutex<ListenerFn>>)> = match self.table.slots.lock()
        {
            Ok(slots) => slots
                .iter()
                .map(|slot| (Arc::clone(&slot.active), Arc::clone(&slot.callback)))
                .collect(),
            Err(_) => return event,
        };

        for (active, callback) in snapshot {
            if !active.load(Ordering::Acquire) {
                continue;
            }
            if let Ok(mut callback) = callback.try_lock() {
                (&mut **callback)(&mut event);
            }
        }

        event
    }

    pub fn listener_count(&self) -> usize {
        self.table.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);

        if let Some(table) = self.table.upgrade() {
            if let Ok(mut slots) = table.slots.lock() {
                slots.retain(|slot| slot.id != self.id);
            }
        }
    }
}

/// A shortcut table attached to a `KeyEventSource`.
///
/// Matched actions are passed to the handler. Disabling detaches the listener
/// synchronously; dropping the binding detaches it as well.
pub struct ShortcutBinding<A> {
    source: KeyEventSource,
    dispatcher: Arc<ShortcutDispatcher<A>>,
    handler: Arc<Mutex<dyn FnMut(A) + Send>>,
    guard: Option<ListenerGuard>,
}

impl<A> ShortcutBinding<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Attach `shortcuts` to `source`, routing matched actions to `handler`
    pub fn attach<F>(source: &KeyEventSource, shortcuts: Vec<KeyboardShortcut<A>>, handler: F) -> Self
    where
        F: FnMut(A) + Send + 'static,
    {
        let mut binding = Self {
            source: source.clone(),
            dispatcher: Arc::new(ShortcutDispatcher::new(shortcuts)),
            handler: Arc::new(Mutex::new(handler)),
            guard: None,
        };
        binding.set_enabled(true);
        binding
    }

    pub fn is_enabled(&self) -> bool {
        self.guard.is_some()
    }

    pub fn shortcuts(&self) -> &[KeyboardShortcut<A>] {
        self.dispatcher.shortcuts()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.guard = None;
            return;
        }
        if self.guard.is_some() {
            return;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let handler = Arc::clone(&self.handler);
        self.guard = Some(self.source.add_listener(move |event| {
            if let Some(action) = dispatcher.dispatch(event) {
                if let Ok(mut handler) = handler.lock() {
                    (&mut *handler)(action.clone());
                }
            }
        }));
    }
}

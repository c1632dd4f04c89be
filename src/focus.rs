//! Dialog focus management: capture focus on open, trap Tab inside the
//! dialog, restore the previous focus on close.
//!
//! The controller never discovers focusable elements itself. A dialog
//! registers its ordered focus ring when it opens, and the surrounding UI
//! exposes its notion of focus through [`FocusHost`].

use crate::observe::Subscribers;
use flume::Receiver;

/// Access to whatever currently owns keyboard focus.
pub trait FocusHost<F> {
    fn focused(&self) -> Option<F>;
    fn focus(&mut self, target: &F);
    /// Whether `target` still exists and can take focus.
    fn is_attached(&self, target: &F) -> bool;
}

/// Focus layout a dialog registers when it opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogSpec<F> {
    /// Focusable targets in Tab order.
    pub focusables: Vec<F>,
    /// Target focused right after opening (the close control).
    pub initial: F,
}

impl<F> DialogSpec<F> {
    pub fn new(focusables: Vec<F>, initial: F) -> Self {
        Self { focusables, initial }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DialogKey {
    Escape,
    Tab,
    BackTab,
    Other,
}

/// Where a pointer click landed while the dialog is up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DialogClick {
    /// The overlay itself, outside the panel.
    Backdrop,
    /// The panel or anything inside it.
    Panel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key closed the dialog.
    Closed,
    /// Focus wrapped; the host must not apply its own advance.
    Wrapped,
    /// Not handled here; the host applies its default behaviour.
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogEvent<S, F> {
    Opened { subject: S },
    Closed { restored: Option<F> },
    FocusMoved { target: F },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogFocusState<S, F> {
    pub subject: S,
    pub previously_focused: Option<F>,
    pub spec: DialogSpec<F>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum DialogState<S, F> {
    Closed,
    Open(DialogFocusState<S, F>),
}

#[derive(Debug)]
pub struct ModalFocusController<S, F> {
    state: DialogState<S, F>,
    subscribers: Subscribers<DialogEvent<S, F>>,
}

impl<S, F> Default for ModalFocusController<S, F> {
    fn default() -> Self {
        Self {
            state: DialogState::Closed,
            subscribers: Subscribers::default(),
        }
    }
}

impl<S, F> ModalFocusController<S, F>
where
    S: Clone + std::fmt::Debug,
    F: Clone + PartialEq + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog for `subject`. Opening while already open closes the
    /// current dialog first (restoring focus) and then opens the new one.
    pub fn open<H: FocusHost<F>>(&mut self, subject: S, spec: DialogSpec<F>, host: &mut H) {
        if self.is_open() {
            self.close(host);
        }
        let previously_focused = host.focused();
        tracing::debug!(?subject, ?previously_focused, "dialog opened");
        let initial = spec.initial.clone();
        self.state = DialogState::Open(DialogFocusState {
            subject: subject.clone(),
            previously_focused,
            spec,
        });
        self.subscribers.notify(DialogEvent::Opened { subject });
        self.move_focus(host, initial);
    }

    /// Close the dialog and hand focus back to whatever had it before, if
    /// that target is still attached. Returns the restored target.
    pub fn close<H: FocusHost<F>>(&mut self, host: &mut H) -> Option<F> {
        let DialogState::Open(open) = std::mem::replace(&mut self.state, DialogState::Closed) else {
            return None;
        };
        let restored = open
            .previously_focused
            .filter(|prev| host.is_attached(prev));
        if let Some(prev) = &restored {
            host.focus(prev);
        }
        tracing::debug!(subject = ?open.subject, ?restored, "dialog closed");
        self.subscribers.notify(DialogEvent::Closed {
            restored: restored.clone(),
        });
        restored
    }

    pub fn handle_key<H: FocusHost<F>>(&mut self, key: DialogKey, host: &mut H) -> KeyOutcome {
        let DialogState::Open(open) = &self.state else {
            return KeyOutcome::Ignored;
        };
        match key {
            DialogKey::Escape => {
                self.close(host);
                KeyOutcome::Closed
            }
            DialogKey::Tab | DialogKey::BackTab => {
                let (Some(first), Some(last)) =
                    (open.spec.focusables.first(), open.spec.focusables.last())
                else {
                    return KeyOutcome::Ignored;
                };
                let current = host.focused();
                let wrap_to = match key {
                    DialogKey::Tab if current.as_ref() == Some(last) => first.clone(),
                    DialogKey::BackTab if current.as_ref() == Some(first) => last.clone(),
                    _ => return KeyOutcome::Ignored,
                };
                self.move_focus(host, wrap_to);
                KeyOutcome::Wrapped
            }
            DialogKey::Other => KeyOutcome::Ignored,
        }
    }

    /// Close on a backdrop click; clicks on the panel are left alone.
    pub fn handle_click<H: FocusHost<F>>(&mut self, click: DialogClick, host: &mut H) -> bool {
        if self.is_open() && click == DialogClick::Backdrop {
            self.close(host);
            true
        } else {
            false
        }
    }

    fn move_focus<H: FocusHost<F>>(&mut self, host: &mut H, target: F) {
        host.focus(&target);
        self.subscribers.notify(DialogEvent::FocusMoved { target });
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open(_))
    }

    pub fn subject(&self) -> Option<&S> {
        match &self.state {
            DialogState::Open(open) => Some(&open.subject),
            DialogState::Closed => None,
        }
    }

    pub fn focus_state(&self) -> Option<&DialogFocusState<S, F>> {
        match &self.state {
            DialogState::Open(open) => Some(open),
            DialogState::Closed => None,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<DialogEvent<S, F>> {
        self.subscribers.subscribe()
    }
}

use std::cell::RefCell;

use crate::error::EventBusError;
use crate::event::{EditorEvent, EventHandler};

/// A synchronous event bus scoped to one editor instance.
///
/// Subscriptions are named so they can be revoked individually. Handlers run
/// in subscription order, all of them before `emit` returns. While handlers
/// run the bus is locked: nested emits are dropped and subscription changes
/// are refused.
pub struct EventBus {
    handlers: RefCell<Vec<(String, Box<dyn EventHandler>)>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.try_borrow().map(|h| h.len()).ok())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler under a unique name
    pub fn subscribe(&self, name: &str, handler: impl EventHandler + 'static) -> Result<(), EventBusError> {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("Can't subscribe {:?} while an event is being handled", name);
            return Err(EventBusError::Busy);
        };
        if handlers.iter().any(|(existing, _)| existing == name) {
            return Err(EventBusError::DuplicateSubscription(name.to_owned()));
        }
        handlers.push((name.to_owned(), Box::new(handler)));
        Ok(())
    }

    /// Revoke a subscription. Returns false if no subscription had that name
    /// or the bus is busy emitting.
    pub fn unsubscribe(&self, name: &str) -> bool {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("Can't unsubscribe {:?} while an event is being handled", name);
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| existing != name);
        handlers.len() != before
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.handlers
            .try_borrow()
            .is_ok_and(|handlers| handlers.iter().any(|(existing, _)| existing == name))
    }

    /// Emit an event to all registered handlers
    pub fn emit(&self, event: EditorEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("Dropped re-entrant {} event", event.name());
            return;
        };
        log::trace!("emit {}", event.name());
        for (_, handler) in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }
}

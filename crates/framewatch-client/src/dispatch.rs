use std::collections::HashMap;

use framewatch_wire::Message;

use crate::error::{ClientError, Result};

/// A message handler over some context `Ctx`.
pub type Handler<Ctx> = Box<dyn FnMut(&mut Ctx, &Message) -> Result<()>>;

/// How a message was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A handler registered for the message type ran.
    Handled,
    /// No handler matched; the fallback ran.
    Fallback,
}

/// Routes messages by type to exactly one handler.
///
/// Types without a handler go to the fallback, so nothing is dropped.
pub struct Dispatcher<Ctx> {
    handlers: HashMap<String, Handler<Ctx>>,
    fallback: Handler<Ctx>,
}

impl<Ctx> Dispatcher<Ctx> {
    pub fn new<F>(fallback: F) -> Self
    where
        F: FnMut(&mut Ctx, &Message) -> Result<()> + 'static,
    {
        Self {
            handlers: HashMap::new(),
            fallback: Box::new(fallback),
        }
    }

    /// Register the handler for `msg_type`.
    ///
    /// Fails with [`ClientError::DuplicateHandler`] if one is already
    /// registered; the existing handler is kept.
    pub fn register<F>(&mut self, msg_type: impl Into<String>, handler: F) -> Result<()>
    where
        F: FnMut(&mut Ctx, &Message) -> Result<()> + 'static,
    {
        let msg_type = msg_type.into();
        if self.handlers.contains_key(&msg_type) {
            return Err(ClientError::DuplicateHandler(msg_type));
        }
        self.handlers.insert(msg_type, Box::new(handler));
        Ok(())
    }

    /// Replace the fallback handler.
    pub fn set_fallback<F>(&mut self, fallback: F)
    where
        F: FnMut(&mut Ctx, &Message) -> Result<()> + 'static,
    {
        self.fallback = Box::new(fallback);
    }

    /// Run the handler for `message.msg_type`, or the fallback.
    ///
    /// The route is reported alongside the handler's own result.
    pub fn dispatch(&mut self, ctx: &mut Ctx, message: &Message) -> (Route, Result<()>) {
        match self.handlers.get_mut(&message.msg_type) {
            Some(handler) => (Route::Handled, handler(ctx, message)),
            None => (Route::Fallback, (self.fallback)(ctx, message)),
        }
    }

    pub fn has_handler(&self, msg_type: &str) -> bool {
        self.handlers.contains_key(msg_type)
    }

    /// Registered message types, in no particular order.
    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<Ctx> std::fmt::Debug for Dispatcher<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.message_types().collect();
        types.sort_unstable();
        f.debug_struct("Dispatcher").field("handlers", &types).finish()
    }
}

use std::cell::Cell;
use std::rc::Rc;

use framewatch_store::{Event, EventKind, TelemetryStore};

/// Redraw dirty flag shared between collection observers and a view.
///
/// Observers mark it on every mutation; the redraw tick takes it and skips
/// layout work when nothing changed.
#[derive(Debug, Clone, Default)]
pub struct Invalidation {
    dirty: Rc<Cell<bool>>,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Return the flag and clear it.
    pub fn take(&self) -> bool {
        self.dirty.replace(false)
    }

    /// A collection observer that marks this flag.
    pub fn observer<I, C>(&self) -> impl FnMut(Event<'_, I, C>) + 'static
    where
        I: ?Sized + 'static,
        C: ?Sized + 'static,
    {
        let dirty = Rc::clone(&self.dirty);
        move |_event| dirty.set(true)
    }

    /// Mark on any mutation of the collections a view draws from.
    pub fn watch_store(&self, store: &mut TelemetryStore) -> framewatch_store::Result<()> {
        store.tasks.subscribe(EventKind::Any, self.observer())?;
        store.frame_dt.subscribe(EventKind::Any, self.observer())?;
        store.frame_raw_dt.subscribe(EventKind::Any, self.observer())?;
        store.memory.subscribe(EventKind::Change, self.observer())?;
        Ok(())
    }
}

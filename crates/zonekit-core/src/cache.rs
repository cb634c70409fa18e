//! Memoized collections
//!
//! A [`CollectionCache`] holds the materialized result of an expensive
//! listing. It is filled on first access and emptied by an explicit
//! [`CollectionCache::invalidate`]; it is never patched in place.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;

/// Single-threaded memo of one collection
pub struct CollectionCache<T> {
    /// Name used in log lines (e.g. "records")
    name: &'static str,
    slot: RefCell<Option<Rc<T>>>,
}

impl<T> CollectionCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RefCell::new(None),
        }
    }

    /// Return the memo, computing it with `load` when empty
    ///
    /// A failed `load` leaves the cache empty.
    pub fn get_or_load(&self, load: impl FnOnce() -> Result<T>) -> Result<Rc<T>> {
        if let Some(value) = self.slot.borrow().as_ref() {
            return Ok(Rc::clone(value));
        }

        tracing::debug!(cache = self.name, "Loading collection");
        // The slot is not borrowed while `load` runs, so it may invalidate
        // other caches freely.
        let value = Rc::new(load()?);
        *self.slot.borrow_mut() = Some(Rc::clone(&value));
        Ok(value)
    }

    /// Discard the memo so the next read recomputes it
    pub fn invalidate(&self) {
        if self.slot.borrow_mut().take().is_some() {
            tracing::debug!(cache = self.name, "Invalidated collection");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T> std::fmt::Debug for CollectionCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionCache")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

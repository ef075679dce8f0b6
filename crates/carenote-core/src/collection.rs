//! Client-side mirror of a server-owned collection.
//!
//! Local mutations are applied immediately. The next fetch replaces the whole
//! collection, so a mutation the server did not keep is overwritten.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{NotificationId, NotificationItem};

/// Records addressable by a server identifier
pub trait Identified {
    type Id: PartialEq + Clone;

    fn id(&self) -> &Self::Id;
}

impl Identified for NotificationItem {
    type Id = NotificationId;

    fn id(&self) -> &NotificationId {
        &self.id
    }
}

/// Shared, cloneable handle to the last known list of records.
#[derive(Debug)]
pub struct OptimisticCollection<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for OptimisticCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for OptimisticCollection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Identified + Clone> OptimisticCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite everything with a server response.
    pub fn replace_all(&self, items: Vec<T>) {
        *self.lock() = items;
    }

    /// Apply `change` to the record with `id`. Returns false when absent.
    pub fn update(&self, id: &T::Id, change: impl FnOnce(&mut T)) -> bool {
        let mut items = self.lock();
        match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                change(item);
                true
            }
            None => false,
        }
    }

    /// Apply `change` to every record, returning the ids it reported as changed.
    pub fn update_where(&self, mut change: impl FnMut(&mut T) -> bool) -> Vec<T::Id> {
        self.lock()
            .iter_mut()
            .filter_map(|item| change(item).then(|| item.id().clone()))
            .collect()
    }

    /// Append a locally created record, replacing one with the same id.
    pub fn push(&self, item: T) {
        let mut items = self.lock();
        if let Some(existing) = items.iter_mut().find(|existing| existing.id() == item.id()) {
            *existing = item;
        } else {
            items.push(item);
        }
    }

    pub fn remove(&self, id: &T::Id) -> Option<T> {
        let mut items = self.lock();
        let index = items.iter().position(|item| item.id() == id)?;
        Some(items.remove(index))
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.lock().iter().find(|item| item.id() == id).cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Count records matching `predicate`, computed from the current contents.
    pub fn count(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.lock().iter().filter(|item| predicate(item)).count()
    }
}

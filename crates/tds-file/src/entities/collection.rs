//! Keyed, insertion-ordered entity lists.

use tds_core::CoreError;

use crate::error::FileError;
use crate::xml::Element;

/// An entity that round-trips through one XML element.
pub trait XmlEntity: Sized {
    fn from_element(element: &Element) -> Result<Self, FileError>;
    fn to_element(&self) -> Element;
}

/// An entity with a lookup key unique within its list.
pub trait Keyed {
    /// Entity name used in not-found and duplicate-key errors.
    const ENTITY: &'static str;

    fn key(&self) -> &str;
}

/// Ordered list of keyed entities. Order is insertion order and is the order
/// the entities are written back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> EntityList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entities read from a document as they are.
    #[must_use]
    pub const fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.key() == key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Append a new entity; fails when the key is taken.
    pub fn add(&mut self, item: T) -> Result<(), CoreError> {
        if self.contains_key(item.key()) {
            return Err(CoreError::duplicate(T::ENTITY, item.key()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace the entity with the same key, keeping its position.
    pub fn update(&mut self, item: T) -> Result<(), CoreError> {
        let index = self
            .position(item.key())
            .ok_or_else(|| CoreError::not_found(T::ENTITY, item.key()))?;
        self.items[index] = item;
        Ok(())
    }

    /// Update when present, append otherwise.
    pub fn upsert(&mut self, item: T) {
        match self.position(item.key()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    pub fn delete(&mut self, key: &str) -> Result<T, CoreError> {
        let index = self
            .position(key)
            .ok_or_else(|| CoreError::not_found(T::ENTITY, key))?;
        Ok(self.items.remove(index))
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Keyed::key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: XmlEntity> EntityList<T> {
    pub(crate) fn to_elements(&self) -> Vec<Element> {
        self.items.iter().map(XmlEntity::to_element).collect()
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

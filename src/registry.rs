//! Insertion-ordered mapping with unique string keys.
//!
//! Model comparison runs in the order models were registered and ties in the
//! ranking keep that order, so a `HashMap` is not enough here.

use crate::error::{Result, TmdError};

/// Ordered name -> value mapping
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; names must be unique
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(TmdError::DuplicateName(name));
        }
        self.entries.push((name, value));
        Ok(())
    }

    /// Builder form of [`Registry::insert`]
    pub fn with(mut self, name: impl Into<String>, value: T) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove an entry, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.iter_mut().map(|(n, v)| (n.as_str(), v))
    }

    /// Map every value, keeping names and order
    pub fn map<U, F>(&self, mut f: F) -> Registry<U>
    where
        F: FnMut(&str, &T) -> U,
    {
        Registry {
            entries: self
                .entries
                .iter()
                .map(|(n, v)| (n.clone(), f(n, v)))
                .collect(),
        }
    }
}

impl<T> IntoIterator for Registry<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut reg = Registry::new();
        reg.insert("b", 2).unwrap();
        reg.insert("a", 1).unwrap();
        reg.insert("c", 3).unwrap();

        let names: Vec<&str> = reg.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = Registry::new();
        reg.insert("knn", 1).unwrap();
        let err = reg.insert("knn", 2).unwrap_err();
        assert!(matches!(err, TmdError::DuplicateName(ref n) if n == "knn"));
        assert_eq!(reg.get("knn"), Some(&1));
    }

    #[test]
    fn test_map_keeps_keys() {
        let reg = Registry::new().with("x", 2).unwrap().with("y", 5).unwrap();
        let doubled = reg.map(|_, v| v * 2);
        assert_eq!(doubled.get("x"), Some(&4));
        assert_eq!(doubled.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_remove() {
        let mut reg = Registry::new().with("x", 1).unwrap().with("y", 2).unwrap();
        assert_eq!(reg.remove("x"), Some(1));
        assert_eq!(reg.len(), 1);
        assert!(reg.remove("x").is_none());
    }
}

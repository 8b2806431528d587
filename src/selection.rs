//! The set of issue keys marked for bulk actions.
//!
//! Lives only in router memory, never persisted. Keys enter the set by being
//! toggled on a visible list row, so membership always reflects something
//! the user saw.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
  keys: BTreeSet<String>,
}

impl SelectionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add the key if absent, remove it if present.
  pub fn toggle(&mut self, key: &str) {
    if !self.keys.remove(key) {
      self.keys.insert(key.to_string());
    }
  }

  pub fn contains(&self, key: &str) -> bool {
    self.keys.contains(key)
  }

  pub fn clear(&mut self) {
    self.keys.clear();
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  pub fn keys(&self) -> Vec<String> {
    self.keys.iter().cloned().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn toggle_adds_then_removes() {
    let mut sel = SelectionSet::new();
    sel.toggle("PROJ-1");
    assert!(sel.contains("PROJ-1"));
    assert_eq!(sel.len(), 1);

    sel.toggle("PROJ-1");
    assert!(!sel.contains("PROJ-1"));
    assert!(sel.is_empty());
  }

  #[test]
  fn clear_empties_everything() {
    let mut sel = SelectionSet::new();
    sel.toggle("PROJ-1");
    sel.toggle("PROJ-2");
    sel.clear();
    assert!(sel.is_empty());
  }
}

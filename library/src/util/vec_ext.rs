//! Ordered-set helpers for the small `Vec`s used as back-reference lists
//! (port connector lists, block connector lists, chunk children).

/// Set-like operations on a `Vec` that keep insertion order.
pub trait VecSetExt<T: PartialEq> {
    /// Pushes `value` unless an equal element is already present.
    /// Returns `true` when the value was pushed.
    fn add_unique(&mut self, value: T) -> bool;

    /// Removes every element equal to `value`.
    /// Returns `true` when something was removed.
    fn remove_value(&mut self, value: &T) -> bool;
}

impl<T: PartialEq> VecSetExt<T> for Vec<T> {
    fn add_unique(&mut self, value: T) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.push(value);
        true
    }

    fn remove_value(&mut self, value: &T) -> bool {
        let before = self.len();
        self.retain(|v| v != value);
        before != self.len()
    }
}

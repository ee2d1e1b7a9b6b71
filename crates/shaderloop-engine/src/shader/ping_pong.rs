/// Two values in fixed slots with a movable "current" role.
///
/// Swapping flips a single index; neither value moves. The other slot holds the
/// "next" role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    pub fn new(current: T, next: T) -> Self {
        Self {
            slots: [current, next],
            current: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn next(&self) -> &T {
        &self.slots[1 - self.current]
    }

    /// Slot (0 or 1) holding the current role.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Exchanges the roles.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_roles() {
        let mut pair = PingPong::new("a", "b");
        pair.swap();
        assert_eq!((*pair.current(), *pair.next()), ("b", "a"));
        assert_eq!(pair.current_index(), 1);
    }

    #[test]
    fn swap_is_self_inverse() {
        let original = PingPong::new(1, 2);
        let mut pair = original.clone();
        for n in 1..=6 {
            pair.swap();
            if n % 2 == 0 {
                assert_eq!(pair, original);
            } else {
                assert_ne!(pair, original);
                assert_eq!(pair.current(), original.next());
            }
        }
    }

    #[test]
    fn values_stay_in_their_slots() {
        let mut pair = PingPong::new(String::from("in"), String::from("out"));
        let slot_zero = pair.current().as_ptr();
        pair.swap();
        assert_eq!(pair.current_index(), 1);
        assert_eq!(pair.next().as_ptr(), slot_zero);
        assert_eq!(pair.current(), "out");
    }
}

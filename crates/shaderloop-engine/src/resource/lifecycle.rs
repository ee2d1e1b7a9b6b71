/// Observable lifecycle of a device-side object.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    /// No device object exists yet; the next acquire allocates it.
    Unallocated,
    /// The device object exists and is reused across frames.
    Allocated,
    /// The device object was released. Terminal.
    Disposed,
}

/// Device object slot with an explicit `Unallocated -> Allocated -> Disposed` lifecycle.
#[derive(Debug)]
pub(crate) enum Lifecycle<T> {
    Unallocated,
    Allocated(T),
    Disposed,
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Self::Unallocated
    }
}

impl<T> Lifecycle<T> {
    pub(crate) fn state(&self) -> LifecycleState {
        match self {
            Self::Unallocated => LifecycleState::Unallocated,
            Self::Allocated(_) => LifecycleState::Allocated,
            Self::Disposed => LifecycleState::Disposed,
        }
    }

    pub(crate) fn get(&self) -> Option<&T> {
        match self {
            Self::Allocated(value) => Some(value),
            _ => None,
        }
    }

    /// Moves to `Disposed`, returning the device object if one was allocated.
    pub(crate) fn dispose(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::Disposed) {
            Self::Allocated(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_is_terminal_and_idempotent() {
        let mut slot = Lifecycle::Allocated(7);
        assert_eq!(slot.state(), LifecycleState::Allocated);
        assert_eq!(slot.dispose(), Some(7));
        assert_eq!(slot.state(), LifecycleState::Disposed);
        assert_eq!(slot.dispose(), None);
        assert_eq!(slot.state(), LifecycleState::Disposed);
    }

    #[test]
    fn disposing_unallocated_yields_nothing() {
        let mut slot: Lifecycle<u8> = Lifecycle::default();
        assert_eq!(slot.state(), LifecycleState::Unallocated);
        assert!(slot.get().is_none());
        assert_eq!(slot.dispose(), None);
    }
}

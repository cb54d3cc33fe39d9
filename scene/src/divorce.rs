use fixedbitset::FixedBitSet;

/// Per-instance record of which variables were explicitly overridden.
///
/// Bits are keyed by [`VariableDescriptor::index`](crate::VariableDescriptor::index).
/// A divorced variable keeps its own value when the prototype changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DivorceTracker {
    bits: FixedBitSet,
}

impl DivorceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_divorced(&self, index: usize) -> bool {
        self.bits.contains(index)
    }

    pub fn set_divorced(&mut self, index: usize, divorced: bool) {
        if divorced {
            self.bits.grow(index + 1);
            self.bits.insert(index);
        } else if index < self.bits.len() {
            self.bits.set(index, false);
        }
    }

    /// Divorced variable indices, ascending.
    pub fn divorced_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    pub fn any(&self) -> bool {
        self.bits.count_ones(..) > 0
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_flags() {
        let mut tracker = DivorceTracker::new();
        assert!(!tracker.any());
        assert!(!tracker.is_divorced(40));

        tracker.set_divorced(3, true);
        tracker.set_divorced(40, true);
        assert!(tracker.is_divorced(3));
        assert_eq!(tracker.divorced_indices().collect::<Vec<_>>(), [3, 40]);

        tracker.set_divorced(3, false);
        tracker.set_divorced(100, false);
        assert!(!tracker.is_divorced(3));
        assert!(tracker.any());

        tracker.clear();
        assert!(!tracker.any());
    }
}

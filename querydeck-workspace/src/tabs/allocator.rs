use querydeck_utils::data::ScriptId;

/// Hands out placeholder ids for scripts that have not been saved yet.
///
/// Ids start at -1 and only ever decrease, so they cannot collide with
/// store-issued ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempIdAllocator {
    next: i64,
}

impl TempIdAllocator {
    pub fn new() -> Self {
        Self { next: -1 }
    }

    /// Value the next call to `next_id` will return.
    pub fn peek(&self) -> i64 {
        self.next
    }

    pub fn next_id(&mut self) -> ScriptId {
        let id = self.next;
        self.next -= 1;
        ScriptId::Temporary(id)
    }

    /// Never move the counter back above a value a restored snapshot may
    /// already reference.
    pub fn reconcile(&mut self, restored_next: i64) {
        self.next = self.next.min(restored_next);
    }
}

impl Default for TempIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_decrease() {
        let mut allocator = TempIdAllocator::new();
        assert_eq!(allocator.next_id(), ScriptId::Temporary(-1));
        assert_eq!(allocator.next_id(), ScriptId::Temporary(-2));
        assert_eq!(allocator.next_id(), ScriptId::Temporary(-3));
        assert_eq!(allocator.peek(), -4);
    }

    #[test]
    fn test_reconcile_only_moves_down() {
        let mut allocator = TempIdAllocator::new();
        allocator.reconcile(-7);
        assert_eq!(allocator.next_id(), ScriptId::Temporary(-7));

        allocator.reconcile(-2);
        assert_eq!(allocator.peek(), -8);
    }

    #[test]
    fn test_reconcile_ignores_non_negative_counters() {
        let mut allocator = TempIdAllocator::new();
        allocator.reconcile(4);
        assert_eq!(allocator.peek(), -1);
    }
}

//! UUID surrogate ids.

use matchsync_engine::{IdGenerator, SurrogateId};
use uuid::Uuid;

/// Mints a random v4 UUID for every new row.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> SurrogateId {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_uuids() {
        let mut ids = UuidIds;
        let minted: HashSet<_> = (0..100).map(|_| ids.next_id()).collect();
        assert_eq!(minted.len(), 100);
        assert!(minted.iter().all(|id| Uuid::parse_str(id).is_ok()));
    }
}

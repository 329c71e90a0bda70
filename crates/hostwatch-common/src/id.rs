use uuid::Uuid;

/// Generates a random alert event id (UUID v4, hyphenated).
pub fn next_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_next_id_returns_unique_ids() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = next_id();
            assert!(!id.is_empty());
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_next_id_is_uuid() {
        let id = next_id();
        assert!(Uuid::parse_str(&id).is_ok(), "ID should be a valid UUID: {}", id);
    }
}

// Identifier helpers.
//
// Agent actions use UUIDv7 so ids sort by creation time; user ids carry no
// ordering and use random v4 ids.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a random UUIDv4.
pub fn uuidv4() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn uuidv4_is_random() {
        let id = uuidv4();
        assert_eq!(id.get_version(), Some(uuid::Version::Random));
        assert_ne!(id, uuidv4());
    }
}

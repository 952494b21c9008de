use uuid::Uuid;

/// New record ids are v7 so that lexicographic order tracks creation time.
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

use super::checkpoint_record::CheckpointRecord;

/// Persists the checkpoint record.
///
/// `save` must be atomic and durable: after it returns, a crash leaves
/// either the previous record or the new one, never a mix.
pub trait CheckpointStore: Send {
    /// `Ok(None)` when no record exists. An unreadable record is an error.
    fn load(&self) -> Result<Option<CheckpointRecord>, Box<dyn std::error::Error>>;

    fn save(&self, record: &CheckpointRecord) -> Result<(), Box<dyn std::error::Error>>;

    fn clear(&self) -> Result<(), Box<dyn std::error::Error>>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write lock poisoned")]
    LockPoisoned,
    #[error("storage error: {0}")]
    Storage(String),
}

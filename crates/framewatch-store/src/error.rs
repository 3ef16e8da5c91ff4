/// Errors that can occur when using a collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The collection only reports whole-content changes.
    #[error("push events aren't supported by this collection")]
    PushNotSupported,
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid rich-text JSON: {0}")]
    Json(#[from] serde_json::Error),
}

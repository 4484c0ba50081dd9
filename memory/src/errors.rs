use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Failed to load tokenizer {name}: {message}")]
    Load { name: String, message: String },
}

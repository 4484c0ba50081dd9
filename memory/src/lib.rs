// The scheduler-memory crate holds the conversation state of one session:
// - Turn and role data structures
// - The ordered transcript with prefix condensation
// - Tokenizers used to estimate transcript size

pub mod errors;
pub mod tokenizer;
pub mod transcript;
pub mod turn;

pub use errors::TokenizerError;
pub use tokenizer::{Cl100kTokenizer, Tokenizer, WordTokenizer};
pub use transcript::Transcript;
pub use turn::{ActionRequest, Role, Turn, SUMMARY_PREFIX};

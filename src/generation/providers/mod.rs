//! Concrete generation provider implementations.

mod openai;
mod replicate;

pub use openai::OpenAiProvider;
pub use replicate::ReplicateProvider;

// Adapters layer: concrete implementations of the domain ports (storage, LLM provider).

pub mod gemini;
pub mod storage;

pub use gemini::GeminiClient;
pub use storage::LocalStorage;

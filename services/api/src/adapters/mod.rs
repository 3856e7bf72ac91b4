pub mod definition_llm;
pub mod kv_store;

pub use definition_llm::OpenAiDefinitionAdapter;
pub use kv_store::SqliteKvStore;

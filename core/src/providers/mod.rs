pub mod factory;
pub mod inline;
pub mod openai;
pub mod scripted;

pub use factory::create_provider;
pub use openai::OpenAIProvider;
pub use scripted::{RecordedRequest, ScriptedProvider};

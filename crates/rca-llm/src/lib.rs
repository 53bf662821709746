//! LLM-provider façade for the root-cause-analysis engine: a generic
//! prompt/response client trait, two illustrative provider
//! implementations, and the causal-reasoning façade that enriches a
//! heuristic analysis result with an LLM narrative when a provider is
//! configured and reachable.

pub mod facade;
pub mod groq_client;
pub mod llm_client;
pub mod ollama_client;

pub use facade::{build_prompt, CausalReasoningFacade};
pub use groq_client::GroqClient;
pub use llm_client::{LlmClient, LlmError, LlmProvider};
pub use ollama_client::OllamaClient;

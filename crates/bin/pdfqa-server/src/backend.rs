use std::sync::Arc;

use pdfqa_core::answer::{
    AnsweringEngine,
    AnsweringStrategy,
    ChatCompletionsClient,
    GenerationClient,
    GenerationStrategy,
    HeuristicStrategy,
    RetrievalStrategy,
};

use crate::config::{BackendConfig, LlmSettings, QaConfig};

pub fn build_engine(config: &QaConfig) -> AnsweringEngine {
    let strategy: Arc<dyn AnsweringStrategy> = match &config.backend {
        BackendConfig::Heuristic => Arc::new(HeuristicStrategy),
        BackendConfig::Generation(llm) => Arc::new(GenerationStrategy::new(build_client(llm))),
        BackendConfig::Retrieval { llm, top_k } => {
            Arc::new(RetrievalStrategy::new(build_client(llm)).with_top_k(*top_k))
        }
    };

    let engine = AnsweringEngine::new(strategy);
    match config.answer_timeout {
        Some(timeout) => engine.with_timeout(timeout),
        None => engine,
    }
}

fn build_client(llm: &LlmSettings) -> Arc<dyn GenerationClient> {
    Arc::new(
        ChatCompletionsClient::new(llm.api_key.clone(), llm.model.clone())
            .with_base_url(&llm.base_url),
    )
}

//! Shared test doubles

use async_trait::async_trait;
use mockall::mock;
use ranker_llm::{CompletionRequest, CompletionResponse, LLMProvider};

mock! {
    pub Provider {}

    #[async_trait]
    impl LLMProvider for Provider {
        async fn complete(&self, request: CompletionRequest) -> ranker_llm::Result<CompletionResponse>;
        fn name(&self) -> &str;
    }
}

/// Provider that answers every request with `text`
pub fn replying(text: &'static str) -> MockProvider {
    let mut provider = MockProvider::new();
    provider
        .expect_complete()
        .returning(move |_| Ok(CompletionResponse::from_text(text)));
    provider.expect_name().return_const("mock".to_string());
    provider
}

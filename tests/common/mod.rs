/*!
 * Common test utilities shared by unit and integration tests
 */

pub mod mock_transport;

use std::sync::Arc;

use doctrans::app_config::PipelineConfig;
use doctrans::cache::TranslationCache;
use doctrans::glossary::Glossary;
use doctrans::providers::{ChatTransport, ProviderSpec};
use doctrans::translation::prompts::PromptTemplate;
use doctrans::translation::TranslationService;

/// A provider spec pointing nowhere; tests never hit the network
pub fn test_provider() -> ProviderSpec {
    ProviderSpec {
        id: "mock".to_string(),
        label: "Mock provider".to_string(),
        kind: "openai".to_string(),
        requires_api_key: false,
        api_key: String::new(),
        api_key_env: String::new(),
        base_url: "http://localhost:9".to_string(),
        model: "mock-model".to_string(),
        timeout_ms: None,
        temperature: None,
        top_p: None,
    }
}

/// A service wired to the given transport with an in-memory cache
pub fn test_service(transport: Arc<dyn ChatTransport>, pipeline: PipelineConfig) -> TranslationService {
    test_service_with_glossary(transport, pipeline, Glossary::disabled())
}

/// Same as `test_service`, with a custom glossary
pub fn test_service_with_glossary(
    transport: Arc<dyn ChatTransport>,
    pipeline: PipelineConfig,
    glossary: Glossary,
) -> TranslationService {
    let cache = TranslationCache::open_in_memory().unwrap();
    let prompt = PromptTemplate::resolve("en", "fr", None, "documentTranslation");
    TranslationService::new(
        test_provider(),
        transport,
        cache,
        glossary,
        prompt,
        pipeline,
        "en",
        "fr",
    )
}

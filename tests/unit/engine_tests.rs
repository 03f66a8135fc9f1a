/*!
 * Unit tests for the translation service orchestration
 */

use std::sync::Arc;

use doctrans::app_config::PipelineConfig;
use doctrans::glossary::{Glossary, GlossaryEntry, GlossaryOptions};
use doctrans::translation::core::TextKind;

use crate::common::mock_transport::{MockErrorType, MockTransport};
use crate::common::{test_service, test_service_with_glossary};

fn pipeline() -> PipelineConfig {
    PipelineConfig::default()
}

#[tokio::test]
async fn test_translateText_withUppercaseTransport_shouldTranslateAllParagraphs() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    let input = "first paragraph.\n\nsecond paragraph.\n\n\nthird paragraph.";
    let (translated, meta) = service
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();

    assert_eq!(
        translated,
        "FIRST PARAGRAPH.\n\nSECOND PARAGRAPH.\n\n\nTHIRD PARAGRAPH."
    );
    assert_eq!(meta.chunks, 3);
    assert_eq!(meta.cached_chunks, 0);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_translateText_withScrambledCompletionOrder_shouldKeepInputOrder() {
    // The first chunk finishes last; reassembly must not care
    let transport = Arc::new(MockTransport::uppercase().with_delays(&[120, 60, 10]));
    let service = test_service(transport, pipeline());

    let input = "alpha one.\n\nbravo two.\n\ncharlie three.";
    let (translated, _) = service
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();

    assert_eq!(translated, "ALPHA ONE.\n\nBRAVO TWO.\n\nCHARLIE THREE.");
}

#[tokio::test]
async fn test_translateText_withSequentialConcurrency_shouldMatchConcurrentOutput() {
    let input = "alpha one.\n\nbravo two.\n\ncharlie three.";

    let concurrent = test_service(Arc::new(MockTransport::uppercase()), pipeline());
    let sequential_pipeline = PipelineConfig {
        concurrency: 1,
        ..pipeline()
    };
    let sequential = test_service(Arc::new(MockTransport::uppercase()), sequential_pipeline);

    let (a, _) = concurrent
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();
    let (b, _) = sequential
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_translateText_withRepeatedRun_shouldAnswerFromCache() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    let input = "cache me.\n\ncache me too.";
    let (first, meta_first) = service
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(meta_first.cached_chunks, 0);
    let calls_after_first = transport.call_count();

    let (second, meta_second) = service
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(meta_second.cached_chunks, meta_second.chunks);
    // No additional provider traffic on the second run
    assert_eq!(transport.call_count(), calls_after_first);
}

#[tokio::test]
async fn test_translateText_withDryRun_shouldReturnInputWithoutCalls() {
    let transport = Arc::new(MockTransport::uppercase());
    let dry = PipelineConfig {
        dry_run: true,
        ..pipeline()
    };
    let service = test_service(transport.clone(), dry);

    let input = "leave me alone.\n\nme as well.";
    let (translated, meta) = service
        .translate_text(input, TextKind::Plain, None)
        .await
        .unwrap();

    assert_eq!(translated, input);
    assert_eq!(meta.chunks, 2);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_translateText_withFailingTransport_shouldFailWholeRun() {
    let transport =
        Arc::new(MockTransport::uppercase().fail_next_calls(100, MockErrorType::Api(500)));
    let service = test_service(transport, pipeline());

    let result = service
        .translate_text("one.\n\ntwo.", TextKind::Plain, None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_translateText_withUsageReports_shouldAccumulateTokens() {
    // The mock reports 3 input / 5 output tokens per call
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport, pipeline());

    let (_, meta) = service
        .translate_text("a one.\n\nb two.\n\nc three.", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(meta.usage.input_tokens, 9);
    assert_eq!(meta.usage.output_tokens, 15);
}

#[tokio::test]
async fn test_translateText_withoutUsageBlock_shouldCountZeroTokens() {
    let transport = Arc::new(MockTransport::uppercase().without_usage());
    let service = test_service(transport, pipeline());

    let (_, meta) = service
        .translate_text("no usage here.", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(meta.usage.input_tokens, 0);
    assert_eq!(meta.usage.output_tokens, 0);
}

#[tokio::test]
async fn test_translateText_withMarkdown_shouldShieldCodeFromTransport() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    let input = "intro text\n\n```rust\nlet keep_me = 1;\n```\n\nuse `cargo test` via [docs](https://example.com/path).";
    let (translated, _) = service
        .translate_text(input, TextKind::Markdown, None)
        .await
        .unwrap();

    // Code, inline code and URLs survive byte for byte
    assert!(translated.contains("```rust\nlet keep_me = 1;\n```"));
    assert!(translated.contains("`cargo test`"));
    assert!(translated.contains("(https://example.com/path)"));
    assert!(translated.contains("INTRO TEXT"));
    // And none of them ever reached the transport
    for call in transport.calls() {
        assert!(!call.contains("keep_me"));
        assert!(!call.contains("cargo test"));
        assert!(!call.contains("example.com"));
    }
}

#[tokio::test]
async fn test_translateText_withGlossaryTerm_shouldPinTargetTerm() {
    let glossary = Glossary::new(
        vec![GlossaryEntry {
            source: "pipeline".to_string(),
            target: "pipeline de traduction".to_string(),
        }],
        Vec::new(),
        GlossaryOptions::default(),
    );
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service_with_glossary(transport.clone(), pipeline(), glossary);

    let (translated, _) = service
        .translate_text("the pipeline works.", TextKind::Plain, None)
        .await
        .unwrap();

    // The placeholder passed through the transport untouched and came
    // back as the pinned target term
    assert_eq!(translated, "THE pipeline de traduction WORKS.");
    assert!(transport.calls()[0].contains("{{T0001}}"));
    assert!(!transport.calls()[0].contains("pipeline"));
}

#[tokio::test]
async fn test_translateText_withLongParagraph_shouldSplitIntoBudgetedChunks() {
    let transport = Arc::new(MockTransport::identity());
    let small = PipelineConfig {
        max_chars: 200,
        ..pipeline()
    };
    let service = test_service(transport.clone(), small);

    let sentence = "This sentence is around fifty characters long, yes.";
    let input = sentence.repeat(8);
    let (translated, meta) = service
        .translate_text(&input, TextKind::Plain, None)
        .await
        .unwrap();

    assert_eq!(translated, input);
    assert!(meta.chunks > 1);
    for call in transport.calls() {
        assert!(call.chars().count() <= 200);
    }
}

#[tokio::test]
async fn test_translateText_withNormalizeWhitespace_shouldSendRawTextButShareCacheEntries() {
    let transport = Arc::new(MockTransport::uppercase());
    let normalizing = PipelineConfig {
        normalize_whitespace: true,
        ..pipeline()
    };
    let service = test_service(transport.clone(), normalizing);

    let (translated, _) = service
        .translate_text("hello   world", TextKind::Plain, None)
        .await
        .unwrap();

    // Normalization only feeds the cache key; the model sees the raw
    // text and the output keeps its spacing
    assert_eq!(transport.calls()[0], "hello   world");
    assert_eq!(translated, "HELLO   WORLD");

    // A variant that normalizes to the same text hits the cache
    let (_, meta) = service
        .translate_text("hello world", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(meta.cached_chunks, 1);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_translateText_withPaddedResponse_shouldTrimModelOutput() {
    let transport = Arc::new(MockTransport::uppercase_padded());
    let service = test_service(transport, pipeline());

    let (translated, _) = service
        .translate_text("hello there.", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(translated, "HELLO THERE.");
}

#[tokio::test]
async fn test_translateText_withWhitespaceOnlyLeadingSegment_shouldPassItThrough() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    let (translated, meta) = service
        .translate_text("   \n\nhello", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(translated, "   \n\nHELLO");
    // The spaces-only piece never became a chunk
    assert_eq!(meta.chunks, 1);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_textFn_withManyParagraphs_shouldTranslateConcurrently() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    // The boxed closure drives the same concurrent fan-out external
    // adapters use
    let translate = service.text_fn(None);
    let translated = translate("alpha one.\n\nbravo two.\n\ncharlie three.".to_string())
        .await
        .unwrap();
    assert_eq!(translated, "ALPHA ONE.\n\nBRAVO TWO.\n\nCHARLIE THREE.");
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_translateText_withEmptyInput_shouldShortCircuit() {
    let transport = Arc::new(MockTransport::uppercase());
    let service = test_service(transport.clone(), pipeline());

    let (translated, meta) = service
        .translate_text("   \n  ", TextKind::Plain, None)
        .await
        .unwrap();
    assert_eq!(translated, "   \n  ");
    assert_eq!(meta.chunks, 0);
    assert_eq!(transport.call_count(), 0);
}

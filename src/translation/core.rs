/*!
 * The translation service.
 *
 * Drives the full pipeline for one piece of text: markup protection,
 * glossary placeholders, segmentation into size-bounded chunks, cached
 * and concurrent chunk dispatch, then restoration in reverse order.
 * Chunk results are reassembled in input order regardless of completion
 * order, and any chunk failure fails the whole run with no partial
 * output.
 */

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::debug;

use crate::app_config::{Config, PipelineConfig};
use crate::cache::{cache_key, CacheRecord, KeyContext, TranslationCache};
use crate::glossary::Glossary;
use crate::providers::openai::{ChatRequest, OpenAiClient};
use crate::providers::{load_providers, resolve_provider, ChatTransport, ProviderSpec};
use crate::text::protect::{protect_markup, restore_markup, TokenMap};
use crate::text::segment::{merge_short_segments, split_long_text, split_paragraphs};
use crate::text::terms::{
    apply_synonym_fixes, apply_term_placeholders, restore_placeholders, PlaceholderMap,
};

use super::meta::{TokenUsage, TranslationMeta};
use super::prompts::{build_messages, PromptTemplate};

/// How the input text should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// No markup protection
    Plain,
    /// Protect code blocks, inline code and link URLs
    Markdown,
}

/// Result of translating one chunk
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Translated chunk
    pub text: String,
    /// Token usage of the call, zero on a cache hit or dry run
    pub usage: TokenUsage,
    /// Whether the chunk came from the cache
    pub cache_hit: bool,
}

/// One position in the reassembly plan
enum PlanItem {
    /// Separator carried through verbatim
    Verbatim(String),
    /// Index into the chunk list
    Chunk(usize),
}

/// The translation orchestrator.
///
/// Cheap to clone; clones share the transport, cache and glossary.
#[derive(Clone)]
pub struct TranslationService {
    provider: Arc<ProviderSpec>,
    transport: Arc<dyn ChatTransport>,
    cache: TranslationCache,
    glossary: Arc<Glossary>,
    prompt: Arc<PromptTemplate>,
    pipeline: PipelineConfig,
    source_language: String,
    target_language: String,
}

impl TranslationService {
    /// Build a service from explicit parts
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: ProviderSpec,
        transport: Arc<dyn ChatTransport>,
        cache: TranslationCache,
        glossary: Glossary,
        prompt: PromptTemplate,
        pipeline: PipelineConfig,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        TranslationService {
            provider: Arc::new(provider),
            transport,
            cache,
            glossary: Arc::new(glossary),
            prompt: Arc::new(prompt),
            pipeline,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }

    /// Build a service from the application configuration.
    ///
    /// Fails fast on an unusable provider registry, glossary or cache;
    /// nothing is translated until configuration is known good.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = load_providers(&config.providers_file)?;
        let provider = resolve_provider(&providers, config.provider_id.as_deref())?.clone();
        provider.check_available(config.pipeline.dry_run)?;

        let glossary = if config.glossary_enabled {
            match &config.glossary_file {
                Some(path) => Glossary::from_file(path)?,
                None => Glossary::disabled(),
            }
        } else {
            Glossary::disabled()
        };

        let prompt = PromptTemplate::resolve(
            &config.source_language,
            &config.target_language,
            config.prompts_file.as_deref(),
            &config.prompt_key,
        );

        let cache = match &config.cache_db {
            Some(path) => TranslationCache::open(path)?,
            None => TranslationCache::open_default()?,
        };

        let transport: Arc<dyn ChatTransport> =
            Arc::new(OpenAiClient::new(config.pipeline.retry.clone()));

        Ok(TranslationService::new(
            provider,
            transport,
            cache,
            glossary,
            prompt,
            config.pipeline.clone(),
            &config.source_language,
            &config.target_language,
        ))
    }

    /// The active provider
    pub fn provider(&self) -> &ProviderSpec {
        &self.provider
    }

    /// The active glossary digest
    pub fn glossary_hash(&self) -> &str {
        &self.glossary.hash
    }

    /// The active prompt identity
    pub fn prompt_identity(&self) -> &str {
        &self.prompt.identity
    }

    /// Pipeline configuration in effect
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Source language of the run
    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    /// Target language of the run
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translate one piece of text end to end.
    ///
    /// `extra_instruction` is appended to the system prompt for texts
    /// that carry adapter-specific markers; it does not change the
    /// prompt identity, the markers themselves make the cached text
    /// distinct.
    pub async fn translate_text(
        &self,
        text: &str,
        kind: TextKind,
        extra_instruction: Option<&str>,
    ) -> Result<(String, TranslationMeta)> {
        let mut meta = TranslationMeta::default();
        if text.trim().is_empty() {
            return Ok((text.to_string(), meta));
        }
        let started = Instant::now();

        // Protection order: markup first, then glossary terms inside the
        // remaining translatable text. Restoration runs in reverse.
        // Whitespace normalization only ever touches cache keys, inside
        // `translate_chunk`; the text sent to the model stays verbatim.
        let (working, token_map) = match kind {
            TextKind::Markdown => protect_markup(text),
            TextKind::Plain => (text.to_string(), TokenMap::default()),
        };
        let (working, placeholder_map) = if self.glossary.is_empty() {
            (working, PlaceholderMap::new())
        } else {
            apply_term_placeholders(&working, &self.glossary)
        };

        let (plan, chunks) = self.build_plan(&working);
        meta.chunks = chunks.len() as u64;

        let system = match extra_instruction {
            Some(instruction) => format!("{}\n{}", self.prompt.system, instruction),
            None => self.prompt.system.clone(),
        };

        let outcomes = self.translate_chunks(&chunks, &system).await?;

        let mut translated = String::new();
        for item in &plan {
            match item {
                PlanItem::Verbatim(sep) => translated.push_str(sep),
                PlanItem::Chunk(index) => translated.push_str(&outcomes[*index].text),
            }
        }
        for outcome in &outcomes {
            meta.usage.add(outcome.usage);
            if outcome.cache_hit {
                meta.cached_chunks += 1;
            }
        }

        let translated = restore_placeholders(&translated, &placeholder_map);
        let translated = apply_synonym_fixes(&translated, &self.glossary);
        let translated = restore_markup(&translated, &token_map);

        debug!(
            "Translated {} chunk(s) ({} cached) in {:?}",
            meta.chunks,
            meta.cached_chunks,
            started.elapsed()
        );
        Ok((translated, meta))
    }

    /// Translate one chunk through the cache and the transport
    pub async fn translate_chunk(&self, chunk: &str, system: &str) -> Result<ChunkOutcome> {
        let context = KeyContext {
            provider_id: &self.provider.id,
            model: &self.provider.model,
            source_lang: &self.source_language,
            target_lang: &self.target_language,
            glossary_hash: &self.glossary.hash,
            prompt_identity: &self.prompt.identity,
        };
        let key = cache_key(&context, chunk, self.pipeline.normalize_whitespace);

        if let Some(cached) = self.cache.get_async(&key).await? {
            return Ok(ChunkOutcome {
                text: cached,
                usage: TokenUsage::default(),
                cache_hit: true,
            });
        }

        let (translated, usage) = if self.pipeline.dry_run {
            // Identity translation, cached like a real one
            (chunk.to_string(), TokenUsage::default())
        } else {
            let request =
                ChatRequest::for_provider(&self.provider, build_messages(system, chunk));
            let completion = self
                .transport
                .chat(&self.provider, request)
                .await
                .map_err(anyhow::Error::new)?;
            let usage = completion
                .usage
                .as_ref()
                .map(TokenUsage::from_payload)
                .unwrap_or_default();
            (completion.text().trim().to_string(), usage)
        };

        let record = CacheRecord {
            provider_id: self.provider.id.clone(),
            model: self.provider.model.clone(),
            source_lang: self.source_language.clone(),
            target_lang: self.target_language.clone(),
            glossary_hash: self.glossary.hash.clone(),
            prompt_identity: self.prompt.identity.clone(),
            original_text: chunk.to_string(),
            translated_text: translated.clone(),
        };
        self.cache
            .set_async(&key, record)
            .await
            .context("Failed to store translation in cache")?;

        Ok(ChunkOutcome {
            text: translated,
            usage,
            cache_hit: false,
        })
    }

    /// Segment protected text into the reassembly plan and chunk list
    fn build_plan(&self, text: &str) -> (Vec<PlanItem>, Vec<String>) {
        let max_chars = self.pipeline.effective_max_chars();
        let mut segments = split_paragraphs(text);
        if self.pipeline.merge_short_segments {
            segments = merge_short_segments(
                segments,
                self.pipeline.effective_merge_min_chars(),
                max_chars,
            );
        }

        let mut plan = Vec::new();
        let mut chunks = Vec::new();
        for segment in segments {
            if segment.is_separator || segment.text.trim().is_empty() {
                plan.push(PlanItem::Verbatim(segment.text));
                continue;
            }
            for chunk in split_long_text(&segment.text, max_chars) {
                plan.push(PlanItem::Chunk(chunks.len()));
                chunks.push(chunk);
            }
        }
        (plan, chunks)
    }

    /// Dispatch all chunks, bounded by the configured concurrency.
    ///
    /// Results come back in chunk order whatever the completion order;
    /// the first failure aborts the run.
    async fn translate_chunks(&self, chunks: &[String], system: &str) -> Result<Vec<ChunkOutcome>> {
        let concurrency = self.pipeline.effective_concurrency();

        if concurrency <= 1 || chunks.len() <= 1 {
            let mut outcomes = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                outcomes.push(self.translate_chunk(chunk, system).await?);
            }
            return Ok(outcomes);
        }

        let mut indexed: Vec<(usize, Result<ChunkOutcome>)> =
            stream::iter(chunks.to_vec().into_iter().enumerate())
                .map(|(index, chunk)| {
                    let service = self.clone();
                    let system = system.to_string();
                    async move { (index, service.translate_chunk(&chunk, &system).await) }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        indexed.sort_by_key(|(index, _)| *index);

        let mut outcomes = Vec::with_capacity(indexed.len());
        for (index, result) in indexed {
            let outcome =
                result.with_context(|| format!("Translation of chunk {} failed", index))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("provider", &self.provider.id)
            .field("model", &self.provider.model)
            .field("source", &self.source_language)
            .field("target", &self.target_language)
            .finish()
    }
}

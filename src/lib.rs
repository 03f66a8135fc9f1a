/*!
 * # doctrans - document translation pipeline
 *
 * A Rust library for translating structured documents through an
 * OpenAI-compatible chat backend while preserving document structure.
 *
 * ## Features
 *
 * - Plain text, Markdown, JSON, XML and DOCX inputs
 * - Glossary-aware text protection (terms, code blocks, inline code, URLs)
 * - Paragraph segmentation with size-bounded chunking
 * - Persistent content-addressed SQLite cache
 * - Bounded concurrent dispatch with retry and backoff
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `glossary`: Glossary loading and stable hashing
 * - `text`: Text protection and segmentation:
 *   - `text::protect`: Markup protection tokens
 *   - `text::terms`: Glossary term placeholders
 *   - `text::segment`: Paragraph splitting and chunking
 * - `cache`: Content-addressed translation cache:
 *   - `cache::key`: Cache key derivation
 *   - `cache::store`: SQLite-backed store
 * - `translation`: Orchestration of chunk translation:
 *   - `translation::core`: The translation service
 *   - `translation::prompts`: Prompt templates and identity
 *   - `translation::meta`: Usage accounting
 * - `documents`: Per-format adapters and the file pipeline
 * - `providers`: Provider registry and the chat transport:
 *   - `providers::openai`: OpenAI-compatible API client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod cache;
pub mod documents;
pub mod errors;
pub mod file_utils;
pub mod glossary;
pub mod providers;
pub mod text;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, PipelineConfig};
pub use documents::{DocumentPipeline, TranslationReport};
pub use errors::{AppError, ConfigError, DocumentError, ProviderError};
pub use glossary::Glossary;
pub use translation::TranslationService;

/*!
 * External document adapters.
 *
 * Formats the built-in adapters do not cover can plug into the pipeline
 * through this trait. An adapter owns its parsing and reconstruction and
 * borrows the translation machinery as a plain text-to-text function, so
 * caching, chunking, retries and the glossary all apply to its text.
 */

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::TranslationService;

/// A text-to-text translation function handed to external adapters
pub type TranslateTextFn =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// A pluggable adapter for one or more file extensions
#[async_trait]
pub trait ExternalDocumentAdapter: Send + Sync {
    /// Adapter name, for logs
    fn name(&self) -> &str;

    /// Whether this adapter handles the given lowercase extension
    fn handles_extension(&self, extension: &str) -> bool;

    /// Translate `input` into `output`, calling `translate` for every
    /// piece of extracted text. The adapter must not write `output`
    /// before all translation calls succeeded.
    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        translate: TranslateTextFn,
    ) -> Result<TranslationMeta>;
}

impl TranslationService {
    /// Package this service as a plain text function for adapters.
    ///
    /// `extra_instruction`, when set, is appended to the system prompt of
    /// every call made through the returned function.
    pub fn text_fn(&self, extra_instruction: Option<String>) -> TranslateTextFn {
        let service = self.clone();
        Arc::new(move |text: String| {
            let service = service.clone();
            let instruction = extra_instruction.clone();
            async move {
                let (translated, _) = service
                    .translate_text(&text, TextKind::Plain, instruction.as_deref())
                    .await?;
                Ok(translated)
            }
            .boxed()
        })
    }
}

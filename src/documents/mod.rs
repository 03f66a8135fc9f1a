/*!
 * Per-format document adapters and the file pipeline.
 *
 * The pipeline reads an input file, picks the adapter matching its
 * extension, rebuilds the document with translated text in place, and
 * writes the result only after the whole translation succeeded. A
 * single structured report summarises the run.
 */

pub mod docx;
pub mod external;
pub mod json;
pub mod plain;
pub mod xml;

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::errors::{AppError, DocumentError};
use crate::file_utils::{self, DocumentFormat};
use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::TranslationService;

use external::ExternalDocumentAdapter;

/// Provider fields echoed in the report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProvider {
    /// Provider identifier
    pub id: String,
    /// Model used
    pub model: String,
}

/// Everything a caller needs to know about a finished run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
    /// Always true; failures never produce a report
    pub ok: bool,
    /// Provider that served the run
    pub provider: ReportProvider,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// Glossary digest in effect
    pub glossary_hash: String,
    /// Prompt identity in effect
    pub prompt_identity: String,
    /// Run counters and token usage
    pub meta: TranslationMeta,
    /// Human-readable caveats, empty on a clean run
    pub warnings: Vec<String>,
}

/// Translates whole files, dispatching on their extension
pub struct DocumentPipeline {
    service: TranslationService,
    adapters: Vec<Arc<dyn ExternalDocumentAdapter>>,
}

impl DocumentPipeline {
    /// Create a pipeline around a configured service
    pub fn new(service: TranslationService) -> Self {
        DocumentPipeline {
            service,
            adapters: Vec::new(),
        }
    }

    /// Register an adapter for formats the built-ins do not cover
    pub fn register_adapter(&mut self, adapter: Arc<dyn ExternalDocumentAdapter>) {
        self.adapters.push(adapter);
    }

    /// The service driving this pipeline
    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Translate one file into another.
    ///
    /// The output file is written only after every chunk translated
    /// successfully; a failing run leaves no partial output behind.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<TranslationReport, AppError> {
        let format = DocumentFormat::from_path(input);
        info!(
            "Translating {:?} -> {:?} ({:?}, {} -> {})",
            input,
            output,
            format,
            self.service.provider().id,
            self.service.provider().model
        );

        let mut warnings: Vec<String> = Vec::new();
        let meta = match &format {
            DocumentFormat::PlainText | DocumentFormat::Markdown => {
                let kind = if format == DocumentFormat::Markdown {
                    TextKind::Markdown
                } else {
                    TextKind::Plain
                };
                let content = file_utils::read_to_string(input)?;
                let (translated, meta) = plain::translate_plain(&self.service, &content, kind).await?;
                file_utils::write_string(output, &translated)?;
                meta
            }
            DocumentFormat::Json => {
                let content = file_utils::read_to_string(input)?;
                let (translated, meta) = json::translate_json_str(&self.service, &content).await?;
                file_utils::write_string(output, &translated)?;
                meta
            }
            DocumentFormat::Xml => {
                let content = file_utils::read_bytes(input)?;
                let (translated, meta) =
                    xml::translate_xml_bytes(&self.service, &content, &input.display().to_string())
                        .await?;
                file_utils::write_bytes(output, &translated)?;
                meta
            }
            DocumentFormat::Docx => {
                let content = file_utils::read_bytes(input)?;
                let outcome =
                    docx::translate_docx_bytes(&self.service, &content, &input.display().to_string())
                        .await?;
                file_utils::write_bytes(output, &outcome.bytes)?;
                warnings.push(
                    "DOCX: character-level styling inside rewritten paragraphs may be simplified"
                        .to_string(),
                );
                if outcome.fallback_paragraphs > 0 {
                    warnings.push(format!(
                        "DOCX: {} paragraph(s) lost run boundaries and were rewritten whole",
                        outcome.fallback_paragraphs
                    ));
                }
                outcome.meta
            }
            DocumentFormat::Other(ext) => {
                let adapter = self
                    .adapters
                    .iter()
                    .find(|a| a.handles_extension(ext))
                    .ok_or_else(|| {
                        DocumentError::UnsupportedFormat(format!(
                            "no adapter for '.{}' ({})",
                            ext,
                            input.display()
                        ))
                    })?;
                adapter
                    .translate_document(input, output, self.service.text_fn(None))
                    .await?
            }
        };

        Ok(TranslationReport {
            ok: true,
            provider: ReportProvider {
                id: self.service.provider().id.clone(),
                model: self.service.provider().model.clone(),
            },
            source_language: self.service.source_language().to_string(),
            target_language: self.service.target_language().to_string(),
            glossary_hash: self.service.glossary_hash().to_string(),
            prompt_identity: self.service.prompt_identity().to_string(),
            meta,
            warnings,
        })
    }
}

/*!
 * Plain text and Markdown adapter.
 *
 * The thinnest adapter: the whole file is one text, the service does
 * the rest. Markdown inputs get markup protection; plain text does not.
 */

use anyhow::Result;

use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::TranslationService;

/// Translate a whole text or Markdown document
pub async fn translate_plain(
    service: &TranslationService,
    content: &str,
    kind: TextKind,
) -> Result<(String, TranslationMeta)> {
    service.translate_text(content, kind, None).await
}

/*!
 * XML adapter.
 *
 * Streams events through quick-xml: text and CDATA nodes are translated,
 * every other event (tags, attributes, comments, processing instructions,
 * the prolog) is copied through untouched. Leading and trailing
 * whitespace of each text node is preserved around the translated core,
 * so indentation-heavy documents keep their shape.
 */

use anyhow::Result;
use quick_xml::events::{BytesCData, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::DocumentError;
use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::TranslationService;

/// Translate an XML document given as raw bytes
pub async fn translate_xml_bytes(
    service: &TranslationService,
    content: &[u8],
    file_label: &str,
) -> Result<(Vec<u8>, TranslationMeta)> {
    let mut reader = Reader::from_reader(content);
    let mut writer = Writer::new(Vec::new());
    let mut meta = TranslationMeta::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            DocumentError::Parse {
                file: file_label.to_string(),
                message: e.to_string(),
            }
        })?;
        match event {
            Event::Eof => break,
            Event::Text(text) => {
                let decoded = text.unescape().map_err(|e| DocumentError::Parse {
                    file: file_label.to_string(),
                    message: e.to_string(),
                })?;
                let translated =
                    translate_preserving_whitespace(service, &decoded, &mut meta).await?;
                writer.write_event(Event::Text(BytesText::new(&translated)))?;
            }
            Event::CData(cdata) => {
                let decoded = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                let translated =
                    translate_preserving_whitespace(service, &decoded, &mut meta).await?;
                writer.write_event(Event::CData(BytesCData::new(&translated)))?;
            }
            other => {
                writer.write_event(other.into_owned())?;
            }
        }
        buf.clear();
    }

    Ok((writer.into_inner(), meta))
}

/// Translate the core of a text node, keeping its surrounding whitespace.
///
/// Whitespace-only nodes (indentation between elements) pass through
/// unchanged.
async fn translate_preserving_whitespace(
    service: &TranslationService,
    text: &str,
    meta: &mut TranslationMeta,
) -> Result<String> {
    let core = text.trim();
    if core.is_empty() {
        return Ok(text.to_string());
    }

    let lead_len = text.len() - text.trim_start().len();
    let trail_len = text.len() - text.trim_end().len();
    let lead = &text[..lead_len];
    let trail = &text[text.len() - trail_len..];

    let (translated, chunk_meta) = service.translate_text(core, TextKind::Plain, None).await?;
    meta.absorb(&chunk_meta);

    Ok(format!("{}{}{}", lead, translated, trail))
}

/*!
 * DOCX adapter.
 *
 * A .docx file is a zip archive of XML parts. The document body, headers
 * and footers are rewritten paragraph by paragraph; every other entry is
 * copied through byte for byte. Table cells need no special handling
 * since their content is ordinary paragraphs.
 *
 * A paragraph is usually split into several runs (`w:r`), each holding a
 * `w:t` text element. Translating runs one by one destroys sentence
 * context, so a multi-run paragraph is flattened into one blob with
 * `[[RUN_0001]]`-style markers between run texts. The model is told to
 * keep the markers; splitting the response on them puts each piece back
 * into its run. When markers come back mangled, the whole translated
 * blob lands in the first run and the remaining runs are emptied: the
 * text survives at the cost of character-level styling.
 */

use std::io::{Cursor, Read, Write};

use anyhow::Result;
use log::warn;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;
use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::prompts::RUN_MARKER_INSTRUCTION;
use crate::translation::TranslationService;

/// Marker separating run texts inside a flattened paragraph
static RUN_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[RUN_\d{4}\]\]").unwrap());

fn run_marker(index: usize) -> String {
    format!("[[RUN_{:04}]]", index)
}

/// Result of rewriting a whole archive
pub struct DocxOutcome {
    /// The rebuilt .docx bytes
    pub bytes: Vec<u8>,
    /// Run counters accumulated over all parts
    pub meta: TranslationMeta,
    /// Paragraphs where the marker protocol failed and the whole-blob
    /// fallback was used
    pub fallback_paragraphs: u64,
}

/// Whether a zip entry holds translatable paragraph content
fn is_translatable_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Translate a .docx archive given as raw bytes
pub async fn translate_docx_bytes(
    service: &TranslationService,
    content: &[u8],
    file_label: &str,
) -> Result<DocxOutcome> {
    let mut archive =
        ZipArchive::new(Cursor::new(content)).map_err(|e| DocumentError::Archive {
            file: file_label.to_string(),
            message: e.to_string(),
        })?;

    // Drain the archive up front; zip entries borrow the archive and
    // cannot be held across await points.
    let mut entries: Vec<(String, Vec<u8>, bool)> = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| DocumentError::Archive {
            file: file_label.to_string(),
            message: e.to_string(),
        })?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            entries.push((name, Vec::new(), false));
            continue;
        }
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| DocumentError::Archive {
                file: format!("{}:{}", file_label, name),
                message: e.to_string(),
            })?;
        let translatable = is_translatable_part(&name);
        entries.push((name, bytes, translatable));
    }

    let mut meta = TranslationMeta::default();
    let mut fallback_paragraphs = 0u64;
    for (name, bytes, translatable) in entries.iter_mut() {
        if !*translatable {
            continue;
        }
        let label = format!("{}:{}", file_label, name);
        let part = translate_part(service, bytes, &label).await?;
        *bytes = part.bytes;
        meta.absorb(&part.meta);
        fallback_paragraphs += part.fallback_paragraphs;
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes, _) in &entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), options)
                .map_err(|e| DocumentError::Archive {
                    file: file_label.to_string(),
                    message: e.to_string(),
                })?;
            continue;
        }
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| DocumentError::Archive {
                file: file_label.to_string(),
                message: e.to_string(),
            })?;
        writer.write_all(bytes).map_err(|e| DocumentError::Archive {
            file: file_label.to_string(),
            message: e.to_string(),
        })?;
    }
    let bytes = writer
        .finish()
        .map_err(|e| DocumentError::Archive {
            file: file_label.to_string(),
            message: e.to_string(),
        })?
        .into_inner();

    Ok(DocxOutcome {
        bytes,
        meta,
        fallback_paragraphs,
    })
}

/// Result of rewriting one XML part
struct PartOutcome {
    bytes: Vec<u8>,
    meta: TranslationMeta,
    fallback_paragraphs: u64,
}

/// Rewrite one XML part, buffering events paragraph by paragraph.
///
/// Events outside any `w:p` element stream straight through; inside one
/// they are collected until the paragraph closes, then the paragraph is
/// translated as a unit.
async fn translate_part(
    service: &TranslationService,
    content: &[u8],
    label: &str,
) -> Result<PartOutcome> {
    let mut reader = Reader::from_reader(content);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut meta = TranslationMeta::default();
    let mut fallback_paragraphs = 0u64;

    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            DocumentError::Parse {
                file: label.to_string(),
                message: e.to_string(),
            }
        })?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.name().as_ref() == b"w:p" => {
                depth += 1;
                paragraph.push(event.into_owned());
            }
            Event::End(ref e) if e.name().as_ref() == b"w:p" && depth > 0 => {
                depth -= 1;
                paragraph.push(event.into_owned());
                if depth == 0 {
                    let events = std::mem::take(&mut paragraph);
                    let rewritten =
                        translate_paragraph(service, events, label, &mut meta).await?;
                    fallback_paragraphs += rewritten.1;
                    for ev in rewritten.0 {
                        writer.write_event(ev)?;
                    }
                }
            }
            other => {
                if depth > 0 {
                    paragraph.push(other.into_owned());
                } else {
                    writer.write_event(other.into_owned())?;
                }
            }
        }
        buf.clear();
    }

    Ok(PartOutcome {
        bytes: writer.into_inner(),
        meta,
        fallback_paragraphs,
    })
}

/// Translate one buffered paragraph, returning the rewritten events and
/// whether the whole-blob fallback fired (0 or 1).
async fn translate_paragraph(
    service: &TranslationService,
    mut events: Vec<Event<'static>>,
    label: &str,
    meta: &mut TranslationMeta,
) -> Result<(Vec<Event<'static>>, u64)> {
    // Locate the text slot of every w:t element
    let mut slots: Vec<(usize, String)> = Vec::new();
    let mut in_text = false;
    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                let decoded = t.unescape().map_err(|e| DocumentError::Parse {
                    file: label.to_string(),
                    message: e.to_string(),
                })?;
                slots.push((index, decoded.into_owned()));
            }
            _ => {}
        }
    }

    let filled: Vec<(usize, String)> = slots
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .collect();
    let combined: String = filled.iter().map(|(_, text)| text.as_str()).collect();
    if combined.trim().is_empty() {
        return Ok((events, 0));
    }
    meta.paragraphs += 1;

    let mut fallback = 0u64;
    if filled.len() <= 1 {
        let (index, text) = &filled[0];
        let (translated, chunk_meta) =
            service.translate_text(text, TextKind::Plain, None).await?;
        meta.absorb(&chunk_meta);
        events[*index] = Event::Text(BytesText::new(&translated).into_owned());
    } else {
        // Flatten runs into one marked blob so the model sees the whole
        // sentence at once; every run text is introduced by its marker
        let mut blob = String::new();
        for (marker_index, (_, text)) in filled.iter().enumerate() {
            blob.push_str(&run_marker(marker_index + 1));
            blob.push_str(text);
        }

        let (translated, chunk_meta) = service
            .translate_text(&blob, TextKind::Plain, Some(RUN_MARKER_INSTRUCTION))
            .await?;
        meta.absorb(&chunk_meta);

        match split_by_run_markers(&translated, filled.len()) {
            Some(pieces) => {
                for ((index, _), piece) in filled.iter().zip(pieces) {
                    events[*index] = Event::Text(BytesText::new(&piece).into_owned());
                }
            }
            None => {
                // Markers came back mangled; keep the text, simplify the runs
                warn!(
                    "Run markers lost in '{}', rewriting paragraph as a single run",
                    label
                );
                fallback = 1;
                let mut first = true;
                for (index, _) in &filled {
                    if first {
                        events[*index] = Event::Text(BytesText::new(&translated).into_owned());
                        first = false;
                    } else {
                        events[*index] = Event::Text(BytesText::new("").into_owned());
                    }
                }
            }
        }
    }

    Ok((events, fallback))
}

/// Split a translated blob back into per-run pieces.
///
/// Returns `None` when the marker protocol failed: wrong piece count, or
/// text smuggled in front of the first marker.
fn split_by_run_markers(translated: &str, expected: usize) -> Option<Vec<String>> {
    let pieces: Vec<&str> = RUN_MARKER.split(translated).collect();
    // The blob starts with a marker, so a well-formed response splits
    // into a whitespace-only preamble plus one piece per run
    if pieces.len() != expected + 1 || !pieces[0].trim().is_empty() {
        return None;
    }
    Some(pieces[1..].iter().map(|p| p.to_string()).collect())
}

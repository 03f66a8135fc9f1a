/*!
 * JSON adapter.
 *
 * Walks the value tree and translates every string value, leaving keys,
 * numbers, booleans and nulls untouched. The tree shape and object key
 * order survive the round trip.
 */

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::errors::DocumentError;
use crate::translation::core::TextKind;
use crate::translation::meta::TranslationMeta;
use crate::translation::TranslationService;

/// Translate a JSON document given as a string
pub async fn translate_json_str(
    service: &TranslationService,
    content: &str,
) -> Result<(String, TranslationMeta)> {
    let value: Value = serde_json::from_str(content).map_err(|e| DocumentError::Parse {
        file: "<json input>".to_string(),
        message: e.to_string(),
    })?;

    let mut meta = TranslationMeta::default();
    let translated = walk(service, value, &mut meta).await?;

    let mut out = serde_json::to_string_pretty(&translated)?;
    out.push('\n');
    Ok((out, meta))
}

/// Recurse through the value tree, translating string leaves.
///
/// Recursion over an async function needs a boxed future; values are
/// visited sequentially, concurrency lives at the chunk level below.
fn walk<'a>(
    service: &'a TranslationService,
    value: Value,
    meta: &'a mut TranslationMeta,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match value {
            Value::String(text) => {
                if text.trim().is_empty() {
                    return Ok(Value::String(text));
                }
                let (translated, chunk_meta) =
                    service.translate_text(&text, TextKind::Plain, None).await?;
                meta.absorb(&chunk_meta);
                meta.strings += 1;
                Ok(Value::String(translated))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(walk(service, item, meta).await?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    let translated = walk(service, item, meta).await?;
                    out.insert(key, translated);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other),
        }
    }
    .boxed()
}

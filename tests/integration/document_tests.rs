/*!
 * End-to-end document pipeline tests
 *
 * Every test drives the full pipeline from an input file on disk to an
 * output file on disk, with the network replaced by a mock transport.
 */

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use doctrans::app_config::PipelineConfig;
use doctrans::documents::external::{ExternalDocumentAdapter, TranslateTextFn};
use doctrans::documents::DocumentPipeline;
use doctrans::translation::meta::TranslationMeta;

use crate::common::mock_transport::MockTransport;
use crate::common::test_service;

fn uppercase_pipeline() -> DocumentPipeline {
    DocumentPipeline::new(test_service(
        Arc::new(MockTransport::uppercase()),
        PipelineConfig::default(),
    ))
}

#[tokio::test]
async fn test_translateFile_withPlainText_shouldWriteTranslatedOutput() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    let output = dir.path().join("doc.fr.txt");
    std::fs::write(&input, "hello there.\n\nsecond paragraph.").unwrap();

    let report = uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "HELLO THERE.\n\nSECOND PARAGRAPH."
    );
    assert!(report.ok);
    assert_eq!(report.provider.id, "mock");
    assert_eq!(report.meta.chunks, 2);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn test_translateFile_withMarkdown_shouldPreserveCodeFence() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.md");
    let output = dir.path().join("doc.fr.md");
    std::fs::write(&input, "# title\n\n```sh\ncargo build\n```\n\nclosing words.").unwrap();

    uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap();

    let translated = std::fs::read_to_string(&output).unwrap();
    assert!(translated.contains("```sh\ncargo build\n```"));
    assert!(translated.contains("CLOSING WORDS."));
}

#[tokio::test]
async fn test_translateFile_withJson_shouldTranslateOnlyStringsAndKeepKeyOrder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.json");
    let output = dir.path().join("doc.fr.json");
    std::fs::write(
        &input,
        r#"{"title":"hello","count":3,"tags":["one","two"],"nested":{"zulu":"zed","alpha":"ay"},"flag":true}"#,
    )
    .unwrap();

    let report = uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap();

    let translated = std::fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&translated).unwrap();
    assert_eq!(value["title"], "HELLO");
    assert_eq!(value["count"], 3);
    assert_eq!(value["flag"], true);
    assert_eq!(value["tags"][1], "TWO");
    assert_eq!(value["nested"]["alpha"], "AY");
    // Insertion order of object keys survives the rewrite
    assert!(translated.find("\"zulu\"").unwrap() < translated.find("\"alpha\"").unwrap());
    assert_eq!(report.meta.strings, 5);
}

#[tokio::test]
async fn test_translateFile_withXml_shouldKeepStructureAndWhitespace() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.xml");
    let output = dir.path().join("doc.fr.xml");
    std::fs::write(
        &input,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root attr=\"keep-me\">\n  <item> hello world </item>\n  <empty/>\n</root>",
    )
    .unwrap();

    uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap();

    let translated = std::fs::read_to_string(&output).unwrap();
    // Attributes, tags and the prolog are untouched
    assert!(translated.contains("attr=\"keep-me\""));
    assert!(translated.contains("<?xml version=\"1.0\""));
    assert!(translated.contains("<empty/>"));
    // Text translated with its leading and trailing whitespace intact
    assert!(translated.contains("<item> HELLO WORLD </item>"));
    // Indentation between elements survives
    assert!(translated.contains(">\n  <item>"));
}

/// Build a minimal .docx archive with one single-run and one three-run
/// paragraph
fn docx_fixture() -> Vec<u8> {
    let document = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
        "<w:body>",
        "<w:p><w:r><w:t>hello world.</w:t></w:r></w:p>",
        "<w:p>",
        "<w:r><w:rPr><w:b/></w:rPr><w:t>bold </w:t></w:r>",
        "<w:r><w:t>and </w:t></w:r>",
        "<w:r><w:t>plain.</w:t></w:r>",
        "</w:p>",
        "</w:body></w:document>"
    );
    let content_types = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
        "</Types>"
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(content_types.as_bytes()).unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Read one entry of a zip archive to a string
fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_translateFile_withDocx_shouldTranslateRunsInPlace() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.docx");
    let output = dir.path().join("doc.fr.docx");
    std::fs::write(&input, docx_fixture()).unwrap();

    let report = uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let document = zip_entry(&bytes, "word/document.xml");
    assert!(document.contains("<w:t>HELLO WORLD.</w:t>"));
    // Each run kept its own translated piece, styling untouched
    assert!(document.contains("<w:rPr><w:b/></w:rPr><w:t>BOLD </w:t>"));
    assert!(document.contains("<w:t>AND </w:t>"));
    assert!(document.contains("<w:t>PLAIN.</w:t>"));
    // Untouched parts are carried through unchanged
    assert!(zip_entry(&bytes, "[Content_Types].xml").contains("content-types"));

    assert_eq!(report.meta.paragraphs, 2);
    // The generic styling caveat is always present for DOCX
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn test_translateFile_withDocxMarkerLoss_shouldFallBackToWholeParagraph() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.docx");
    let output = dir.path().join("doc.fr.docx");
    std::fs::write(&input, docx_fixture()).unwrap();

    let pipeline = DocumentPipeline::new(test_service(
        Arc::new(MockTransport::marker_dropping()),
        PipelineConfig::default(),
    ));
    let report = pipeline.translate_file(&input, &output).await.unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let document = zip_entry(&bytes, "word/document.xml");
    // The whole translated paragraph landed in the first run; the other
    // runs were emptied rather than dropped
    assert!(document.contains("<w:t>BOLD AND PLAIN.</w:t>"));
    assert!(document.contains("<w:t></w:t>"));
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[1].contains("1 paragraph"));
}

/// Adapter double handling a made-up `.note` format
struct NoteAdapter;

#[async_trait]
impl ExternalDocumentAdapter for NoteAdapter {
    fn name(&self) -> &str {
        "note"
    }

    fn handles_extension(&self, extension: &str) -> bool {
        extension == "note"
    }

    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        translate: TranslateTextFn,
    ) -> anyhow::Result<TranslationMeta> {
        let content = std::fs::read_to_string(input)?;
        let translated = translate(content).await?;
        std::fs::write(output, format!("NOTE:{}", translated))?;
        let mut meta = TranslationMeta::default();
        meta.strings = 1;
        Ok(meta)
    }
}

#[tokio::test]
async fn test_translateFile_withRegisteredAdapter_shouldDispatchByExtension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("memo.note");
    let output = dir.path().join("memo.fr.note");
    std::fs::write(&input, "remember this.").unwrap();

    let mut pipeline = uppercase_pipeline();
    pipeline.register_adapter(Arc::new(NoteAdapter));
    let report = pipeline.translate_file(&input, &output).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "NOTE:REMEMBER THIS."
    );
    assert_eq!(report.meta.strings, 1);
}

#[tokio::test]
async fn test_translateFile_withUnknownExtension_shouldFailAsDocumentError() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("movie.srt");
    let output = dir.path().join("movie.fr.srt");
    std::fs::write(&input, "1\n00:00:01,000 --> 00:00:02,000\nhi\n").unwrap();

    let err = uppercase_pipeline()
        .translate_file(&input, &output)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "document");
    assert!(!output.exists());
}

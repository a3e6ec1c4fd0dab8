use crate::error::IngestError;
use crate::ingest::fingerprint;
use crate::models::{BatchPolicy, DocumentFingerprint, PageText, PdfSource, SkippedPdf};
use lopdf::Document;
use tracing::{debug, warn};

pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, source: &PdfSource) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, source: &PdfSource) -> Result<Vec<PageText>, IngestError> {
        let document = Document::load_mem(&source.bytes).map_err(|error| IngestError::PdfParse {
            document: source.name.clone(),
            reason: error.to_string(),
        })?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse {
                    document: source.name.clone(),
                    reason: format!("page {page_no}: {error}"),
                })?;

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

/// Text of a whole upload batch, concatenated in upload order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedBatch {
    pub text: String,
    pub documents: Vec<DocumentFingerprint>,
    pub skipped: Vec<SkippedPdf>,
}

pub fn extract_documents(
    extractor: &dyn PdfExtractor,
    sources: &[PdfSource],
    policy: BatchPolicy,
) -> Result<ExtractedBatch, IngestError> {
    let mut batch = ExtractedBatch::default();

    for source in sources {
        match extractor.extract_pages(source) {
            Ok(pages) => {
                let before = batch.text.chars().count();
                for page in &pages {
                    batch.text.push_str(&page.text);
                }
                let added = batch.text.chars().count() - before;
                debug!(document = %source.name, pages = pages.len(), chars = added, "extracted pdf");
                batch.documents.push(fingerprint(source, pages.len(), added));
            }
            Err(error) => {
                if policy == BatchPolicy::AbortBatch {
                    return Err(error);
                }
                warn!(document = %source.name, reason = %error, "skipped pdf");
                batch.skipped.push(SkippedPdf {
                    name: source.name.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    struct Utf8Extractor;

    impl PdfExtractor for Utf8Extractor {
        fn extract_pages(&self, source: &PdfSource) -> Result<Vec<PageText>, IngestError> {
            let text = String::from_utf8(source.bytes.clone()).map_err(|error| {
                IngestError::PdfParse {
                    document: source.name.clone(),
                    reason: error.to_string(),
                }
            })?;
            Ok(text
                .split('\u{000c}')
                .enumerate()
                .map(|(index, page)| PageText {
                    number: index as u32 + 1,
                    text: page.to_string(),
                })
                .collect())
        }
    }

    pub(crate) fn single_page_pdf(line: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }

    #[test]
    fn lopdf_extracts_page_text() {
        let source = PdfSource::new("invoices.pdf", single_page_pdf("Invoices are due monthly."));
        let pages = LopdfExtractor
            .extract_pages(&source)
            .expect("generated pdf should parse");

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Invoices are due monthly."));
    }

    #[test]
    fn invalid_bytes_are_a_format_error() {
        let source = PdfSource::new("broken.pdf", b"%PDF-1.4\n%broken".to_vec());
        let result = LopdfExtractor.extract_pages(&source);
        assert!(matches!(
            result,
            Err(IngestError::PdfParse { ref document, .. }) if document == "broken.pdf"
        ));
    }

    #[test]
    fn pages_and_documents_are_concatenated_without_separator() {
        let sources = vec![
            PdfSource::new("a.pdf", b"one\x0ctwo".to_vec()),
            PdfSource::new("b.pdf", b"three".to_vec()),
        ];
        let batch = extract_documents(&Utf8Extractor, &sources, BatchPolicy::SkipAndReport)
            .expect("extraction should succeed");

        assert_eq!(batch.text, "onetwothree");
        assert_eq!(batch.documents.len(), 2);
        assert_eq!(batch.documents[0].page_count, 2);
        assert_eq!(batch.documents[1].char_count, 5);
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn skip_policy_reports_each_bad_document() {
        let sources = vec![
            PdfSource::new("bad-first.pdf", vec![0xff, 0xfe]),
            PdfSource::new("good.pdf", b"kept text".to_vec()),
            PdfSource::new("bad-last.pdf", vec![0xc3]),
        ];
        let batch = extract_documents(&Utf8Extractor, &sources, BatchPolicy::SkipAndReport)
            .expect("skip policy never aborts");

        assert_eq!(batch.text, "kept text");
        let skipped: Vec<_> = batch.skipped.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(skipped, vec!["bad-first.pdf", "bad-last.pdf"]);
    }

    #[test]
    fn abort_policy_stops_at_first_bad_document() {
        let sources = vec![
            PdfSource::new("good.pdf", b"kept text".to_vec()),
            PdfSource::new("bad.pdf", vec![0xff]),
        ];
        let result = extract_documents(&Utf8Extractor, &sources, BatchPolicy::AbortBatch);
        assert!(matches!(
            result,
            Err(IngestError::PdfParse { ref document, .. }) if document == "bad.pdf"
        ));
    }

    #[test]
    fn empty_upload_yields_empty_text() {
        let batch = extract_documents(&Utf8Extractor, &[], BatchPolicy::SkipAndReport)
            .expect("empty batch is not an error");
        assert!(batch.text.is_empty());
        assert!(batch.documents.is_empty());
    }
}

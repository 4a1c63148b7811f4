//! Extraction and ingestion of well-formed PDFs built in memory.

use std::sync::Arc;

use scholar_rag::{
    HashingEmbedder, PdfExtractor, RagConfig, ResearchSession, SourceDocument, TextExtractor,
};

/// Build a PDF with one page per entry; an empty entry becomes a page with an
/// empty content stream. Objects: 1 catalog, 2 page tree, 3 font, then a page
/// and its content stream for every entry.
fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages.len()).map(|i| format!("{} 0 R", 4 + 2 * i)).collect::<Vec<_>>().join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

#[test]
fn extracts_text_page_by_page() {
    let pdf = build_pdf(&["Statins lower cholesterol", "Muscle pain was rare"]);
    let extracted = PdfExtractor.extract("trial.pdf", &pdf).unwrap();

    assert_eq!(extracted.pages.len(), 2);
    assert!(extracted.pages[0].contains("Statins lower cholesterol"));
    assert!(extracted.pages[1].contains("Muscle pain was rare"));
    assert!(extracted.warnings.is_empty());
}

#[test]
fn blank_pages_produce_warnings() {
    let pdf = build_pdf(&["Results are summarised below", ""]);
    let extracted = PdfExtractor.extract("trial.pdf", &pdf).unwrap();

    assert_eq!(extracted.pages.len(), 2);
    assert_eq!(extracted.warnings.len(), 1);
    assert!(extracted.warnings[0].contains("page 2"));
    assert!(!extracted.is_blank());
}

#[tokio::test]
async fn pdf_upload_is_indexed_and_retrievable() {
    let session =
        ResearchSession::new(RagConfig::default(), Arc::new(HashingEmbedder::new(64))).unwrap();
    let document = SourceDocument::new("trial.pdf", build_pdf(&["Statins lower cholesterol"]));
    assert_eq!(document.kind(), scholar_rag::DocumentKind::Pdf);

    let outcome = session.ingest_document(document).await;
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.chunks_indexed, 1);

    let hits = session.retrieve("statins", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source(), "trial.pdf");
    assert!(hits[0].text().contains("Statins lower cholesterol"));
}

#[tokio::test]
async fn image_only_pdf_is_rejected() {
    let session =
        ResearchSession::new(RagConfig::default(), Arc::new(HashingEmbedder::new(64))).unwrap();
    let outcome = session.ingest(build_pdf(&["", ""]), "scan.pdf").await;

    assert!(!outcome.success);
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("no extractable text")));
}

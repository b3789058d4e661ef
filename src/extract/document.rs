use encoding_rs::{DecoderResult, UTF_8};
use tracing::debug;

use super::interface::{DocumentKind, TextExtractor};

/// Extractor for plain text (permissive UTF-8) and PDF (via `pdf-extract`)
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, anyhow::Error> {
        let text = match kind {
            DocumentKind::Txt => extract_text_from_txt(bytes),
            DocumentKind::Pdf => extract_text_from_pdf(bytes)?,
        };
        debug!("Extracted {} chars from {} document", text.chars().count(), kind);
        Ok(text)
    }
}

/// Decode as UTF-8, dropping a BOM and any undecodable sequences
pub fn extract_text_from_txt(bytes: &[u8]) -> String {
    let mut decoder = UTF_8.new_decoder_with_bom_removal();
    let mut content = String::with_capacity(bytes.len());
    let mut input = bytes;
    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut content, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => break,
            // malformed bytes are already consumed
            DecoderResult::Malformed(_, _) => {}
            DecoderResult::OutputFull => content.reserve(input.len().max(4)),
        }
    }
    content.trim().to_string()
}

/// Text of every page, concatenated. Pages without a text layer contribute nothing.
pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, anyhow::Error> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to read PDF: {:?}", e))?;
    Ok(text.trim().to_string())
}

/// A well-formed one-page PDF whose page has no content stream
#[cfg(test)]
pub(crate) fn blank_page_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> >>",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_start = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    pdf
}

use anyhow::{Context, Result};
use contracts::system::documents::{ExtractedDocument, ExtractedLineItem, NreLineItemRow, VendorInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::io::{Cursor, Read};

const WORD_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const RAW_TEXT_LIMIT: usize = 5000;
const MIN_LINE_AMOUNT: f64 = 10.0;
const REGEX_CONFIDENCE: f64 = 0.7;

static LINE_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(\d+)[\.\)]\s*)?(.+?)[\s:$]*?([\d,]+\.?\d*)\s*$").unwrap()
});
static QUOTE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)quote\s*#?\s*:?\s*([A-Z0-9-]+)").unwrap());
static QUOTE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:date|dated)[\s:]*(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})").unwrap()
});
static VENDOR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:from|vendor|company)[\s:]+([A-Z][A-Za-z\s&,\.]+?)(?:\n|$)")
        .unwrap()
});
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap()
});
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Keyword table checked in order; first match wins
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "NRE_DESIGN",
        &["design", "electrical", "mechanical", "engineering hours", "schematic", "pcb", "layout"],
    ),
    ("TOOLING", &["tooling", "mold", "jig", "fixture", "rework", "fabrication"]),
    ("EVT_DVT_PVT", &["evt", "dvt", "pvt", "validation", "prototype", "build"]),
    (
        "CERTIFICATIONS",
        &["certification", "fcc", "ul", "ce", "rohs", "testing", "compliance"],
    ),
    ("FIELD_TESTING", &["field test", "pilot", "trial", "beta", "field trial"]),
    ("ODM_SETUP", &["odm", "setup", "factory", "line setup", "production setup"]),
    ("FIRMWARE", &["firmware", "software", "ota", "development", "programming"]),
    (
        "LOGISTICS_SAMPLES",
        &["logistics", "sample", "shipment", "shipping", "prototype shipment"],
    ),
    (
        "WARRANTY_RELIABILITY",
        &["warranty", "reliability", "halt", "burn-in", "stress test"],
    ),
];

pub fn process(bytes: &[u8], mime_type: &str) -> Result<ExtractedDocument> {
    if mime_type.contains("pdf") {
        Ok(process_pdf(bytes))
    } else if mime_type == WORD_MIME || mime_type.contains("word") || mime_type.contains("docx") {
        process_word(bytes)
    } else {
        anyhow::bail!("Unsupported document type: {}", mime_type)
    }
}

/// PDFs are stored as-is; text extraction is not wired up
fn process_pdf(bytes: &[u8]) -> ExtractedDocument {
    ExtractedDocument {
        text: "Image created - not processed yet".to_string(),
        line_items: Vec::new(),
        vendor_info: VendorInfo::default(),
        page_count: 1,
        metadata: json!({ "pages": 1, "size": bytes.len() }),
    }
}

fn process_word(bytes: &[u8]) -> Result<ExtractedDocument> {
    let text = extract_docx_text(bytes).context("Failed to extract Word document")?;
    Ok(ExtractedDocument {
        line_items: parse_line_items(&text),
        vendor_info: extract_vendor_info(&text),
        page_count: 1,
        metadata: json!({}),
        text,
    })
}

/// Raw text of `word/document.xml`: one line per paragraph, tabs kept
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("word/document.xml not found")?
        .read_to_string(&mut xml)?;

    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");
    let stripped = XML_TAG.replace_all(&xml, "");
    Ok(unescape_xml(&stripped))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn parse_line_items(text: &str) -> Vec<ExtractedLineItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.len() >= 5)
        .filter_map(|line| {
            let caps = LINE_ITEM.captures(line)?;
            let amount: f64 = caps.get(3)?.as_str().replace(',', "").parse().ok()?;
            if amount < MIN_LINE_AMOUNT {
                return None;
            }
            let description = caps.get(2)?.as_str().trim().to_string();
            Some(ExtractedLineItem {
                line_number: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                category: categorize(&description).to_string(),
                description,
                quantity: None,
                unit_price: None,
                total_amount: amount,
                confidence: REGEX_CONFIDENCE,
            })
        })
        .collect()
}

pub fn categorize(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or("OTHERS")
}

pub fn extract_vendor_info(text: &str) -> VendorInfo {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };
    VendorInfo {
        name: capture(&VENDOR_NAME),
        quote_number: capture(&QUOTE_NUMBER),
        quote_date: capture(&QUOTE_DATE),
        email: capture(&EMAIL),
    }
}

pub fn format_for_database(extracted: &ExtractedDocument, user_id: &str) -> Vec<NreLineItemRow> {
    let raw_text: String = extracted.text.chars().take(RAW_TEXT_LIMIT).collect();
    extracted
        .line_items
        .iter()
        .enumerate()
        .map(|(index, item)| NreLineItemRow {
            line_item_number: item.line_number.unwrap_or(index as u32 + 1),
            description: item.description.clone(),
            category: item.category.clone(),
            quantity: item.quantity.unwrap_or(1.0),
            unit_price: item.unit_price,
            total_amount: item.total_amount,
            currency: "USD".to_string(),
            status: "pending".to_string(),
            confidence_score: item.confidence,
            extracted_data: json!({
                "raw_text": raw_text,
                "metadata": extracted.metadata,
                "vendor": extracted.vendor_info,
            }),
            created_by: user_id.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const VENDOR_HEADER: &str = "Vendor: Shenzhen Acme Electronics\n\
        Quote #: Q-2024-118\n\
        Date: 03/15/2024\n\
        sales@acme-sz.com\n";

    const QUOTE_LINES: &str = "1. PCB layout and schematic review $12,500.00\n\
        2) Injection mold tooling 8,000\n\
        FCC certification: 4500\n\
        Shipping fee 5\n\
        Misc\n";

    #[test]
    fn parses_numbered_and_plain_line_items() {
        let items = parse_line_items(QUOTE_LINES);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].line_number, Some(1));
        assert_eq!(items[0].description, "PCB layout and schematic review");
        assert_eq!(items[0].total_amount, 12500.0);
        assert_eq!(items[0].category, "NRE_DESIGN");

        assert_eq!(items[1].line_number, Some(2));
        assert_eq!(items[1].category, "TOOLING");
        assert_eq!(items[1].total_amount, 8000.0);

        assert_eq!(items[2].line_number, None);
        assert_eq!(items[2].category, "CERTIFICATIONS");
        assert_eq!(items[2].confidence, 0.7);
    }

    #[test]
    fn categorizes_by_first_matching_keyword() {
        assert_eq!(categorize("Firmware OTA update"), "FIRMWARE");
        assert_eq!(categorize("Pilot run"), "FIELD_TESTING");
        assert_eq!(categorize("HALT chamber"), "WARRANTY_RELIABILITY");
        assert_eq!(categorize("Handling"), "OTHERS");
    }

    #[test]
    fn extracts_vendor_details() {
        let vendor = extract_vendor_info(VENDOR_HEADER);
        assert_eq!(vendor.name.as_deref(), Some("Shenzhen Acme Electronics"));
        assert_eq!(vendor.quote_number.as_deref(), Some("Q-2024-118"));
        assert_eq!(vendor.quote_date.as_deref(), Some("03/15/2024"));
        assert_eq!(vendor.email.as_deref(), Some("sales@acme-sz.com"));
    }

    #[test]
    fn rejects_unsupported_types() {
        let err = process(b"hello", "text/plain").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported document type: text/plain");
    }

    #[test]
    fn pdf_is_a_placeholder() {
        let doc = process(b"%PDF-1.7", "application/pdf").unwrap();
        assert_eq!(doc.text, "Image created - not processed yet");
        assert_eq!(doc.page_count, 1);
        assert!(doc.line_items.is_empty());
    }

    #[test]
    fn reads_docx_paragraphs() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer
                .write_all(
                    br#"<w:document><w:body><w:p><w:r><w:t>Tooling &amp; jigs</w:t><w:tab/><w:t>2,400</w:t></w:r></w:p><w:p><w:r><w:t>Total</w:t></w:r></w:p></w:body></w:document>"#,
                )
                .unwrap();
            writer.finish().unwrap();
        }

        let doc = process(buffer.get_ref(), WORD_MIME).unwrap();
        assert_eq!(doc.text, "Tooling & jigs\t2,400\nTotal\n");
        assert_eq!(doc.line_items.len(), 1);
        assert_eq!(doc.line_items[0].total_amount, 2400.0);
        assert_eq!(doc.line_items[0].category, "TOOLING");
    }

    #[test]
    fn database_rows_fill_defaults() {
        let doc = ExtractedDocument {
            text: "x".repeat(6000),
            line_items: parse_line_items("Injection mold tooling 8,000\n"),
            vendor_info: VendorInfo::default(),
            page_count: 1,
            metadata: json!({}),
        };
        let rows = format_for_database(&doc, "user-1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_item_number, 1);
        assert_eq!(rows[0].quantity, 1.0);
        assert_eq!(rows[0].currency, "USD");
        assert_eq!(rows[0].status, "pending");
        assert_eq!(
            rows[0].extracted_data["raw_text"].as_str().unwrap().len(),
            5000
        );
    }
}

use serde::{Deserialize, Serialize};

use crate::rag::client::RetrievedChunk;

/// A citation shown under an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub source_url: String,
    pub regulation_type: String,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_link: Option<String>,
}

impl Source {
    fn fixed(title: &str, url: &str, regulation_type: &str, document_type: &str) -> Self {
        Self {
            title: title.to_string(),
            source_url: url.to_string(),
            regulation_type: regulation_type.to_string(),
            document_type: document_type.to_string(),
            similarity_score: None,
            chunk_text: None,
            document_id: None,
            document_link: None,
        }
    }

    /// Citation for a retrieved chunk.
    pub fn from_chunk(chunk: &RetrievedChunk) -> Self {
        let meta = &chunk.metadata;
        let source_url = if meta.source_link.is_empty() {
            "#".to_string()
        } else {
            meta.source_link.clone()
        };
        let regulation_type = if meta.level.is_empty() {
            "Banking Regulation".to_string()
        } else {
            meta.level.clone()
        };
        let preview: String = chunk.text.chars().take(CHUNK_PREVIEW_CHARS).collect();

        Self {
            title: meta.title.clone(),
            source_url,
            regulation_type,
            document_type: meta.document_type.clone(),
            similarity_score: Some(chunk.similarity_score),
            chunk_text: Some(format!("{preview}...")),
            document_id: Some(meta.document_id.clone()),
            document_link: Some(format!("#document-{}", meta.document_id)),
        }
    }
}

const CHUNK_PREVIEW_CHARS: usize = 200;

const FED: &str = "Federal Reserve Regulation";

/// Canned citations picked by keywords in the question, used when no
/// retrieved chunks are available. First matching rule wins.
pub fn keyword_sources(question: &str) -> Vec<Source> {
    let q = question.to_lowercase();

    if q.contains("fry") {
        return vec![
            Source::fixed(
                "FRY-9C Instructions - Consolidated Financial Statements for Small Bank Holding Companies",
                "https://www.federalreserve.gov/reportforms/forms/FR_Y-9C20240331_f.pdf",
                FED,
                "Regulatory Instructions",
            ),
            Source::fixed(
                "FRY-14A/Q Instructions - Recovery and Resolution Planning for Large Bank Holding Companies",
                "https://www.federalreserve.gov/reportforms/forms/FR_Y-14A20240331_f.pdf",
                FED,
                "Regulatory Instructions",
            ),
        ];
    }
    if q.contains("stress") {
        return vec![capital_planning()];
    }
    if q.contains("liquidity") {
        return vec![
            Source::fixed(
                "Liquidity Coverage Ratio (LCR) Final Rule Implementation Guide",
                "https://www.federalreserve.gov/newsevents/pressreleases/bcreg20140903a.htm",
                FED,
                "Regulatory Guidance",
            ),
            Source::fixed(
                "Net Stable Funding Ratio (NSFR) Requirements and Calculation Methods",
                "https://www.federalreserve.gov/newsevents/pressreleases/bcreg20210520a.htm",
                FED,
                "Regulatory Guidance",
            ),
        ];
    }
    if q.contains("cybersecurity") {
        return vec![Source::fixed(
            "Cybersecurity and Information Technology Risk Management Guidelines",
            "https://www.federalreserve.gov/supervisionreg/srletters/sr2301.htm",
            FED,
            "Supervisory Guidance",
        )];
    }
    if q.contains("model") {
        return vec![Source::fixed(
            "Model Risk Management Guidance for Banking Organizations",
            "https://www.federalreserve.gov/supervisionreg/srletters/sr1107.htm",
            FED,
            "Supervisory Guidance",
        )];
    }
    if is_aml(&q) {
        return vec![Source::fixed(
            "Anti-Money Laundering Program Requirements and Examination Procedures",
            "https://www.fincen.gov/resources/statutes-regulations/guidance/application-fincens-regulations-certain-business-models",
            "FinCEN Regulation",
            "Regulatory Guidance",
        )];
    }
    if q.contains("capital") {
        return vec![capital_planning()];
    }

    vec![Source::fixed(
        "Federal Banking Regulation - Supervisory Guidance",
        "https://www.federalreserve.gov/supervisionreg/srletters/sr2301.htm",
        "Federal Banking Regulation",
        "Supervisory Guidance",
    )]
}

fn is_aml(q: &str) -> bool {
    q.contains("compliance") || q.contains("aml") || q.contains("bsa")
}

fn capital_planning() -> Source {
    Source::fixed(
        "Capital Planning and Stress Testing Guidelines for Large Bank Holding Companies",
        "https://www.federalreserve.gov/newsevents/pressreleases/bcreg20230629a.htm",
        FED,
        "Regulatory Guidance",
    )
}

/// The single citation attached to the quota fallback answer.
pub fn mock_source() -> Source {
    Source::fixed(
        "Federal Reserve Regulation (Mock Source)",
        "https://www.federalreserve.gov/supervisionreg/",
        "Federal Reserve Guidance",
        "Guidelines",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::client::ChunkMetadata;

    #[test]
    fn test_fry_takes_precedence() {
        let sources = keyword_sources("How does FRY relate to stress testing?");
        assert_eq!(sources.len(), 2);
        assert!(sources[0].title.starts_with("FRY-9C"));
    }

    #[test]
    fn test_liquidity_before_capital() {
        let sources = keyword_sources("capital and liquidity buffers");
        assert!(sources[0].title.contains("Liquidity Coverage Ratio"));
    }

    #[test]
    fn test_capital_only() {
        let sources = keyword_sources("minimum capital ratios");
        assert_eq!(sources, vec![capital_planning()]);
    }

    #[test]
    fn test_compliance_maps_to_aml() {
        let sources = keyword_sources("What is BSA compliance?");
        assert_eq!(sources[0].regulation_type, "FinCEN Regulation");
    }

    #[test]
    fn test_default_source() {
        let sources = keyword_sources("Hello");
        assert_eq!(sources[0].title, "Federal Banking Regulation - Supervisory Guidance");
    }

    #[test]
    fn test_chunk_source_defaults() {
        let chunk = RetrievedChunk {
            text: "x".repeat(250),
            metadata: ChunkMetadata {
                document_id: "7".to_string(),
                title: "Basel III".to_string(),
                document_type: "Guidelines".to_string(),
                ..Default::default()
            },
            similarity_score: 0.8,
            ..Default::default()
        };
        let source = Source::from_chunk(&chunk);
        assert_eq!(source.source_url, "#");
        assert_eq!(source.regulation_type, "Banking Regulation");
        assert_eq!(source.chunk_text.as_deref().map(str::len), Some(203));
        assert_eq!(source.document_link.as_deref(), Some("#document-7"));
    }
}

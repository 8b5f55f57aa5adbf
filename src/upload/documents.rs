//! Validation and templated analysis for uploaded policy documents.

use std::sync::LazyLock;

use chrono::NaiveDate;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const ACCEPTED_MIME_FRAGMENTS: [&str; 3] = ["pdf", "msword", "wordprocessingml"];

static DOCUMENT_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(pdf|docx?|txt)$").expect("static regex"));

/// A file part read from the multipart body.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFile>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub original_name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<DocumentAnalysis>,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub title: String,
    pub summary: String,
    pub subheaders: Vec<Subheader>,
    pub metadata: AnalysisMetadata,
    pub key_topics: Vec<String>,
    pub document_structure: Vec<StructureSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subheader {
    pub level: u8,
    pub text: String,
    pub page: u32,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub page_count: u32,
    pub word_count: u32,
    pub language: String,
    pub file_type: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureSection {
    pub section: String,
    pub pages: String,
    pub description: String,
}

/// Reasons a file is rejected before analysis.
pub fn validate_file(file: &IncomingFile, max_bytes: usize) -> Result<(), String> {
    let mime = file.content_type.to_lowercase();
    if !ACCEPTED_MIME_FRAGMENTS.iter().any(|f| mime.contains(f)) {
        return Err(format!("{} is not a supported file type.", file.file_name));
    }
    if file.size > max_bytes {
        return Err(format!(
            "{} is too large. Maximum size is {}MB.",
            file.file_name,
            max_bytes / (1024 * 1024)
        ));
    }
    Ok(())
}

/// Validate each file and attach a mock analysis to the valid ones.
///
/// Fails only when no file was sent at all.
pub fn process_upload<R: Rng>(
    files: Vec<IncomingFile>,
    max_bytes: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Result<UploadResponse, AppError> {
    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    let mut accepted = Vec::new();
    let mut errors = Vec::new();

    for file in files {
        if let Err(reason) = validate_file(&file, max_bytes) {
            tracing::info!("Rejected upload: {reason}");
            errors.push(reason);
            continue;
        }

        let analysis = mock_analysis(&file, today, rng);
        accepted.push(UploadedFile {
            id: uuid::Uuid::new_v4().simple().to_string(),
            original_name: file.file_name,
            size: file.size,
            content_type: file.content_type,
            analysis: Some(analysis),
            status: FileStatus::Completed,
            error: None,
        });
    }

    tracing::info!(accepted = accepted.len(), rejected = errors.len(), "Processed upload");

    Ok(UploadResponse {
        success: !accepted.is_empty(),
        files: accepted,
        errors,
    })
}

pub fn mock_analysis<R: Rng>(file: &IncomingFile, today: NaiveDate, rng: &mut R) -> DocumentAnalysis {
    let mime = file.content_type.to_lowercase();
    let file_type = if mime.contains("pdf") {
        "PDF"
    } else if mime.contains("word") || mime.contains("wordprocessingml") {
        "Word"
    } else {
        "Unknown"
    };

    DocumentAnalysis {
        title: mock_title(&file.file_name, rng),
        summary: SUMMARIES.choose(rng).copied().unwrap_or(SUMMARIES[0]).to_string(),
        subheaders: mock_subheaders(rng),
        metadata: AnalysisMetadata {
            page_count: rng.random_range(5..25),
            word_count: rng.random_range(1000..6000),
            language: "English".to_string(),
            file_type: file_type.to_string(),
            last_modified: today.format("%Y-%m-%d").to_string(),
        },
        key_topics: mock_topics(rng),
        document_structure: STRUCTURE
            .iter()
            .map(|(section, pages, description)| StructureSection {
                section: section.to_string(),
                pages: pages.to_string(),
                description: description.to_string(),
            })
            .collect(),
    }
}

pub fn mock_title<R: Rng>(file_name: &str, rng: &mut R) -> String {
    let base = DOCUMENT_EXTENSION.replace(file_name, "");
    let suffix = TITLE_SUFFIXES.choose(rng).copied().unwrap_or(TITLE_SUFFIXES[0]);
    format!("{base}{suffix}")
}

fn mock_subheaders<R: Rng>(rng: &mut R) -> Vec<Subheader> {
    let count = rng.random_range(7..=12);
    SUBHEADERS
        .iter()
        .take(count)
        .map(|(level, text, page, content)| Subheader {
            level: *level,
            text: text.to_string(),
            page: *page,
            content: content.to_string(),
        })
        .collect()
}

fn mock_topics<R: Rng>(rng: &mut R) -> Vec<String> {
    let mut topics: Vec<&str> = TOPICS.to_vec();
    topics.shuffle(rng);
    let count = rng.random_range(4..=8);
    topics.into_iter().take(count).map(str::to_string).collect()
}

const TITLE_SUFFIXES: [&str; 5] = [
    " - Analysis Report",
    " Framework",
    " Guidelines",
    " Policy Document",
    " Compliance Manual",
];

const SUMMARIES: [&str; 4] = [
    "This document provides comprehensive guidelines for regulatory compliance in the banking sector. It covers risk assessment methodologies, implementation strategies, and reporting requirements essential for maintaining regulatory standards.",
    "An extensive framework outlining operational procedures and best practices for financial institutions. The document emphasizes risk management, compliance protocols, and strategic implementation across various business units.",
    "This policy document establishes the foundational principles for regulatory adherence and risk mitigation. It includes detailed procedures, assessment criteria, and monitoring frameworks for effective compliance management.",
    "A detailed analysis of regulatory requirements with practical implementation guidance. The document covers assessment methodologies, control frameworks, and reporting standards necessary for regulatory compliance.",
];

const SUBHEADERS: [(u8, &str, u32, &str); 13] = [
    (1, "Executive Summary", 1, "Overview of key findings and recommendations"),
    (1, "Introduction", 2, "Document purpose and scope definition"),
    (2, "Background and Context", 3, "Historical context and regulatory environment"),
    (2, "Objectives and Goals", 4, "Primary objectives and expected outcomes"),
    (1, "Regulatory Framework", 5, "Comprehensive regulatory requirements overview"),
    (2, "Risk Assessment Methods", 7, "Methodologies for identifying and assessing risks"),
    (2, "Compliance Standards", 10, "Required compliance standards and benchmarks"),
    (3, "Monitoring Procedures", 12, "Ongoing monitoring and evaluation processes"),
    (3, "Reporting Requirements", 14, "Mandatory reporting standards and timelines"),
    (1, "Implementation Guidelines", 16, "Step-by-step implementation procedures"),
    (2, "Resource Allocation", 18, "Required resources and budget considerations"),
    (2, "Timeline and Milestones", 20, "Implementation timeline with key milestones"),
    (1, "Conclusion and Recommendations", 22, "Summary of recommendations and next steps"),
];

const TOPICS: [&str; 16] = [
    "Risk Management",
    "Regulatory Compliance",
    "Financial Analysis",
    "Operational Controls",
    "Audit Procedures",
    "Policy Framework",
    "Risk Assessment",
    "Compliance Monitoring",
    "Financial Reporting",
    "Internal Controls",
    "Regulatory Standards",
    "Best Practices",
    "Quality Assurance",
    "Performance Metrics",
    "Strategic Planning",
    "Change Management",
];

const STRUCTURE: [(&str, &str, &str); 4] = [
    ("Introduction and Overview", "1-4", "Document introduction, objectives, and scope definition"),
    ("Regulatory Framework", "5-12", "Comprehensive regulatory requirements and compliance standards"),
    ("Implementation Guidelines", "13-18", "Practical implementation procedures and best practices"),
    ("Monitoring and Reporting", "19-22", "Ongoing monitoring procedures and reporting requirements"),
];

//! Server-side answer pipeline behind `POST /api/ask`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chat::sources::{keyword_sources, mock_source, Source};
use crate::error::AppError;
use crate::llm::client::CompletionProvider;
use crate::rag::client::{RagService, RetrievedChunk};

/// Chunks requested from the retrieval service per question.
pub const RAG_TOP_K: usize = 5;

/// Answers longer than this are sent back to the LLM for shortening.
pub const MAX_ANSWER_CHARS: usize = 800;

pub const LLM_NOT_CONFIGURED: &str =
    "LLM API key not configured. Set POLICYDESK__LLM__API_KEY or llm.api_key in the config file.";

pub const GENERATION_FAILED: &str =
    "Failed to generate response. Please check your API key and try again.";

const MOCK_ANSWER: &str = r#"# API Quota Exceeded - Mock Response

I'm currently operating in **mock mode** because the LLM API quota has been exceeded. This is a simulated response to demonstrate the application functionality.

## Key Banking Regulation Points:

- **Capital Requirements**: Banks must maintain minimum capital ratios under Basel III
- **Liquidity Standards**: LCR and NSFR requirements ensure adequate funding
- **Risk Management**: Comprehensive frameworks for operational and credit risk
- **Compliance**: Regular reporting and examination requirements

### Important Notes:
> This is a demonstration response. The actual AI service will resume when the API quota resets.

For more information, please refer to the `Federal Reserve` guidance documents."#;

fn default_use_rag() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    /// Titles of the documents selected in the library.
    #[serde(default)]
    pub selected_documents: Vec<String>,
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub context_documents_used: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_chunks: Option<usize>,
}

impl AskResponse {
    /// Stand-in answer served while the LLM quota is exhausted.
    pub fn quota_fallback() -> Self {
        Self {
            answer: MOCK_ANSWER.to_string(),
            sources: vec![mock_source()],
            context_documents_used: 1,
            confidence: Some("mock".to_string()),
            rag_enabled: None,
            retrieved_chunks: None,
        }
    }
}

/// Numbered context block built from retrieved chunks.
pub fn build_rag_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            format!(
                "Document {}: {}\nType: {} | Risk Type: {}\nRelevance: {:.1}%\n\nContent:\n{}\n\n---",
                index + 1,
                chunk.metadata.title,
                chunk.metadata.document_type,
                chunk.metadata.risk_type,
                chunk.similarity_score * 100.0,
                chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn rag_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a banking regulation expert assistant. Use the provided document context to answer the user's question accurately and comprehensively.

RETRIEVED DOCUMENT CONTEXT:
{context}

USER QUESTION: {question}

INSTRUCTIONS:
- Base your answer primarily on the provided document context above
- Be specific and cite relevant information from the documents
- Use **bold text** for key terms and important regulatory concepts
- Use bullet points for lists of requirements or procedures
- Include specific document references when applicable
- Keep response focused and under 300 words
- Use proper markdown formatting

If the context doesn't contain sufficient information to answer the question, clearly state what information is missing and provide general guidance based on your banking regulation knowledge.

ANSWER:"#
    )
}

/// `context` is empty or starts with a blank line, as produced by
/// [`selected_documents_context`].
pub fn basic_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are a banking regulation expert. Answer this question directly and concisely using proper markdown formatting.

Question: {question}{context}

Requirements:
- Keep response under 150 words
- Be direct and specific
- Focus only on what was asked
- Use **bold text** for key terms and important points
- Use bullet points (- or *) for lists
- Use proper markdown formatting for better readability
- Avoid explanatory text about what you're doing

Answer:"#
    )
}

pub fn shorten_prompt(answer: &str) -> String {
    format!("Make this response much shorter and more direct (under 100 words):\n\n{answer}\n\nShorter version:")
}

pub fn selected_documents_context(titles: &[String]) -> String {
    if titles.is_empty() {
        String::new()
    } else {
        format!("\n\nContext Documents Selected: {}", titles.join(", "))
    }
}

/// First `max` characters plus an ellipsis.
pub fn truncate_answer(answer: &str, max: usize) -> String {
    let head: String = answer.chars().take(max).collect();
    format!("{head}...")
}

/// Answer a question, optionally grounded on retrieved chunks.
///
/// A quota error from the LLM yields the canned fallback answer instead of
/// an error.
pub async fn process_ask(
    llm: Option<&dyn CompletionProvider>,
    rag: &dyn RagService,
    request: AskRequest,
) -> Result<AskResponse, AppError> {
    // 1. Validate the question
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("Question is required".into()));
    }

    // 2. The LLM must be configured
    let Some(llm) = llm else {
        return Err(AppError::Config(LLM_NOT_CONFIGURED.into()));
    };

    match answer_question(llm, rag, question, &request).await {
        Ok(response) => Ok(response),
        Err(AppError::QuotaExceeded(msg)) => {
            warn!("LLM quota exceeded, serving mock answer: {msg}");
            Ok(AskResponse::quota_fallback())
        }
        Err(e) => {
            warn!("LLM generation failed: {e}");
            Err(AppError::Upstream(GENERATION_FAILED.into()))
        }
    }
}

async fn answer_question(
    llm: &dyn CompletionProvider,
    rag: &dyn RagService,
    question: &str,
    request: &AskRequest,
) -> Result<AskResponse, AppError> {
    // 3. Probe the retrieval service
    let rag_available = request.use_rag && rag.is_healthy().await;

    // 4. Retrieve chunks
    let mut context = String::new();
    let mut rag_sources = Vec::new();
    let mut retrieved_chunks = 0;

    if rag_available {
        match rag.search(question, RAG_TOP_K).await {
            Ok(chunks) => {
                retrieved_chunks = chunks.len();
                if !chunks.is_empty() {
                    context = build_rag_context(&chunks);
                    rag_sources = chunks.iter().map(Source::from_chunk).collect();
                }
            }
            Err(e) => warn!("RAG search failed, falling back to basic mode: {e}"),
        }
    }

    // 5. Fall back to the selected titles
    let has_rag_context = !context.is_empty();
    if !has_rag_context {
        context = selected_documents_context(&request.selected_documents);
    }

    // 6. Generate
    let prompt = if rag_available && has_rag_context {
        rag_prompt(&context, question)
    } else {
        basic_prompt(question, &context)
    };
    let mut answer = llm.generate(&prompt).await?;

    // 7. Shorten long answers
    if answer.chars().count() > MAX_ANSWER_CHARS {
        answer = match llm.generate(&shorten_prompt(&answer)).await {
            Ok(shorter) => shorter,
            Err(e) => {
                warn!("Shortening failed, truncating: {e}");
                truncate_answer(&answer, MAX_ANSWER_CHARS)
            }
        };
    }

    // 8. Sources
    let sources = if rag_sources.is_empty() {
        keyword_sources(question)
    } else {
        rag_sources
    };

    // 9. Assemble
    let context_documents_used = if request.selected_documents.is_empty() {
        sources.len()
    } else {
        request.selected_documents.len()
    };
    let confidence = if rag_available && retrieved_chunks > 0 {
        "95%"
    } else {
        "92%"
    };

    info!(
        rag = rag_available,
        chunks = retrieved_chunks,
        sources = sources.len(),
        "Answered question"
    );

    Ok(AskResponse {
        answer,
        sources,
        context_documents_used,
        confidence: Some(confidence.to_string()),
        rag_enabled: Some(rag_available),
        retrieved_chunks: Some(retrieved_chunks),
    })
}

/// Axum handler for `POST /api/ask`.
pub async fn ask_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::Json(request): axum::Json<AskRequest>,
) -> Result<axum::Json<AskResponse>, AppError> {
    let response = process_ask(state.llm.as_deref(), state.rag.as_ref(), request).await?;
    Ok(axum::Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockCompletionProvider;
    use crate::rag::client::{ChunkMetadata, MockRagService};

    fn request(question: &str) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            selected_documents: Vec::new(),
            use_rag: true,
        }
    }

    fn offline_rag() -> MockRagService {
        let mut rag = MockRagService::new();
        rag.expect_is_healthy().returning(|| false);
        rag.expect_search().never();
        rag
    }

    fn chunk(id: &str, title: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: format!("{title} requires banks to hold capital."),
            metadata: ChunkMetadata {
                document_id: id.to_string(),
                title: title.to_string(),
                document_type: "Guidelines".to_string(),
                level: "Group".to_string(),
                ..Default::default()
            },
            similarity_score: 0.87,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let llm = MockCompletionProvider::new();
        let err = process_ask(Some(&llm), &offline_rag(), request("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Question is required"));
    }

    #[tokio::test]
    async fn test_unconfigured_llm() {
        let err = process_ask(None, &offline_rag(), request("What is CET1?"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_basic_mode_uses_selected_titles() {
        let mut llm = MockCompletionProvider::new();
        llm.expect_generate()
            .withf(|prompt| prompt.contains("Context Documents Selected: Basel III, CECL"))
            .times(1)
            .returning(|_| Ok("**CET1** is 4.5%.".to_string()));

        let mut req = request("What is the minimum capital ratio?");
        req.selected_documents = vec!["Basel III".to_string(), "CECL".to_string()];

        let response = process_ask(Some(&llm), &offline_rag(), req).await.unwrap();
        assert_eq!(response.answer, "**CET1** is 4.5%.");
        assert_eq!(response.confidence.as_deref(), Some("92%"));
        assert_eq!(response.rag_enabled, Some(false));
        assert_eq!(response.retrieved_chunks, Some(0));
        assert_eq!(response.context_documents_used, 2);
        assert!(response.sources[0].title.starts_with("Capital Planning"));
    }

    #[tokio::test]
    async fn test_rag_mode_builds_sources_from_chunks() {
        let mut rag = MockRagService::new();
        rag.expect_is_healthy().returning(|| true);
        rag.expect_search()
            .withf(|_, top_k| *top_k == RAG_TOP_K)
            .returning(|_, _| Ok(vec![chunk("3", "Regulation YY"), chunk("7", "Basel III")]));

        let mut llm = MockCompletionProvider::new();
        llm.expect_generate()
            .withf(|prompt| prompt.contains("RETRIEVED DOCUMENT CONTEXT") && prompt.contains("Document 2: Basel III"))
            .returning(|_| Ok("Grounded answer".to_string()));

        let response = process_ask(Some(&llm), &rag, request("capital?")).await.unwrap();
        assert_eq!(response.confidence.as_deref(), Some("95%"));
        assert_eq!(response.rag_enabled, Some(true));
        assert_eq!(response.retrieved_chunks, Some(2));
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].source_url, "#");
        assert_eq!(response.context_documents_used, 2);
    }

    #[tokio::test]
    async fn test_rag_search_error_falls_back() {
        let mut rag = MockRagService::new();
        rag.expect_is_healthy().returning(|| true);
        rag.expect_search()
            .returning(|_, _| Err(AppError::Upstream("down".into())));

        let mut llm = MockCompletionProvider::new();
        llm.expect_generate()
            .withf(|prompt| prompt.starts_with("You are a banking regulation expert. Answer"))
            .returning(|_| Ok("Basic answer".to_string()));

        let response = process_ask(Some(&llm), &rag, request("liquidity?")).await.unwrap();
        assert_eq!(response.rag_enabled, Some(true));
        assert_eq!(response.confidence.as_deref(), Some("92%"));
        assert!(response.sources[0].title.contains("Liquidity"));
    }

    #[tokio::test]
    async fn test_use_rag_false_skips_probe() {
        let mut rag = MockRagService::new();
        rag.expect_is_healthy().never();

        let mut llm = MockCompletionProvider::new();
        llm.expect_generate().returning(|_| Ok("ok".to_string()));

        let mut req = request("model risk");
        req.use_rag = false;
        let response = process_ask(Some(&llm), &rag, req).await.unwrap();
        assert_eq!(response.rag_enabled, Some(false));
    }

    #[tokio::test]
    async fn test_long_answer_is_shortened() {
        let mut llm = MockCompletionProvider::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("a".repeat(900)));
        llm.expect_generate()
            .withf(|prompt| prompt.starts_with("Make this response much shorter"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("short".to_string()));

        let response = process_ask(Some(&llm), &offline_rag(), request("q")).await.unwrap();
        assert_eq!(response.answer, "short");
    }

    #[tokio::test]
    async fn test_long_answer_truncated_when_shortening_fails() {
        let mut llm = MockCompletionProvider::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("b".repeat(1000)));
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Upstream("boom".into())));

        let response = process_ask(Some(&llm), &offline_rag(), request("q")).await.unwrap();
        assert_eq!(response.answer.chars().count(), MAX_ANSWER_CHARS + 3);
        assert!(response.answer.ends_with("..."));
    }

    #[tokio::test]
    async fn test_quota_error_returns_mock() {
        let mut llm = MockCompletionProvider::new();
        llm.expect_generate()
            .returning(|_| Err(AppError::QuotaExceeded("429".into())));

        let response = process_ask(Some(&llm), &offline_rag(), request("q")).await.unwrap();
        assert_eq!(response.confidence.as_deref(), Some("mock"));
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.context_documents_used, 1);
        assert!(response.answer.contains("mock mode"));
    }

    #[tokio::test]
    async fn test_other_llm_error_is_upstream() {
        let mut llm = MockCompletionProvider::new();
        llm.expect_generate()
            .returning(|_| Err(AppError::Upstream("invalid key".into())));

        let err = process_ask(Some(&llm), &offline_rag(), request("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(msg) if msg == GENERATION_FAILED));
    }

    #[test]
    fn test_rag_context_format() {
        let context = build_rag_context(&[chunk("1", "FRY-9C")]);
        assert!(context.starts_with("Document 1: FRY-9C\nType: Guidelines | Risk Type: \nRelevance: 87.0%"));
        assert!(context.ends_with("---"));
    }
}

use crate::models::document::Document;

const MAX_PROMPTS: usize = 5;

pub const DEFAULT_PROMPTS: [&str; 5] = [
    "What is FRY?",
    "Explain Basel III capital requirements",
    "What are CCAR stress testing requirements?",
    "How does the CECL methodology work?",
    "What is the purpose of Call Reports?",
];

/// Title fragments and the prompt each one suggests. Matching is
/// case-sensitive so that e.g. "CRA" does not fire on "ccra".
const TITLE_PROMPTS: &[(&[&str], &str)] = &[
    (&["FRY"], "What is FRY and what are the differences between FRY-9C and FRY-4?"),
    (&["Basel III"], "What are the key Basel III capital ratio requirements?"),
    (&["CCAR", "DFAST"], "How do CCAR and DFAST stress tests differ?"),
    (&["CECL"], "How should banks implement CECL methodology?"),
    (&["Regulation YY"], "What are the enhanced prudential standards under Regulation YY?"),
    (&["Model Risk"], "What are the key components of model risk management?"),
    (&["Cybersecurity"], "What are the FFIEC cybersecurity assessment requirements?"),
    (&["Call Report"], "What are the key Call Report filing requirements for banks?"),
    (&["AML"], "What are the essential components of an AML program?"),
    (&["CRA"], "How are banks evaluated under the Community Reinvestment Act?"),
];

/// Suggested chat questions for the current selection.
///
/// Falls back to [`DEFAULT_PROMPTS`] when nothing is selected. The result is
/// de-duplicated in first-seen order and capped at five entries.
pub fn suggested_prompts(selected: &[&Document]) -> Vec<String> {
    if selected.is_empty() {
        return DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect();
    }

    let mut prompts: Vec<&str> = Vec::new();
    for doc in selected {
        for (needles, prompt) in TITLE_PROMPTS {
            if needles.iter().any(|needle| doc.title.contains(needle)) {
                prompts.push(prompt);
            }
        }
    }

    let has_topic = |topic: &str| selected.iter().any(|d| d.topic.as_deref() == Some(topic));
    let has_risk = |risk: &str| selected.iter().any(|d| d.risk_type.as_deref() == Some(risk));

    if has_topic("Financial Reporting") {
        prompts.push("What are the key financial reporting requirements for bank holding companies?");
    }
    if has_topic("Basel III Compliance") {
        prompts.push("How do banks ensure compliance with Basel III requirements?");
    }
    if has_risk("Compliance Risk") {
        prompts.push("What are the main compliance risks banks need to manage?");
    }

    let mut unique: Vec<String> = Vec::with_capacity(MAX_PROMPTS);
    for prompt in prompts {
        if unique.len() == MAX_PROMPTS {
            break;
        }
        if !unique.iter().any(|p| p == prompt) {
            unique.push(prompt.to_string());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, topic: Option<&str>, risk: Option<&str>) -> Document {
        Document {
            id: title.to_string(),
            title: title.to_string(),
            category: "Guidelines".to_string(),
            content: String::new(),
            publication_date: "2024-12-01".to_string(),
            level: "Group".to_string(),
            owning_business_group: "Compliance".to_string(),
            region: None,
            risk_type: risk.map(str::to_string),
            topic: topic.map(str::to_string),
            source_url: None,
            summary: None,
            is_bookmarked: None,
        }
    }

    #[test]
    fn test_defaults_when_nothing_selected() {
        assert_eq!(suggested_prompts(&[]), DEFAULT_PROMPTS.to_vec());
    }

    #[test]
    fn test_title_and_topic_prompts_are_deduplicated() {
        let a = doc("FRY-9C Consolidated Financial Statements", Some("Financial Reporting"), None);
        let b = doc("FRY-4 Annual Report", Some("Financial Reporting"), None);

        let prompts = suggested_prompts(&[&a, &b]);
        assert_eq!(
            prompts,
            vec![
                "What is FRY and what are the differences between FRY-9C and FRY-4?",
                "What are the key financial reporting requirements for bank holding companies?",
            ]
        );
    }

    #[test]
    fn test_capped_at_five() {
        let docs = [
            doc("Basel III CCAR CECL", None, Some("Compliance Risk")),
            doc("Regulation YY Model Risk", None, None),
            doc("Cybersecurity AML", None, None),
        ];
        let refs: Vec<&Document> = docs.iter().collect();
        let prompts = suggested_prompts(&refs);
        assert_eq!(prompts.len(), 5);
        assert_eq!(prompts[0], "What are the key Basel III capital ratio requirements?");
    }

    #[test]
    fn test_no_match_gives_empty_list() {
        let a = doc("Vendor onboarding", None, None);
        assert!(suggested_prompts(&[&a]).is_empty());
    }
}

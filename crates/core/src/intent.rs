use crate::models::FinanceTopic;

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Keyword order is the tie-break: when several keywords appear in one
/// message the earliest table entry wins. Matching is plain substring
/// search, no word boundaries ("savesomething" still counts as Save).
const TOPIC_KEYWORDS: &[(&str, FinanceTopic)] = &[
    ("budget", FinanceTopic::Budget),
    ("invest", FinanceTopic::Invest),
    ("save", FinanceTopic::Save),
    ("tax", FinanceTopic::Tax),
];

pub fn classify_topic(text: &str) -> FinanceTopic {
    let lower = text.to_lowercase();

    for (keyword, topic) in TOPIC_KEYWORDS {
        if lower.contains(keyword) {
            return *topic;
        }
    }

    FinanceTopic::General
}

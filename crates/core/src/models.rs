use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Student,
    Professional,
}

impl ProfileType {
    pub fn from_optional_str(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "student" => Some(Self::Student),
            Some(v) if v == "professional" || v == "pro" => Some(Self::Professional),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professional => "professional",
        }
    }
}

/// One month of user-entered amounts. All fields are pre-sanitized,
/// non-negative numbers by the time the engines see them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub income: f64,
    pub housing: f64,
    pub food: f64,
    pub transportation: f64,
    pub entertainment: f64,
    pub utilities: f64,
    pub other: f64,
}

impl BudgetRecord {
    /// Clamps negative amounts to zero. Form boundaries call this before
    /// handing the record to the engines.
    pub fn sanitized(self) -> Self {
        Self {
            income: self.income.max(0.0),
            housing: self.housing.max(0.0),
            food: self.food.max(0.0),
            transportation: self.transportation.max(0.0),
            entertainment: self.entertainment.max(0.0),
            utilities: self.utilities.max(0.0),
            other: self.other.max(0.0),
        }
    }
}

/// Collapses non-numeric or empty form input to zero, never an error.
pub fn amount_or_zero(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0)
}

/// Derived quantities, recomputed on every analysis. `income` is carried
/// through so rule evaluation can distinguish a zero-income month from a
/// zero-housing one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetMetrics {
    pub income: f64,
    pub total_expenses: f64,
    pub remaining_budget: f64,
    pub savings_rate: f64,
    pub housing_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Good,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub status: RecommendationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceTopic {
    Budget,
    Invest,
    Save,
    Tax,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub at: DateTime<Utc>,
}

/// Raw chat input as the presentation layer hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub text: String,
    pub profile: Option<String>,
}

/// A submitted user message waiting for its bot reply. While one of these
/// exists the session accepts no further submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTurn {
    pub text: String,
}

/// The conversation log plus per-session settings. The message sequence is
/// append-only and is the conversation's entire state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub profile: Option<ProfileType>,
    pub messages: Vec<ChatMessage>,
    pub pending_turn: Option<PendingTurn>,
    pub next_message_id: u64,
}

impl ChatSession {
    pub fn new(session_id: impl Into<String>, profile: Option<ProfileType>) -> Self {
        Self {
            session_id: session_id.into(),
            profile,
            messages: Vec::new(),
            pending_turn: None,
            next_message_id: 1,
        }
    }

    pub fn append_message(&mut self, text: String, sender: Sender) -> ChatMessage {
        let id = self.next_message_id;
        self.next_message_id += 1;
        let message = ChatMessage {
            id,
            text,
            sender,
            at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }
}

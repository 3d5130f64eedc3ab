pub mod budget;
pub mod intent;
pub mod models;
pub mod responses;

pub use budget::{compute_metrics, evaluate_budget};
pub use intent::{classify_topic, normalize_text};
pub use models::*;
pub use responses::{greeting, select_response, GENERAL_RESPONSES};

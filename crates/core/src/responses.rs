use rand::Rng;

use crate::models::{FinanceTopic, ProfileType};

const BUDGET_STUDENT: &str = "As a student, I recommend the 50/30/20 rule adapted for your situation: 50% for needs (tuition, books, food), 30% for wants (entertainment, dining out), and 20% for savings and debt repayment. Start with even $25/month in savings!";
const BUDGET_PROFESSIONAL: &str = "For professionals, I suggest the 50/30/20 rule: 50% needs, 30% wants, 20% savings/investments. Consider increasing savings to 25-30% if possible for faster wealth building.";
const BUDGET_NEUTRAL: &str = "A solid starting point is the 50/30/20 rule: 50% of income for needs, 30% for wants, and 20% for savings. Track a full month of spending first so the split reflects reality.";

const INVEST_STUDENT: &str = "Great question! As a student, start simple: open a Roth IRA and invest in low-cost index funds. Even $50/month can grow significantly over time. Focus on building the habit now!";
const INVEST_PROFESSIONAL: &str = "For professionals, diversify with a mix of 401(k), IRA, and taxable accounts. Consider index funds, target-date funds, and individual stocks. Aim to invest 15-20% of your income.";
const INVEST_NEUTRAL: &str = "Start with low-cost, diversified index funds inside a tax-advantaged account, and invest a fixed amount every month. Consistency matters far more than timing.";

const SAVE_STUDENT: &str = "Building savings as a student is crucial! Start with a $500 emergency fund, then work toward 3 months of expenses. Use high-yield savings accounts and automate transfers.";
const SAVE_PROFESSIONAL: &str = "Build a 3-6 month emergency fund first, then focus on retirement savings. Consider high-yield savings accounts and money market accounts for better returns.";
const SAVE_NEUTRAL: &str = "Build an emergency fund before anything else, keep it in a high-yield savings account, and automate a transfer every payday so saving never depends on willpower.";

const TAX_STUDENT: &str = "Student tax tips: Don't forget the American Opportunity Tax Credit (up to $2,500), deduct student loan interest, and file even if you didn't earn much - you might get money back!";
const TAX_PROFESSIONAL: &str = "Maximize tax-advantaged accounts like 401(k) and IRA. Consider tax-loss harvesting, HSA contributions, and whether itemizing vs. standard deduction saves more.";
const TAX_NEUTRAL: &str = "Make the most of tax-advantaged accounts first, keep records of deductible expenses through the year, and check whether itemizing beats the standard deduction before filing.";

/// The profile-neutral fallback bucket for messages that match no topic
/// keyword. Exactly three entries, chosen uniformly.
pub const GENERAL_RESPONSES: [&str; 3] = [
    "I'm here to help with your personal finance questions! Feel free to ask about budgeting, saving, investing, or taxes.",
    "That's a great financial question! Let me provide some personalized advice based on your situation.",
    "Financial planning is important at any stage of life. What specific area would you like to focus on?",
];

/// Maps (topic, profile) to the canned answer catalog. Only the General
/// branch is nondeterministic, and only through the injected `rng`, so a
/// seeded source reproduces the same fallback sequence.
pub fn select_response<R: Rng>(
    topic: FinanceTopic,
    profile: Option<ProfileType>,
    rng: &mut R,
) -> &'static str {
    match topic {
        FinanceTopic::Budget => by_profile(profile, BUDGET_STUDENT, BUDGET_PROFESSIONAL, BUDGET_NEUTRAL),
        FinanceTopic::Invest => by_profile(profile, INVEST_STUDENT, INVEST_PROFESSIONAL, INVEST_NEUTRAL),
        FinanceTopic::Save => by_profile(profile, SAVE_STUDENT, SAVE_PROFESSIONAL, SAVE_NEUTRAL),
        FinanceTopic::Tax => by_profile(profile, TAX_STUDENT, TAX_PROFESSIONAL, TAX_NEUTRAL),
        FinanceTopic::General => GENERAL_RESPONSES[rng.random_range(0..GENERAL_RESPONSES.len())],
    }
}

fn by_profile(
    profile: Option<ProfileType>,
    student: &'static str,
    professional: &'static str,
    neutral: &'static str,
) -> &'static str {
    match profile {
        Some(ProfileType::Student) => student,
        Some(ProfileType::Professional) => professional,
        None => neutral,
    }
}

/// Opening message appended to every fresh session's log.
pub fn greeting(profile: Option<ProfileType>) -> String {
    match profile {
        Some(profile) => format!(
            "Hi! I'm your personal finance assistant. I see you're a {}. I can help you with budgeting, saving, investing, and tax planning tailored to your situation. What would you like to know?",
            profile.as_code()
        ),
        None => "Hi! I'm your personal finance assistant. I can help you with budgeting, saving, investing, and tax planning. What would you like to know?".to_string(),
    }
}

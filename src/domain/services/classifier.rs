#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;

use crate::domain::models::FragmentKind;

/// Routing rules in priority order. The first rule with a keyword found in
/// the lowercased text wins, so reordering changes routing of texts that
/// match several rules.
pub const RULES: &[(FragmentKind, &[&str])] = &[
    (
        FragmentKind::Help,
        &["help", "what can you do", "how do i use", "commands"],
    ),
    (
        FragmentKind::CameraFeed,
        &["camera", "cctv", "surveillance", "footage", "video feed"],
    ),
    (
        FragmentKind::StaffManagement,
        &["staff", "employee", "shift", "roster", "schedule"],
    ),
    (
        FragmentKind::InventoryManagement,
        &["inventory", "stock", "restock", "warehouse"],
    ),
    (
        FragmentKind::CostAnalytics,
        &["cost", "expense", "spending", "margin", "profit"],
    ),
    (
        FragmentKind::Forecast,
        &["forecast", "predict", "projection", "outlook"],
    ),
    (
        FragmentKind::SalesData,
        &["sales", "revenue", "transactions", "orders"],
    ),
    (
        FragmentKind::Dashboard,
        &["dashboard", "overview", "summary", "kpi", "metrics"],
    ),
];

pub struct IntentClassifier {}

impl IntentClassifier {
    pub fn classify(text: &str) -> FragmentKind {
        let lowered = text.to_lowercase();

        return RULES
            .iter()
            .find(|(_, keywords)| {
                return keywords.iter().any(|keyword| return lowered.contains(keyword));
            })
            .map(|(kind, _)| return *kind)
            .unwrap_or(FragmentKind::Code);
    }
}

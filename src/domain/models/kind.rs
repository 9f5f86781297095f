use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;

/// Every fragment a submission can be routed to. `Code` is the generative
/// kind, everything else is synthesized locally.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FragmentKind {
    Code,
    CameraFeed,
    Dashboard,
    SalesData,
    StaffManagement,
    InventoryManagement,
    CostAnalytics,
    Forecast,
    Help,
}

impl FragmentKind {
    pub fn is_generative(&self) -> bool {
        return *self == FragmentKind::Code;
    }

    pub fn is_canned(&self) -> bool {
        return !self.is_generative();
    }

    /// Label used while the kind is loading.
    pub fn loading_label(&self) -> &'static str {
        match self {
            FragmentKind::Code => return "Generating",
            FragmentKind::CameraFeed => return "Connecting to cameras",
            FragmentKind::Dashboard => return "Building dashboard",
            FragmentKind::SalesData => return "Crunching sales",
            FragmentKind::StaffManagement => return "Loading staff roster",
            FragmentKind::InventoryManagement => return "Counting inventory",
            FragmentKind::CostAnalytics => return "Analyzing costs",
            FragmentKind::Forecast => return "Forecasting",
            FragmentKind::Help => return "Looking up help",
        }
    }
}

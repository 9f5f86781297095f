#[cfg(test)]
#[path = "fragment_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::FragmentKind;

/// Generated code artifact. Every field is optional so the same type carries
/// partial values while a stream is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_additional_dependencies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dependencies_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl CodeFragment {
    pub fn has_executable_code(&self) -> bool {
        return self
            .code
            .as_ref()
            .map(|code| return !code.trim().is_empty())
            .unwrap_or(false);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub location: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub change: String,
}

impl Metric {
    pub fn new(label: &str, value: &str, change: &str) -> Metric {
        return Metric {
            label: label.to_string(),
            value: value.to_string(),
            change: change.to_string(),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub name: String,
    pub role: String,
    pub shift: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    pub name: String,
    pub on_hand: u32,
    pub reorder_point: u32,
}

impl InventoryItem {
    pub fn needs_restock(&self) -> bool {
        return self.on_hand <= self.reorder_point;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    Code(CodeFragment),
    CameraFeed {
        commentary: String,
        store_name: String,
        cameras: Vec<Camera>,
    },
    Dashboard {
        commentary: String,
        store_name: String,
        period: String,
        metrics: Vec<Metric>,
    },
    SalesData {
        commentary: String,
        store_name: String,
        period: String,
        metrics: Vec<Metric>,
        top_products: Vec<String>,
    },
    StaffManagement {
        commentary: String,
        store_name: String,
        shift: String,
        staff: Vec<StaffMember>,
    },
    InventoryManagement {
        commentary: String,
        store_name: String,
        items: Vec<InventoryItem>,
    },
    CostAnalytics {
        commentary: String,
        store_name: String,
        period: String,
        categories: Vec<Metric>,
    },
    Forecast {
        commentary: String,
        store_name: String,
        horizon: String,
        points: Vec<Metric>,
    },
    Help {
        commentary: String,
        examples: Vec<String>,
    },
}

impl Fragment {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Fragment::Code(_) => return FragmentKind::Code,
            Fragment::CameraFeed { .. } => return FragmentKind::CameraFeed,
            Fragment::Dashboard { .. } => return FragmentKind::Dashboard,
            Fragment::SalesData { .. } => return FragmentKind::SalesData,
            Fragment::StaffManagement { .. } => return FragmentKind::StaffManagement,
            Fragment::InventoryManagement { .. } => return FragmentKind::InventoryManagement,
            Fragment::CostAnalytics { .. } => return FragmentKind::CostAnalytics,
            Fragment::Forecast { .. } => return FragmentKind::Forecast,
            Fragment::Help { .. } => return FragmentKind::Help,
        }
    }

    pub fn commentary(&self) -> Option<&str> {
        match self {
            Fragment::Code(code) => return code.commentary.as_deref(),
            Fragment::CameraFeed { commentary, .. }
            | Fragment::Dashboard { commentary, .. }
            | Fragment::SalesData { commentary, .. }
            | Fragment::StaffManagement { commentary, .. }
            | Fragment::InventoryManagement { commentary, .. }
            | Fragment::CostAnalytics { commentary, .. }
            | Fragment::Forecast { commentary, .. }
            | Fragment::Help { commentary, .. } => return Some(commentary),
        }
    }

    pub fn store_name(&self) -> Option<&str> {
        match self {
            Fragment::CameraFeed { store_name, .. }
            | Fragment::Dashboard { store_name, .. }
            | Fragment::SalesData { store_name, .. }
            | Fragment::StaffManagement { store_name, .. }
            | Fragment::InventoryManagement { store_name, .. }
            | Fragment::CostAnalytics { store_name, .. }
            | Fragment::Forecast { store_name, .. } => return Some(store_name),
            Fragment::Code(_) | Fragment::Help { .. } => return None,
        }
    }

    pub fn as_code(&self) -> Option<&CodeFragment> {
        if let Fragment::Code(code) = self {
            return Some(code);
        }

        return None;
    }
}

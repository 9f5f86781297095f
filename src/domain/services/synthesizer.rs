#[cfg(test)]
#[path = "synthesizer_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::Camera;
use crate::domain::models::Fragment;
use crate::domain::models::FragmentKind;
use crate::domain::models::InventoryItem;
use crate::domain::models::Metric;
use crate::domain::models::StaffMember;

pub const DEFAULT_STORE_NAME: &str = "Main Street";

static STORE_NAME: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(
        r"\b(?i:store|shop|location)\s+(?:(?i:called|named)\s+)?([A-Z][\w'&-]*(?:\s+[A-Z][\w'&-]*)*)",
    )
    .expect("store name pattern is valid");
});

const PERIODS: &[(&str, &str)] = &[
    ("today", "Today"),
    ("yesterday", "Yesterday"),
    ("last week", "Last Week"),
    ("last month", "Last Month"),
    ("week", "This Week"),
    ("month", "This Month"),
    ("quarter", "This Quarter"),
    ("year", "This Year"),
];
const DEFAULT_PERIOD: &str = "This Month";

const SHIFTS: &[(&str, &str)] = &[
    ("morning", "Morning"),
    ("afternoon", "Afternoon"),
    ("evening", "Evening"),
    ("night", "Night"),
];
const DEFAULT_SHIFT: &str = "All Shifts";

const HORIZONS: &[(&str, &str)] = &[
    ("next week", "Next 7 Days"),
    ("next month", "Next Month"),
    ("next quarter", "Next Quarter"),
    ("next year", "Next Year"),
];
const DEFAULT_HORIZON: &str = "Next 30 Days";

const CAMERA_LOCATIONS: [&str; 6] = [
    "Main Entrance",
    "Checkout Lanes",
    "Produce Aisle",
    "Stockroom",
    "Parking Lot",
    "Loading Dock",
];

/// Last capitalized phrase following a store, shop or location token.
pub fn extract_store_name(text: &str) -> String {
    return STORE_NAME
        .captures_iter(text)
        .last()
        .and_then(|caps| return caps.get(1))
        .map(|name| return name.as_str().to_string())
        .unwrap_or_else(|| return DEFAULT_STORE_NAME.to_string());
}

fn pick(text: &str, table: &[(&str, &'static str)], default: &'static str) -> String {
    let lowered = text.to_lowercase();

    return table
        .iter()
        .find(|(keyword, _)| return lowered.contains(keyword))
        .map(|(_, label)| return *label)
        .unwrap_or(default)
        .to_string();
}

pub fn extract_period(text: &str) -> String {
    return pick(text, PERIODS, DEFAULT_PERIOD);
}

pub fn extract_shift(text: &str) -> String {
    return pick(text, SHIFTS, DEFAULT_SHIFT);
}

pub fn extract_horizon(text: &str) -> String {
    return pick(text, HORIZONS, DEFAULT_HORIZON);
}

fn cameras() -> Vec<Camera> {
    return CAMERA_LOCATIONS
        .iter()
        .enumerate()
        .map(|(idx, location)| {
            let status = if *location == "Loading Dock" {
                "offline"
            } else {
                "online"
            };

            return Camera {
                id: format!("cam-{}", idx + 1),
                location: location.to_string(),
                status: status.to_string(),
            };
        })
        .collect();
}

fn staff(shift: &str) -> Vec<StaffMember> {
    let roster = [
        ("Maria Lopez", "Store Manager", "Morning"),
        ("James Chen", "Cashier", "Morning"),
        ("Aisha Patel", "Stock Associate", "Afternoon"),
        ("Lena Novak", "Cashier", "Evening"),
        ("Tom Becker", "Security", "Night"),
    ];

    return roster
        .iter()
        .filter(|(_, _, member_shift)| {
            return shift == DEFAULT_SHIFT || *member_shift == shift;
        })
        .map(|(name, role, member_shift)| {
            return StaffMember {
                name: name.to_string(),
                role: role.to_string(),
                shift: member_shift.to_string(),
            };
        })
        .collect();
}

fn inventory() -> Vec<InventoryItem> {
    let items = [
        ("SKU-1001", "Cold Brew Coffee", 42, 20),
        ("SKU-1002", "Sourdough Loaf", 8, 15),
        ("SKU-1003", "Organic Bananas", 120, 50),
        ("SKU-1004", "Oat Milk", 6, 12),
        ("SKU-1005", "Sparkling Water", 64, 24),
    ];

    return items
        .iter()
        .map(|(sku, name, on_hand, reorder_point)| {
            return InventoryItem {
                sku: sku.to_string(),
                name: name.to_string(),
                on_hand: *on_hand,
                reorder_point: *reorder_point,
            };
        })
        .collect();
}

pub struct CannedSynthesizer {}

impl CannedSynthesizer {
    /// Builds the fragment for a canned kind. The generative kind has no
    /// canned form and yields `None`.
    pub fn synthesize(kind: FragmentKind, text: &str) -> Option<Fragment> {
        let store_name = extract_store_name(text);

        let fragment = match kind {
            FragmentKind::Code => return None,
            FragmentKind::CameraFeed => {
                let cameras = cameras();
                let online = cameras.iter().filter(|c| return c.status == "online").count();
                Fragment::CameraFeed {
                    commentary: format!(
                        "Here are the live camera feeds for {store_name}. {online} of {} cameras are online.",
                        cameras.len()
                    ),
                    store_name,
                    cameras,
                }
            }
            FragmentKind::Dashboard => {
                let period = extract_period(text);
                Fragment::Dashboard {
                    commentary: format!(
                        "Here's the performance dashboard for {store_name} ({period})."
                    ),
                    store_name,
                    period,
                    metrics: vec![
                        Metric::new("Revenue", "$48,250", "+12%"),
                        Metric::new("Transactions", "1,284", "+5%"),
                        Metric::new("Average Basket", "$37.58", "+3%"),
                        Metric::new("Foot Traffic", "3,910", "-2%"),
                    ],
                }
            }
            FragmentKind::SalesData => {
                let period = extract_period(text);
                Fragment::SalesData {
                    commentary: format!("Sales for {store_name} ({period}) are trending up."),
                    store_name,
                    period,
                    metrics: vec![
                        Metric::new("Total Sales", "$48,250", "+12%"),
                        Metric::new("Units Sold", "6,402", "+8%"),
                        Metric::new("Conversion Rate", "32.8%", "+1.4%"),
                    ],
                    top_products: vec![
                        "Cold Brew Coffee".to_string(),
                        "Sourdough Loaf".to_string(),
                        "Organic Bananas".to_string(),
                    ],
                }
            }
            FragmentKind::StaffManagement => {
                let shift = extract_shift(text);
                let staff = staff(&shift);
                Fragment::StaffManagement {
                    commentary: format!(
                        "{} staff members are scheduled at {store_name} ({shift}).",
                        staff.len()
                    ),
                    store_name,
                    shift,
                    staff,
                }
            }
            FragmentKind::InventoryManagement => {
                let items = inventory();
                let low = items.iter().filter(|item| return item.needs_restock()).count();
                Fragment::InventoryManagement {
                    commentary: format!(
                        "{low} of {} tracked items at {store_name} are at or below their reorder point.",
                        items.len()
                    ),
                    store_name,
                    items,
                }
            }
            FragmentKind::CostAnalytics => {
                let period = extract_period(text);
                Fragment::CostAnalytics {
                    commentary: format!(
                        "Here's where the money went at {store_name} ({period}). Payroll remains the largest cost."
                    ),
                    store_name,
                    period,
                    categories: vec![
                        Metric::new("Payroll", "$18,400", "+4%"),
                        Metric::new("Inventory", "$15,900", "+9%"),
                        Metric::new("Rent", "$6,000", "0%"),
                        Metric::new("Utilities", "$1,850", "-6%"),
                        Metric::new("Marketing", "$1,200", "+15%"),
                    ],
                }
            }
            FragmentKind::Forecast => {
                let horizon = extract_horizon(text);
                Fragment::Forecast {
                    commentary: format!(
                        "Forecast for {store_name} over the {}.",
                        horizon.to_lowercase()
                    ),
                    store_name,
                    horizon,
                    points: vec![
                        Metric::new("Projected Revenue", "$51,700", "+7%"),
                        Metric::new("Projected Transactions", "1,352", "+5%"),
                        Metric::new("Confidence", "82%", ""),
                    ],
                }
            }
            FragmentKind::Help => Fragment::Help {
                commentary: "I can pull up store views for you, or generate something new from scratch. Try one of these:".to_string(),
                examples: vec![
                    "Show me camera feeds for store Downtown".to_string(),
                    "How were sales at store Riverside this week?".to_string(),
                    "Who is working the morning shift?".to_string(),
                    "What inventory needs a restock?".to_string(),
                    "Break down my costs this quarter".to_string(),
                    "Forecast next month".to_string(),
                    "Build me a loyalty points calculator".to_string(),
                ],
            },
        };

        return Some(fragment);
    }
}

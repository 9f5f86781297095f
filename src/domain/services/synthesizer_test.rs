use strum::IntoEnumIterator;

use super::extract_horizon;
use super::extract_period;
use super::extract_shift;
use super::extract_store_name;
use super::CannedSynthesizer;
use super::DEFAULT_STORE_NAME;
use crate::domain::models::Fragment;
use crate::domain::models::FragmentKind;

fn canned_kinds() -> Vec<FragmentKind> {
    return FragmentKind::iter()
        .filter(|kind| return kind.is_canned())
        .collect();
}

#[test]
fn it_extracts_store_names_for_every_store_kind() {
    for kind in canned_kinds() {
        let fragment = CannedSynthesizer::synthesize(kind, "store Riverside is great").unwrap();
        if kind == FragmentKind::Help {
            assert_eq!(fragment.store_name(), None);
            continue;
        }
        assert_eq!(fragment.store_name(), Some("Riverside"), "{kind}");
    }
}

#[test]
fn it_defaults_the_store_name() {
    for kind in canned_kinds() {
        let fragment = CannedSynthesizer::synthesize(kind, "how is my store").unwrap();
        if kind == FragmentKind::Help {
            continue;
        }
        assert_eq!(fragment.store_name(), Some(DEFAULT_STORE_NAME), "{kind}");
    }
}

#[test]
fn it_extracts_multi_word_and_trailing_store_names() {
    assert_eq!(extract_store_name("shop called Oak Park today"), "Oak Park");
    assert_eq!(
        extract_store_name("compare store Riverside with location Harbor View"),
        "Harbor View"
    );
    assert_eq!(extract_store_name("store downtown"), DEFAULT_STORE_NAME);
}

#[test]
fn it_picks_periods_shifts_and_horizons() {
    assert_eq!(extract_period("sales today"), "Today");
    assert_eq!(extract_period("costs last month"), "Last Month");
    assert_eq!(extract_period("this quarter please"), "This Quarter");
    assert_eq!(extract_period("sales"), "This Month");

    assert_eq!(extract_shift("who works the NIGHT shift"), "Night");
    assert_eq!(extract_shift("who works here"), "All Shifts");

    assert_eq!(extract_horizon("forecast next quarter"), "Next Quarter");
    assert_eq!(extract_horizon("forecast"), "Next 30 Days");
}

#[test]
fn it_synthesizes_six_cameras() {
    let fragment =
        CannedSynthesizer::synthesize(FragmentKind::CameraFeed, "Show me camera feeds for store Downtown")
            .unwrap();

    match fragment {
        Fragment::CameraFeed {
            store_name,
            cameras,
            commentary,
        } => {
            assert_eq!(store_name, "Downtown");
            assert_eq!(cameras.len(), 6);
            insta::assert_snapshot!(commentary, @"Here are the live camera feeds for Downtown. 5 of 6 cameras are online.");
        }
        _ => panic!("Wrong fragment"),
    }
}

#[test]
fn it_filters_staff_by_shift() {
    let fragment =
        CannedSynthesizer::synthesize(FragmentKind::StaffManagement, "morning shift roster").unwrap();

    match fragment {
        Fragment::StaffManagement { shift, staff, .. } => {
            assert_eq!(shift, "Morning");
            assert_eq!(staff.len(), 2);
            assert!(staff.iter().all(|member| return member.shift == "Morning"));
        }
        _ => panic!("Wrong fragment"),
    }
}

#[test]
fn it_is_pure() {
    for kind in canned_kinds() {
        assert_eq!(
            CannedSynthesizer::synthesize(kind, "sales at store Riverside this week"),
            CannedSynthesizer::synthesize(kind, "sales at store Riverside this week")
        );
    }
}

#[test]
fn it_has_no_canned_code() {
    assert!(CannedSynthesizer::synthesize(FragmentKind::Code, "build an app").is_none());
}

//! Property-based tests for the pure building blocks of the ordering flow.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use restaurant_api::entities::order::OrderStatus;
use restaurant_api::services::chatbot::{detect_intent, find_order_number, Intent};
use restaurant_api::services::companies::{normalize_domain, slugify};
use restaurant_api::services::orders::generate_order_number;
use restaurant_api::services::Pagination;

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::ALL.to_vec())
}

fn timestamp_strategy() -> impl Strategy<Value = i64> {
    // 2020-01-01 .. 2040-01-01
    1_577_836_800i64..2_208_988_800
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn generated_order_numbers_are_found_in_chat_text(
        secs in timestamp_strategy(),
        prefix in "[a-zçğıöşü ]{0,20}",
    ) {
        let now = Utc.timestamp_opt(secs, 0).single().unwrap();
        let number = generate_order_number(now);
        prop_assert_eq!(number.len(), "ORD-240301-7KQ2ZD".len());
        let date_prefix = format!("ORD-{}", now.format("%y%m%d"));
        prop_assert!(
            number.starts_with(&date_prefix),
            "{} does not start with {}",
            number,
            date_prefix
        );

        let message = format!("{} {}?", prefix, number.to_lowercase());
        prop_assert_eq!(find_order_number(&message), Some(number.clone()));
        prop_assert_eq!(detect_intent(&message), Intent::OrderStatus);
    }

    #[test]
    fn terminal_statuses_never_transition(from in status_strategy(), to in status_strategy()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
        // No status loops back onto itself
        prop_assert!(!from.can_transition_to(from));
    }

    #[test]
    fn every_open_status_can_still_be_cancelled_or_completed(from in status_strategy()) {
        if !from.is_terminal() {
            prop_assert!(
                from.can_transition_to(OrderStatus::Cancelled)
                    || from.can_transition_to(OrderStatus::Completed)
            );
        }
    }

    #[test]
    fn pagination_is_always_clamped(page in any::<u64>(), limit in any::<u64>()) {
        let p = Pagination::new(page, limit);
        prop_assert!(p.page >= 1);
        prop_assert!((1..=Pagination::MAX_LIMIT).contains(&p.limit));
        prop_assert_eq!(p.index(), p.page - 1);
    }

    #[test]
    fn slugs_are_url_safe(name in "\\PC{0,60}") {
        let slug = slugify(&name);
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn domain_normalization_is_idempotent(
        label in "[a-zA-Z0-9]{1,12}",
        tld in prop_oneof![Just("com"), Just("net"), Just("io"), Just("com.tr")],
        scheme in prop_oneof![Just(""), Just("http://"), Just("https://")],
        path in "(/[a-z]{0,8}){0,2}",
    ) {
        prop_assume!(!label.eq_ignore_ascii_case("www"));
        let host = format!("{}.{}", label, tld);
        let once = normalize_domain(&format!("{}{}{}", scheme, host, path));
        prop_assert_eq!(&once, &host.to_lowercase());
        prop_assert_eq!(normalize_domain(&once), once.clone());
    }
}

//! Unit tests for the shop identifiers
//!
//! Tests cover creation, parsing with and without prefix, conversion,
//! serialization, and display formatting.

use core_kernel::{DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use proptest::prelude::*;

mod order_id_tests {
    use super::*;

    #[test]
    fn test_prefix() {
        assert_eq!(OrderId::prefix(), "ORD");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(OrderId::new(12).to_string(), "ORD-12");
    }

    #[test]
    fn test_from_str_with_prefix() {
        let parsed: OrderId = "ORD-5".parse().unwrap();
        assert_eq!(parsed, OrderId::new(5));
    }

    #[test]
    fn test_from_str_without_prefix() {
        let parsed: OrderId = "5".parse().unwrap();
        assert_eq!(parsed.value(), 5);
    }

    #[test]
    fn test_from_str_rejects_foreign_prefix() {
        let parsed: Result<OrderId, _> = "ITM-5".parse();
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&OrderId::new(3)).unwrap();
        assert_eq!(json, "3");

        let back: OrderId = serde_json::from_str("3").unwrap();
        assert_eq!(back, OrderId::new(3));
    }

    #[test]
    fn test_ordering_follows_raw_key() {
        assert!(OrderId::new(1) < OrderId::new(2));
    }
}

mod other_id_tests {
    use super::*;

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            MemberId::prefix(),
            OrderId::prefix(),
            OrderItemId::prefix(),
            DeliveryId::prefix(),
            ItemId::prefix(),
        ];
        let mut unique = prefixes.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), prefixes.len());
    }

    #[test]
    fn test_i64_conversion() {
        let id = MemberId::from(9_i64);
        let raw: i64 = id.into();
        assert_eq!(raw, 9);
    }
}

proptest! {
    #[test]
    fn prop_display_parse_roundtrip(raw in any::<i64>()) {
        let id = ItemId::new(raw);
        let parsed: ItemId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }
}

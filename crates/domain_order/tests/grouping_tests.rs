//! Regrouping flat join rows into nested orders

use std::collections::BTreeSet;

use domain_order::group_flat_rows;
use proptest::prelude::*;
use test_utils::flat_rows_strategy;

proptest! {
    #[test]
    fn grouping_keeps_every_line(rows in flat_rows_strategy(8)) {
        let grouped = group_flat_rows(rows.clone());
        let lines: usize = grouped.iter().map(|order| order.order_items.len()).sum();
        prop_assert_eq!(lines, rows.len());
    }

    #[test]
    fn grouping_yields_one_order_per_id(rows in flat_rows_strategy(8)) {
        let ids: BTreeSet<_> = rows.iter().map(|row| row.order_id).collect();
        let grouped = group_flat_rows(rows);
        prop_assert_eq!(grouped.len(), ids.len());
    }

    #[test]
    fn grouping_preserves_first_appearance(rows in flat_rows_strategy(8)) {
        let mut first_seen = Vec::new();
        for row in &rows {
            if !first_seen.contains(&row.order_id) {
                first_seen.push(row.order_id);
            }
        }
        let grouped: Vec<_> = group_flat_rows(rows).into_iter().map(|o| o.order_id).collect();
        prop_assert_eq!(grouped, first_seen);
    }

    #[test]
    fn grouped_lines_match_rows(rows in flat_rows_strategy(8)) {
        let grouped = group_flat_rows(rows.clone());
        let flattened: Vec<_> = grouped
            .iter()
            .flat_map(|order| {
                order.order_items.iter().map(move |line| {
                    (order.order_id, line.item_name.clone(), line.order_price, line.count)
                })
            })
            .collect();
        let expected: Vec<_> = rows
            .iter()
            .map(|row| (row.order_id, row.item_name.clone(), row.order_price, row.count))
            .collect();
        prop_assert_eq!(flattened, expected);
    }
}

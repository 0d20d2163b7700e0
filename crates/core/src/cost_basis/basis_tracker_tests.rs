//! Tests for average-cost and lot-matched basis tracking.

#[cfg(test)]
mod tests {
    use crate::cost_basis::{BasisContext, BasisMethod, CostBasisTracker, TransactionIndex};
    use crate::fx::{SplitAdjustment, StaticRateProvider};
    use crate::securities::{ScaleFactors, SecurityAccount, SecurityType};
    use crate::transactions::TransactionEvent;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_security() -> SecurityAccount {
        SecurityAccount::new(
            "acme-broker",
            "Brokerage",
            "ACME",
            "Acme Corp",
            SecurityType::Stock,
            ScaleFactors::new(4, 2).unwrap(),
        )
        .with_rates(Arc::new(StaticRateProvider::new(
            [(date(2023, 1, 2), dec!(0.1))],
            [],
        )))
    }

    fn create_split_security() -> SecurityAccount {
        // 2-for-1 split on 2024-06-01.
        SecurityAccount::new(
            "acme-broker",
            "Brokerage",
            "ACME",
            "Acme Corp",
            SecurityType::Stock,
            ScaleFactors::new(4, 2).unwrap(),
        )
        .with_rates(Arc::new(StaticRateProvider::new(
            [(date(2023, 1, 2), dec!(0.1)), (date(2024, 6, 3), dec!(0.2))],
            [SplitAdjustment::new(date(2024, 6, 1), dec!(2))],
        )))
    }

    fn buy(id: &str, on: NaiveDate, position: i64, quantity: i64, amount: i64, commission: i64) -> TransactionEvent {
        TransactionEvent {
            quantity,
            buy: amount,
            commission,
            ..TransactionEvent::new(id, on, position)
        }
    }

    fn sell(id: &str, on: NaiveDate, position: i64, quantity: i64, amount: i64) -> TransactionEvent {
        TransactionEvent {
            quantity,
            sell: amount,
            ..TransactionEvent::new(id, on, position)
        }
    }

    fn advance_all<'a>(
        tracker: &mut CostBasisTracker,
        events: impl IntoIterator<Item = &'a TransactionEvent>,
        ctx: &BasisContext,
    ) {
        for event in events {
            tracker.advance(event, ctx).unwrap();
        }
    }

    // ==================== Long Basis Tests ====================

    #[test]
    fn test_buy_adds_value_plus_commission_exactly() {
        // 100 shares at 10.00 with a 9.95 commission.
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let event = buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 995);
        let state = tracker.advance(&event, &ctx).unwrap();
        assert_eq!(state.long_basis, 100_995);
        assert_eq!(state.short_basis, 0);
    }

    #[test]
    fn test_partial_sale_releases_average_cost() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        // 100 @ 10.00 + 9.95, then 50 @ 12.00, then sell 75.
        let events = vec![
            buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 995),
            buy("t2", date(2024, 2, 1), 1_500_000, 500_000, 60_000, 0),
            sell("t3", date(2024, 3, 1), 750_000, -750_000, 90_000),
        ];
        advance_all(&mut tracker, &events, &ctx);

        // Average unit cost 1609.95 / 150 = 10.733; releasing 75 shares
        // removes 804.98 (half away from zero on 804.975).
        assert_eq!(tracker.long_basis(), 80_497);
    }

    #[test]
    fn test_full_disposal_zeroes_basis() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let events = vec![
            buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 995),
            sell("t2", date(2024, 6, 3), 0, -1_000_000, 120_000),
        ];
        advance_all(&mut tracker, &events, &ctx);
        assert_eq!(tracker.long_basis(), 0);
    }

    #[test]
    fn test_sell_commission_leaves_basis_untouched() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let events = vec![
            buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 0),
            TransactionEvent {
                quantity: -500_000,
                sell: 60_000,
                commission: 995,
                ..TransactionEvent::new("t2", date(2024, 3, 1), 500_000)
            },
        ];
        advance_all(&mut tracker, &events, &ctx);
        assert_eq!(tracker.long_basis(), 50_000);
    }

    // ==================== Short Basis Tests ====================

    #[test]
    fn test_short_sale_accumulates_net_credit() {
        // Short 100 at 10.00 with a 5.00 commission.
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let event = TransactionEvent {
            quantity: -1_000_000,
            short_sell: 100_000,
            commission: 500,
            ..TransactionEvent::new("t1", date(2024, 1, 2), -1_000_000)
        };
        let state = tracker.advance(&event, &ctx).unwrap();
        assert_eq!(state.short_basis, 99_500);
        assert_eq!(state.long_basis, 0);
    }

    #[test]
    fn test_partial_cover_releases_credit_proportionally() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let events = vec![
            TransactionEvent {
                quantity: -1_000_000,
                short_sell: 100_000,
                commission: 500,
                ..TransactionEvent::new("t1", date(2024, 1, 2), -1_000_000)
            },
            TransactionEvent {
                quantity: 400_000,
                cover_short: 44_000,
                ..TransactionEvent::new("t2", date(2024, 3, 1), -600_000)
            },
        ];
        advance_all(&mut tracker, &events, &ctx);
        // 60% of the 995.00 credit stays open.
        assert_eq!(tracker.short_basis(), 59_700);
    }

    #[test]
    fn test_full_cover_zeroes_short_basis() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        let events = vec![
            TransactionEvent {
                quantity: -1_000_000,
                short_sell: 100_000,
                ..TransactionEvent::new("t1", date(2024, 1, 2), -1_000_000)
            },
            TransactionEvent {
                quantity: 1_000_000,
                cover_short: 90_000,
                ..TransactionEvent::new("t2", date(2024, 3, 1), 0)
            },
        ];
        advance_all(&mut tracker, &events, &ctx);
        assert_eq!(tracker.short_basis(), 0);
    }

    // ==================== Lot Matching Tests ====================

    fn lot_fixture() -> Vec<TransactionEvent> {
        vec![
            buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 1_000),
            buy("t2", date(2024, 2, 1), 2_000_000, 1_000_000, 200_000, 0),
        ]
    }

    #[test]
    fn test_lot_matched_uses_allocated_lot_cost() {
        let security = create_test_security();
        let history = lot_fixture();
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let mut tracker =
            CostBasisTracker::with_history(BasisMethod::LotMatched, &history, &ctx).unwrap();
        assert_eq!(tracker.long_basis(), 301_000);

        // Sell 50 shares matched entirely against the 20.00 lot.
        let disposal = TransactionEvent {
            quantity: -500_000,
            sell: 110_000,
            lot_allocations: Some(BTreeMap::from([("t2".to_string(), 500_000)])),
            ..TransactionEvent::new("t3", date(2024, 3, 1), 1_500_000)
        };
        let state = tracker.advance(&disposal, &ctx).unwrap();
        assert_eq!(state.long_basis, 201_000);
    }

    #[test]
    fn test_lot_matched_weights_across_lots() {
        let security = create_test_security();
        let history = lot_fixture();
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let mut tracker =
            CostBasisTracker::with_history(BasisMethod::LotMatched, &history, &ctx).unwrap();

        // 25 shares from the 10.10 lot, 25 from the 20.00 lot.
        let disposal = TransactionEvent {
            quantity: -500_000,
            sell: 110_000,
            lot_allocations: Some(BTreeMap::from([
                ("t1".to_string(), 250_000),
                ("t2".to_string(), 250_000),
            ])),
            ..TransactionEvent::new("t3", date(2024, 3, 1), 1_500_000)
        };
        let state = tracker.advance(&disposal, &ctx).unwrap();
        // Weighted unit cost (10.10 + 20.00) / 2 = 15.05 over 50 shares.
        assert_eq!(state.long_basis, 301_000 - 75_250);
    }

    #[test]
    fn test_absent_table_matches_average_cost_exactly() {
        let security = create_test_security();
        let history = lot_fixture();
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let disposal = sell("t3", date(2024, 3, 1), 1_500_000, -500_000, 110_000);

        let mut lot_matched =
            CostBasisTracker::with_history(BasisMethod::LotMatched, &history, &ctx).unwrap();
        let mut average =
            CostBasisTracker::with_history(BasisMethod::AverageCost, &history, &ctx).unwrap();
        let lot_state = lot_matched.advance(&disposal, &ctx).unwrap();
        let avg_state = average.advance(&disposal, &ctx).unwrap();
        assert_eq!(lot_state, avg_state);
    }

    #[test]
    fn test_unknown_lot_id_falls_back_to_average() {
        let security = create_test_security();
        let history = lot_fixture();
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let disposal = TransactionEvent {
            quantity: -500_000,
            sell: 110_000,
            lot_allocations: Some(BTreeMap::from([("missing".to_string(), 500_000)])),
            ..TransactionEvent::new("t3", date(2024, 3, 1), 1_500_000)
        };
        let plain = sell("t3", date(2024, 3, 1), 1_500_000, -500_000, 110_000);

        let mut lot_matched =
            CostBasisTracker::with_history(BasisMethod::LotMatched, &history, &ctx).unwrap();
        let mut average =
            CostBasisTracker::with_history(BasisMethod::AverageCost, &history, &ctx).unwrap();
        assert_eq!(
            lot_matched.advance(&disposal, &ctx).unwrap(),
            average.advance(&plain, &ctx).unwrap()
        );
    }

    #[test]
    fn test_lot_quantity_split_adjusts_to_disposal_date() {
        let security = create_split_security();
        // 100 shares at 10.00 bought pre-split.
        let history = vec![buy("t1", date(2024, 1, 2), 1_000_000, 1_000_000, 100_000, 0)];
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let mut tracker =
            CostBasisTracker::with_history(BasisMethod::LotMatched, &history, &ctx).unwrap();

        // Post-split the lot holds 200 units at 5.00 each; sell 100 of them.
        let disposal = TransactionEvent {
            quantity: -1_000_000,
            sell: 55_000,
            lot_allocations: Some(BTreeMap::from([("t1".to_string(), 1_000_000)])),
            ..TransactionEvent::new("t2", date(2024, 7, 1), 1_000_000)
        };
        let state = tracker.advance(&disposal, &ctx).unwrap();
        assert_eq!(state.long_basis, 50_000);
    }

    // ==================== Sequencing Tests ====================

    #[test]
    fn test_out_of_order_event_is_an_error() {
        let security = create_test_security();
        let index = TransactionIndex::default();
        let ctx = BasisContext::new(&security, &index);
        let mut tracker = CostBasisTracker::new(BasisMethod::AverageCost);

        tracker
            .advance(&buy("t2", date(2024, 2, 1), 1_000_000, 1_000_000, 100_000, 0), &ctx)
            .unwrap();
        let result = tracker.advance(
            &buy("t1", date(2024, 1, 2), 2_000_000, 1_000_000, 100_000, 0),
            &ctx,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_with_history_matches_streaming() {
        let security = create_test_security();
        let history = lot_fixture();
        let index = TransactionIndex::from_events(&history);
        let ctx = BasisContext::new(&security, &index);

        let replayed =
            CostBasisTracker::with_history(BasisMethod::AverageCost, &history, &ctx).unwrap();
        let mut streamed = CostBasisTracker::new(BasisMethod::AverageCost);
        advance_all(&mut streamed, &history, &ctx);
        assert_eq!(replayed.state(), streamed.state());
    }
}

//! Tests for grouping policies, group labels, and bucketed group returns.

#[cfg(test)]
mod tests {
    use crate::aggregation::{AggregationPolicy, GroupKey, GroupLabel, GroupedReturns};
    use crate::fx::StaticRateProvider;
    use crate::returns::{ReturnExtractor, ReturnKind};
    use crate::securities::{ScaleFactors, SecurityAccount, SecurityType};
    use crate::transactions::{ReportWindow, TransactionEvent};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ReportWindow {
        ReportWindow::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap()
    }

    fn create_test_security(
        id: &str,
        account: &str,
        ticker: &str,
        security_type: SecurityType,
        subtype: Option<&str>,
        end_price: Decimal,
    ) -> SecurityAccount {
        let security = SecurityAccount::new(
            id,
            account,
            ticker,
            ticker,
            security_type,
            ScaleFactors::new(4, 2).unwrap(),
        )
        .with_rates(Arc::new(StaticRateProvider::from_prices(
            [(date(2023, 12, 15), dec!(10)), (date(2024, 12, 28), end_price)],
            [],
        )));
        match subtype {
            Some(subtype) => security.with_subtype(subtype),
            None => security,
        }
    }

    fn extractor_for(security: SecurityAccount, kind: ReturnKind) -> ReturnExtractor {
        let mut extractor = ReturnExtractor::new(security, kind, window());
        extractor
            .process_event(&TransactionEvent {
                buy: 100_000,
                ..TransactionEvent::new("t1", date(2023, 12, 20), 1_000_000)
            })
            .unwrap();
        extractor
    }

    // Three holdings bought at 10.00: two in account Alpha ending the year
    // at 12.00 and 11.00, one in Beta ending at 10.50.
    fn sample_extractors(kind: ReturnKind) -> Vec<ReturnExtractor> {
        vec![
            extractor_for(
                create_test_security("s1", "Alpha", "AAA", SecurityType::Stock, None, dec!(12)),
                kind,
            ),
            extractor_for(
                create_test_security(
                    "s2",
                    "Alpha",
                    "BBB",
                    SecurityType::Stock,
                    Some("GROWTH"),
                    dec!(11),
                ),
                kind,
            ),
            extractor_for(
                create_test_security("s3", "Beta", "CCC", SecurityType::Bond, None, dec!(10.5)),
                kind,
            ),
        ]
    }

    // ==================== Policy Lookup Tests ====================

    #[test]
    fn test_policy_key_table() {
        assert_eq!(
            AggregationPolicy::AccountThenClass.primary(),
            Some(GroupKey::Account)
        );
        assert_eq!(
            AggregationPolicy::AccountThenClass.secondary(),
            Some(GroupKey::TradeableClass)
        );
        assert_eq!(
            AggregationPolicy::TickerThenAccount.primary(),
            Some(GroupKey::Ticker)
        );
        assert_eq!(
            AggregationPolicy::TickerThenAccount.secondary(),
            Some(GroupKey::Account)
        );
        assert_eq!(
            AggregationPolicy::TypeThenSubtype.primary(),
            Some(GroupKey::SecurityType)
        );
        assert_eq!(
            AggregationPolicy::TypeThenSubtype.secondary(),
            Some(GroupKey::SecuritySubtype)
        );
        assert_eq!(AggregationPolicy::Ungrouped.primary(), None);
        assert_eq!(AggregationPolicy::Ungrouped.secondary(), None);
    }

    #[test]
    fn test_refinement_flag_only_for_type_subtype() {
        for policy in AggregationPolicy::ALL {
            assert_eq!(
                policy.secondary_refines_primary(),
                policy == AggregationPolicy::TypeThenSubtype,
                "{policy}"
            );
        }
    }

    // ==================== Label Tests ====================

    #[test]
    fn test_group_key_labels() {
        let stock =
            create_test_security("s1", "Alpha", "AAA", SecurityType::Stock, None, dec!(12));
        assert_eq!(GroupKey::Account.label_for(&stock), "Alpha");
        assert_eq!(GroupKey::TradeableClass.label_for(&stock), "SECURITY");
        assert_eq!(GroupKey::Ticker.label_for(&stock), "AAA");
        assert_eq!(GroupKey::SecurityType.label_for(&stock), "STOCK");

        let cash = SecurityAccount::cash("alpha-cash", "Alpha", 2).unwrap();
        assert_eq!(GroupKey::TradeableClass.label_for(&cash), "CASH");
    }

    #[test]
    fn test_subtype_label_falls_back_to_type() {
        let tagged = create_test_security(
            "s2",
            "Alpha",
            "BBB",
            SecurityType::Stock,
            Some("GROWTH"),
            dec!(11),
        );
        let untagged =
            create_test_security("s3", "Beta", "CCC", SecurityType::Bond, None, dec!(10.5));
        assert_eq!(GroupKey::SecuritySubtype.label_for(&tagged), "GROWTH");
        assert_eq!(GroupKey::SecuritySubtype.label_for(&untagged), "BOND");
    }

    #[test]
    fn test_ungrouped_label_is_match_all() {
        let stock =
            create_test_security("s1", "Alpha", "AAA", SecurityType::Stock, None, dec!(12));
        let label = GroupLabel::for_security(AggregationPolicy::Ungrouped, &stock);
        assert_eq!(label, GroupLabel::new("ALL", "ALL"));
    }

    #[test]
    fn test_label_rendering_follows_refinement() {
        let label = GroupLabel::new("STOCK", "GROWTH");
        assert_eq!(label.render(true), "STOCK/GROWTH");
        assert_eq!(label.render(false), "STOCK, GROWTH");
    }

    // ==================== Bucketing Tests ====================

    #[test]
    fn test_build_by_account_then_class() {
        let extractors = sample_extractors(ReturnKind::Ordinary);
        let mut grouped = GroupedReturns::build(
            AggregationPolicy::AccountThenClass,
            ReturnKind::Ordinary,
            window(),
            &extractors,
        )
        .unwrap();

        assert_eq!(grouped.members(), 3);
        assert_eq!(grouped.cells().count(), 2);
        let alpha = grouped.cell_mut("Alpha", "SECURITY").unwrap();
        assert_eq!(alpha.members(), 2);
        assert_eq!(alpha.result().unwrap(), dec!(0.15));
        let beta = grouped.cell_mut("Beta", "SECURITY").unwrap();
        assert_eq!(beta.result().unwrap(), dec!(0.05));
        assert_eq!(
            grouped.rollup_mut("Alpha").unwrap().result().unwrap(),
            dec!(0.15)
        );
        assert_eq!(grouped.total_mut().result().unwrap(), dec!(0.116667));
    }

    #[test]
    fn test_build_type_then_subtype_rolls_cells_into_type() {
        let extractors = sample_extractors(ReturnKind::Ordinary);
        let mut grouped = GroupedReturns::build(
            AggregationPolicy::TypeThenSubtype,
            ReturnKind::Ordinary,
            window(),
            &extractors,
        )
        .unwrap();

        assert_eq!(grouped.cells().count(), 3);
        assert!(grouped.cell_mut("STOCK", "STOCK").is_some());
        assert!(grouped.cell_mut("STOCK", "GROWTH").is_some());
        assert!(grouped.cell_mut("BOND", "BOND").is_some());

        let stock = grouped.rollup_mut("STOCK").unwrap();
        assert_eq!(stock.members(), 2);
        assert_eq!(stock.result().unwrap(), dec!(0.15));
        assert_eq!(
            grouped.rollup_mut("BOND").unwrap().result().unwrap(),
            dec!(0.05)
        );

        let label = GroupLabel::new("STOCK", "GROWTH");
        assert_eq!(grouped.cell_label(&label), "STOCK/GROWTH");
    }

    #[test]
    fn test_build_ungrouped_uses_single_cell() {
        let extractors = sample_extractors(ReturnKind::Ordinary);
        let mut grouped = GroupedReturns::build(
            AggregationPolicy::Ungrouped,
            ReturnKind::Ordinary,
            window(),
            &extractors,
        )
        .unwrap();

        assert_eq!(grouped.cells().count(), 1);
        let cell = grouped.cell_mut("ALL", "ALL").unwrap();
        assert_eq!(cell.members(), 3);
        assert_eq!(cell.result().unwrap(), dec!(0.116667));
    }

    #[test]
    fn test_build_rejects_kind_mismatch() {
        let extractors = sample_extractors(ReturnKind::ModifiedDietz);
        let result = GroupedReturns::build(
            AggregationPolicy::Ungrouped,
            ReturnKind::Ordinary,
            window(),
            &extractors,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_build_rejects_window_mismatch() {
        let security =
            create_test_security("s1", "Alpha", "AAA", SecurityType::Stock, None, dec!(12));
        let other = ReportWindow::new(date(2024, 1, 1), date(2024, 6, 30)).unwrap();
        let extractor = ReturnExtractor::new(security, ReturnKind::Ordinary, other);
        let result = GroupedReturns::build(
            AggregationPolicy::Ungrouped,
            ReturnKind::Ordinary,
            window(),
            &[extractor],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_build_has_no_cells() {
        let mut grouped = GroupedReturns::build(
            AggregationPolicy::AccountThenClass,
            ReturnKind::Ordinary,
            window(),
            &[],
        )
        .unwrap();
        assert!(grouped.is_empty());
        assert_eq!(grouped.members(), 0);
        assert_eq!(grouped.total_mut().result(), None);
    }

    #[test]
    fn test_policy_serializes_screaming_snake() {
        let json = serde_json::to_value(AggregationPolicy::TypeThenSubtype).unwrap();
        assert_eq!(json, "TYPE_THEN_SUBTYPE");
        assert_eq!(AggregationPolicy::AccountThenClass.to_string(), "ACCOUNT_THEN_CLASS");
    }
}

//! Spread ladder construction.

use crate::domain::ladder::{round8, LadderEntry, Side};
use chrono::Utc;

/// Build one side's order ladder from a reference rate and a budget.
///
/// The budget is split evenly across the configured spread bands. Band
/// prices compound: each band's rate is stepped from the previous band's
/// adjusted rate, not offset independently from the reference, so wider
/// bands sit at repeated relative distances. Buy ladders walk down from
/// the reference, sell ladders walk up. Spread order is load-bearing.
///
/// A non-positive reference rate or per-band quantity yields an empty
/// ladder — no orders are planned for that side.
pub fn plan_ladder(
    side: Side,
    reference_rate: f64,
    total_budget: f64,
    spreads: &[f64],
    expiration_secs: i64,
) -> Vec<LadderEntry> {
    if spreads.is_empty() {
        return Vec::new();
    }
    if reference_rate.is_nan() || reference_rate <= 0.0 {
        return Vec::new();
    }

    let per_band = total_budget / spreads.len() as f64;
    if per_band.is_nan() || per_band <= 0.0 {
        return Vec::new();
    }

    let expires_at = Utc::now().timestamp() + expiration_secs;
    let mut rate = reference_rate;
    let mut entries = Vec::with_capacity(spreads.len());

    for spread in spreads {
        rate = match side {
            Side::Buy => rate - rate * spread,
            Side::Sell => rate + rate * spread,
        };
        entries.push(LadderEntry {
            side,
            price: round8(rate),
            quantity: per_band,
            expires_at,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_ladder_compounds_downward() {
        let entries = plan_ladder(Side::Buy, 100.0, 10.0, &[0.01, 0.02], 3600);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].quantity, 5.0);
        assert_eq!(entries[0].price, 99.0);
        // Second band steps off 99.0, not 100.0.
        assert_eq!(entries[1].price, 97.02);
    }

    #[test]
    fn sell_ladder_compounds_upward() {
        let entries = plan_ladder(Side::Sell, 100.0, 10.0, &[0.01, 0.02], 3600);

        assert_eq!(entries[0].price, 101.0);
        assert_eq!(entries[1].price, 103.02);
    }

    #[test]
    fn ladder_length_matches_spread_count() {
        let spreads = [0.005, 0.01, 0.02, 0.04];
        let entries = plan_ladder(Side::Buy, 1.0, 8.0, &spreads, 60);
        assert_eq!(entries.len(), spreads.len());
    }

    #[test]
    fn quantities_sum_to_budget() {
        let entries = plan_ladder(Side::Sell, 0.5, 7.0, &[0.01, 0.02, 0.03], 60);
        let total: f64 = entries.iter().map(|e| e.quantity).sum();
        assert!((total - 7.0).abs() < 1e-9);
    }

    #[test]
    fn prices_walk_strictly_away_from_reference() {
        let spreads = [0.01, 0.01, 0.02];

        let buys = plan_ladder(Side::Buy, 42.0, 3.0, &spreads, 60);
        assert!(buys[0].price < 42.0);
        assert!(buys.windows(2).all(|w| w[1].price < w[0].price));

        let sells = plan_ladder(Side::Sell, 42.0, 3.0, &spreads, 60);
        assert!(sells[0].price > 42.0);
        assert!(sells.windows(2).all(|w| w[1].price > w[0].price));
    }

    #[test]
    fn zero_rate_or_budget_yields_empty_ladder() {
        assert!(plan_ladder(Side::Buy, 0.0, 10.0, &[0.01], 60).is_empty());
        assert!(plan_ladder(Side::Buy, 100.0, 0.0, &[0.01], 60).is_empty());
        assert!(plan_ladder(Side::Sell, -1.0, 10.0, &[0.01], 60).is_empty());
        assert!(plan_ladder(Side::Sell, f64::NAN, 10.0, &[0.01], 60).is_empty());
        assert!(plan_ladder(Side::Buy, 100.0, 10.0, &[], 60).is_empty());
    }

    #[test]
    fn expiration_is_in_the_future() {
        let now = Utc::now().timestamp();
        let entries = plan_ladder(Side::Buy, 100.0, 10.0, &[0.01], 7200);
        assert!(entries[0].expires_at >= now + 7200);
        assert!(entries[0].expires_at <= now + 7201);
    }
}

use crate::core::filters::specified;
use crate::models::{BuyerCriteria, ScoringPolicy};

/// Calculate the fit score (0-100) of a listing that already passed matching
///
/// Scoring formula:
/// score = 100
///     - size_penalty       # listing much larger than the buyer asked for
///     - price_penalty      # over budget (steep) or well under budget (mild)
///
/// Both penalties are capped and independent. Undersized listings that
/// passed the size tolerance are not penalized.
pub fn calculate_match_score(
    size: Option<f64>,
    price: Option<f64>,
    buyer: &BuyerCriteria,
    policy: &ScoringPolicy,
) -> u8 {
    let mut score = 100.0;

    score -= calculate_size_penalty(specified(size), specified(buyer.min_size), policy);
    score -= calculate_price_penalty(specified(price), specified(buyer.max_price), policy);

    score.clamp(0.0, 100.0).round() as u8
}

/// Penalty for listings beyond `size_overshoot_factor` times the wanted size
#[inline]
fn calculate_size_penalty(size: Option<f64>, min_size: Option<f64>, policy: &ScoringPolicy) -> f64 {
    let (Some(size), Some(min_size)) = (size, min_size) else {
        return 0.0;
    };

    if size <= min_size * policy.size_overshoot_factor {
        return 0.0;
    }

    let size_difference = (size - min_size) / min_size;
    (size_difference * policy.size_penalty_slope).min(policy.size_penalty_cap)
}

/// Penalty based on price relative to the buyer's budget
#[inline]
fn calculate_price_penalty(price: Option<f64>, max_price: Option<f64>, policy: &ScoringPolicy) -> f64 {
    let (Some(price), Some(max_price)) = (price, max_price) else {
        return 0.0;
    };

    let price_percentage = price / max_price;

    if price_percentage > 1.0 {
        ((price_percentage - 1.0) * policy.over_budget_penalty_slope)
            .min(policy.over_budget_penalty_cap)
    } else if price_percentage < policy.under_budget_threshold {
        ((policy.under_budget_threshold - price_percentage) * policy.under_budget_penalty_slope)
            .min(policy.under_budget_penalty_cap)
    } else {
        0.0
    }
}

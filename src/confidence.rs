//! Overall confidence score for a profile.
//!
//! Starts from 0.5 and adds:
//! - 0.15 per point and 0.10 per `high` quality point
//! - 0.25 once if any point includes the dynamic forecast class
//! - 0.15 once if two distinct officially validated classes contributed
//! - 0.20 when point heights agree (σ < 0.3 m), −0.10 when they do not (σ > 1.0 m)
//!
//! The sum is clamped to [0.1, 1.0].

use crate::{ProviderClass, Quality, WaveFrontPoint};
use std::collections::BTreeSet;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

const BASE: f64 = 0.5;
const PER_POINT: f64 = 0.15;
const PER_HIGH_QUALITY: f64 = 0.10;
const DYNAMIC_BONUS: f64 = 0.25;
const OFFICIAL_PAIR_BONUS: f64 = 0.15;
const AGREEMENT_BONUS: f64 = 0.20;
const DISAGREEMENT_PENALTY: f64 = 0.10;

const AGREEMENT_SIGMA_M: f64 = 0.3;
const DISAGREEMENT_SIGMA_M: f64 = 1.0;

/// Population standard deviation of the point heights.
pub fn height_std_dev(points: &[WaveFrontPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean = points.iter().map(|p| p.wave_height).sum::<f64>() / n;
    let variance = points
        .iter()
        .map(|p| (p.wave_height - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}

pub fn score(points: &[WaveFrontPoint]) -> f64 {
    let mut confidence = BASE;

    confidence += PER_POINT * points.len() as f64;
    confidence += PER_HIGH_QUALITY
        * points
            .iter()
            .filter(|p| p.quality == Quality::High)
            .count() as f64;

    let classes: BTreeSet<ProviderClass> = points
        .iter()
        .flat_map(|p| p.sources.iter().copied())
        .collect();

    if classes.contains(&ProviderClass::Dynamic) {
        confidence += DYNAMIC_BONUS;
    }
    if classes.iter().filter(|c| c.is_officially_validated()).count() >= 2 {
        confidence += OFFICIAL_PAIR_BONUS;
    }

    let sigma = height_std_dev(points);
    if sigma < AGREEMENT_SIGMA_M {
        confidence += AGREEMENT_BONUS;
    } else if sigma > DISAGREEMENT_SIGMA_M {
        confidence -= DISAGREEMENT_PENALTY;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::point_at;

    fn with_sources(mut point: WaveFrontPoint, sources: &[ProviderClass]) -> WaveFrontPoint {
        point.sources = sources.to_vec();
        point.quality = Quality::High;
        point
    }

    fn medium(mut point: WaveFrontPoint) -> WaveFrontPoint {
        point.quality = Quality::Medium;
        point.sources.clear();
        point
    }

    #[test]
    fn test_empty_profile_scores_base_plus_agreement() {
        // σ of nothing is 0, which counts as agreement
        assert!((score(&[]) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_single_medium_point() {
        let points = vec![medium(point_at(1.0, 2.0))];
        assert!((score(&points) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_dynamic_class_strictly_raises_confidence() {
        let without = vec![with_sources(point_at(1.0, 2.0), &[ProviderClass::Model])];
        let with = vec![with_sources(
            point_at(1.0, 2.0),
            &[ProviderClass::Model, ProviderClass::Dynamic],
        )];
        // 0.5 + 0.15 + 0.10 + 0.20 = 0.95 versus clamped 1.0
        assert!((score(&without) - 0.95).abs() < 1e-12);
        assert!(score(&with) > score(&without));
        assert_eq!(score(&with), MAX_CONFIDENCE);
    }

    #[test]
    fn test_two_official_classes_required_for_bonus() {
        // Heights 1.0 and 3.5 disagree (σ = 1.25), keeping both scores under the clamp
        let one = vec![
            medium(point_at(1.0, 1.0)),
            with_sources(point_at(2.0, 3.5), &[ProviderClass::Satellite]),
        ];
        let two = vec![
            medium(point_at(1.0, 1.0)),
            with_sources(
                point_at(2.0, 3.5),
                &[ProviderClass::Satellite, ProviderClass::OfficialReanalysis],
            ),
        ];
        // 0.5 + 0.30 + 0.10 - 0.10 = 0.80; with the pair bonus 0.95
        assert!((score(&one) - 0.80).abs() < 1e-12);
        assert!((score(&two) - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_disagreement_penalty() {
        let points = vec![
            medium(point_at(1.0, 1.0)),
            medium(point_at(2.0, 1.2)),
            medium(point_at(5.0, 4.0)),
        ];
        assert!(height_std_dev(&points) > 1.0);
        // 0.5 + 0.45 - 0.10
        assert!((score(&points) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_always_in_range() {
        let many: Vec<_> = (1..=6)
            .map(|i| {
                with_sources(
                    point_at(i as f64, 2.0),
                    &[ProviderClass::Dynamic, ProviderClass::Satellite],
                )
            })
            .collect();
        let s = score(&many);
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&s));
    }

    #[test]
    fn test_std_dev() {
        let points = vec![point_at(1.0, 2.0), point_at(2.0, 4.0)];
        assert!((height_std_dev(&points) - 1.0).abs() < 1e-12);
    }
}

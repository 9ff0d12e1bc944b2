//! UCB1-style bandit selector. Pure and deterministic: given a slot's
//! candidates and their counters, return the banner to show.

use rotation_core::types::BannerStats;

/// Calculate the banner rating: average click-through plus the exploration
/// bonus `sqrt(2 * ln(total) / impressions)`.
///
/// Zero impressions are substituted with one so the division and `ln` are
/// always defined; callers apply the same substitution when summing the
/// total, which keeps `total >= 1`.
pub fn rating(clicks: f64, impressions: f64, total_impressions: f64) -> f64 {
    let impressions = if impressions == 0.0 { 1.0 } else { impressions };
    clicks / impressions + (2.0 * total_impressions.ln() / impressions).sqrt()
}

/// Select the banner with the greatest rating. Candidates are scored in the
/// supplied order and only a strictly greater rating replaces the running
/// maximum, so ties resolve to the first candidate. Returns `None` for an
/// empty candidate set.
///
/// When every candidate has zero impressions all ratings are equal and the
/// first banner wins; the exploration term then rotates fresh banners in
/// until click-through takes over.
pub fn pick_banner(candidates: &[BannerStats]) -> Option<i64> {
    let total_impressions: f64 = candidates
        .iter()
        .map(|c| {
            if c.impressions == 0 {
                1.0
            } else {
                c.impressions as f64
            }
        })
        .sum();

    let mut maximum_rating = f64::NEG_INFINITY;
    let mut selected = None;

    for candidate in candidates {
        let r = rating(
            candidate.clicks as f64,
            candidate.impressions as f64,
            total_impressions,
        );
        if r > maximum_rating {
            maximum_rating = r;
            selected = Some(candidate.banner_id);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn stats(banner_id: i64, impressions: u64, clicks: u64) -> BannerStats {
        BannerStats {
            banner_id,
            impressions,
            clicks,
        }
    }

    #[test]
    fn test_rating() {
        let cases = [
            // (clicks, impressions, total, expected)
            (0.0, 0.0, 100.0, 3.034854258770293), // 0 / 1 + sqrt(2 * ln(100) / 1)
            (0.0, 5.0, 15.0, 1.040778593381361),  // 0 / 5 + sqrt(2 * ln(15) / 5)
            (100.0, 0.0, 100.0, 103.0348542587703),
            (100.0, 100.0, 100.0, 1.3034854258770292),
            (100.0, 200.0, 100.0, 0.7145966026289348),
        ];

        for (clicks, impressions, total, expected) in cases {
            let r = rating(clicks, impressions, total);
            assert!(
                (r - expected).abs() < EPSILON,
                "rating({clicks}, {impressions}, {total}) = {r}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_rating_zero_impression_substitution() {
        assert_eq!(rating(7.0, 0.0, 42.0), rating(7.0, 1.0, 42.0));
    }

    #[test]
    fn test_rating_strictly_increasing_in_clicks() {
        let mut previous = rating(0.0, 50.0, 200.0);
        for clicks in 1..20 {
            let current = rating(clicks as f64, 50.0, 200.0);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_pick_banner_empty() {
        assert_eq!(pick_banner(&[]), None);
    }

    #[test]
    fn test_pick_banner() {
        let cases: &[(&str, Vec<BannerStats>, i64)] = &[
            (
                "all banners have zero clicks and impressions, pick first banner",
                vec![stats(1, 0, 0), stats(2, 0, 0), stats(3, 0, 0)],
                1,
            ),
            (
                "one banner has impressions, but not clicks, pick second banner",
                vec![stats(1, 2, 0), stats(2, 0, 0), stats(3, 0, 0)],
                2,
            ),
            (
                "equal impressions, one banner has clicks, pick it",
                vec![stats(1, 5, 0), stats(2, 5, 3), stats(3, 5, 0)],
                2,
            ),
            (
                "two banners have impressions, but not clicks, pick third banner",
                vec![stats(1, 2, 0), stats(2, 2, 0), stats(3, 0, 0)],
                3,
            ),
            (
                "different impressions, no clicks, pick least shown",
                vec![stats(1, 3, 0), stats(2, 4, 0), stats(3, 2, 0)],
                3,
            ),
            (
                "one banner has clicks, pick first banner",
                vec![stats(1, 5, 1), stats(2, 4, 0), stats(3, 4, 0)],
                1,
            ),
            (
                "one banner has clicks, but too many impressions, pick second banner",
                vec![stats(1, 6, 1), stats(2, 4, 0), stats(3, 4, 0)],
                2,
            ),
            (
                "all banners have clicks, pick second banner",
                vec![stats(1, 7, 2), stats(2, 4, 1), stats(3, 4, 0)],
                2,
            ),
            (
                "all banners have clicks, pick third banner",
                vec![stats(1, 7, 2), stats(2, 5, 1), stats(3, 4, 1)],
                3,
            ),
            (
                "one banner has many impressions and clicks",
                vec![
                    stats(1, 16000, 799),
                    stats(2, 9000, 59),
                    stats(3, 3000, 9),
                ],
                1,
            ),
            (
                "identical counters, pick the first one",
                vec![stats(1, 50, 10), stats(2, 50, 10), stats(3, 50, 10)],
                1,
            ),
            (
                "highest click-through wins over raw click count",
                vec![
                    stats(1, 1000, 50),
                    stats(2, 1500, 60),
                    stats(3, 800, 100),
                ],
                3,
            ),
            (
                "most clicks at comparable rates wins",
                vec![stats(1, 300, 100), stats(2, 500, 200), stats(3, 200, 50)],
                2,
            ),
        ];

        for (name, candidates, expected) in cases {
            assert_eq!(
                pick_banner(candidates),
                Some(*expected),
                "case failed: {name}"
            );
        }
    }

    #[test]
    fn test_pick_banner_order_independent_without_ties() {
        // No two candidates share a rating here, so every ordering must
        // agree on the winner.
        let a = stats(1, 1000, 50);
        let b = stats(2, 1500, 60);
        let c = stats(3, 800, 100);

        let orderings = [
            vec![a, b, c],
            vec![a, c, b],
            vec![b, a, c],
            vec![b, c, a],
            vec![c, a, b],
            vec![c, b, a],
        ];

        for ordering in &orderings {
            assert_eq!(pick_banner(ordering), Some(3));
        }
    }
}

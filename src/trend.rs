//! # Trend
//! Direction of a score sequence from the last step of its rolling mean.
//!
//! `delta = mean(last window) - mean(window one step earlier)`;
//! `delta > +t` Upward, `delta < -t` Downward, otherwise Stable, with
//! `confidence = min(|delta| * 10, 1)`.
//!
//! This is a two-point derivative of a smoothed series, not a forecast: it only
//! sees the most recent smoothed change. With fewer than `window + 1` scores
//! there is no previous mean to compare against and the result is
//! `InsufficientData` with confidence 0.

use crate::model::{TrendDirection, TrendResult};

pub const DEFAULT_WINDOW: usize = 7;
/// Dead band around zero for `delta`. Uncalibrated default.
pub const DEFAULT_DELTA_THRESHOLD: f64 = 0.05;

/// Trend with the default dead band.
pub fn predict_trend<T: Into<f64> + Copy>(scores: &[T], window: usize) -> TrendResult {
    predict_trend_with(scores, window, DEFAULT_DELTA_THRESHOLD)
}

pub fn predict_trend_with<T: Into<f64> + Copy>(
    scores: &[T],
    window: usize,
    threshold: f64,
) -> TrendResult {
    let means = rolling_mean(scores, window);
    let [.., prev, last] = means.as_slice() else {
        return TrendResult::insufficient();
    };

    let delta = last - prev;
    let direction = if delta > threshold {
        TrendDirection::Upward
    } else if delta < -threshold {
        TrendDirection::Downward
    } else {
        TrendDirection::Stable
    };

    TrendResult {
        direction,
        confidence: (delta.abs() * 10.0).min(1.0),
    }
}

/// Full-window rolling means; `len - window + 1` values, none if too short.
pub fn rolling_mean<T: Into<f64> + Copy>(scores: &[T], window: usize) -> Vec<f64> {
    if window == 0 || scores.len() < window {
        return Vec::new();
    }
    let w = window as f64;
    scores
        .windows(window)
        .map(|chunk| chunk.iter().map(|&s| s.into()).sum::<f64>() / w)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_than_window_is_insufficient() {
        let t = predict_trend(&[50u8, 60, 70], DEFAULT_WINDOW);
        assert_eq!(t, TrendResult::insufficient());
        assert_eq!(t.confidence, 0.0);
    }

    #[test]
    fn exactly_one_window_is_insufficient() {
        let s = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
        assert_eq!(predict_trend(&s, 7).direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn increasing_series_is_upward() {
        let s: Vec<f64> = (1..=14).map(f64::from).collect();
        let t = predict_trend(&s, 7);
        assert_eq!(t.direction, TrendDirection::Upward);
        assert!(t.confidence > 0.0);
        assert_eq!(t.confidence, 1.0);
    }

    #[test]
    fn decreasing_series_is_downward() {
        let s: Vec<u8> = (0..10).map(|i| 90 - i * 5).collect();
        assert_eq!(predict_trend(&s, 3).direction, TrendDirection::Downward);
    }

    #[test]
    fn flat_series_is_stable_with_zero_confidence() {
        let s = [55u8; 12];
        let t = predict_trend(&s, 7);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.confidence, 0.0);
    }

    #[test]
    fn small_delta_scales_confidence() {
        // last step: (x_n - x_{n-w}) / w = 0.21 / 3 = 0.07
        let s = [1.0, 1.0, 1.0, 1.21];
        let t = predict_trend(&s, 3);
        assert_eq!(t.direction, TrendDirection::Upward);
        assert!((t.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn zero_window_is_insufficient() {
        assert_eq!(predict_trend(&[1.0, 2.0], 0), TrendResult::insufficient());
    }

    #[test]
    fn rolling_mean_has_expected_length() {
        assert_eq!(rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 2.5, 3.5]);
        assert!(rolling_mean(&[1.0], 2).is_empty());
    }
}

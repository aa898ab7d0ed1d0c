//! Spectral peak picking.
//!
//! Selection runs in the same order as the classic `find_peaks` routine:
//!
//! 1. strict local maxima (flat tops resolve to their middle sample),
//! 2. minimum height,
//! 3. minimum separation in bins, strongest peaks claim their neighbourhood first,
//! 4. minimum topographic prominence.
//!
//! Equal-height peaks competing in step 3 are resolved in bin order, so the
//! lower frequency survives.

/// Peak selection thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakConfig {
    /// Minimum peak height (same units as the input, normalised spectrum here)
    pub min_height: f64,
    /// Minimum distance between retained peaks, in bins
    pub min_distance: usize,
    /// Minimum prominence relative to the surrounding baseline
    pub min_prominence: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            min_height: 0.05,
            min_distance: 5,
            min_prominence: 0.03,
        }
    }
}

/// A selected spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralPeak {
    /// FFT bin index
    pub bin: usize,
    /// Bin centre frequency (Hz)
    pub frequency_hz: f64,
    /// Normalised magnitude at the bin
    pub power: f64,
}

/// Find peak indices in `x`, returned in ascending bin order.
pub fn find_peaks(x: &[f64], config: &PeakConfig) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&p| x[p] >= config.min_height)
        .collect();

    let spaced = select_by_distance(x, &candidates, config.min_distance);

    spaced
        .into_iter()
        .filter(|&p| prominence(x, p) >= config.min_prominence)
        .collect()
}

/// Indices of local maxima, excluding the first and last sample.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop peaks closer than `distance` bins to a stronger neighbour.
fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    // Strongest first; stable sort keeps lower bins ahead on ties.
    order.sort_by(|&a, &b| x[peaks[b]].total_cmp(&x[peaks[a]]));

    let mut keep = vec![true; peaks.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Topographic prominence of the peak at `peak`.
///
/// Walks outwards on each side until a strictly higher sample or the edge,
/// tracking the lowest sample seen; the higher of the two minima is the base.
fn prominence(x: &[f64], peak: usize) -> f64 {
    let height = x[peak];

    let mut left_min = height;
    let mut i = peak;
    loop {
        if x[i] > height {
            break;
        }
        left_min = left_min.min(x[i]);
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = height;
    let mut i = peak;
    while i < x.len() && x[i] <= height {
        right_min = right_min.min(x[i]);
        i += 1;
    }

    height - left_min.max(right_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose() -> PeakConfig {
        PeakConfig {
            min_height: 0.0,
            min_distance: 1,
            min_prominence: 0.0,
        }
    }

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 1.0, 0.0, 0.5, 0.0];
        assert_eq!(find_peaks(&x, &loose()), vec![1, 3]);
    }

    #[test]
    fn test_edges_are_never_peaks() {
        let x = [1.0, 0.5, 0.2, 0.5, 1.0];
        assert!(find_peaks(&x, &loose()).is_empty());
    }

    #[test]
    fn test_plateau_resolves_to_middle() {
        let x = [0.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, &loose()), vec![2]);

        // Even-width plateau rounds down
        let x = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, &loose()), vec![1]);
    }

    #[test]
    fn test_height_filter() {
        let x = [0.0, 0.04, 0.0, 0.06, 0.0];
        let config = PeakConfig {
            min_height: 0.05,
            ..loose()
        };
        assert_eq!(find_peaks(&x, &config), vec![3]);
    }

    #[test]
    fn test_distance_prefers_stronger_peak() {
        let x = [0.0, 0.5, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7, 0.0];
        let config = PeakConfig {
            min_distance: 5,
            ..loose()
        };
        // Bin 1 is within 5 bins of the stronger bin 3; bin 9 is 6 bins away.
        assert_eq!(find_peaks(&x, &config), vec![3, 9]);
    }

    #[test]
    fn test_distance_tie_keeps_lower_bin() {
        let x = [0.0, 0.8, 0.0, 0.8, 0.0];
        let config = PeakConfig {
            min_distance: 5,
            ..loose()
        };
        assert_eq!(find_peaks(&x, &config), vec![1]);
    }

    #[test]
    fn test_exact_distance_is_allowed() {
        let mut x = vec![0.0; 12];
        x[2] = 1.0;
        x[7] = 0.9;
        let config = PeakConfig {
            min_distance: 5,
            ..loose()
        };
        assert_eq!(find_peaks(&x, &config), vec![2, 7]);
    }

    #[test]
    fn test_prominence() {
        // Small ripple on the shoulder of a big peak
        let x = [0.0, 0.6, 0.58, 0.59, 0.3, 1.0, 0.0];
        assert!((prominence(&x, 5) - 1.0).abs() < 1e-12);
        assert!((prominence(&x, 3) - 0.01).abs() < 1e-12);
        assert!((prominence(&x, 1) - 0.3).abs() < 1e-12);

        let config = PeakConfig {
            min_prominence: 0.03,
            ..loose()
        };
        assert_eq!(find_peaks(&x, &config), vec![1, 5]);
    }

    #[test]
    fn test_short_input() {
        assert!(find_peaks(&[], &PeakConfig::default()).is_empty());
        assert!(find_peaks(&[1.0, 2.0], &PeakConfig::default()).is_empty());
    }
}

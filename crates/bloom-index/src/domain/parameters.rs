//! Optimal Bloom filter parameter calculation
//!
//! Reference: System.md, Subsystem 7 - FPR = (1 - e^(-kn/m))^k
//!
//! Formulas:
//! - m = -n*ln(fpr) / (ln(2)^2)  -- optimal bits
//! - k = (m/n) * ln(2)           -- optimal hash functions

use std::f64::consts::LN_2;

/// Bloom filter parameters
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterParams {
    /// Number of bits in the filter
    pub size_bits: usize,
    /// Number of hash functions
    pub hash_count: usize,
    /// Expected false positive rate with these parameters
    pub expected_fpr: f64,
}

/// Calculate optimal Bloom filter parameters for given constraints
///
/// # Arguments
/// * `num_elements` - Expected number of elements to insert (n)
/// * `target_fpr` - Target false positive rate
///
/// # Returns
/// Optimal parameters (m, k) that achieve the target FPR
///
/// # Reference
/// System.md, Subsystem 7:
/// - FPR = (1 - e^(-kn/m))^k
/// - m = -n*ln(fpr) / (ln(2)^2)
/// - k = (m/n) * ln(2)
pub fn calculate_optimal_parameters(num_elements: usize, target_fpr: f64) -> BloomFilterParams {
    if num_elements == 0 {
        return BloomFilterParams {
            size_bits: 1,
            hash_count: 1,
            expected_fpr: 1.0,
        };
    }

    let n = num_elements as f64;
    let ln2_squared = LN_2 * LN_2;

    // Optimal number of bits: m = -n * ln(fpr) / (ln(2)^2)
    let m = (-n * target_fpr.ln() / ln2_squared).ceil() as usize;

    // Optimal number of hash functions: k = (m/n) * ln(2)
    let k = ((m as f64 / n) * LN_2).round() as usize;
    let k = k.clamp(1, 32); // Clamp to reasonable range

    // Calculate actual FPR with these parameters
    let expected_fpr = calculate_fpr(m, num_elements, k);

    BloomFilterParams {
        size_bits: m,
        hash_count: k,
        expected_fpr,
    }
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

/// Calculate optimal k for given m and n
pub fn optimal_k(m: usize, n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    ((m as f64 / n as f64) * LN_2).round() as usize
}

/// Calculate minimum m for given n and target FPR
pub fn minimum_bits(n: usize, target_fpr: f64) -> usize {
    let ln2_squared = LN_2 * LN_2;
    (-(n as f64) * target_fpr.ln() / ln2_squared).ceil() as usize
}

/// Derive `(m, k)` for a counting filter sized from a byte quota instead of
/// an expected element count: the index file can hold at most
/// `quota_bytes * 2` counters (4 bits each), so size the filter to that
/// many cells directly rather than solving for a target element count.
pub fn parameters_from_quota(quota_bytes: usize, target_fpr: f64) -> BloomFilterParams {
    let max_counters = quota_bytes.saturating_mul(2).max(1);
    // Size k for the load factor implied by the target FPR at full occupancy,
    // using the standard m = -n*ln(p)/(ln2)^2 relation solved for n.
    let assumed_n = (-(max_counters as f64) * (LN_2 * LN_2) / target_fpr.ln().min(-0.01))
        .max(1.0) as usize;
    let k = optimal_k(max_counters, assumed_n).clamp(1, 32);
    BloomFilterParams {
        size_bits: max_counters,
        hash_count: k,
        expected_fpr: calculate_fpr(max_counters, assumed_n, k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_parameters_n50_fpr0001() {
        // For n=50, FPR=0.0001 → expect k≈13, m≈959
        let params = calculate_optimal_parameters(50, 0.0001);

        assert!(
            params.hash_count >= 10 && params.hash_count <= 15,
            "Expected k≈13, got k={}",
            params.hash_count
        );
        assert!(
            params.size_bits >= 800 && params.size_bits <= 1200,
            "Expected m≈959, got m={}",
            params.size_bits
        );
    }

    #[test]
    fn test_optimal_parameters_n100_fpr001() {
        // For n=100, FPR=0.01 → expect k≈7, m≈959
        let params = calculate_optimal_parameters(100, 0.01);

        assert!(
            params.hash_count >= 5 && params.hash_count <= 9,
            "Expected k≈7, got k={}",
            params.hash_count
        );
        assert!(
            params.size_bits >= 800 && params.size_bits <= 1200,
            "Expected m≈959, got m={}",
            params.size_bits
        );
    }

    #[test]
    fn test_fpr_calculation() {
        // With m=1000, n=100, k=7, FPR should be around 0.008
        let fpr = calculate_fpr(1000, 100, 7);
        assert!(fpr > 0.005 && fpr < 0.02, "Expected FPR≈0.008, got {}", fpr);
    }

    #[test]
    fn test_expected_fpr_meets_target() {
        let target_fpr = 0.01;
        let params = calculate_optimal_parameters(100, target_fpr);

        // Expected FPR should be at or below target
        assert!(
            params.expected_fpr <= target_fpr * 1.1, // Allow 10% tolerance
            "Expected FPR {} should be <= target {}",
            params.expected_fpr,
            target_fpr
        );
    }

    #[test]
    fn test_zero_elements() {
        let params = calculate_optimal_parameters(0, 0.01);
        assert_eq!(params.size_bits, 1);
        assert_eq!(params.hash_count, 1);
    }

    #[test]
    fn test_k_clamped_to_reasonable_range() {
        // Very small FPR would need many hash functions
        let params = calculate_optimal_parameters(10, 0.0000001);
        assert!(params.hash_count <= 32, "k should be clamped to max 32");
        assert!(params.hash_count >= 1, "k should be at least 1");
    }

    #[test]
    fn test_larger_n_needs_more_bits() {
        let params1 = calculate_optimal_parameters(100, 0.01);
        let params2 = calculate_optimal_parameters(1000, 0.01);

        assert!(
            params2.size_bits > params1.size_bits,
            "More elements should need more bits"
        );
    }

    #[test]
    fn test_lower_fpr_needs_more_bits() {
        let params1 = calculate_optimal_parameters(100, 0.1);
        let params2 = calculate_optimal_parameters(100, 0.01);

        assert!(
            params2.size_bits > params1.size_bits,
            "Lower FPR should need more bits"
        );
    }

    #[test]
    fn quota_sizing_fills_every_available_counter() {
        let params = parameters_from_quota(1024, 0.01);
        assert_eq!(params.size_bits, 2048); // 2 counters per quota byte
        assert!(params.hash_count >= 1 && params.hash_count <= 32);
    }

    #[test]
    fn quota_sizing_scales_with_quota() {
        let small = parameters_from_quota(1024, 0.01);
        let large = parameters_from_quota(1024 * 1024, 0.01);
        assert!(large.size_bits > small.size_bits);
    }
}

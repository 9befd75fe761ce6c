/// Rounds `value` to `decimals` places, halves away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(5.5 - 3.2, 3), 2.3);
        assert_eq!(round_to(1.005001, 2), 1.01);
        assert_eq!(round_to(12.344, 2), 12.34);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}

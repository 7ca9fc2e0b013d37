use coinem_utils::{Coin, EmFit};
use itertools::Itertools;

/// Final estimates as a small tab-aligned table.
pub fn format_estimates(fit: &EmFit) -> String {
    format!(
        "\t thetaA \t thetaB\n\t {:.3} \t {:.3}\n",
        fit.params.theta_a, fit.params.theta_b
    )
}

/// One coin's estimates across iterations, comma separated.
pub fn format_trajectory(fit: &EmFit, coin: Coin) -> String {
    fit.history
        .theta_trajectory(coin)
        .iter()
        .map(|theta| format!("{:.4}", theta))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinem_utils::{run, ObservationSet, Parameters};

    fn fit() -> EmFit {
        let observations = ObservationSet::from_heads(10, &[5, 9, 8, 4, 7]).unwrap();
        run(Parameters::new(0.5, 0.6).unwrap(), &observations, 1e-8, 1000).unwrap()
    }

    #[test]
    fn test_format_estimates() {
        assert_eq!(format_estimates(&fit()), "\t thetaA \t thetaB\n\t 0.520 \t 0.797\n");
    }

    #[test]
    fn test_format_trajectory() {
        let trajectory = format_trajectory(&fit(), Coin::A);
        assert!(trajectory.starts_with("0.5000, 0.5813, "));
        assert!(trajectory.ends_with("0.5196"));
        assert_eq!(trajectory.split(", ").count(), 23);
    }
}

//! Protocol constants. All token values are in base units (1 token = 10^18 units).

/// Base units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Fixed-point factor applied to `reward_rate` and `acc_reward_per_share`.
///
/// Both are stored multiplied by `SCALE` so that per-second and per-share
/// values keep twelve decimal places without floating point.
///
/// # Examples
///
/// ```
/// use stakeflow_core::constants::SCALE;
/// assert_eq!(SCALE, 10u128.pow(12));
/// ```
pub const SCALE: u128 = 1_000_000_000_000;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// A 365-day year. The schedule ignores leap days.
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

pub const MONTHS_PER_YEAR: u64 = 12;

/// One twelfth of [`SECONDS_PER_YEAR`] (30.4166 days).
pub const SECONDS_PER_MONTH: u64 = SECONDS_PER_YEAR / MONTHS_PER_YEAR;

/// Default refill epoch length: 30 days.
pub const DEFAULT_REWARDS_DURATION: u64 = 30 * SECONDS_PER_DAY;

/// Schedule anchor: 2019-09-01T00:00:00Z.
pub const INITIAL_PERIOD_START: u64 = 1_567_296_000;

/// Budget of the first schedule year, before the per-network split.
pub const INITIAL_YEARLY_REWARD: u128 = 2_500_000 * TOKEN_UNIT;

/// Number of deployments sharing the yearly budget.
pub const NUM_NETWORKS: u32 = 2;

/// Yearly decay multiplier `DECAY_NUMERATOR / DECAY_DENOMINATOR` (3/4).
pub const DECAY_NUMERATOR: u128 = 3;
pub const DECAY_DENOMINATOR: u128 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_is_a_twelfth_of_year() {
        assert_eq!(SECONDS_PER_MONTH * MONTHS_PER_YEAR, SECONDS_PER_YEAR);
        assert_eq!(SECONDS_PER_MONTH, 2_628_000);
    }

    #[test]
    fn default_duration_is_thirty_days() {
        assert_eq!(DEFAULT_REWARDS_DURATION, 2_592_000);
    }

    #[test]
    fn decay_ratio_is_three_quarters() {
        assert!(DECAY_NUMERATOR < DECAY_DENOMINATOR);
        assert_eq!(DECAY_DENOMINATOR - DECAY_NUMERATOR, 1);
    }

    #[test]
    fn initial_yearly_reward_value() {
        assert_eq!(INITIAL_YEARLY_REWARD / TOKEN_UNIT, 2_500_000);
    }

    #[test]
    fn scaled_budget_fits_u128() {
        // A whole yearly budget multiplied by SCALE must not overflow.
        assert!(INITIAL_YEARLY_REWARD.checked_mul(SCALE).is_some());
    }
}

//! Calendar-indexed decaying reward schedule.
//!
//! Time is measured from the schedule anchor in 365-day years and
//! twelfth-of-a-year months. The yearly budget starts at the initial
//! figure divided by the number of networks and shrinks by a quarter at
//! every year boundary:
//!
//! - Year 0: `initial / networks`
//! - Year 1: `year0 * 3 / 4`
//! - Year n: `year(n-1) * 3 / 4`, truncated each step
//!
//! The monthly budget is always one twelfth of the yearly budget in force.

use serde::{Deserialize, Serialize};

use stakeflow_core::constants::{
    DECAY_DENOMINATOR, DECAY_NUMERATOR, INITIAL_PERIOD_START, INITIAL_YEARLY_REWARD,
    MONTHS_PER_YEAR, NUM_NETWORKS, SECONDS_PER_MONTH, SECONDS_PER_YEAR,
};
use stakeflow_core::error::FeederError;
use stakeflow_core::types::{Amount, Timestamp};

/// Fixed parameters of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    /// Anchor timestamp of year 0, month 0.
    pub initial_period_start: Timestamp,
    /// Year-0 budget shared by all networks.
    pub initial_yearly_reward: Amount,
    pub num_networks: u32,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            initial_period_start: INITIAL_PERIOD_START,
            initial_yearly_reward: INITIAL_YEARLY_REWARD,
            num_networks: NUM_NETWORKS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardSchedule {
    params: ScheduleParams,
}

impl RewardSchedule {
    pub fn new(params: ScheduleParams) -> Result<Self, FeederError> {
        if params.num_networks == 0 {
            return Err(FeederError::ZeroNetworks);
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    pub fn initial_period_start(&self) -> Timestamp {
        self.params.initial_period_start
    }

    /// This network's share of the year-0 budget.
    pub fn base_yearly_reward(&self) -> Amount {
        self.params.initial_yearly_reward / self.params.num_networks as u128
    }

    fn elapsed(&self, ts: Timestamp) -> Result<u64, FeederError> {
        ts.checked_sub(self.params.initial_period_start)
            .ok_or(FeederError::BeforePeriodStart {
                ts,
                start: self.params.initial_period_start,
            })
    }

    /// Whole schedule years elapsed at `ts`.
    pub fn year_number(&self, ts: Timestamp) -> Result<u64, FeederError> {
        Ok(self.elapsed(ts)? / SECONDS_PER_YEAR)
    }

    /// Whole schedule months elapsed at `ts`.
    pub fn month_number(&self, ts: Timestamp) -> Result<u64, FeederError> {
        Ok(self.elapsed(ts)? / SECONDS_PER_MONTH)
    }

    /// Yearly budget during schedule year `year`.
    ///
    /// The decay is compounded one year at a time with truncation, so the
    /// result matches repeated `r * 3 / 4` exactly. Returns 0 once the
    /// truncated budget reaches zero.
    pub fn epoch_yearly_reward(&self, year: u64) -> Amount {
        let mut reward = self.base_yearly_reward();
        for _ in 0..year {
            if reward == 0 {
                break;
            }
            reward = reward.saturating_mul(DECAY_NUMERATOR) / DECAY_DENOMINATOR;
        }
        reward
    }

    pub fn yearly_reward(&self, ts: Timestamp) -> Result<Amount, FeederError> {
        Ok(self.epoch_yearly_reward(self.year_number(ts)?))
    }

    pub fn monthly_reward(&self, ts: Timestamp) -> Result<Amount, FeederError> {
        Ok(self.yearly_reward(ts)? / MONTHS_PER_YEAR as u128)
    }

    /// First timestamp of schedule year `year`.
    pub fn year_start(&self, year: u64) -> Timestamp {
        self.params
            .initial_period_start
            .saturating_add(year.saturating_mul(SECONDS_PER_YEAR))
    }

    /// First timestamp of schedule month `month`.
    pub fn month_start(&self, month: u64) -> Timestamp {
        self.params
            .initial_period_start
            .saturating_add(month.saturating_mul(SECONDS_PER_MONTH))
    }

    /// Seconds from `ts` until the next month boundary (never 0).
    pub fn seconds_until_next_month(&self, ts: Timestamp) -> Result<u64, FeederError> {
        let month = self.month_number(ts)?;
        Ok(self.month_start(month + 1) - ts)
    }

    /// Sum of the yearly budgets of years `0..years`.
    pub fn cumulative_reward(&self, years: u64) -> Amount {
        let mut total: Amount = 0;
        for year in 0..years {
            let reward = self.epoch_yearly_reward(year);
            if reward == 0 {
                break;
            }
            total = total.saturating_add(reward);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stakeflow_core::constants::TOKEN_UNIT;

    const START: Timestamp = INITIAL_PERIOD_START;

    fn schedule() -> RewardSchedule {
        RewardSchedule::default()
    }

    // ------------------------------------------------------------------
    // params
    // ------------------------------------------------------------------

    #[test]
    fn default_params() {
        let s = schedule();
        assert_eq!(s.params().num_networks, 2);
        assert_eq!(s.params().initial_yearly_reward, 2_500_000 * TOKEN_UNIT);
        assert_eq!(s.initial_period_start(), 1_567_296_000);
        assert_eq!(s.base_yearly_reward(), 1_250_000 * TOKEN_UNIT);
    }

    #[test]
    fn zero_networks_rejected() {
        let params = ScheduleParams {
            num_networks: 0,
            ..ScheduleParams::default()
        };
        assert_eq!(RewardSchedule::new(params), Err(FeederError::ZeroNetworks));
    }

    #[test]
    fn partial_params_from_json() {
        let params: ScheduleParams = serde_json::from_str(r#"{"num_networks": 4}"#).unwrap();
        assert_eq!(params.num_networks, 4);
        assert_eq!(params.initial_period_start, START);
    }

    // ------------------------------------------------------------------
    // year / month numbers
    // ------------------------------------------------------------------

    #[test]
    fn year_and_month_numbers() {
        let s = schedule();
        assert_eq!(s.year_number(START).unwrap(), 0);
        assert_eq!(s.month_number(START).unwrap(), 0);
        assert_eq!(s.year_number(START + SECONDS_PER_YEAR - 1).unwrap(), 0);
        assert_eq!(s.year_number(START + SECONDS_PER_YEAR).unwrap(), 1);
        assert_eq!(s.month_number(START + SECONDS_PER_MONTH).unwrap(), 1);

        let now = 1_700_000_000;
        let month = s.month_number(now).unwrap();
        let year = s.year_number(now).unwrap();
        assert_eq!(s.year_number(now + SECONDS_PER_YEAR).unwrap(), year + 1);
        assert_eq!(s.month_number(now + SECONDS_PER_MONTH).unwrap(), month + 1);
        assert_eq!(s.month_number(now + SECONDS_PER_YEAR).unwrap(), month + 12);
    }

    #[test]
    fn before_anchor_rejected() {
        let s = schedule();
        assert_eq!(
            s.year_number(START - 1),
            Err(FeederError::BeforePeriodStart { ts: START - 1, start: START })
        );
        assert!(s.monthly_reward(0).is_err());
    }

    // ------------------------------------------------------------------
    // rewards
    // ------------------------------------------------------------------

    #[test]
    fn yearly_and_monthly_reward_over_ten_years() {
        let s = schedule();
        let mut reward = s.base_yearly_reward();
        let mut period_start = START;
        for _ in 0..=10 {
            let next_reward = reward * 3 / 4;
            let next_start = period_start + SECONDS_PER_YEAR;

            assert_eq!(s.yearly_reward(period_start).unwrap(), reward);
            assert_eq!(s.monthly_reward(period_start).unwrap(), reward / 12);
            assert_eq!(s.yearly_reward(next_start - 1).unwrap(), reward);
            assert_eq!(s.monthly_reward(next_start - 1).unwrap(), reward / 12);
            assert_eq!(s.yearly_reward(next_start).unwrap(), next_reward);
            assert_eq!(s.monthly_reward(next_start).unwrap(), next_reward / 12);

            reward = next_reward;
            period_start = next_start;
        }
    }

    #[test]
    fn decay_compounds() {
        let s = schedule();
        let base = s.base_yearly_reward();
        assert_eq!(s.epoch_yearly_reward(1), base * 3 / 4);
        assert_eq!(s.epoch_yearly_reward(2), base * 9 / 16);
    }

    #[test]
    fn decay_reaches_zero() {
        let s = schedule();
        assert_eq!(s.epoch_yearly_reward(1_000), 0);
        assert_eq!(s.epoch_yearly_reward(u64::MAX), 0);
    }

    #[test]
    fn cumulative_stays_below_four_times_base() {
        let s = schedule();
        let total = s.cumulative_reward(500);
        assert!(total < 4 * s.base_yearly_reward());
        assert_eq!(s.cumulative_reward(1), s.base_yearly_reward());
        assert_eq!(s.cumulative_reward(0), 0);
    }

    // ------------------------------------------------------------------
    // boundaries
    // ------------------------------------------------------------------

    #[test]
    fn month_start_and_next_boundary() {
        let s = schedule();
        assert_eq!(s.month_start(0), START);
        assert_eq!(s.month_start(12), s.year_start(1));
        assert_eq!(s.seconds_until_next_month(START).unwrap(), SECONDS_PER_MONTH);
        assert_eq!(s.seconds_until_next_month(START + SECONDS_PER_MONTH - 1).unwrap(), 1);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn yearly_reward_never_increases(a in START..START + 40 * SECONDS_PER_YEAR, d in 0u64..10 * SECONDS_PER_YEAR) {
            let s = schedule();
            prop_assert!(s.yearly_reward(a + d).unwrap() <= s.yearly_reward(a).unwrap());
        }

        #[test]
        fn ts_lies_inside_its_month(ts in START..START + 40 * SECONDS_PER_YEAR) {
            let s = schedule();
            let month = s.month_number(ts).unwrap();
            prop_assert!(s.month_start(month) <= ts);
            prop_assert!(ts < s.month_start(month + 1));
            prop_assert_eq!(s.monthly_reward(ts).unwrap(), s.yearly_reward(ts).unwrap() / 12);
        }
    }
}

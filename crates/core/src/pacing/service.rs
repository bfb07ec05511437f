//! Pacing service - session lifecycle and query timing

use std::time::Duration;

use chaff_domain::constants::{
    CLICK_PROBABILITY, MIN_QUERY_GAP_MS, MIX_WHEN_ACTIVE_PROBABILITY, MIX_WHEN_IDLE_PROBABILITY,
    RATE_WINDOW_MS, REFERENCE_RATE_PER_HOUR, REFINE_DELAY_MAX_MS, REFINE_DELAY_MIN_MS,
    REFINE_PROBABILITY, SESSION_GAP_SCALE_MS, SESSION_LENGTH_MAX, SESSION_LENGTH_MEAN,
    SESSION_LENGTH_MIN, SESSION_LENGTH_SD, TYPO_PROBABILITY, WITHIN_SESSION_JITTER_SD_MS,
    WITHIN_SESSION_MEAN_MS,
};
use chaff_domain::{Intensity, QueryComplexity, Session, Settings, UserState};
use chrono::{DateTime, Duration as ChronoDuration, Local, Timelike, Utc};
use tracing::debug;

use crate::random::{self, RandomSource};

/// Statistical timing scheduler.
///
/// Produces the delay until the next query, grouped into sessions separated
/// by long Erlang-distributed gaps, and enforces the hourly rate cap. All
/// mutation happens from the single orchestrator flow; the pacer itself
/// holds no locks.
pub struct Pacer {
    rng: Box<dyn RandomSource>,
    session: Option<Session>,
    queries_this_hour: u32,
    hour_reset_time: DateTime<Utc>,
}

impl Pacer {
    pub fn new(rng: Box<dyn RandomSource>, now: DateTime<Utc>) -> Self {
        Self {
            rng,
            session: None,
            queries_this_hour: 0,
            hour_reset_time: now + ChronoDuration::milliseconds(RATE_WINDOW_MS),
        }
    }

    /// Delay until the next query should fire.
    ///
    /// Refreshes the rate window, then either opens a new session (returning
    /// the inter-session gap) or samples a within-session delay, consuming
    /// one of the session's remaining queries.
    pub fn next_query_delay(&mut self, settings: &Settings, now: DateTime<Local>) -> Duration {
        self.refresh_rate_window(now.with_timezone(&Utc));

        let exhausted = self.session.as_ref().map_or(true, Session::is_exhausted);
        if exhausted {
            self.start_new_session(now.with_timezone(&Utc))
        } else {
            self.within_session_delay(settings, now)
        }
    }

    /// Open a fresh session and return the gap before its first query.
    ///
    /// Gap is Erlang-2 with a 30 minute mean; session length is a rounded
    /// normal clamped to its documented range. The previous session's topic
    /// does not carry over.
    fn start_new_session(&mut self, now: DateTime<Utc>) -> Duration {
        let gap_ms = random::gamma(self.rng.as_mut(), 2, SESSION_GAP_SCALE_MS);
        let length = random::normal(self.rng.as_mut(), SESSION_LENGTH_MEAN, SESSION_LENGTH_SD)
            .round()
            .clamp(f64::from(SESSION_LENGTH_MIN), f64::from(SESSION_LENGTH_MAX))
            as u32;

        let start_time = now + ChronoDuration::milliseconds(gap_ms as i64);
        self.session = Some(Session::new(length, start_time));

        debug!(gap_ms = gap_ms as u64, queries = length, "starting new query session");
        Duration::from_millis(gap_ms as u64)
    }

    /// Delay between queries inside the current session.
    ///
    /// Exponential base plus normal jitter, stretched by the time-of-day
    /// weight and divided by the intensity multiplier, floored at one
    /// minute. Consumes one query from the session.
    fn within_session_delay(&mut self, settings: &Settings, now: DateTime<Local>) -> Duration {
        let base = random::exponential(self.rng.as_mut(), WITHIN_SESSION_MEAN_MS);
        let jitter = random::normal(self.rng.as_mut(), 0.0, WITHIN_SESSION_JITTER_SD_MS);
        let weight = Self::time_of_day_weight(now.hour());
        let multiplier = Self::intensity_multiplier(settings);

        let delay_ms = ((base + jitter) * weight / multiplier).max(MIN_QUERY_GAP_MS);

        if let Some(session) = self.session.as_mut() {
            session.queries_remaining = session.queries_remaining.saturating_sub(1);
        }

        debug!(delay_ms = delay_ms as u64, "within-session delay sampled");
        Duration::from_millis(delay_ms as u64)
    }

    /// Whether another query fits under the hourly cap.
    pub fn can_execute_query(&self, settings: &Settings) -> bool {
        self.queries_this_hour < Self::hourly_cap(settings)
    }

    /// Count a dispatched query against the rate window.
    pub fn record_query(&mut self) {
        self.queries_this_hour += 1;
    }

    /// Whether to interleave a query with the user's current state.
    ///
    /// Never while the screen is locked; active browsing is favored over
    /// idle, since real searches cluster with activity.
    pub fn should_mix_with_activity(&mut self, state: UserState) -> bool {
        let threshold = match state {
            UserState::Locked => return false,
            UserState::Active => MIX_WHEN_ACTIVE_PROBABILITY,
            UserState::Idle => MIX_WHEN_IDLE_PROBABILITY,
        };
        random::chance(self.rng.as_mut(), threshold)
    }

    /// Draw a complexity tier: 30% short, 50% medium, 15% long, 5% very long.
    pub fn query_complexity(&mut self) -> QueryComplexity {
        let rand = self.rng.next_f64();
        if rand < 0.30 {
            QueryComplexity::Short
        } else if rand < 0.80 {
            QueryComplexity::Medium
        } else if rand < 0.95 {
            QueryComplexity::Long
        } else {
            QueryComplexity::VeryLong
        }
    }

    pub fn should_add_typo(&mut self) -> bool {
        random::chance(self.rng.as_mut(), TYPO_PROBABILITY)
    }

    pub fn should_click_result(&mut self) -> bool {
        random::chance(self.rng.as_mut(), CLICK_PROBABILITY)
    }

    pub fn should_refine_search(&mut self) -> bool {
        random::chance(self.rng.as_mut(), REFINE_PROBABILITY)
    }

    /// Pause before a follow-up refinement query fires.
    pub fn refinement_delay(&mut self) -> Duration {
        let ms = random::uniform_range(
            self.rng.as_mut(),
            REFINE_DELAY_MIN_MS as f64,
            REFINE_DELAY_MAX_MS as f64,
        );
        Duration::from_millis(ms as u64)
    }

    /// Simulated time spent reading a clicked result.
    ///
    /// Three-component mixture: quick exits dominate, with a tail of long
    /// reads. Negative normal samples clamp to zero.
    pub fn result_dwell_time(&mut self) -> Duration {
        let rand = self.rng.next_f64();
        let ms = if rand < 0.70 {
            random::normal(self.rng.as_mut(), 10_000.0, 3_000.0)
        } else if rand < 0.95 {
            random::normal(self.rng.as_mut(), 37_500.0, 15_000.0)
        } else {
            random::normal(self.rng.as_mut(), 120_000.0, 40_000.0)
        };
        Duration::from_millis(ms.max(0.0) as u64)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn queries_this_hour(&self) -> u32 {
        self.queries_this_hour
    }

    fn refresh_rate_window(&mut self, now: DateTime<Utc>) {
        if now > self.hour_reset_time {
            self.queries_this_hour = 0;
            self.hour_reset_time = now + ChronoDuration::milliseconds(RATE_WINDOW_MS);
        }
    }

    /// Hourly query cap for the configured intensity.
    fn hourly_cap(settings: &Settings) -> u32 {
        match settings.intensity {
            Intensity::Low => 6,
            Intensity::Medium => 12,
            Intensity::High => 20,
            Intensity::Custom => settings.custom_rate,
        }
    }

    /// Delay divisor for the configured intensity, normalized so medium
    /// pacing is 1.0.
    fn intensity_multiplier(settings: &Settings) -> f64 {
        match settings.intensity {
            Intensity::Low => 0.5,
            Intensity::Medium => 1.0,
            Intensity::High => 1.8,
            Intensity::Custom => f64::from(settings.custom_rate) / REFERENCE_RATE_PER_HOUR,
        }
    }

    /// Delay stretch by local hour; sleep hours suppress queries hardest.
    fn time_of_day_weight(hour: u32) -> f64 {
        match hour {
            0..=5 => 4.0,
            6..=8 => 1.5,
            9..=22 => 1.0,
            _ => 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use chaff_domain::Intensity;
    use chrono::TimeZone;

    use super::*;
    use crate::random::SequenceSource;

    fn pacer_at(now: DateTime<Utc>, values: Vec<f64>) -> Pacer {
        Pacer::new(Box::new(SequenceSource::new(values)), now)
    }

    fn noon_local() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).single().expect("valid local time")
    }

    #[test]
    fn first_delay_opens_a_session() {
        let now = noon_local();
        let mut pacer = pacer_at(now.with_timezone(&Utc), vec![0.5]);

        let delay = pacer.next_query_delay(&Settings::default(), now);

        // Erlang-2 at U=0.5: -scale * 2 ln(0.5) = 2 * scale * ln 2
        let expected_ms = 2.0 * SESSION_GAP_SCALE_MS * std::f64::consts::LN_2;
        assert_eq!(delay.as_millis() as u64, expected_ms as u64);

        let session = pacer.session().expect("session created");
        // round(normal(4, 2)) at U=0.5 twice: z0 = -sqrt(2 ln 2), 4 - 2*1.177 -> 2
        assert_eq!(session.queries_remaining, 2);
        assert_eq!(session.topic, None);
    }

    #[test]
    fn session_queries_decrease_by_one_per_delay_and_never_go_negative() {
        let now = noon_local();
        let mut pacer = pacer_at(now.with_timezone(&Utc), vec![0.5]);
        pacer.next_query_delay(&Settings::default(), now);
        let initial = pacer.session().expect("session").queries_remaining;

        for expected in (0..initial).rev() {
            pacer.next_query_delay(&Settings::default(), now);
            assert_eq!(pacer.session().expect("session").queries_remaining, expected);
        }

        // The next call rolls over into a new session rather than going negative.
        pacer.next_query_delay(&Settings::default(), now);
        assert!(pacer.session().expect("session").queries_remaining > 0);
    }

    #[test]
    fn within_session_delay_respects_one_minute_floor() {
        let now = noon_local();
        // First draw opens the session; feeding zeros afterwards drives the
        // exponential base and jitter to their minimum.
        let mut pacer = pacer_at(now.with_timezone(&Utc), vec![0.5, 0.5, 0.5, 0.0, 0.5, 0.5]);
        pacer.next_query_delay(&Settings::default(), now);

        let delay = pacer.next_query_delay(&Settings::default(), now);
        assert!(delay >= Duration::from_millis(MIN_QUERY_GAP_MS as u64));
    }

    #[test]
    fn hourly_cap_flips_exactly_at_documented_limits() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).single().expect("valid time");
        for (intensity, cap) in [
            (Intensity::Low, 6),
            (Intensity::Medium, 12),
            (Intensity::High, 20),
            (Intensity::Custom, 10),
        ] {
            let mut settings = Settings::default();
            settings.intensity = intensity;
            settings.custom_rate = 10;

            let mut pacer = pacer_at(now, vec![0.5]);
            for _ in 0..cap {
                assert!(pacer.can_execute_query(&settings));
                pacer.record_query();
            }
            assert!(!pacer.can_execute_query(&settings));
        }
    }

    #[test]
    fn rate_window_resets_once_expired() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).single().expect("valid time");
        let mut pacer = pacer_at(now, vec![0.5]);
        for _ in 0..12 {
            pacer.record_query();
        }
        let settings = Settings::default();
        assert!(!pacer.can_execute_query(&settings));

        let later = now + ChronoDuration::milliseconds(RATE_WINDOW_MS + 1);
        let local_later: DateTime<Local> = later.with_timezone(&Local);
        pacer.next_query_delay(&settings, local_later);

        assert_eq!(pacer.queries_this_hour(), 0);
        assert!(pacer.can_execute_query(&settings));
    }

    #[test]
    fn locked_state_never_mixes() {
        let mut pacer = pacer_at(Utc::now(), vec![0.0]);
        assert!(!pacer.should_mix_with_activity(UserState::Locked));
    }

    #[test]
    fn mix_probabilities_follow_user_state() {
        // Draw of 0.5: under the 0.7 active threshold, over the 0.3 idle one.
        let mut pacer = pacer_at(Utc::now(), vec![0.5]);
        assert!(pacer.should_mix_with_activity(UserState::Active));
        assert!(!pacer.should_mix_with_activity(UserState::Idle));
    }

    #[test]
    fn complexity_tiers_match_cumulative_weights() {
        let mut pacer = pacer_at(Utc::now(), vec![0.29, 0.30, 0.79, 0.80, 0.94, 0.95, 0.99]);
        assert_eq!(pacer.query_complexity(), QueryComplexity::Short);
        assert_eq!(pacer.query_complexity(), QueryComplexity::Medium);
        assert_eq!(pacer.query_complexity(), QueryComplexity::Medium);
        assert_eq!(pacer.query_complexity(), QueryComplexity::Long);
        assert_eq!(pacer.query_complexity(), QueryComplexity::Long);
        assert_eq!(pacer.query_complexity(), QueryComplexity::VeryLong);
        assert_eq!(pacer.query_complexity(), QueryComplexity::VeryLong);
    }

    #[test]
    fn dwell_time_mixture_selects_expected_component() {
        // First draw selects the component, next two feed Box-Muller. With
        // U=0.5 the normal lands below its mean, so check against the
        // component's range rather than the exact mean.
        let mut pacer = pacer_at(Utc::now(), vec![0.1, 0.5, 0.5]);
        let quick = pacer.result_dwell_time();
        assert!(quick < Duration::from_millis(15_000));

        let mut pacer = pacer_at(Utc::now(), vec![0.99, 0.5, 0.5]);
        let long = pacer.result_dwell_time();
        assert!(long > Duration::from_millis(60_000));
    }

    #[test]
    fn time_of_day_weight_brackets() {
        assert_eq!(Pacer::time_of_day_weight(0), 4.0);
        assert_eq!(Pacer::time_of_day_weight(5), 4.0);
        assert_eq!(Pacer::time_of_day_weight(6), 1.5);
        assert_eq!(Pacer::time_of_day_weight(8), 1.5);
        assert_eq!(Pacer::time_of_day_weight(9), 1.0);
        assert_eq!(Pacer::time_of_day_weight(22), 1.0);
        assert_eq!(Pacer::time_of_day_weight(23), 2.0);
    }
}

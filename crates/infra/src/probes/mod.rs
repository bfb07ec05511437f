//! Default probe and indicator adapters
//!
//! The idle probe and status indicator are thin collaborators; platform
//! integrations plug in behind the same ports. The defaults here keep the
//! engine runnable headless: a fixed-state probe and a log-line indicator.

use async_trait::async_trait;
use chaff_core::{IdleProbe, StatusIndicator};
use chaff_domain::{Result, UserState};
use tracing::info;

/// Idle probe reporting a fixed state.
///
/// Used where no platform probe is wired up; reporting `active` matches the
/// degraded behavior when a real probe is unavailable.
pub struct FixedIdleProbe {
    state: UserState,
}

impl FixedIdleProbe {
    pub fn new(state: UserState) -> Self {
        Self { state }
    }

    /// Probe that always reports an active user.
    pub fn active() -> Self {
        Self::new(UserState::Active)
    }
}

#[async_trait]
impl IdleProbe for FixedIdleProbe {
    async fn query_state(&self, _threshold_secs: u32) -> Result<UserState> {
        Ok(self.state)
    }
}

/// Status indicator that reports transitions as log lines.
#[derive(Debug, Default)]
pub struct TracingStatusIndicator;

impl StatusIndicator for TracingStatusIndicator {
    fn set_text(&self, text: &str) {
        info!(badge = text, "status indicator updated");
    }

    fn set_color(&self, color: &str) {
        info!(color, "status indicator color updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_probe_reports_configured_state() {
        let probe = FixedIdleProbe::new(UserState::Locked);
        assert_eq!(probe.query_state(15).await.expect("state"), UserState::Locked);

        let probe = FixedIdleProbe::active();
        assert_eq!(probe.query_state(15).await.expect("state"), UserState::Active);
    }
}

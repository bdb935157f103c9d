//! Tiered resolution orchestrator.
//!
//! Tiers run strictly in priority order. Inside a tier every probe starts at
//! once and the first success wins; the losers are dropped, which cancels their
//! in-flight requests. Each attempt carries its own timeout, transient failures
//! are retried with exponential backoff, and one outer deadline bounds the
//! whole cascade.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::entities::{ResolvedAvatar, Username};
use crate::domain::errors::{ProbeFailure, ResolveError};
use crate::domain::ports::{ClockPort, ProbePort};

use super::registry::{ProbeRegistry, Tier, TierPolicy};

/// Default wall-clock budget for one resolution.
pub const DEFAULT_GLOBAL_BUDGET: Duration = Duration::from_secs(20);

/// Runs the probe registry for one username under a global deadline.
pub struct ResolutionOrchestrator {
    registry: ProbeRegistry,
    global_budget: Duration,
    clock: Arc<dyn ClockPort>,
}

impl ResolutionOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(registry: ProbeRegistry, global_budget: Duration, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            registry,
            global_budget,
            clock,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn global_budget(&self) -> Duration {
        self.global_budget
    }

    /// Resolves a username to a raw upstream picture URL.
    ///
    /// # Errors
    /// Returns [`ResolveError::Timeout`] when the global budget runs out and
    /// [`ResolveError::NotFoundAnywhere`] when every tier was exhausted.
    pub async fn resolve(&self, username: &Username) -> Result<ResolvedAvatar, ResolveError> {
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.global_budget, self.run_cascade(username)).await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(Ok((probe, url))) => {
                info!(username = %username, probe = %probe, elapsed_ms, "Resolved profile picture");
                Ok(ResolvedAvatar::new(
                    username.clone(),
                    url,
                    self.clock.now(),
                    probe,
                ))
            }
            Ok(Err(err)) => {
                warn!(username = %username, elapsed_ms, error = %err, "Resolution failed");
                Err(err)
            }
            Err(_) => {
                warn!(
                    username = %username,
                    budget_ms = self.global_budget.as_millis(),
                    "Resolution exceeded global budget"
                );
                Err(ResolveError::timeout(username.as_str(), self.global_budget))
            }
        }
    }

    async fn run_cascade(&self, username: &Username) -> Result<(String, String), ResolveError> {
        for tier in self.registry.tiers() {
            if tier.is_empty() {
                continue;
            }

            let delay = tier.policy().delay_before;
            if !delay.is_zero() {
                debug!(tier = tier.name(), delay_ms = delay.as_millis(), "Pausing before tier");
                tokio::time::sleep(delay).await;
            }

            if let Some(hit) = race_tier(tier, username).await {
                return Ok(hit);
            }

            debug!(username = %username, tier = tier.name(), "Tier exhausted");
        }

        Err(ResolveError::not_found_anywhere(
            username.as_str(),
            self.registry.len(),
        ))
    }
}

impl std::fmt::Debug for ResolutionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionOrchestrator")
            .field("registry", &self.registry)
            .field("global_budget", &self.global_budget)
            .finish_non_exhaustive()
    }
}

/// Starts every probe of the tier and returns the first success as
/// `(probe name, url)`.
async fn race_tier(tier: &Tier, username: &Username) -> Option<(String, String)> {
    let policy = tier.policy();

    let mut pending: FuturesUnordered<_> = tier
        .probes()
        .iter()
        .map(|probe| async move {
            let outcome = attempt_with_retry(probe.as_ref(), username, policy).await;
            (probe.name(), outcome)
        })
        .collect();

    while let Some((name, outcome)) = pending.next().await {
        match outcome {
            Ok(url) => return Some((name.to_string(), url)),
            Err(failure) => {
                debug!(
                    username = %username,
                    tier = tier.name(),
                    probe = name,
                    kind = failure.kind(),
                    error = %failure,
                    "Probe gave up"
                );
            }
        }
    }

    None
}

/// Runs one probe, retrying only `Blocked`/`Unreachable` up to the policy limit.
pub async fn attempt_with_retry(
    probe: &dyn ProbePort,
    username: &Username,
    policy: &TierPolicy,
) -> Result<String, ProbeFailure> {
    let mut retries = 0u32;

    loop {
        let outcome =
            match tokio::time::timeout(policy.timeout, probe.attempt(username, policy.timeout))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ProbeFailure::unreachable(format!(
                    "no answer within {}ms",
                    policy.timeout.as_millis()
                ))),
            };

        match outcome {
            Ok(url) => return Ok(url),
            Err(failure) if failure.is_transient() && retries < policy.retry.max_retries => {
                let delay = policy.retry.delay_for(retries);
                retries += 1;
                debug!(
                    probe = probe.name(),
                    attempt = retries + 1,
                    delay_ms = delay.as_millis(),
                    kind = failure.kind(),
                    "Retrying probe"
                );
                tokio::time::sleep(delay).await;
            }
            Err(failure) => return Err(failure),
        }
    }
}

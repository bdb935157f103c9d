//! Ordered, tiered probe registry.
//!
//! The registry only knows "an ordered list of tiers, each an unordered set of
//! probes". Adding or reordering probes never touches the orchestrator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::ProbePort;

use super::retry::RetryPolicy;

/// Execution policy shared by every probe of a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Pause before the tier starts, to soften burst-rate detection.
    pub delay_before: Duration,
}

impl TierPolicy {
    /// Creates a policy without an inter-tier pause.
    #[must_use]
    pub const fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            timeout,
            retry,
            delay_before: Duration::ZERO,
        }
    }

    /// Sets the pause applied before the tier starts.
    #[must_use]
    pub const fn with_delay_before(mut self, delay: Duration) -> Self {
        self.delay_before = delay;
        self
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(6), RetryPolicy::default())
    }
}

/// A named group of probes raced against each other.
pub struct Tier {
    name: String,
    policy: TierPolicy,
    probes: Vec<Arc<dyn ProbePort>>,
}

impl Tier {
    /// Creates an empty tier.
    #[must_use]
    pub fn new(name: impl Into<String>, policy: TierPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            probes: Vec::new(),
        }
    }

    /// Adds a probe, builder style.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ProbePort>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Adds a probe.
    pub fn push(&mut self, probe: Arc<dyn ProbePort>) {
        self.probes.push(probe);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    #[must_use]
    pub fn probes(&self) -> &[Arc<dyn ProbePort>] {
        &self.probes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl fmt::Debug for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.probes.iter().map(|p| p.name()).collect();
        f.debug_struct("Tier")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("probes", &names)
            .finish()
    }
}

/// Tiers in priority order, most reliable first.
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    tiers: Vec<Tier>,
}

impl ProbeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Appends a tier at the lowest priority, builder style.
    #[must_use]
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Appends a tier at the lowest priority.
    pub fn push(&mut self, tier: Tier) {
        self.tiers.push(tier);
    }

    #[must_use]
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Number of tiers, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(Tier::is_empty)
    }

    /// Total number of probes across tiers.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.tiers.iter().map(|t| t.probes.len()).sum()
    }
}

//! Pure state-machine logic for the advertising / bootstrap driver (C9).
//!
//! `MIN_CONNECTION_TARGET` and the back-off bounds are left as configurable
//! fields rather than hard constants (an open question in the source
//! material); defaults are documented on `BootstrapConfig::default`.

/// Tunables for the bootstrap driver's back-off behavior.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapConfig {
    /// Once `connected_count()` reaches this, the driver is considered
    /// settled and stops probing.
    pub min_connection_target: usize,
    /// How long a settled driver waits before rechecking connection count.
    pub settled_recheck_secs: u64,
    /// First probe delay for a machine that has never bootstrapped.
    pub cold_probe_delay_secs: u64,
    /// Ceiling on the exponentially-growing probe delay.
    pub max_probe_delta_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            min_connection_target: 4,
            settled_recheck_secs: 5 * 60,
            cold_probe_delay_secs: 60,
            max_probe_delta_secs: 30 * 60,
        }
    }
}

/// Mutable state the driver carries between ticks.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapState {
    pub has_bootstrapped_before: bool,
    pub last_probe_at: u64,
    pub next_probe_delta: u64,
}

impl BootstrapState {
    #[must_use]
    pub fn cold() -> Self {
        Self { has_bootstrapped_before: false, last_probe_at: 0, next_probe_delta: 0 }
    }

    #[must_use]
    pub fn restore(has_bootstrapped_before: bool) -> Self {
        Self { has_bootstrapped_before, last_probe_at: 0, next_probe_delta: 0 }
    }
}

/// One 2-second tick of the driver's loop: given the current connection
/// count, decide whether to trigger a bootstrap round now, updating `state`
/// in place either way. Returns `true` when the caller should bootstrap.
pub fn tick(state: &mut BootstrapState, config: &BootstrapConfig, now: u64, connected_count: usize) -> bool {
    if connected_count >= config.min_connection_target {
        state.next_probe_delta = config.settled_recheck_secs;
        state.last_probe_at = now;
        return false;
    }

    if state.next_probe_delta == 0 {
        state.next_probe_delta =
            if state.has_bootstrapped_before { config.cold_probe_delay_secs } else { config.cold_probe_delay_secs };
    }

    if now.saturating_sub(state.last_probe_at) < state.next_probe_delta {
        return false;
    }

    state.last_probe_at = now;
    state.next_probe_delta = state.next_probe_delta.saturating_mul(2).min(config.max_probe_delta_secs);
    true
}

/// `50 + random(0, (load+1)^2)` ms, per HELLO injected during a bootstrap
/// round. `jitter_draw` is a value already drawn uniformly from
/// `0..(load+1)^2` by the caller's random source.
#[must_use]
pub fn adaptive_sleep_ms(load: u8, jitter_draw: u64) -> u64 {
    50 + jitter_draw.min((u64::from(load) + 1).pow(2).saturating_sub(1))
}

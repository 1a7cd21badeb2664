//! Bootstrap driver service (C9): wires the pure back-off state machine to
//! an external bootstrap service, a load figure, a persisted "ever
//! bootstrapped" flag, and the host registry's connection count.

use crate::domain::bootstrap::{adaptive_sleep_ms, tick, BootstrapConfig, BootstrapState};
use crate::domain::RegistryError;
use crate::ports::inbound::BootstrapDriverApi;
use crate::ports::outbound::{
    BootstrapService, ConnectedCountSource, RandomSource, ResourceLoadProvider, StateFlagStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub struct BootstrapDriverService<B, L, F, R, C>
where
    B: BootstrapService,
    L: ResourceLoadProvider,
    F: StateFlagStore,
    R: RandomSource,
    C: ConnectedCountSource,
{
    bootstrap_service: B,
    load: L,
    flags: F,
    random: R,
    registry: C,
    state: Mutex<BootstrapState>,
    config: BootstrapConfig,
    settled: AtomicBool,
}

impl<B, L, F, R, C> BootstrapDriverService<B, L, F, R, C>
where
    B: BootstrapService,
    L: ResourceLoadProvider,
    F: StateFlagStore,
    R: RandomSource,
    C: ConnectedCountSource,
{
    pub fn new(bootstrap_service: B, load: L, flags: F, random: R, registry: C, config: BootstrapConfig) -> Self {
        let has_bootstrapped_before = flags.get_bootstrapped().unwrap_or(false);
        Self {
            bootstrap_service,
            load,
            flags,
            random,
            registry,
            state: Mutex::new(BootstrapState::restore(has_bootstrapped_before)),
            config,
            settled: AtomicBool::new(false),
        }
    }

    /// Fetch a batch of HELLOs, shuffle them, and inject each into the host
    /// registry with an adaptive sleep between injections.
    async fn run_bootstrap_round(&self) -> Result<(), RegistryError> {
        let mut hellos = self.bootstrap_service.fetch_hellos().await?;
        shuffle(&mut hellos, &self.random);

        let load = self.load.load_percent();
        for hello in hellos {
            self.registry.add_temporary_hello(hello);
            let window = (u64::from(load) + 1).pow(2).saturating_sub(1);
            let jitter = self.random.gen_range(window + 1);
            let sleep_ms = adaptive_sleep_ms(load, jitter);
            tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;
        }

        if self.flags.get_bootstrapped() != Ok(true) {
            self.flags.set_bootstrapped(true)?;
        }
        self.state.lock().unwrap().has_bootstrapped_before = true;
        Ok(())
    }
}

fn shuffle<T>(items: &mut [T], random: &impl RandomSource) {
    for i in (1..items.len()).rev() {
        let j = random.gen_range(i as u64 + 1) as usize;
        items.swap(i, j);
    }
}

#[async_trait::async_trait]
impl<B, L, F, R, C> BootstrapDriverApi for BootstrapDriverService<B, L, F, R, C>
where
    B: BootstrapService,
    L: ResourceLoadProvider,
    F: StateFlagStore,
    R: RandomSource,
    C: ConnectedCountSource,
{
    async fn tick(&self, now: u64) -> bool {
        let connected_count = self.registry.connected_count();
        let should_probe = {
            let mut state = self.state.lock().unwrap();
            tick(&mut state, &self.config, now, connected_count)
        };
        self.settled.store(connected_count >= self.config.min_connection_target, Ordering::Relaxed);

        if should_probe {
            let _ = self.run_bootstrap_round().await;
        }
        should_probe
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Relaxed)
    }
}

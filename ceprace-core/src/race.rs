//! Race coordinator: query every provider concurrently, surface the first
//! result, drain the rest.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ceprace_model::Address;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::LookupError;
use crate::providers::{CepProvider, ProviderResult};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);
const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Timing bounds for one race. Recreated per invocation; nothing here is
/// persisted.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Upper bound on waiting for the first provider result.
    pub deadline: Duration,
    /// Upper bound on draining late results after the race is decided.
    pub drain_grace: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

/// Winning provider plus the normalized address it produced.
#[derive(Debug, Clone)]
pub struct ResolvedAddress {
    pub provider: String,
    pub address: Address,
}

/// Outcome of one race, plus the handle of its detached cleanup task.
///
/// The outcome is available immediately; [`Resolution::settled`] performs
/// the grace-bounded wait for the drain of the slower provider. Callers
/// that present the outcome first and then await `settled` reproduce the
/// answer-then-cleanup ordering the coordinator guarantees.
#[derive(Debug)]
pub struct Resolution {
    pub outcome: Result<ResolvedAddress, LookupError>,
    drain: Option<JoinHandle<()>>,
    // Held for observability only; dropping a JoinHandle detaches the task,
    // so the losing adapter keeps running and is never cancelled.
    pub(crate) adapters: Vec<JoinHandle<()>>,
}

impl Resolution {
    /// Wait for the drain task to finish. Bounded by the drain grace; late
    /// results beyond it are abandoned, which is not an error.
    pub async fn settled(self) {
        if let Some(drain) = self.drain {
            let _ = drain.await;
        }
    }
}

/// Launches all configured providers concurrently and selects whichever
/// answers first, success or failure, under the race deadline.
pub struct RaceCoordinator {
    providers: Vec<Arc<dyn CepProvider>>,
    config: RaceConfig,
}

impl fmt::Debug for RaceCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceCoordinator")
            .field("providers", &self.providers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl RaceCoordinator {
    pub fn new(providers: Vec<Arc<dyn CepProvider>>, config: RaceConfig) -> Self {
        Self { providers, config }
    }

    /// Resolve one postal code.
    ///
    /// The first `ProviderResult` received decides the outcome: a failure
    /// arriving first is surfaced as a failure even if the slower provider
    /// would have succeeded. Latency is traded for success rate here, by
    /// design. The losing request is never cancelled; its eventual result
    /// is read and discarded by the drain task.
    pub async fn resolve(&self, cep: &str) -> Resolution {
        if self.providers.is_empty() {
            return Resolution {
                outcome: Err(LookupError::NoProviders),
                drain: None,
                adapters: Vec::new(),
            };
        }

        // Twice the provider count leaves room for more than one emission
        // per adapter; a misbehaving adapter must never block on send.
        let (tx, mut rx) = mpsc::channel(self.providers.len() * 2);

        let mut adapters = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            let cep = cep.to_owned();
            adapters.push(tokio::spawn(async move {
                let outcome = provider.lookup(&cep).await;
                let result = ProviderResult {
                    provider: provider.name().to_owned(),
                    outcome,
                };
                if tx.send(result).await.is_err() {
                    tracing::trace!(
                        target: "ceprace::race",
                        provider = provider.name(),
                        "race already settled, result dropped"
                    );
                }
            }));
        }
        // Adapter tasks hold the only senders now; the channel closes once
        // every adapter has emitted and hung up.
        drop(tx);

        let outcome = match timeout(self.config.deadline, rx.recv()).await {
            Ok(Some(first)) => {
                tracing::debug!(
                    target: "ceprace::race",
                    provider = %first.provider,
                    ok = first.outcome.is_ok(),
                    "first result received"
                );
                match first.outcome {
                    Ok(address) => Ok(ResolvedAddress {
                        provider: first.provider,
                        address,
                    }),
                    Err(source) => Err(LookupError::Provider {
                        provider: first.provider,
                        source,
                    }),
                }
            }
            // Every adapter hung up without emitting; surface it as an
            // unanswered race.
            Ok(None) => Err(LookupError::DeadlineExceeded {
                deadline: self.config.deadline,
            }),
            Err(_) => {
                tracing::debug!(target: "ceprace::race", "race deadline elapsed");
                Err(LookupError::DeadlineExceeded {
                    deadline: self.config.deadline,
                })
            }
        };

        // Hand the receiver to a detached cleanup task; the caller gets the
        // outcome without waiting on the loser.
        let drain = tokio::spawn(drain_remaining(rx, self.config.drain_grace));

        Resolution {
            outcome,
            drain: Some(drain),
            adapters,
        }
    }
}

/// Read and discard whatever the slower adapters still emit, for at most
/// `grace`. By then the caller already has its answer, so lateness here
/// only means the remaining results are abandoned.
async fn drain_remaining(mut rx: mpsc::Receiver<ProviderResult>, grace: Duration) {
    let drained = timeout(grace, async {
        while let Some(result) = rx.recv().await {
            tracing::trace!(
                target: "ceprace::race",
                provider = %result.provider,
                "discarding late result"
            );
        }
    })
    .await;

    if drained.is_err() {
        tracing::debug!(
            target: "ceprace::race",
            "drain grace elapsed with results still pending"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;

    struct StubProvider {
        name: &'static str,
        delay: Duration,
        fail: bool,
    }

    impl StubProvider {
        fn new(name: &'static str, delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self { name, delay, fail })
        }
    }

    #[async_trait]
    impl CepProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, cep: &str) -> Result<Address, ProviderError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(ProviderError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ))
            } else {
                Ok(Address {
                    cep: cep.to_owned(),
                    estado: "SP".into(),
                    cidade: "São Paulo".into(),
                    rua: self.name.into(),
                    bairro: "Sé".into(),
                })
            }
        }
    }

    fn coordinator(providers: Vec<Arc<StubProvider>>) -> RaceCoordinator {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn CepProvider>)
            .collect();
        RaceCoordinator::new(providers, RaceConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn fastest_success_wins() {
        let fast = StubProvider::new("fast", Duration::from_millis(10), false);
        let slow = StubProvider::new("slow", Duration::from_millis(500), false);

        let resolution = coordinator(vec![fast, slow]).resolve("01001000").await;

        let resolved = resolution.outcome.as_ref().expect("first result succeeds");
        assert_eq!(resolved.provider, "fast");
        assert_eq!(resolved.address.cep, "01001000");
        resolution.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_order_beats_registration_order() {
        let slow = StubProvider::new("slow", Duration::from_millis(500), false);
        let fast = StubProvider::new("fast", Duration::from_millis(10), false);

        let resolution = coordinator(vec![slow, fast]).resolve("01001000").await;

        assert_eq!(resolution.outcome.as_ref().unwrap().provider, "fast");
        resolution.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_ends_the_race() {
        // The slower provider would have succeeded; the race still surfaces
        // the failure that arrived first.
        let failing = StubProvider::new("failing", Duration::from_millis(10), true);
        let healthy = StubProvider::new("healthy", Duration::from_millis(50), false);

        let resolution = coordinator(vec![failing, healthy]).resolve("01001000").await;

        match &resolution.outcome {
            Err(LookupError::Provider { provider, .. }) => assert_eq!(provider, "failing"),
            other => panic!("expected provider failure, got {other:?}"),
        }
        resolution.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn both_failures_surface_the_first() {
        let first = StubProvider::new("first", Duration::from_millis(10), true);
        let second = StubProvider::new("second", Duration::from_millis(20), true);

        let resolution = coordinator(vec![first, second]).resolve("01001000").await;

        match &resolution.outcome {
            Err(LookupError::Provider { provider, .. }) => assert_eq!(provider, "first"),
            other => panic!("expected provider failure, got {other:?}"),
        }
        resolution.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapses_when_no_provider_answers() {
        let a = StubProvider::new("a", Duration::from_secs(5), false);
        let b = StubProvider::new("b", Duration::from_secs(5), false);

        let resolution = coordinator(vec![a, b]).resolve("01001000").await;

        assert!(matches!(
            resolution.outcome,
            Err(ref err) if err.is_timeout()
        ));
        resolution.settled().await;
    }

    #[tokio::test]
    async fn empty_provider_list_is_an_error() {
        let coordinator = RaceCoordinator::new(Vec::new(), RaceConfig::default());
        let resolution = coordinator.resolve("01001000").await;

        assert!(matches!(resolution.outcome, Err(LookupError::NoProviders)));
        resolution.settled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_completes_within_deadline_plus_grace() {
        let config = RaceConfig::default();
        let bound = config.deadline + config.drain_grace + Duration::from_millis(50);

        // One answer inside the deadline, one far outside it.
        let fast = StubProvider::new("fast", Duration::from_millis(5), false);
        let stuck = StubProvider::new("stuck", Duration::from_secs(30), false);
        let coordinator = coordinator(vec![fast, stuck]);

        timeout(bound, async {
            let resolution = coordinator.resolve("01001000").await;
            assert!(resolution.outcome.is_ok());
            resolution.settled().await;
        })
        .await
        .expect("race must settle within deadline + grace");
    }

    #[tokio::test(start_paused = true)]
    async fn drain_leaves_no_adapter_blocked() {
        // Latencies land on both sides of each other and of the deadline;
        // every trial must end with both adapter tasks finished once their
        // lookups complete.
        for trial in 0u64..100 {
            let delay_a = Duration::from_millis((trial * 37) % 1500);
            let delay_b = Duration::from_millis((trial * 61 + 13) % 1500);
            let a = StubProvider::new("a", delay_a, trial % 3 == 0);
            let b = StubProvider::new("b", delay_b, trial % 5 == 0);

            let resolution = coordinator(vec![a, b]).resolve("01001000").await;

            // Past the longest stub latency; with the receiver gone a late
            // send fails fast instead of blocking the task.
            tokio::time::sleep(Duration::from_secs(2)).await;
            tokio::task::yield_now().await;

            assert!(
                resolution.adapters.iter().all(|task| task.is_finished()),
                "trial {trial}: adapter task left unfinished"
            );
            resolution.settled().await;
        }
    }
}

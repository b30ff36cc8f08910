//! The scheduler: fixed-interval tickers fanned out over the pipelines.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::{RelayError, Relayer};

const CHECK_STAKING_INTERVAL: Duration = Duration::from_secs(5);
const UPDATE_EXTERNAL_CHAINS_INTERVAL: Duration = Duration::from_secs(60);
const SIGN_MESSAGES_INTERVAL: Duration = Duration::from_millis(500);
const RELAY_MESSAGES_INTERVAL: Duration = Duration::from_millis(500);
const ATTEST_MESSAGES_INTERVAL: Duration = Duration::from_millis(500);

const GRAVITY_SIGN_BATCHES_INTERVAL: Duration = Duration::from_secs(5);
const GRAVITY_RELAY_BATCHES_INTERVAL: Duration = Duration::from_secs(5);
const BATCH_SEND_EVENT_WATCHER_INTERVAL: Duration = Duration::from_secs(5);
const SEND_TO_PALOMA_EVENT_WATCHER_INTERVAL: Duration = Duration::from_secs(5);

impl Relayer {
    /// Queries the home chain for this validator's bonding status and flips
    /// the gate every staking-dependent loop consults.
    pub async fn check_staking(&self) {
        match self.home.is_staking().await {
            Ok(()) => {
                debug!("validator is staking");
                self.staking.store(true, Ordering::Relaxed);
            }
            Err(err) => {
                warn!(error = %err, "validator is not staking, pipelines paused");
                self.staking.store(false, Ordering::Relaxed);
            }
        }
    }

    /// Announces liveness with the daemon version.
    pub async fn keep_alive(&self) -> Result<(), RelayError> {
        self.home.keep_validator_alive(&self.version).await?;
        Ok(())
    }

    /// One scheduled loop: tick at `period`, honour the cancellation token
    /// at every tick, and skip the body while the staking gate is closed
    /// (for gated tasks). Body errors are logged here and never escape.
    async fn run_loop<F, Fut>(
        self: Arc<Self>,
        token: CancellationToken,
        period: Duration,
        requires_staking: bool,
        name: &'static str,
        body: F,
    ) where
        F: Fn(Arc<Relayer>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RelayError>> + Send + 'static,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the body first
        // runs one full period after startup.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(task = name, "exiting loop, shutdown requested");
                    return;
                }
                _ = ticker.tick() => {
                    if requires_staking && !self.staking.load(Ordering::Relaxed) {
                        continue;
                    }
                    if let Err(err) = body(Arc::clone(&self)).await {
                        warn!(task = name, error = %err, "tick failed");
                    }
                }
            }
        }
    }

    fn spawn_loop<F, Fut>(
        self: &Arc<Self>,
        tracker: &TaskTracker,
        token: &CancellationToken,
        period: Duration,
        requires_staking: bool,
        name: &'static str,
        body: F,
    ) where
        F: Fn(Arc<Relayer>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RelayError>> + Send + 'static,
    {
        tracker.spawn(Arc::clone(self).run_loop(
            token.clone(),
            period,
            requires_staking,
            name,
            body,
        ));
    }

    /// Runs the daemon until `token` is cancelled.
    ///
    /// Seeds the staking flag synchronously, spawns one background loop per
    /// pipeline operation, announces liveness once, and then keeps the
    /// keep-alive loop in the foreground. In-flight submissions already
    /// handed to the network are not retracted on shutdown.
    pub async fn start(self: Arc<Self>, token: CancellationToken) {
        info!(version = %self.version, chains = self.chains.len(), "starting relayer");
        self.check_staking().await;

        let tracker = TaskTracker::new();
        self.spawn_loop(
            &tracker,
            &token,
            CHECK_STAKING_INTERVAL,
            false,
            "check-staking",
            |r| async move {
                r.check_staking().await;
                Ok(())
            },
        );
        self.spawn_loop(
            &tracker,
            &token,
            UPDATE_EXTERNAL_CHAINS_INTERVAL,
            true,
            "update-external-chain-info",
            |r| async move { r.update_external_chain_infos().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            SIGN_MESSAGES_INTERVAL,
            true,
            "sign-messages",
            |r| async move { r.sign_messages().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            RELAY_MESSAGES_INTERVAL,
            true,
            "relay-messages",
            |r| async move { r.relay_messages().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            ATTEST_MESSAGES_INTERVAL,
            true,
            "attest-messages",
            |r| async move { r.attest_messages().await },
        );

        for chain in &self.chains {
            if let Some(relay) = chain.evm.mev() {
                let period = relay.health_probe_interval();
                self.spawn_loop(
                    &tracker,
                    &token,
                    period,
                    false,
                    "mev-keep-alive",
                    move |_r| {
                        let relay = Arc::clone(&relay);
                        async move {
                            relay.keep_alive().await?;
                            Ok(())
                        }
                    },
                );
            }
        }

        self.spawn_loop(
            &tracker,
            &token,
            GRAVITY_SIGN_BATCHES_INTERVAL,
            true,
            "gravity-sign-batches",
            |r| async move { r.gravity_sign_batches().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            GRAVITY_RELAY_BATCHES_INTERVAL,
            true,
            "gravity-relay-batches",
            |r| async move { r.gravity_relay_batches().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            BATCH_SEND_EVENT_WATCHER_INTERVAL,
            true,
            "gravity-batch-send-watcher",
            |r| async move { r.gravity_handle_batch_send_event().await },
        );
        self.spawn_loop(
            &tracker,
            &token,
            SEND_TO_PALOMA_EVENT_WATCHER_INTERVAL,
            true,
            "gravity-send-to-paloma-watcher",
            |r| async move { r.gravity_handle_send_to_paloma_event().await },
        );

        // Announce presence right away, then keep announcing from the
        // foreground at the configured period.
        if let Err(err) = self.keep_alive().await {
            warn!(error = %err, "initial keep-alive failed");
        }
        let keep_alive_period = Duration::from_secs(self.settings.keep_alive_loop_timeout_secs);
        Arc::clone(&self)
            .run_loop(
                token.clone(),
                keep_alive_period,
                false,
                "keep-alive",
                |r| async move { r.keep_alive().await },
            )
            .await;

        tracker.close();
        tracker.wait().await;
        info!("relayer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayerSettings;
    use crate::relayer::testutil::{RecordingSender, StubQuerier, home_with};
    use courier_home::HomeMsg;
    use std::sync::atomic::AtomicUsize;

    fn chainless_relayer(sender: Arc<RecordingSender>) -> Arc<Relayer> {
        Arc::new(Relayer::new(
            home_with(StubQuerier::default(), sender),
            RelayerSettings {
                keep_alive_loop_timeout_secs: 1,
            },
            "v1.3.0",
            Vec::new(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn gated_loop_never_runs_while_not_staking() {
        let relayer = chainless_relayer(Arc::new(RecordingSender::default()));
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        relayer.spawn_loop(
            &tracker,
            &token,
            Duration::from_millis(100),
            true,
            "gated",
            move |_r| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        relayer.staking.store(true, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(count.load(Ordering::SeqCst) > 0);

        token.cancel();
        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ungated_loop_runs_regardless_of_staking() {
        let relayer = chainless_relayer(Arc::new(RecordingSender::default()));
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        relayer.spawn_loop(
            &tracker,
            &token,
            Duration::from_millis(100),
            false,
            "ungated",
            move |_r| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(count.load(Ordering::SeqCst) > 0);

        token.cancel();
        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_seeds_keep_alive_and_keeps_announcing() {
        let sender = Arc::new(RecordingSender::default());
        let relayer = chainless_relayer(Arc::clone(&sender));
        let token = CancellationToken::new();

        let handle = tokio::spawn(Arc::clone(&relayer).start(token.clone()));

        // Let the startup sequence run: the seed keep-alive goes out before
        // the foreground loop's first tick.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let keep_alives = |msgs: Vec<HomeMsg>| {
            msgs.into_iter()
                .filter(|m| matches!(m, HomeMsg::KeepAlive(_)))
                .count()
        };
        assert_eq!(keep_alives(sender.sent()), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(keep_alives(sender.sent()) >= 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn check_staking_flips_the_flag() {
        let relayer = chainless_relayer(Arc::new(RecordingSender::default()));
        assert!(!relayer.staking.load(Ordering::Relaxed));
        relayer.check_staking().await;
        assert!(relayer.staking.load(Ordering::Relaxed));
    }
}

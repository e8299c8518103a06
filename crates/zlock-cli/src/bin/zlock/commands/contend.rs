//! Lock contention scenario.
//!
//! Starts several clients, each on its own store session, that all lock the
//! same resource, hold it for a while and release it. Reports who acquired
//! in which order, how long each waited and whether any hold was revoked by
//! its TTL.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::ensure;
use clap::Args;
use tokio::time::Instant;
use tracing::info;
use zlock::LockClient;
use zlock::LockClientConfig;
use zlock_store::DeterministicCoordinationStore;

use crate::output::Outputable;
use crate::output::print_output;

/// Upper bound on `--clients`.
const MAX_CLIENTS: u32 = 1_000;
/// Upper bound on `--hold-ms`.
const MAX_HOLD_MS: u64 = 60_000;

#[derive(Args)]
pub struct ContendArgs {
    /// Resource path to lock.
    #[arg(long, default_value = "/locks/demo")]
    pub resource: String,

    /// Number of concurrent clients.
    #[arg(long, default_value = "3")]
    pub clients: u32,

    /// Force-release each hold after this many milliseconds.
    #[arg(long = "ttl-ms")]
    pub ttl_ms: Option<u64>,

    /// Poll with backoff instead of watching, giving up after this many retries.
    #[arg(long = "max-retries")]
    pub max_retries: Option<u32>,

    /// Backoff base in milliseconds (defaults to the configured value).
    #[arg(long = "retry-wait-ms")]
    pub retry_wait_ms: Option<u64>,

    /// How long each client holds the lock, in milliseconds.
    #[arg(long = "hold-ms", default_value = "100")]
    pub hold_ms: u64,
}

/// Outcome of one client.
pub struct ClientOutcome {
    pub client: u32,
    pub node: Option<String>,
    pub fencing_token: Option<u64>,
    pub collisions: u32,
    pub waited_ms: u64,
    pub acquired_at_ms: Option<u64>,
    pub forced_release: bool,
    pub error: Option<String>,
}

/// Contention scenario output.
pub struct ContendOutput {
    pub resource: String,
    pub outcomes: Vec<ClientOutcome>,
    pub max_concurrent_holders: usize,
}

impl Outputable for ContendOutput {
    fn to_json(&self) -> serde_json::Value {
        let outcomes: Vec<_> = self
            .outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "client": o.client,
                    "node": o.node,
                    "fencing_token": o.fencing_token,
                    "collisions": o.collisions,
                    "waited_ms": o.waited_ms,
                    "acquired_at_ms": o.acquired_at_ms,
                    "forced_release": o.forced_release,
                    "error": o.error
                })
            })
            .collect();
        serde_json::json!({
            "resource": self.resource,
            "max_concurrent_holders": self.max_concurrent_holders,
            "outcomes": outcomes
        })
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Contention on {} (max concurrent holders: {})\n",
            self.resource, self.max_concurrent_holders
        );
        out.push_str("Client  Node                      Token  Waited (ms)  Collisions  Result");
        for o in &self.outcomes {
            let node = o.node.as_deref().unwrap_or("-");
            let token = o.fencing_token.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
            let result = match (&o.error, o.forced_release) {
                (Some(e), _) => format!("failed: {}", e),
                (None, true) => "force-released".to_string(),
                (None, false) => "released".to_string(),
            };
            out.push_str(&format!(
                "\n{:>6}  {:<24}  {:>5}  {:>11}  {:>10}  {}",
                o.client, node, token, o.waited_ms, o.collisions, result
            ));
        }
        out
    }
}

impl ContendArgs {
    /// Execute the contention scenario.
    pub async fn run(self, config: LockClientConfig, json: bool) -> Result<()> {
        ensure!(
            (1..=MAX_CLIENTS).contains(&self.clients),
            "--clients must be between 1 and {MAX_CLIENTS}"
        );
        ensure!(self.hold_ms <= MAX_HOLD_MS, "--hold-ms must be at most {MAX_HOLD_MS}");

        let store = DeterministicCoordinationStore::new();
        store
            .ensure_path(&self.resource)
            .with_context(|| format!("invalid resource path '{}'", self.resource))?;

        let started = Instant::now();
        let holders = Arc::new(AtomicUsize::new(0));
        let max_holders = Arc::new(AtomicUsize::new(0));
        let hold = Duration::from_millis(self.hold_ms);

        let mut tasks = Vec::with_capacity(self.clients as usize);
        for client_index in 0..self.clients {
            let client = LockClient::new(store.connect(), config.clone());
            let mut request = client.request(self.resource.clone(), format!("client-{client_index}-"));
            if let Some(ttl_ms) = self.ttl_ms {
                request = request.with_ttl_ms(ttl_ms);
            }
            if let Some(max_retries) = self.max_retries {
                request = request.with_max_retry_count(max_retries);
            }
            if let Some(retry_wait_ms) = self.retry_wait_ms {
                request.initial_retry_wait_ms = retry_wait_ms;
            }

            let holders = holders.clone();
            let max_holders = max_holders.clone();
            tasks.push(tokio::spawn(async move {
                let requested = Instant::now();
                let mut outcome = ClientOutcome {
                    client: client_index,
                    node: None,
                    fencing_token: None,
                    collisions: 0,
                    waited_ms: 0,
                    acquired_at_ms: None,
                    forced_release: false,
                    error: None,
                };

                let session = match client.lock(request).await {
                    Ok(session) => session,
                    Err(e) => {
                        outcome.waited_ms = requested.elapsed().as_millis() as u64;
                        outcome.error = Some(e.to_string());
                        return outcome;
                    }
                };
                outcome.waited_ms = requested.elapsed().as_millis() as u64;
                outcome.acquired_at_ms = Some(started.elapsed().as_millis() as u64);
                outcome.node = session.seq_node().map(str::to_string);
                outcome.fencing_token = session.fencing_token().map(|t| t.value());
                outcome.collisions = session.collision_count();

                let now_holding = holders.fetch_add(1, Ordering::SeqCst) + 1;
                max_holders.fetch_max(now_holding, Ordering::SeqCst);
                tokio::time::sleep(hold).await;
                holders.fetch_sub(1, Ordering::SeqCst);

                outcome.forced_release = !session.is_held().await;
                if let Err(e) = session.unlock().await {
                    outcome.error = Some(e.to_string());
                }
                outcome
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            outcomes.push(task.await.context("contending client panicked")?);
        }
        outcomes.sort_by_key(|o| (o.acquired_at_ms.is_none(), o.fencing_token, o.client));

        let output = ContendOutput {
            resource: self.resource,
            outcomes,
            max_concurrent_holders: max_holders.load(Ordering::SeqCst),
        };
        info!(
            resource = %output.resource,
            clients = self.clients,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "contention scenario finished"
        );
        print_output(&output, json);
        Ok(())
    }
}

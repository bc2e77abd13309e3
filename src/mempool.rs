//! Pending-transaction subscription
//!
//! The node connection itself is an external collaborator behind
//! [`PendingTransactionSource`]. This module owns the loop around it:
//! pending hash -> fetch transaction -> recipient filter -> forward.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

use crate::encoding::parse_ethereum_address;
use crate::error::{KeysmithError, KeysmithResult};
use crate::{log_debug, log_info, log_warn};

const CHANNEL_CAPACITY: usize = 64;

/// Decoded view of a pending transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub hash: String,
    pub nonce: u64,
    /// Wei
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` for contract creation
    pub to: Option<String>,
    /// Wei
    pub value: u128,
    pub from: String,
}

/// Streaming node connection
#[async_trait]
pub trait PendingTransactionSource: Send + Sync + 'static {
    /// Open the pending-hash stream at `endpoint`.
    async fn pending_hashes(&self, endpoint: &Url) -> KeysmithResult<mpsc::Receiver<String>>;

    /// `Ok(None)` when the transaction left the pool before it was fetched.
    async fn transaction(&self, hash: &str) -> KeysmithResult<Option<TransactionSummary>>;
}

/// Exact-recipient filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientFilter([u8; 20]);

impl RecipientFilter {
    pub fn parse(address: &str) -> KeysmithResult<Self> {
        Ok(Self(parse_ethereum_address(address)?))
    }

    /// Contract creations never match.
    pub fn matches(&self, tx: &TransactionSummary) -> bool {
        tx.to
            .as_deref()
            .and_then(|to| parse_ethereum_address(to).ok())
            .map_or(false, |to| to == self.0)
    }
}

/// Only `ws://` and `wss://` endpoints are accepted.
pub fn parse_endpoint(endpoint: &str) -> KeysmithResult<Url> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(KeysmithError::validation("endpoint is required"));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| KeysmithError::validation(format!("invalid endpoint '{}': {}", trimmed, e)))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(KeysmithError::validation(format!(
            "endpoint must use ws:// or wss://, got {}://",
            other
        ))),
    }
}

/// Handle to a running subscription
pub struct Subscription {
    transactions: mpsc::Receiver<TransactionSummary>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next matching transaction; `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<TransactionSummary> {
        self.transactions.recv().await
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(mut self) -> KeysmithResult<()> {
        // Unblocks a loop parked on a full channel
        self.transactions.close();
        if let Some(stop) = self.stop.take() {
            // Loop may already have exited on its own
            let _ = stop.send(());
        }
        self.task
            .await
            .map_err(|e| KeysmithError::subscription(format!("subscription task failed: {}", e)))
    }
}

/// Validate inputs, open the hash stream and start forwarding matches.
///
/// Must be called from within a tokio runtime.
pub async fn subscribe<S: PendingTransactionSource>(
    source: Arc<S>,
    endpoint: &str,
    filter: Option<&str>,
) -> KeysmithResult<Subscription> {
    let url = parse_endpoint(endpoint)?;
    let filter = match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(address) => Some(RecipientFilter::parse(address)?),
        None => None,
    };

    let hashes = source
        .pending_hashes(&url)
        .await
        .map_err(|e| KeysmithError::subscription("failed to open pending transaction stream").with_details(e.to_string()))?;

    log_info!(
        "mempool",
        "subscribed to pending transactions",
        endpoint = url,
        filtered = filter.is_some()
    );

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(run(source, hashes, filter, tx, stop_rx));

    Ok(Subscription {
        transactions: rx,
        stop: Some(stop_tx),
        task,
    })
}

async fn run<S: PendingTransactionSource>(
    source: Arc<S>,
    mut hashes: mpsc::Receiver<String>,
    filter: Option<RecipientFilter>,
    out: mpsc::Sender<TransactionSummary>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let hash = tokio::select! {
            biased;
            _ = &mut stop => {
                log_info!("mempool", "subscription stopped");
                break;
            }
            next = hashes.recv() => match next {
                Some(hash) => hash,
                None => {
                    log_info!("mempool", "pending transaction stream closed");
                    break;
                }
            },
        };

        let summary = match source.transaction(&hash).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                log_debug!("mempool", "transaction no longer pending", hash = hash);
                continue;
            }
            Err(e) => {
                log_warn!("mempool", "failed to fetch transaction", hash = hash, error = e);
                continue;
            }
        };

        if let Some(filter) = &filter {
            if !filter.matches(&summary) {
                continue;
            }
        }

        tokio::select! {
            biased;
            _ = &mut stop => {
                log_info!("mempool", "subscription stopped");
                break;
            }
            sent = out.send(summary) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
}

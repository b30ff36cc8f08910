//! Bisecting log scanner.
//!
//! Providers cap `eth_getLogs` responses in provider-specific ways and
//! report the overflow only through error strings. The scanner drives a
//! filter over a block range and, whenever a range is rejected as too wide,
//! splits it in half and keeps going, so callers never see the caps.

use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, FilterBlockOption, Log};
use alloy_transport::TransportError;
use async_trait::async_trait;
use tracing::trace;

use crate::error::EvmError;

/// The provider-imposed range-limit messages that trigger bisection. These
/// are matched verbatim against error text; changing them breaks detection
/// against live providers.
const RANGE_LIMIT_MARKERS: [&str; 4] = [
    "query returned more than 10000 results",
    "eth_getLogs and eth_newFilter are limited to a 10,000 blocks range",
    "block range is too wide",
    "exceed maximum block range",
];

pub(crate) fn is_range_limit_error(message: &str) -> bool {
    RANGE_LIMIT_MARKERS.iter().any(|m| message.contains(m))
}

/// The RPC surface the scanner needs.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError>;
    async fn latest_block_number(&self) -> Result<u64, TransportError>;
}

#[async_trait]
impl<P: Provider> LogSource for P {
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError> {
        Provider::get_logs(self, filter).await
    }

    async fn latest_block_number(&self) -> Result<u64, TransportError> {
        self.get_block_number().await
    }
}

/// Scans `filter`'s range, invoking `on_chunk` once per non-empty chunk of
/// logs with the chunk reversed to newest-first order. Returns `true` as
/// soon as `on_chunk` does, without visiting the rest of the range.
///
/// Bounds are materialised before the first call: a missing `to_block`
/// becomes `current_height` (queried if not supplied), a missing
/// `from_block` becomes 0. With `reverse_order` set, the newer half of a
/// split range is visited first.
///
/// Every split halves the remaining block count, so the number of provider
/// calls is bounded by `O(chunks * log2(range))`.
pub async fn filter_logs<S, F>(
    source: &S,
    filter: &Filter,
    current_height: Option<u64>,
    reverse_order: bool,
    mut on_chunk: F,
) -> Result<bool, EvmError>
where
    S: LogSource + ?Sized,
    F: FnMut(Vec<Log>) -> bool,
{
    let (from_bound, to_bound) = match filter.block_option {
        FilterBlockOption::AtBlockHash(_) => {
            // Single-block query: nothing to materialise or split.
            let mut logs = source.get_logs(filter).await?;
            if logs.is_empty() {
                return Ok(false);
            }
            logs.reverse();
            return Ok(on_chunk(logs));
        }
        FilterBlockOption::Range {
            from_block,
            to_block,
        } => (from_block, to_block),
    };

    let to = match to_bound.and_then(|b| b.as_number()) {
        Some(n) => n,
        None => match current_height {
            Some(h) => h,
            None => source.latest_block_number().await?,
        },
    };
    let from = from_bound.and_then(|b| b.as_number()).unwrap_or(0);

    let mut pending = vec![(from, to)];
    while let Some((lo, hi)) = pending.pop() {
        trace!(from = lo, to = hi, "scanning log range");
        let chunk_filter = filter.clone().from_block(lo).to_block(hi);
        match source.get_logs(&chunk_filter).await {
            Ok(logs) => {
                if logs.is_empty() {
                    continue;
                }
                let mut logs = logs;
                logs.reverse();
                if on_chunk(logs) {
                    return Ok(true);
                }
            }
            Err(err) if is_range_limit_error(&err.to_string()) => {
                if lo >= hi {
                    // A single block still overflows; splitting cannot help.
                    return Err(err.into());
                }
                let mid = lo + (hi - lo) / 2;
                if reverse_order {
                    pending.push((lo, mid));
                    pending.push((mid + 1, hi));
                } else {
                    pending.push((mid + 1, hi));
                    pending.push((lo, mid));
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Scripted {
        Logs(Vec<u64>),
        TooMany,
        Broken,
    }

    struct ScriptedSource {
        head: u64,
        responses: HashMap<(u64, u64), Scripted>,
        calls: Mutex<Vec<(u64, u64)>>,
    }

    impl ScriptedSource {
        fn new(head: u64, responses: Vec<((u64, u64), Scripted)>) -> Self {
            Self {
                head,
                responses: responses.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(u64, u64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn log_at(block: u64) -> Log {
        Log {
            block_number: Some(block),
            ..Default::default()
        }
    }

    #[async_trait]
    impl LogSource for ScriptedSource {
        async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, TransportError> {
            let FilterBlockOption::Range {
                from_block,
                to_block,
            } = filter.block_option
            else {
                panic!("range query expected");
            };
            let range = (
                from_block.and_then(|b| b.as_number()).unwrap(),
                to_block.and_then(|b| b.as_number()).unwrap(),
            );
            self.calls.lock().unwrap().push(range);
            match self.responses.get(&range) {
                Some(Scripted::Logs(blocks)) => Ok(blocks.iter().map(|b| log_at(*b)).collect()),
                Some(Scripted::TooMany) => Err(TransportError::local_usage_str(
                    "query returned more than 10000 results",
                )),
                Some(Scripted::Broken) => Err(TransportError::local_usage_str("connection reset")),
                None => Ok(Vec::new()),
            }
        }

        async fn latest_block_number(&self) -> Result<u64, TransportError> {
            Ok(self.head)
        }
    }

    #[tokio::test]
    async fn bisects_and_visits_newest_half_first() {
        let source = ScriptedSource::new(
            1_000_000,
            vec![
                ((0, 1_000_000), Scripted::TooMany),
                ((500_001, 1_000_000), Scripted::Logs(vec![])),
                ((0, 500_000), Scripted::Logs(vec![42])),
            ],
        );
        let filter = Filter::new().from_block(0u64).to_block(1_000_000u64);

        let mut seen = Vec::new();
        let found = filter_logs(&source, &filter, None, true, |logs| {
            seen.push(logs);
            true
        })
        .await
        .unwrap();

        assert!(found);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0].block_number, Some(42));
        assert_eq!(
            source.calls(),
            vec![(0, 1_000_000), (500_001, 1_000_000), (0, 500_000)]
        );
    }

    #[tokio::test]
    async fn callback_verdict_is_returned_when_range_is_exhausted() {
        let source = ScriptedSource::new(
            100,
            vec![((0, 100), Scripted::Logs(vec![7]))],
        );
        let filter = Filter::new().from_block(0u64).to_block(100u64);

        let found = filter_logs(&source, &filter, None, true, |_| false)
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn chunks_are_delivered_newest_first() {
        let source = ScriptedSource::new(
            10,
            vec![((0, 10), Scripted::Logs(vec![3, 5, 9]))],
        );
        let filter = Filter::new().from_block(0u64).to_block(10u64);

        let mut order = Vec::new();
        filter_logs(&source, &filter, None, true, |logs| {
            order = logs.iter().map(|l| l.block_number.unwrap()).collect();
            false
        })
        .await
        .unwrap();
        assert_eq!(order, vec![9, 5, 3]);
    }

    #[tokio::test]
    async fn forward_order_visits_oldest_half_first() {
        let source = ScriptedSource::new(
            1_000,
            vec![
                ((0, 1_000), Scripted::TooMany),
                ((0, 500), Scripted::Logs(vec![1])),
                ((501, 1_000), Scripted::Logs(vec![900])),
            ],
        );
        let filter = Filter::new().from_block(0u64).to_block(1_000u64);

        let mut first_chunk_block = None;
        filter_logs(&source, &filter, None, false, |logs| {
            first_chunk_block.get_or_insert(logs[0].block_number.unwrap());
            false
        })
        .await
        .unwrap();
        assert_eq!(first_chunk_block, Some(1));
    }

    #[tokio::test]
    async fn nested_bisection_terminates() {
        let source = ScriptedSource::new(
            8,
            vec![
                ((0, 8), Scripted::TooMany),
                ((5, 8), Scripted::TooMany),
                ((7, 8), Scripted::Logs(vec![8])),
            ],
        );
        let filter = Filter::new().from_block(0u64).to_block(8u64);

        let found = filter_logs(&source, &filter, None, true, |logs| {
            logs[0].block_number == Some(8)
        })
        .await
        .unwrap();
        assert!(found);
    }

    #[tokio::test]
    async fn unrelated_errors_propagate_without_bisection() {
        let source = ScriptedSource::new(100, vec![((0, 100), Scripted::Broken)]);
        let filter = Filter::new().from_block(0u64).to_block(100u64);

        let err = filter_logs(&source, &filter, None, true, |_| false)
            .await
            .unwrap_err();
        assert!(matches!(err, EvmError::Transport(_)));
        assert_eq!(source.calls(), vec![(0, 100)]);
    }

    #[tokio::test]
    async fn missing_bounds_are_materialised_from_head() {
        let source = ScriptedSource::new(77, vec![((0, 77), Scripted::Logs(vec![70]))]);
        let filter = Filter::new();

        let found = filter_logs(&source, &filter, None, true, |_| true)
            .await
            .unwrap();
        assert!(found);
        assert_eq!(source.calls(), vec![(0, 77)]);
    }

    #[test]
    fn range_limit_predicate_matches_all_four_markers() {
        for marker in [
            "query returned more than 10000 results",
            "eth_getLogs and eth_newFilter are limited to a 10,000 blocks range",
            "block range is too wide",
            "exceed maximum block range",
        ] {
            assert!(is_range_limit_error(&format!("rpc said: {marker}")));
        }
        assert!(!is_range_limit_error("nonce too low"));
    }
}

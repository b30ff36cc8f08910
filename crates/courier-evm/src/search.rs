//! Binary search over header timestamps.

use alloy_provider::Provider;
use async_trait::async_trait;
use courier_types::UnixTimestamp;
use tracing::trace;

use crate::error::EvmError;

/// Header timestamps by height, plus the current head.
#[async_trait]
pub trait HeaderTimes: Send + Sync {
    async fn header_time(&self, height: u64) -> Result<u64, EvmError>;
    async fn latest_height(&self) -> Result<u64, EvmError>;
}

#[async_trait]
impl<P: Provider> HeaderTimes for P {
    async fn header_time(&self, height: u64) -> Result<u64, EvmError> {
        let block = self
            .get_block_by_number(height.into())
            .await?
            .ok_or(EvmError::MissingHeader(height))?;
        Ok(block.header.inner.timestamp)
    }

    async fn latest_height(&self) -> Result<u64, EvmError> {
        Ok(self.get_block_number().await?)
    }
}

/// Finds the greatest height in `[starting_height, head]` whose header time
/// is strictly before `when`.
///
/// Fails with [`EvmError::StartingBlockInFuture`] when even the starting
/// block is at or past `when`, and with [`EvmError::BlockNotYetGenerated`]
/// when the answer would be the head itself: callers need at least one block
/// standing between the answer and the tip before they can trust it.
pub async fn find_block_nearest_to_time<S>(
    source: &S,
    starting_height: u64,
    when: UnixTimestamp,
) -> Result<u64, EvmError>
where
    S: HeaderTimes + ?Sized,
{
    let target = when.as_secs();
    if source.header_time(starting_height).await? >= target {
        return Err(EvmError::StartingBlockInFuture);
    }

    let head = source.latest_height().await?;
    let mut from = starting_height;
    let mut to = head;
    let mut found = starting_height;
    while from <= to {
        let mid = from + (to - from) / 2;
        trace!(mid, "probing header time");
        if source.header_time(mid).await? < target {
            found = mid;
            from = mid + 1;
        } else {
            to = mid - 1;
        }
    }

    if found == head {
        return Err(EvmError::BlockNotYetGenerated);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Heights map to timestamps through a fixed block time of 10s starting
    /// at t=1000 for height 0.
    struct FixedCadence {
        head: u64,
    }

    #[async_trait]
    impl HeaderTimes for FixedCadence {
        async fn header_time(&self, height: u64) -> Result<u64, EvmError> {
            if height > self.head {
                return Err(EvmError::MissingHeader(height));
            }
            Ok(1000 + height * 10)
        }

        async fn latest_height(&self) -> Result<u64, EvmError> {
            Ok(self.head)
        }
    }

    #[tokio::test]
    async fn finds_greatest_height_strictly_before_time() {
        let chain = FixedCadence { head: 100 };
        // t=1555 falls between heights 55 (t=1550) and 56 (t=1560).
        let h = find_block_nearest_to_time(&chain, 0, UnixTimestamp(1555))
            .await
            .unwrap();
        assert_eq!(h, 55);

        // An exact header time is not "strictly before".
        let h = find_block_nearest_to_time(&chain, 0, UnixTimestamp(1550))
            .await
            .unwrap();
        assert_eq!(h, 54);
    }

    #[tokio::test]
    async fn starting_block_at_or_past_time_is_rejected() {
        let chain = FixedCadence { head: 100 };
        let err = find_block_nearest_to_time(&chain, 60, UnixTimestamp(1500))
            .await
            .unwrap_err();
        assert!(matches!(err, EvmError::StartingBlockInFuture));
    }

    #[tokio::test]
    async fn answer_at_head_means_waiting_for_a_successor() {
        let chain = FixedCadence { head: 100 };
        // Every block is before t=99999, so the head itself would be the
        // answer; the caller has to wait for one more block.
        let err = find_block_nearest_to_time(&chain, 0, UnixTimestamp(99_999))
            .await
            .unwrap_err();
        assert!(matches!(err, EvmError::BlockNotYetGenerated));
    }

    #[tokio::test]
    async fn works_from_a_nonzero_starting_height() {
        let chain = FixedCadence { head: 1000 };
        let h = find_block_nearest_to_time(&chain, 500, UnixTimestamp(6005))
            .await
            .unwrap();
        assert_eq!(h, 500);
    }
}

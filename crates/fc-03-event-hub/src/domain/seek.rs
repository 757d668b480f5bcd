//! # Seek Planning
//!
//! Resolves application block positions into the delivery directive.
//!
//! | start       | seek start        |
//! |-------------|-------------------|
//! | unset       | newest            |
//! | newest      | newest            |
//! | oldest      | oldest            |
//! | last_seen   | last block or newest |
//! | n           | specified(n)      |
//!
//! | end         | seek stop         | behavior            |
//! |-------------|-------------------|---------------------|
//! | unset       | specified(MAX)    | block until ready   |
//! | newest      | newest            | fail if not ready   |
//! | oldest      | oldest            | fail if not ready   |
//! | last_seen   | last block or newest | fail if not ready |
//! | n           | specified(n)      | fail if not ready   |

use super::errors::EventHubError;
use shared_types::{BlockNum, BlockPosition, SeekBehavior, SeekInfo, SeekPosition};

/// A resolved seek directive plus the stop the hub enforces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekPlan {
    pub info: SeekInfo,
    pub end: Option<BlockPosition>,
}

fn seek_position(position: BlockPosition) -> SeekPosition {
    match position {
        BlockPosition::Oldest => SeekPosition::Oldest,
        BlockPosition::Number(n) => SeekPosition::Specified(n.value()),
        BlockPosition::Newest | BlockPosition::LastSeen => SeekPosition::Newest,
    }
}

/// Resolve `start` and `end` against `last_seen`.
pub fn plan_seek(
    start: Option<BlockPosition>,
    end: Option<BlockPosition>,
    last_seen: Option<BlockNum>,
) -> Result<SeekPlan, EventHubError> {
    let start = start.unwrap_or(BlockPosition::Newest).resolve(last_seen);
    let end = end.map(|e| e.resolve(last_seen));

    if let (Some(s), Some(e)) = (start.number(), end.and_then(BlockPosition::number)) {
        if s > e {
            return Err(EventHubError::InvalidRange { start: s, end: e });
        }
    }

    let (stop, behavior) = match end {
        None => (
            SeekPosition::Specified(BlockNum::MAX.value()),
            SeekBehavior::BlockUntilReady,
        ),
        Some(position) => (seek_position(position), SeekBehavior::FailIfNotReady),
    };

    Ok(SeekPlan {
        info: SeekInfo {
            start: seek_position(start),
            stop,
            behavior,
        },
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_stream_forever_from_newest() {
        let plan = plan_seek(None, None, None).unwrap();
        assert_eq!(plan.info.start, SeekPosition::Newest);
        assert_eq!(plan.info.stop, SeekPosition::Specified(u64::MAX));
        assert_eq!(plan.info.behavior, SeekBehavior::BlockUntilReady);
        assert_eq!(plan.end, None);
    }

    #[test]
    fn test_concrete_end_fails_if_not_ready() {
        let plan = plan_seek(Some(5u64.into()), Some(10u64.into()), None).unwrap();
        assert_eq!(plan.info.start, SeekPosition::Specified(5));
        assert_eq!(plan.info.stop, SeekPosition::Specified(10));
        assert_eq!(plan.info.behavior, SeekBehavior::FailIfNotReady);
        assert_eq!(plan.end, Some(BlockPosition::Number(BlockNum::new(10))));

        let newest = plan_seek(Some(BlockPosition::Oldest), Some(BlockPosition::Newest), None).unwrap();
        assert_eq!(newest.info.start, SeekPosition::Oldest);
        assert_eq!(newest.info.stop, SeekPosition::Newest);
        assert_eq!(newest.info.behavior, SeekBehavior::FailIfNotReady);
    }

    #[test]
    fn test_last_seen_resolution() {
        let seen = plan_seek(Some(BlockPosition::LastSeen), None, Some(BlockNum::new(42))).unwrap();
        assert_eq!(seen.info.start, SeekPosition::Specified(42));

        let unseen = plan_seek(Some(BlockPosition::LastSeen), Some(BlockPosition::LastSeen), None).unwrap();
        assert_eq!(unseen.info.start, SeekPosition::Newest);
        assert_eq!(unseen.end, Some(BlockPosition::Newest));
    }

    #[test]
    fn test_invalid_range() {
        let err = plan_seek(Some(20u64.into()), Some(10u64.into()), None).unwrap_err();
        assert_eq!(
            err,
            EventHubError::InvalidRange {
                start: BlockNum::new(20),
                end: BlockNum::new(10)
            }
        );
        // Last seen is resolved before the range is checked.
        assert!(plan_seek(Some(BlockPosition::LastSeen), Some(5u64.into()), Some(BlockNum::new(7))).is_err());
    }
}

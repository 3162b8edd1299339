//! Candidate lookup contract

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::errors::{ClickmatchError, Result};
use crate::storage::ClickEvent;

/// 默认回溯窗口
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// 配置允许的最大窗口（7 天）
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[async_trait]
pub trait CandidateSelector: Send + Sync {
    /// Every click event from `network_origin` with a timestamp in
    /// `[as_of - window, as_of]` whose click token no install references yet.
    ///
    /// Results are newest first; an empty vector is a normal result.
    async fn select_candidates(
        &self,
        network_origin: &str,
        as_of: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<ClickEvent>>;
}

/// 校验查询参数并返回窗口起点
pub fn window_start(
    network_origin: &str,
    as_of: DateTime<Utc>,
    window: Duration,
) -> Result<DateTime<Utc>> {
    if network_origin.trim().is_empty() {
        return Err(ClickmatchError::invalid_input(
            "network origin is required for candidate selection",
        ));
    }
    if window <= Duration::zero() {
        return Err(ClickmatchError::invalid_input(format!(
            "candidate window must be positive, got {}s",
            window.num_seconds()
        )));
    }
    Ok(as_of - window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start() {
        let now = Utc::now();
        let start = window_start("203.0.113.7", now, Duration::minutes(30)).unwrap();
        assert_eq!(now - start, Duration::minutes(30));
    }

    #[test]
    fn test_window_start_rejects_blank_origin() {
        let err = window_start("  ", Utc::now(), Duration::minutes(30)).unwrap_err();
        assert!(matches!(err, ClickmatchError::InvalidInput(_)));
    }

    #[test]
    fn test_window_start_rejects_non_positive_window() {
        assert!(window_start("10.0.0.1", Utc::now(), Duration::zero()).is_err());
        assert!(window_start("10.0.0.1", Utc::now(), Duration::minutes(-5)).is_err());
    }
}

//! 写路径的瞬时故障重试
//!
//! 点击计数、事件写入、手机号更新遇到锁冲突或连接池超时时退避重试。
//! 指纹匹配提交不走这里：唯一约束冲突是业务结果，不是瞬时故障。

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::is_unique_violation;
use crate::config::DatabaseConfig;

/// 各后端会自行消失的错误码
const TRANSIENT_SQL_CODES: &[(&str, &str)] = &[
    // SQLite: BUSY / LOCKED / BUSY_SNAPSHOT（WAL 下读事务升级写事务失败）
    ("5", "sqlite busy"),
    ("6", "sqlite locked"),
    ("517", "sqlite busy snapshot"),
    // MySQL
    ("1213", "mysql deadlock"),
    ("1205", "mysql lock wait timeout"),
    // PostgreSQL
    ("40001", "postgres serialization failure"),
    ("40P01", "postgres deadlock"),
];

/// 拿不到错误码时按消息匹配
const TRANSIENT_MESSAGES: &[&str] = &[
    "database is locked",
    "deadlock",
    "lock wait timeout",
    "could not serialize",
    "serialization failure",
];

/// Why an error is worth another attempt, or `None` when it is final.
pub fn transient_cause(err: &DbErr) -> Option<&'static str> {
    if is_unique_violation(err) {
        return None;
    }
    match err {
        DbErr::ConnectionAcquire(_) => Some("pool acquire"),
        DbErr::Conn(_) => Some("connection"),
        DbErr::Exec(runtime) | DbErr::Query(runtime) => transient_runtime_cause(runtime),
        _ => None,
    }
}

#[inline]
pub fn is_retryable_error(err: &DbErr) -> bool {
    transient_cause(err).is_some()
}

fn transient_runtime_cause(err: &RuntimeErr) -> Option<&'static str> {
    let message = match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            if let Some(code) = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code())
            {
                return TRANSIENT_SQL_CODES
                    .iter()
                    .find(|(c, _)| *c == code.as_ref())
                    .map(|(_, cause)| *cause);
            }
            sqlx_err.to_string()
        }
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => return None,
    };

    let message = message.to_lowercase();
    TRANSIENT_MESSAGES
        .iter()
        .any(|needle| message.contains(needle))
        .then_some("lock contention")
}

/// 重试策略，来自 `[database]` 配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms.max(config.retry_base_delay_ms),
        }
    }
}

impl RetryConfig {
    /// 第 `retry` 次重试前的等待：指数增长、封顶，再加最多 25% 抖动
    pub fn delay_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(32);
        let capped = self
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms);
        let jitter = rand::random_range(0..=capped / 4);
        Duration::from_millis(capped + jitter)
    }
}

/// Run `operation`, retrying transient failures up to `config.max_retries` times.
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retries = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} recovered after {} retries", operation_name, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(cause) = transient_cause(&err) else {
            return Err(err);
        };
        if retries >= config.max_retries {
            warn!(
                "{} gave up after {} retries ({}): {}",
                operation_name, retries, cause, err
            );
            return Err(err);
        }

        retries += 1;
        let delay = config.delay_for(retries);
        warn!(
            "{} hit {} ({}), retry {}/{} in {:?}",
            operation_name, cause, err, retries, config.max_retries, delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn exec_err(msg: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(msg.to_string()))
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 4,
        }
    }

    #[test]
    fn test_transient_causes() {
        assert_eq!(
            transient_cause(&DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)),
            Some("pool acquire")
        );
        assert_eq!(
            transient_cause(&exec_err("database is locked")),
            Some("lock contention")
        );
        assert_eq!(
            transient_cause(&exec_err("Deadlock found when trying to get lock")),
            Some("lock contention")
        );
    }

    #[test]
    fn test_final_errors_are_not_retried() {
        // 计数更新没命中行、认领冲突都是业务结果
        assert!(!is_retryable_error(&DbErr::RecordNotFound("aB3x".to_string())));
        assert!(!is_retryable_error(&exec_err(
            "UNIQUE constraint failed: click_claims.click_id"
        )));
        assert!(!is_retryable_error(&DbErr::Custom("bad column".to_string())));
    }

    #[test]
    fn test_retry_config_from_database_config() {
        let database = DatabaseConfig {
            retry_count: 5,
            retry_base_delay_ms: 300,
            retry_max_delay_ms: 100,
            ..DatabaseConfig::default()
        };
        let config = RetryConfig::from(&database);
        assert_eq!(config.max_retries, 5);
        // 上限不会低于基础延迟
        assert_eq!(config.max_delay_ms, 300);
    }

    #[test]
    fn test_delay_grows_then_caps() {
        let config = RetryConfig::default();
        let ms = |retry| config.delay_for(retry).as_millis() as u64;

        assert!((100..=125).contains(&ms(1)));
        assert!((400..=500).contains(&ms(3)));
        assert!((2000..=2500).contains(&ms(12)));
        assert!((2000..=2500).contains(&ms(u32::MAX)));
    }

    #[tokio::test]
    async fn test_counter_update_survives_busy_database() {
        let calls = AtomicU32::new(0);

        let result = with_retry("record_click_event(aB3x)", fast(), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(exec_err("database is locked"))
                } else {
                    Ok(1u64)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);

        let result = with_retry("update_phone_number", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(matches!(result, Err(DbErr::ConnectionAcquire(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_click_fails_without_retry() {
        let calls = AtomicU32::new(0);

        let result = with_retry("record_click_event(nope)", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::RecordNotFound("nope".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

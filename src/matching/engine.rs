//! Attribution engine
//!
//! 流程：校验来源 → 查询候选 → 逐个评分 → 阈值 / 决胜 → 原子提交。
//! 匹配路径内没有重试循环，失败立即返回给调用方。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::fingerprint::{Attribution, Fingerprint, InstallReport, MatchOutcome, NoMatchReason};
use super::scorer::score;
use super::selector::{CandidateSelector, DEFAULT_WINDOW_MINUTES, MAX_WINDOW_MINUTES};
use crate::config::{MatchingConfig, TieBreak};
use crate::errors::{ClickmatchError, Result};
use crate::storage::{ClickEvent, Install};

#[async_trait]
pub trait AttributionLedger: Send + Sync {
    /// Insert `install` (whose `click_token` is set) only if no other install
    /// references that token yet. Losing the race returns `ClickmatchError::Conflict`.
    async fn commit_match(&self, install: Install) -> Result<Install>;
}

/// Storage the engine needs: candidate lookup plus atomic commit.
pub trait FingerprintStore: CandidateSelector + AttributionLedger {}

impl<T: CandidateSelector + AttributionLedger + ?Sized> FingerprintStore for T {}

/// Decision policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub window: Duration,
    pub min_score: u8,
    pub tie_break: TieBreak,
}

impl MatchPolicy {
    /// 0 分永远不是可接受的匹配
    pub fn effective_min_score(&self) -> u8 {
        self.min_score.max(1)
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
            min_score: 1,
            tie_break: TieBreak::default(),
        }
    }
}

impl From<&MatchingConfig> for MatchPolicy {
    fn from(config: &MatchingConfig) -> Self {
        // 窗口限制在 [1, MAX_WINDOW_MINUTES] 分钟
        let minutes = config.window_minutes.clamp(1, MAX_WINDOW_MINUTES as u64) as i64;
        if minutes as u64 != config.window_minutes {
            warn!(
                "matching.window_minutes = {} out of range, using {}",
                config.window_minutes, minutes
            );
        }
        Self {
            window: Duration::minutes(minutes),
            min_score: config.min_score,
            tie_break: config.tie_break,
        }
    }
}

/// One scored candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub event: &'a ClickEvent,
    pub score: u8,
}

/// Scan all candidates and keep the best one.
///
/// A strictly greater score always replaces the current best. Equal scores
/// only replace it under `TieBreak::NearestTimestamp`, and only when the
/// candidate is strictly closer to `as_of`.
pub fn pick_best<'a>(
    fingerprint: &Fingerprint,
    candidates: &'a [ClickEvent],
    as_of: DateTime<Utc>,
    tie_break: TieBreak,
) -> Option<ScoredCandidate<'a>> {
    let distance = |event: &ClickEvent| (as_of - event.timestamp).num_milliseconds().abs();

    let mut best: Option<ScoredCandidate<'a>> = None;
    for event in candidates {
        let current = score(fingerprint, &event.fingerprint);
        let replace = match best {
            None => true,
            Some(b) if current > b.score => true,
            Some(b) if current == b.score => {
                tie_break == TieBreak::NearestTimestamp && distance(event) < distance(b.event)
            }
            Some(_) => false,
        };
        if replace {
            best = Some(ScoredCandidate {
                event,
                score: current,
            });
        }
    }
    best
}

pub struct AttributionEngine {
    store: Arc<dyn FingerprintStore>,
    policy: MatchPolicy,
}

impl AttributionEngine {
    pub fn new(store: Arc<dyn FingerprintStore>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn attribute(&self, report: &InstallReport) -> Result<MatchOutcome> {
        self.attribute_at(report, Utc::now()).await
    }

    /// Run the matching path with an explicit "now".
    pub async fn attribute_at(
        &self,
        report: &InstallReport,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        let origin = report
            .network_origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| ClickmatchError::invalid_input("network origin is required"))?;

        let candidates = self
            .store
            .select_candidates(origin, now, self.policy.window)
            .await?;

        if candidates.is_empty() {
            debug!("No match for origin {}: no recent candidates", origin);
            return Ok(MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates));
        }

        let Some(best) = pick_best(&report.fingerprint, &candidates, now, self.policy.tie_break)
        else {
            return Ok(MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates));
        };

        if best.score < self.policy.effective_min_score() {
            debug!(
                "No match for origin {}: best score {} over {} candidates",
                origin,
                best.score,
                candidates.len()
            );
            return Ok(MatchOutcome::NoMatch(NoMatchReason::InsufficientOverlap));
        }

        let click_token = best.event.click_token.clone();
        let install = Install {
            install_id: Uuid::new_v4().to_string(),
            click_token: Some(click_token.clone()),
            platform: report.platform.clone(),
            network_origin: Some(origin.to_string()),
            advertising_id: report.advertising_id.clone(),
            phone_number: None,
            push_token: report.push_token.clone(),
            created_at: now,
            fingerprint: report.fingerprint.clone(),
        };

        match self.store.commit_match(install).await {
            Ok(install) => {
                info!(
                    "Install {} attributed to click {} (score {}, {} candidates, origin {})",
                    install.install_id,
                    click_token,
                    best.score,
                    candidates.len(),
                    origin
                );
                Ok(MatchOutcome::Matched(Attribution {
                    install_id: install.install_id,
                    click_token,
                    score: best.score,
                }))
            }
            Err(e) if e.is_conflict() => {
                warn!(
                    "Click {} was claimed concurrently, reporting no match: {}",
                    click_token,
                    e.message()
                );
                Ok(MatchOutcome::NoMatch(NoMatchReason::ClaimedConcurrently))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory store with the same anti-join semantics as the SQL backend
    #[derive(Default)]
    struct MemoryStore {
        events: Mutex<Vec<ClickEvent>>,
        installs: Mutex<Vec<Install>>,
        /// 模拟并发写入者：提交前抢先认领这些 token
        stolen: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn push_event(&self, event: ClickEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn install_count(&self) -> usize {
            self.installs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CandidateSelector for MemoryStore {
        async fn select_candidates(
            &self,
            network_origin: &str,
            as_of: DateTime<Utc>,
            window: Duration,
        ) -> Result<Vec<ClickEvent>> {
            let start = crate::matching::selector::window_start(network_origin, as_of, window)?;
            let installs = self.installs.lock().unwrap();
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .filter(|e| e.network_origin.as_deref() == Some(network_origin))
                .filter(|e| e.timestamp >= start && e.timestamp <= as_of)
                .filter(|e| {
                    !installs
                        .iter()
                        .any(|i| i.click_token.as_deref() == Some(e.click_token.as_str()))
                })
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl AttributionLedger for MemoryStore {
        async fn commit_match(&self, install: Install) -> Result<Install> {
            let token = install.click_token.clone().unwrap_or_default();
            if self.stolen.lock().unwrap().contains(&token) {
                return Err(ClickmatchError::conflict(format!(
                    "click {} already claimed",
                    token
                )));
            }
            let mut installs = self.installs.lock().unwrap();
            if installs
                .iter()
                .any(|i| i.click_token.as_deref() == Some(token.as_str()))
            {
                return Err(ClickmatchError::conflict(format!(
                    "click {} already claimed",
                    token
                )));
            }
            installs.push(install.clone());
            Ok(install)
        }
    }

    const ORIGIN: &str = "203.0.113.10";

    fn fingerprint(os: &str, lang: &str, tz: &str, model: &str) -> Fingerprint {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Fingerprint {
            os_version: opt(os),
            language: opt(lang),
            timezone: opt(tz),
            device_model: opt(model),
        }
    }

    fn event(
        id: i64,
        token: &str,
        origin: &str,
        timestamp: DateTime<Utc>,
        fingerprint: Fingerprint,
    ) -> ClickEvent {
        ClickEvent {
            id,
            click_token: token.to_string(),
            timestamp,
            platform: Some("ios".to_string()),
            network_origin: Some(origin.to_string()),
            user_agent: None,
            screen_width: None,
            screen_height: None,
            referrer: None,
            fingerprint,
        }
    }

    fn report(fp: Fingerprint) -> InstallReport {
        InstallReport {
            network_origin: Some(ORIGIN.to_string()),
            platform: Some("ios".to_string()),
            fingerprint: fp,
            advertising_id: None,
            push_token: None,
        }
    }

    fn engine(store: Arc<MemoryStore>, tie_break: TieBreak) -> AttributionEngine {
        AttributionEngine::new(
            store,
            MatchPolicy {
                tie_break,
                ..MatchPolicy::default()
            },
        )
    }

    #[tokio::test]
    async fn test_missing_origin_is_invalid_input() {
        let store = Arc::new(MemoryStore::default());
        let engine = engine(store, TieBreak::ScanOrder);

        let mut r = report(Fingerprint::default());
        r.network_origin = None;
        let err = engine.attribute(&r).await.unwrap_err();
        assert!(matches!(err, ClickmatchError::InvalidInput(_)));

        r.network_origin = Some("   ".to_string());
        assert!(engine.attribute(&r).await.is_err());
    }

    #[tokio::test]
    async fn test_no_candidates_is_no_recent_candidates() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        // 其他来源 + 窗口外的事件都不算
        store.push_event(event(
            1,
            "aaaa",
            "198.51.100.1",
            now - Duration::minutes(1),
            fingerprint("17.2", "en-US", "UTC", "iPhone15,2"),
        ));
        store.push_event(event(
            2,
            "bbbb",
            ORIGIN,
            now - Duration::minutes(31),
            fingerprint("17.2", "en-US", "UTC", "iPhone15,2"),
        ));
        let engine = engine(store.clone(), TieBreak::ScanOrder);

        let outcome = engine
            .attribute_at(&report(fingerprint("17.2", "en-US", "UTC", "iPhone15,2")), now)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates)
        );
        assert_eq!(store.install_count(), 0);
    }

    #[tokio::test]
    async fn test_all_zero_scores_is_no_match() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        store.push_event(event(1, "aaaa", ORIGIN, now, Fingerprint::default()));
        store.push_event(event(
            2,
            "bbbb",
            ORIGIN,
            now,
            fingerprint("12", "de", "Europe/Berlin", "x"),
        ));
        let engine = engine(store.clone(), TieBreak::ScanOrder);

        let outcome = engine
            .attribute_at(&report(fingerprint("17.2", "en-US", "UTC", "y")), now)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch(NoMatchReason::InsufficientOverlap)
        );
        assert_eq!(store.install_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_event_is_never_selected() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        store.push_event(event(1, "aaaa", ORIGIN, now, Fingerprint::default()));
        let engine = engine(store, TieBreak::NearestTimestamp);

        let outcome = engine
            .attribute_at(
                &report(fingerprint("17.2", "en-US", "America/New_York", "iPhone15,2")),
                now,
            )
            .await
            .unwrap();
        assert!(!outcome.is_match());
    }

    #[tokio::test]
    async fn test_higher_score_wins() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        // score 3: os only
        store.push_event(event(1, "low1", ORIGIN, now, fingerprint("17.2", "", "", "")));
        // score 5: os + tz
        store.push_event(event(
            2,
            "high",
            ORIGIN,
            now - Duration::minutes(10),
            fingerprint("17.2", "", "UTC", ""),
        ));
        let engine = engine(store.clone(), TieBreak::ScanOrder);

        let outcome = engine
            .attribute_at(&report(fingerprint("17.2", "en", "UTC", "")), now)
            .await
            .unwrap();
        match outcome {
            MatchOutcome::Matched(attribution) => {
                assert_eq!(attribution.click_token, "high");
                assert_eq!(attribution.score, 5);
            }
            other => panic!("expected match, got {:?}", other),
        }
        assert_eq!(store.install_count(), 1);
    }

    #[tokio::test]
    async fn test_tie_break_scan_order_keeps_first() {
        let now = Utc::now();
        let events = vec![
            event(1, "old1", ORIGIN, now - Duration::minutes(20), fingerprint("17.2", "", "", "")),
            event(2, "new1", ORIGIN, now - Duration::minutes(1), fingerprint("17.2", "", "", "")),
        ];
        let install = fingerprint("17.2", "", "", "");

        let best = pick_best(&install, &events, now, TieBreak::ScanOrder).unwrap();
        assert_eq!(best.event.click_token, "old1");

        let best = pick_best(&install, &events, now, TieBreak::NearestTimestamp).unwrap();
        assert_eq!(best.event.click_token, "new1");
        assert_eq!(best.score, 3);
    }

    #[tokio::test]
    async fn test_min_score_threshold() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        store.push_event(event(1, "aaaa", ORIGIN, now, fingerprint("", "", "", "pixel")));
        let engine = AttributionEngine::new(
            store.clone(),
            MatchPolicy {
                min_score: 3,
                ..MatchPolicy::default()
            },
        );

        let outcome = engine
            .attribute_at(&report(fingerprint("", "", "", "pixel")), now)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch(NoMatchReason::InsufficientOverlap)
        );
    }

    #[tokio::test]
    async fn test_claimed_click_is_not_selected_again() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        let fp = fingerprint("17.2", "en-US", "UTC", "iPhone15,2");
        store.push_event(event(1, "aaaa", ORIGIN, now - Duration::minutes(2), fp.clone()));
        store.push_event(event(2, "aaaa", ORIGIN, now - Duration::minutes(1), fp.clone()));
        let engine = engine(store.clone(), TieBreak::NearestTimestamp);

        let first = engine.attribute_at(&report(fp.clone()), now).await.unwrap();
        assert!(first.is_match());

        let second = engine.attribute_at(&report(fp), now).await.unwrap();
        assert_eq!(
            second,
            MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates)
        );
        assert_eq!(store.install_count(), 1);
    }

    #[tokio::test]
    async fn test_conflict_becomes_no_match() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::default());
        store.push_event(event(1, "aaaa", ORIGIN, now, fingerprint("17.2", "", "", "")));
        store.stolen.lock().unwrap().push("aaaa".to_string());
        let engine = engine(store.clone(), TieBreak::NearestTimestamp);

        let outcome = engine
            .attribute_at(&report(fingerprint("17.2", "", "", "")), now)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch(NoMatchReason::ClaimedConcurrently)
        );
        assert_eq!(store.install_count(), 0);
    }

    #[test]
    fn test_policy_from_config() {
        let config = MatchingConfig {
            window_minutes: 15,
            min_score: 0,
            tie_break: TieBreak::ScanOrder,
        };
        let policy = MatchPolicy::from(&config);
        assert_eq!(policy.window, Duration::minutes(15));
        assert_eq!(policy.effective_min_score(), 1);
        assert_eq!(policy.tie_break, TieBreak::ScanOrder);
    }

    #[test]
    fn test_policy_window_is_clamped() {
        let with_window = |window_minutes| MatchingConfig {
            window_minutes,
            ..MatchingConfig::default()
        };

        let zero = MatchPolicy::from(&with_window(0));
        assert_eq!(zero.window, Duration::minutes(1));

        let huge = MatchPolicy::from(&with_window(u64::MAX / 2));
        assert_eq!(huge.window, Duration::minutes(MAX_WINDOW_MINUTES));
        assert!(
            crate::matching::selector::window_start("10.0.0.1", Utc::now(), huge.window).is_ok()
        );
    }
}

//! Attribution engine tests against a SQLite-backed fingerprint store

use std::sync::{Arc, Once};

use chrono::{DateTime, Duration, Utc};
use clickmatch::config::{TieBreak, init_config};
use clickmatch::matching::{
    AttributionEngine, Fingerprint, InstallReport, MatchOutcome, MatchPolicy, NoMatchReason,
};
use clickmatch::storage::NewClick;
use clickmatch::storage::backend::SeaOrmStorage;
use migration::entities::click_event;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::EntityTrait;
use tempfile::TempDir;

static INIT: Once = Once::new();

const ORIGIN: &str = "203.0.113.5";

async fn create_engine(policy: MatchPolicy) -> (Arc<SeaOrmStorage>, AttributionEngine, TempDir) {
    INIT.call_once(|| {
        init_config();
    });

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("attribution.db").display()
    );
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    let engine = AttributionEngine::new(storage.clone(), policy);
    (storage, engine, temp_dir)
}

fn fp(os: &str, lang: &str, tz: &str, model: &str) -> Fingerprint {
    let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Fingerprint {
        os_version: opt(os),
        language: opt(lang),
        timezone: opt(tz),
        device_model: opt(model),
    }
}

async fn new_click(storage: &SeaOrmStorage, name: &str) -> String {
    storage
        .create_click(
            &NewClick {
                campaign: Some(name.to_string()),
                ..Default::default()
            },
            6,
            16,
        )
        .await
        .unwrap()
        .token
}

async fn click_at(storage: &SeaOrmStorage, token: &str, at: DateTime<Utc>, fingerprint: Fingerprint) {
    let model = click_event::ActiveModel {
        id: NotSet,
        click_id: Set(token.to_string()),
        timestamp: Set(at),
        platform: Set(Some("ios".to_string())),
        ip_address: Set(Some(ORIGIN.to_string())),
        user_agent: Set(None),
        language: Set(fingerprint.language),
        screen_width: Set(None),
        screen_height: Set(None),
        device_model: Set(fingerprint.device_model),
        os_version: Set(fingerprint.os_version),
        timezone: Set(fingerprint.timezone),
        referrer: Set(None),
    };
    click_event::Entity::insert(model)
        .exec(storage.get_db())
        .await
        .unwrap();
}

fn report(fingerprint: Fingerprint) -> InstallReport {
    InstallReport {
        network_origin: Some(ORIGIN.to_string()),
        platform: Some("ios".to_string()),
        fingerprint,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_no_recent_candidates() {
    let (storage, engine, _dir) = create_engine(MatchPolicy::default()).await;
    let token = new_click(&storage, "old").await;
    let now = Utc::now();
    click_at(&storage, &token, now - Duration::minutes(31), fp("17.2", "en-US", "", "")).await;

    let outcome = engine
        .attribute_at(&report(fp("17.2", "en-US", "", "")), now)
        .await
        .unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates));
}

#[tokio::test]
async fn test_higher_score_wins_and_is_recorded() {
    let (storage, engine, _dir) = create_engine(MatchPolicy::default()).await;
    let five = new_click(&storage, "five").await;
    let three = new_click(&storage, "three").await;
    let now = Utc::now();

    // os + timezone = 5
    click_at(&storage, &five, now - Duration::minutes(10), fp("17.2", "de-DE", "America/New_York", "")).await;
    // os = 3，但更新
    click_at(&storage, &three, now - Duration::minutes(1), fp("17.2", "", "", "")).await;

    let outcome = engine
        .attribute_at(&report(fp("17.2", "en-US", "America/New_York", "iPhone15,2")), now)
        .await
        .unwrap();
    let MatchOutcome::Matched(attribution) = outcome else {
        panic!("expected a match, got {:?}", outcome);
    };
    assert_eq!(attribution.click_token, five);
    assert_eq!(attribution.score, 5);

    let install = storage
        .get_install(&attribution.install_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(install.click_token.as_deref(), Some(five.as_str()));
    assert_eq!(install.network_origin.as_deref(), Some(ORIGIN));
}

#[tokio::test]
async fn test_all_zero_scores_no_match_and_nothing_written() {
    let (storage, engine, _dir) = create_engine(MatchPolicy::default()).await;
    let token = new_click(&storage, "zero").await;
    let now = Utc::now();
    click_at(&storage, &token, now - Duration::minutes(2), Fingerprint::default()).await;
    click_at(&storage, &token, now - Duration::minutes(1), fp("16.0", "fr-FR", "Europe/Paris", "")).await;

    let outcome = engine
        .attribute_at(&report(fp("17.2", "en-US", "America/New_York", "")), now)
        .await
        .unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch(NoMatchReason::InsufficientOverlap));

    // 未匹配不写安装记录，候选仍然可用
    let candidates = clickmatch::matching::CandidateSelector::select_candidates(
        storage.as_ref(),
        ORIGIN,
        now,
        Duration::minutes(30),
    )
    .await
    .unwrap();
    assert_eq!(candidates.len(), 2);
}

#[tokio::test]
async fn test_claimed_click_is_not_matched_twice() {
    let (storage, engine, _dir) = create_engine(MatchPolicy::default()).await;
    let token = new_click(&storage, "once").await;
    let now = Utc::now();
    click_at(&storage, &token, now - Duration::minutes(3), fp("17.2", "en-US", "", "")).await;
    click_at(&storage, &token, now - Duration::minutes(2), fp("17.2", "en-US", "", "")).await;

    let first = engine
        .attribute_at(&report(fp("17.2", "en-US", "", "")), now)
        .await
        .unwrap();
    assert!(first.is_match());

    let second = engine
        .attribute_at(&report(fp("17.2", "en-US", "", "")), now)
        .await
        .unwrap();
    assert_eq!(second, MatchOutcome::NoMatch(NoMatchReason::NoRecentCandidates));
}

#[tokio::test]
async fn test_tie_break_nearest_timestamp() {
    let (storage, engine, _dir) = create_engine(MatchPolicy {
        tie_break: TieBreak::NearestTimestamp,
        ..Default::default()
    })
    .await;
    let far = new_click(&storage, "far").await;
    let near = new_click(&storage, "near").await;
    let now = Utc::now();
    click_at(&storage, &far, now - Duration::minutes(20), fp("17.2", "", "", "")).await;
    click_at(&storage, &near, now - Duration::minutes(2), fp("17.2", "", "", "")).await;

    let outcome = engine
        .attribute_at(&report(fp("17.2", "", "", "")), now)
        .await
        .unwrap();
    let MatchOutcome::Matched(attribution) = outcome else {
        panic!("expected a match");
    };
    assert_eq!(attribution.click_token, near);
}

#[tokio::test]
async fn test_missing_origin_is_invalid_input() {
    let (_storage, engine, _dir) = create_engine(MatchPolicy::default()).await;
    let err = engine
        .attribute(&InstallReport::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        clickmatch::errors::ClickmatchError::InvalidInput(_)
    ));
}

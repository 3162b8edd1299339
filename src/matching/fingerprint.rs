//! Fingerprint payloads and matching outcomes

use serde::{Deserialize, Serialize};

/// Device / locale attributes compared by the scorer.
///
/// 所有字段都是可选的：缺失、空字符串或纯空白都视为"未提供"，
/// 评分时该属性贡献 0 分。非空值按原样比较，不做 trim。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub os_version: Option<String>,
    /// BCP-47 风格的语言标签，如 `en-US`
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub device_model: Option<String>,
}

impl Fingerprint {
    pub fn os_version(&self) -> Option<&str> {
        present(&self.os_version)
    }

    pub fn language(&self) -> Option<&str> {
        present(&self.language)
    }

    /// 主语言子标签（第一个 `-` 之前的部分）
    pub fn primary_language(&self) -> Option<&str> {
        self.language()
            .and_then(|lang| lang.split('-').next())
            .filter(|tag| !tag.trim().is_empty())
    }

    pub fn timezone(&self) -> Option<&str> {
        present(&self.timezone)
    }

    pub fn device_model(&self) -> Option<&str> {
        present(&self.device_model)
    }
}

#[inline]
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// An install report entering the matching path.
///
/// `network_origin` is already resolved from the request
/// (`utils::ip::resolve_network_origin`).
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub network_origin: Option<String>,
    pub platform: Option<String>,
    pub fingerprint: Fingerprint,
    pub advertising_id: Option<String>,
    pub push_token: Option<String>,
}

/// A committed attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub install_id: String,
    pub click_token: String,
    pub score: u8,
}

/// Why the engine declined to attribute an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// 窗口内没有来自同一来源的未归因点击
    NoRecentCandidates,
    /// 最高分为 0 或低于阈值
    InsufficientOverlap,
    /// 提交时该点击已被并发请求认领
    ClaimedConcurrently,
}

impl NoMatchReason {
    pub fn message(&self) -> &'static str {
        match self {
            NoMatchReason::NoRecentCandidates => "no recent candidates from this origin",
            NoMatchReason::InsufficientOverlap => "no sufficient fingerprint overlap",
            NoMatchReason::ClaimedConcurrently => {
                "best candidate was claimed by a concurrent install"
            }
        }
    }
}

impl std::fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(Attribution),
    NoMatch(NoMatchReason),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let fp = Fingerprint {
            os_version: Some("   ".to_string()),
            language: Some(String::new()),
            timezone: None,
            device_model: Some(" Pixel 7 ".to_string()),
        };
        assert_eq!(fp.os_version(), None);
        assert_eq!(fp.language(), None);
        assert_eq!(fp.device_model(), Some(" Pixel 7 "));
    }

    #[test]
    fn test_primary_language() {
        let lang = |s: &str| Fingerprint {
            language: Some(s.to_string()),
            ..Default::default()
        };
        assert_eq!(lang("en-US").primary_language(), Some("en"));
        assert_eq!(lang("fr").primary_language(), Some("fr"));
        assert_eq!(lang("zh-Hant-TW").primary_language(), Some("zh"));
        assert_eq!(lang("-US").primary_language(), None);
        assert_eq!(lang(" -US").primary_language(), None);
    }

    #[test]
    fn test_no_match_reason_messages() {
        assert!(
            NoMatchReason::NoRecentCandidates
                .to_string()
                .starts_with("no recent candidates")
        );
        assert_eq!(
            serde_json::to_string(&NoMatchReason::InsufficientOverlap).unwrap(),
            "\"insufficient_overlap\""
        );
    }
}

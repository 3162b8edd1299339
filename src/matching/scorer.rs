//! Weighted fingerprint comparison
//!
//! | attribute    | condition                       | weight |
//! |--------------|---------------------------------|--------|
//! | OS version   | exact equality                  | 3      |
//! | language     | primary subtag equality         | 2      |
//! | timezone     | exact equality                  | 2      |
//! | device model | exact equality                  | 1      |
//!
//! 任一侧缺失的属性不加分也不扣分。网络来源和时间戳由候选查询负责，这里不参与。

use serde::Serialize;

use super::fingerprint::Fingerprint;

pub const OS_VERSION_WEIGHT: u8 = 3;
pub const LANGUAGE_WEIGHT: u8 = 2;
pub const TIMEZONE_WEIGHT: u8 = 2;
pub const DEVICE_MODEL_WEIGHT: u8 = 1;

pub const MAX_SCORE: u8 = OS_VERSION_WEIGHT + LANGUAGE_WEIGHT + TIMEZONE_WEIGHT + DEVICE_MODEL_WEIGHT;

/// Which attributes matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub os_version: bool,
    pub language: bool,
    pub timezone: bool,
    pub device_model: bool,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        let mut total = 0;
        if self.os_version {
            total += OS_VERSION_WEIGHT;
        }
        if self.language {
            total += LANGUAGE_WEIGHT;
        }
        if self.timezone {
            total += TIMEZONE_WEIGHT;
        }
        if self.device_model {
            total += DEVICE_MODEL_WEIGHT;
        }
        total
    }
}

pub fn compare(install: &Fingerprint, click: &Fingerprint) -> ScoreBreakdown {
    ScoreBreakdown {
        os_version: both_equal(install.os_version(), click.os_version()),
        language: both_equal(install.primary_language(), click.primary_language()),
        timezone: both_equal(install.timezone(), click.timezone()),
        device_model: both_equal(install.device_model(), click.device_model()),
    }
}

/// Score one install fingerprint against one click fingerprint, in `0..=MAX_SCORE`.
#[inline]
pub fn score(install: &Fingerprint, click: &Fingerprint) -> u8 {
    compare(install, click).total()
}

#[inline]
fn both_equal(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

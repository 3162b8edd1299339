//! User-Agent 解析：平台识别与 Android 指纹字段
//!
//! Android 点击直接 302 到应用商店，没有落地页采集，只能从 UA 里取 OS 版本和机型。

use woothee::parser::Parser;

/// 重定向分流使用的平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

/// 按 UA 子串识别平台（不区分大小写）
pub fn detect_platform(user_agent: Option<&str>) -> Platform {
    let ua = user_agent.unwrap_or_default().to_ascii_lowercase();
    if ua.contains("android") {
        Platform::Android
    } else if ua.contains("iphone") || ua.contains("ipad") {
        Platform::Ios
    } else {
        Platform::Web
    }
}

/// `Android 13` / `Android 9.0.1` 后面的版本号
fn android_version_span(ua: &str) -> Option<(usize, usize)> {
    let lower = ua.to_ascii_lowercase();
    let start = lower.find("android ")? + "android ".len();
    let len = lower[start..]
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b'.')
        .count();
    (len > 0).then_some((start, start + len))
}

/// 解析 OS 版本
///
/// Android 按 `Android <版本>` 提取；其它系统交给 woothee。
pub fn parse_os_version(user_agent: &str) -> Option<String> {
    if let Some((start, end)) = android_version_span(user_agent) {
        return Some(user_agent[start..end].to_string());
    }

    let result = Parser::new().parse(user_agent)?;
    let version = result.os_version.to_string();
    if version.is_empty() || version == "UNKNOWN" {
        None
    } else {
        Some(version)
    }
}

/// 解析 Android 机型：`Android <版本>;` 之后到 `)` 之前的部分
pub fn parse_device_model(user_agent: &str) -> Option<String> {
    let (_, end) = android_version_span(user_agent)?;
    let rest = user_agent[end..].strip_prefix(';')?;
    let model = rest.split(')').next()?.trim();
    // 机型后常跟着 `Build/...`
    let model = model.split(" Build/").next().unwrap_or(model).trim();
    (!model.is_empty()).then(|| model.to_string())
}

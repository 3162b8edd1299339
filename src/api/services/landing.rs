//! 落地页
//!
//! 浏览器端采集语言、时区、屏幕尺寸和 OS 版本，POST 到 `/{token}/collect`，
//! 无论成功与否都跳转到目标地址。

const LANDING_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Redirecting…</title>
</head>
<body>
<noscript>__NOSCRIPT__</noscript>
<script>
(function () {
  var token = __TOKEN__;
  var target = __TARGET__;
  var ua = navigator.userAgent || "";
  var osVersion = null;
  var m = ua.match(/OS (\d+)_(\d+)(?:_(\d+))? like Mac OS X/);
  if (m) {
    osVersion = m[1] + "." + m[2] + (m[3] ? "." + m[3] : "");
  } else {
    m = ua.match(/Android ([\d.]+)/);
    if (m) { osVersion = m[1]; }
  }
  var timezone = null;
  try { timezone = Intl.DateTimeFormat().resolvedOptions().timeZone || null; } catch (e) {}
  var data = {
    platform: __PLATFORM__,
    user_agent: ua,
    language: navigator.language || null,
    timezone: timezone,
    screen_width: window.screen ? window.screen.width : null,
    screen_height: window.screen ? window.screen.height : null,
    os_version: osVersion,
    referrer: document.referrer || null
  };
  function go() { if (target) { window.location.replace(target); } }
  var timer = setTimeout(go, 1500);
  fetch("/" + encodeURIComponent(token) + "/collect", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(data),
    keepalive: true
  }).catch(function () {}).then(function () { clearTimeout(timer); go(); });
})();
</script>
</body>
</html>
"#;

/// 把字符串编码成可以安全嵌入 `<script>` 的 JS 字面量
fn js_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => serde_json::Value::String(v.to_string())
            .to_string()
            .replace("</", "<\\/")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029"),
        None => "null".to_string(),
    }
}

fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 只允许 http(s) 目标，其它 scheme（如 `javascript:`）一律丢弃
fn safe_target(target: Option<&str>) -> Option<&str> {
    let target = target.map(str::trim).filter(|t| !t.is_empty())?;
    let parsed = url::Url::parse(target).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(target)
}

pub fn render_landing_page(token: &str, platform: &str, target: Option<&str>) -> String {
    let target = safe_target(target);
    let noscript = match target {
        Some(t) => format!(r#"<a href="{}">Continue</a>"#, html_escape(t)),
        None => "JavaScript is required.".to_string(),
    };

    LANDING_TEMPLATE
        .replace("__NOSCRIPT__", &noscript)
        .replace("__TOKEN__", &js_literal(Some(token)))
        .replace("__TARGET__", &js_literal(target))
        .replace("__PLATFORM__", &js_literal(Some(platform)))
}

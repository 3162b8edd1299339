//! 网络来源（客户端 IP）解析
//!
//! 点击记录和安装匹配必须使用同一套规则，否则同一台设备会被当成两个来源。

use std::net::{Ipv4Addr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

/// 按优先级收集候选地址：X-Forwarded-For 各段，然后是连接对端地址
fn collect_candidates<'a>(forwarded_for: Option<&'a str>, peer: Option<&'a str>) -> Vec<&'a str> {
    let mut candidates: Vec<&str> = forwarded_for
        .map(|xff| {
            xff.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(peer) = peer.map(str::trim).filter(|s| !s.is_empty()) {
        candidates.push(peer);
    }
    candidates
}

/// 去掉端口（`1.2.3.4:5678` / `[::1]:80`）
fn strip_port(addr: &str) -> &str {
    match addr.parse::<SocketAddr>() {
        Ok(SocketAddr::V4(_)) => addr.rsplit_once(':').map_or(addr, |(ip, _)| ip),
        Ok(SocketAddr::V6(_)) => addr
            .trim_start_matches('[')
            .split(']')
            .next()
            .unwrap_or(addr),
        Err(_) => addr,
    }
}

/// 解析网络来源
///
/// 第一个能解析为 IPv4 的候选胜出；没有 IPv4 时取第一个候选；都没有返回 `None`。
/// IPv4 判定用 `Ipv4Addr` 严格解析，`999.1.1.1`、`010.0.0.1` 这类不算。
pub fn resolve_network_origin(forwarded_for: Option<&str>, peer: Option<&str>) -> Option<String> {
    let candidates = collect_candidates(forwarded_for, peer);

    candidates
        .iter()
        .map(|c| strip_port(c))
        .find(|c| c.parse::<Ipv4Addr>().is_ok())
        .or_else(|| candidates.first().map(|c| strip_port(c)))
        .map(str::to_string)
}

/// 从 HeaderMap 取 X-Forwarded-For 原文
pub fn forwarded_for_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
}

/// 从 HttpRequest 提取网络来源
pub fn extract_network_origin(req: &HttpRequest) -> Option<String> {
    let peer = req.peer_addr().map(|addr| addr.ip().to_string());
    let origin = resolve_network_origin(forwarded_for_header(req.headers()), peer.as_deref());
    debug!("Resolved network origin: {:?} (peer {:?})", origin, peer);
    origin
}

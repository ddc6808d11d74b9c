//! IP 地址处理工具
//!
//! 统计接口只对可信子网开放，子网判断基于 CIDR 匹配。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;

/// 反向代理写入的真实客户端 IP 头
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.trim().split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false, // IPv4 vs IPv6 不匹配
    }
}

/// 解析 IP 字符串（支持 ip:port）
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    if let Ok(socket_addr) = raw.parse::<SocketAddr>() {
        Some(socket_addr.ip())
    } else {
        raw.parse::<IpAddr>().ok()
    }
}

/// 检查 IP 字符串是否属于可信子网
///
/// 未配置子网时一律返回 false
pub fn ip_in_subnet(raw_ip: &str, subnet: Option<&str>) -> bool {
    let Some(subnet) = subnet.filter(|s| !s.trim().is_empty()) else {
        return false;
    };
    parse_ip(raw_ip).is_some_and(|ip| ip_in_cidr(&ip, subnet))
}

/// 从 X-Real-IP 头提取客户端 IP
pub fn real_ip_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed expansion: turn a mixed list of single IPs and CIDR blocks into a
//! deduplicated, bounded target set.

use indexmap::IndexSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// Hard cap on addresses emitted per CIDR seed. A block with more than
/// 8 host bits expands to at most this many addresses, ascending from
/// the network address.
pub const MAX_CIDR_EXPANSION: usize = 256;

/// Expand seeds into a deduplicated list of target IPs, preserving input
/// order. Invalid entries are logged and dropped.
pub fn expand_seeds(seeds: &[String]) -> Vec<String> {
    let mut targets: IndexSet<String> = IndexSet::new();
    for seed in seeds {
        let seed = seed.trim();
        if seed.is_empty() {
            continue;
        }
        if let Ok(ip) = seed.parse::<IpAddr>() {
            targets.insert(ip.to_string());
        } else if seed.contains('/') {
            match expand_cidr(seed) {
                Some(ips) => {
                    targets.extend(ips);
                }
                None => warn!(seed, "skipping unparseable CIDR seed"),
            }
        } else {
            warn!(seed, "skipping invalid seed");
        }
    }
    targets.into_iter().collect()
}

fn expand_cidr(cidr: &str) -> Option<Vec<String>> {
    let (addr, prefix) = cidr.split_once('/')?;
    let prefix: u32 = prefix.parse().ok()?;
    match addr.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => expand_v4(v4, prefix),
        IpAddr::V6(v6) => expand_v6(v6, prefix),
    }
}

fn expand_v4(addr: Ipv4Addr, prefix: u32) -> Option<Vec<String>> {
    if prefix > 32 {
        return None;
    }
    let host_bits = 32 - prefix;
    let mask: u32 = if prefix == 0 { 0 } else { u32::MAX << host_bits };
    let network = u32::from(addr) & mask;

    if host_bits > 8 {
        // Capped expansion: the first 256 addresses of the block,
        // network address included.
        let ips = (0..MAX_CIDR_EXPANSION as u32)
            .map(|i| Ipv4Addr::from(network + i).to_string())
            .collect();
        return Some(ips);
    }

    let count = 1u32 << host_bits;
    let mut ips: Vec<String> =
        (0..count).map(|i| Ipv4Addr::from(network + i).to_string()).collect();

    // Point-to-point (/31) and host (/32) blocks keep everything; larger
    // blocks drop the network and broadcast addresses.
    if prefix < 31 && ips.len() > 2 {
        ips.remove(ips.len() - 1);
        ips.remove(0);
    }
    Some(ips)
}

fn expand_v6(addr: Ipv6Addr, prefix: u32) -> Option<Vec<String>> {
    if prefix > 128 {
        return None;
    }
    let host_bits = 128 - prefix;
    let mask: u128 = if prefix == 0 { 0 } else { u128::MAX << host_bits };
    let network = u128::from(addr) & mask;

    let count = if host_bits > 8 {
        MAX_CIDR_EXPANSION as u128
    } else {
        1u128 << host_bits
    };
    Some((0..count).map(|i| Ipv6Addr::from(network + i).to_string()).collect())
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;

//! Security group rules and the diff used to reconcile them with a backend.

use anyhow::{bail, Context, Result};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr};

pub const PROTO_ANY: &str = "any";
pub const PROTO_TCP: &str = "tcp";
pub const PROTO_UDP: &str = "udp";
pub const PROTO_ICMP: &str = "icmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Allow,
    Deny,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Allow => write!(f, "allow"),
            Action::Deny => write!(f, "deny"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRule {
    pub priority: i32,
    pub action: Action,
    pub direction: Direction,
    pub protocol: String,
    pub ip_net: IpNetwork,
    pub port_start: i32,
    pub port_end: i32,
    pub ports: Vec<i32>,
    pub description: String,
    /// Backend id of the rule, empty for rules not yet created.
    pub external_id: String,
}

impl Default for SecurityRule {
    fn default() -> Self {
        Self {
            priority: 1,
            action: Action::Allow,
            direction: Direction::In,
            protocol: PROTO_ANY.to_string(),
            ip_net: IpNetwork::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
                .unwrap_or_else(|_| IpNetwork::from(IpAddr::V4(Ipv4Addr::UNSPECIFIED))),
            port_start: 0,
            port_end: 0,
            ports: Vec::new(),
            description: String::new(),
            external_id: String::new(),
        }
    }
}

impl SecurityRule {
    /// Accepts either a CIDR or a bare address, which becomes a host route.
    pub fn parse_cidr(&mut self, cidr: &str) -> Result<()> {
        let cidr = cidr.trim();
        self.ip_net = if cidr.contains('/') {
            cidr.parse::<IpNetwork>()
                .with_context(|| format!("Invalid CIDR: {}", cidr))?
        } else {
            let addr: IpAddr = cidr
                .parse()
                .with_context(|| format!("Invalid IP address: {}", cidr))?;
            IpNetwork::from(addr)
        };
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for port in [self.port_start, self.port_end] {
            if !(0..=65535).contains(&port) {
                bail!("Invalid port {} in rule {}", port, self);
            }
        }
        if self.port_start > 0 && self.port_end > 0 && self.port_start > self.port_end {
            bail!(
                "Invalid port range {}-{} in rule {}",
                self.port_start,
                self.port_end,
                self
            );
        }
        if let Some(port) = self.ports.iter().find(|p| !(1..=65535).contains(*p)) {
            bail!("Invalid port {} in rule {}", port, self);
        }
        Ok(())
    }

    fn port_spec(&self) -> Option<String> {
        if !self.ports.is_empty() {
            let ports: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
            return Some(ports.join(","));
        }
        if self.port_start > 0 && self.port_end > 0 {
            if self.port_start == self.port_end {
                return Some(self.port_start.to_string());
            }
            return Some(format!("{}-{}", self.port_start, self.port_end));
        }
        None
    }

    fn same_rule(&self, other: &SecurityRule) -> bool {
        self.direction == other.direction
            && self.action == other.action
            && self.protocol == other.protocol
            && self.ip_net == other.ip_net
            && self.port_spec() == other.port_spec()
    }
}

impl std::fmt::Display for SecurityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {} {}",
            self.direction, self.action, self.ip_net, self.protocol
        )?;
        if let Some(ports) = self.port_spec() {
            write!(f, " {}", ports)?;
        }
        Ok(())
    }
}

/// Rules to keep, add and remove, split by direction.
#[derive(Debug, Default, Clone)]
pub struct RuleDiff {
    pub common: Vec<SecurityRule>,
    pub in_adds: Vec<SecurityRule>,
    pub out_adds: Vec<SecurityRule>,
    pub in_dels: Vec<SecurityRule>,
    pub out_dels: Vec<SecurityRule>,
}

impl RuleDiff {
    pub fn is_empty(&self) -> bool {
        self.in_adds.is_empty()
            && self.out_adds.is_empty()
            && self.in_dels.is_empty()
            && self.out_dels.is_empty()
    }
}

/// Compare the desired rules against what the backend reports.
///
/// Remote rules with a local twin are kept (the remote copy is returned so
/// its external id survives); the rest are scheduled for deletion. Local
/// rules without a remote twin are scheduled for creation.
pub fn compare_rules(local: &[SecurityRule], remote: &[SecurityRule]) -> RuleDiff {
    let mut diff = RuleDiff::default();
    let mut matched = vec![false; local.len()];

    for rule in remote {
        let twin = local
            .iter()
            .enumerate()
            .find(|(i, l)| !matched[*i] && l.same_rule(rule));
        match twin {
            Some((i, _)) => {
                matched[i] = true;
                diff.common.push(rule.clone());
            }
            None => match rule.direction {
                Direction::In => diff.in_dels.push(rule.clone()),
                Direction::Out => diff.out_dels.push(rule.clone()),
            },
        }
    }

    for (rule, _) in local.iter().zip(matched).filter(|(_, m)| !m) {
        match rule.direction {
            Direction::In => diff.in_adds.push(rule.clone()),
            Direction::Out => diff.out_adds.push(rule.clone()),
        }
    }

    diff
}

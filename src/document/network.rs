//! Network configuration (`network-config`)
//!
//! Covers the netplan-style version-2 schema cloud-init understands, plus
//! the parameter builder that derives a full document from an address, an
//! optional gateway and optional nameservers.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::Document;

/// Errors for network parameter handling
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid CIDR address '{0}': {1}")]
    InvalidAddress(String, String),
}

/// Interface match criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Match {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "macaddress", skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

/// DNS servers and search domains
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nameservers {
    pub addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<String>,
}

/// Per-interface network settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ethernet {
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_: Option<Match>,

    /// Static addresses in CIDR notation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp4: Option<bool>,

    #[serde(rename = "gateway4", skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Nameservers>,
}

/// Network configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(skip)]
    raw: Mapping,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ethernets: BTreeMap<String, Ethernet>,
}

impl Document for NetworkConfig {
    const FILE_NAME: &'static str = "network-config";

    fn raw(&self) -> &Mapping {
        &self.raw
    }

    fn set_raw(&mut self, raw: Mapping) {
        self.raw = raw;
    }
}

/// An IPv4 address with prefix length, e.g. `192.168.1.10/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Cidr {
    /// Base address of the subnet
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask())
    }

    /// Conventional first usable host address (network base plus one)
    pub fn first_host(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network()).wrapping_add(1))
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix_len)
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| NetworkError::InvalidAddress(s.to_string(), reason.into());

        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| invalid("expected ADDRESS/PREFIX notation"))?;

        let address = addr
            .parse::<Ipv4Addr>()
            .map_err(|e| invalid(&e.to_string()))?;

        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|e| invalid(&e.to_string()))?;
        if prefix_len > 32 {
            return Err(invalid("prefix length must be <= 32"));
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }
}

/// User-supplied network parameters, typically bound from CLI flags
#[derive(Debug, Clone, Default)]
pub struct NetworkParams {
    /// Static address in CIDR notation; empty means no network document
    /// (DHCP is implicit downstream)
    pub address: String,
    pub gateway: Option<String>,
    pub nameservers: Vec<String>,
}

impl NetworkConfig {
    /// Derive a complete network document from user parameters.
    ///
    /// Returns `None` when no address is given. An unset gateway defaults
    /// to the subnet's first usable host; empty nameservers default to the
    /// resolved gateway. The single interface entry matches `en*`, which
    /// covers the common single-NIC VM.
    pub fn from_params(params: &NetworkParams) -> Result<Option<Self>, NetworkError> {
        if params.address.is_empty() {
            return Ok(None);
        }

        let cidr: Ipv4Cidr = params.address.parse()?;

        let gateway = match &params.gateway {
            Some(gw) if !gw.is_empty() => gw.clone(),
            _ => cidr.first_host().to_string(),
        };

        let nameservers = if params.nameservers.is_empty() {
            vec![gateway.clone()]
        } else {
            params.nameservers.clone()
        };

        let mut ethernets = BTreeMap::new();
        ethernets.insert(
            "default".to_string(),
            Ethernet {
                match_: Some(Match {
                    name: Some("en*".to_string()),
                    mac: None,
                }),
                addresses: vec![params.address.clone()],
                gateway: Some(gateway),
                nameservers: Some(Nameservers {
                    addresses: nameservers,
                    search: Vec::new(),
                }),
                ..Default::default()
            },
        );

        Ok(Some(Self {
            raw: Mapping::new(),
            version: Some(2),
            ethernets,
        }))
    }
}

//! Optional YAML seed-records file: parsed with `config`/`serde`, then
//! turned into validated [`ResourceRecord`]s the caller inserts one at
//! a time via the store's own `add`.

use std::net::{Ipv4Addr, Ipv6Addr};

use config::{Config, ConfigError, File};
use serde::Deserialize;

use dns_proto::{DomainName, ResourceRecord};
use dns_store::Error;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub records: Vec<SeedRecord>,
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }
}

/// A single seed-file entry, tagged on `type` to pick the record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SeedRecord {
    A {
        name: String,
        ttl: u32,
        address: Ipv4Addr,
    },
    AAAA {
        name: String,
        ttl: u32,
        address: Ipv6Addr,
    },
    CNAME {
        name: String,
        ttl: u32,
        target: String,
    },
    PTR {
        name: String,
        ttl: u32,
        target: String,
    },
    MX {
        name: String,
        ttl: u32,
        preference: u16,
        exchange: String,
    },
    TXT {
        name: String,
        ttl: u32,
        text: String,
    },
    SRV {
        name: String,
        ttl: u32,
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
}

impl SeedRecord {
    fn name(s: &str) -> Result<DomainName, Error> {
        Ok(DomainName::from_dotted_string(s)?)
    }

    pub fn into_resource_record(self) -> Result<ResourceRecord, Error> {
        Ok(match self {
            SeedRecord::A { name, ttl, address } => {
                ResourceRecord::a(Self::name(&name)?, ttl, address)?
            }
            SeedRecord::AAAA { name, ttl, address } => {
                ResourceRecord::aaaa(Self::name(&name)?, ttl, address)?
            }
            SeedRecord::CNAME { name, ttl, target } => {
                ResourceRecord::cname(Self::name(&name)?, ttl, Self::name(&target)?)?
            }
            SeedRecord::PTR { name, ttl, target } => {
                ResourceRecord::ptr(Self::name(&name)?, ttl, Self::name(&target)?)?
            }
            SeedRecord::MX {
                name,
                ttl,
                preference,
                exchange,
            } => ResourceRecord::mx(Self::name(&name)?, ttl, preference, Self::name(&exchange)?)?,
            SeedRecord::TXT { name, ttl, text } => {
                ResourceRecord::txt(Self::name(&name)?, ttl, text.into_bytes())?
            }
            SeedRecord::SRV {
                name,
                ttl,
                priority,
                weight,
                port,
                target,
            } => ResourceRecord::srv(
                Self::name(&name)?,
                ttl,
                priority,
                weight,
                port,
                Self::name(&target)?,
            )?,
        })
    }
}

/// Parse the seed file and convert every entry. An entry that fails
/// validation is logged and dropped; the rest of the file still loads.
pub fn load_seed_records(path: &str) -> Result<Vec<ResourceRecord>, ConfigError> {
    let settings = Settings::from_file(path)?;
    let mut records = Vec::with_capacity(settings.records.len());
    for seed in settings.records {
        match seed.into_resource_record() {
            Ok(record) => records.push(record),
            Err(error) => tracing::warn!(?error, "dropping invalid seed record"),
        }
    }
    Ok(records)
}

//! `shard.realm.num` entity identities.
//!
//! An identity travels in four shapes:
//! - dotted string `"0.0.1001"` (a bare `"1001"` or `"0.1001"` picks up the
//!   configured default shard/realm),
//! - packed integer `(shard << 48) | (realm << 32) | num`,
//! - 20-byte address: shard (4 bytes), realm (8), num (8), big-endian, `0x` hex,
//! - derived address: 20 bytes that do not decode to an in-bounds triple.
//!
//! Derived addresses are never squeezed into shard/realm/num; they stay opaque
//! in [`Identity::Derived`].

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::cache::EntityIdCache;
use crate::error::EntityIdError;

pub const SHARD_BITS: u32 = 15;
pub const REALM_BITS: u32 = 16;
pub const NUM_BITS: u32 = 32;

pub const MAX_SHARD: u64 = (1 << SHARD_BITS) - 1;
pub const MAX_REALM: u64 = (1 << REALM_BITS) - 1;
pub const MAX_NUM: u64 = (1 << NUM_BITS) - 1;

pub const ADDRESS_LEN: usize = 20;
pub const ADDRESS_PREFIX: &str = "0x";

static DOTTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,10})\.(\d{1,10})(?:\.(\d{1,10}))?$").expect("dotted id regex")
});

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,20}$").expect("digits regex"));

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{1,10})\.)?(?:(\d{1,10})\.)?(?:0[xX])?([0-9A-Fa-f]{40})$")
        .expect("address regex")
});

/// In-bounds `shard.realm.num` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    shard: u16,
    realm: u16,
    num: u32,
}

impl EntityId {
    /// `None` when any component exceeds its bit width.
    pub fn new(shard: u64, realm: u64, num: u64) -> Option<Self> {
        check_bounds(shard, realm, num).ok()
    }

    pub fn shard(&self) -> u64 {
        u64::from(self.shard)
    }

    pub fn realm(&self) -> u64 {
        u64::from(self.realm)
    }

    pub fn num(&self) -> u64 {
        u64::from(self.num)
    }

    /// Packed form; always fits a signed 64-bit column.
    pub fn packed(&self) -> i64 {
        (i64::from(self.shard) << 48) | (i64::from(self.realm) << 32) | i64::from(self.num)
    }

    pub fn from_packed(value: i64) -> Option<Self> {
        if value < 0 {
            return None;
        }
        let v = value as u64;
        Self::new(v >> 48, (v >> 32) & 0xFFFF, v & 0xFFFF_FFFF)
    }

    pub fn address_bytes(&self) -> [u8; ADDRESS_LEN] {
        let mut out = [0u8; ADDRESS_LEN];
        out[..4].copy_from_slice(&u32::from(self.shard).to_be_bytes());
        out[4..12].copy_from_slice(&u64::from(self.realm).to_be_bytes());
        out[12..].copy_from_slice(&u64::from(self.num).to_be_bytes());
        out
    }

    pub fn to_address(&self) -> String {
        format!("{ADDRESS_PREFIX}{}", hex::encode(self.address_bytes()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 20-byte address that cannot be decomposed into an [`EntityId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DerivedAddress([u8; ADDRESS_LEN]);

impl DerivedAddress {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ADDRESS_PREFIX}{}", hex::encode(self.0))
    }
}

/// Outcome of parsing one identity value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Absent value; only produced when the caller declared the field nullable.
    Null,
    Id(EntityId),
    Derived(DerivedAddress),
}

impl Identity {
    pub fn is_null(&self) -> bool {
        matches!(self, Identity::Null)
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Identity::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn to_dotted(&self) -> Option<String> {
        self.entity_id().map(|id| id.to_string())
    }

    pub fn to_packed(&self) -> Option<i64> {
        self.entity_id().map(|id| id.packed())
    }

    /// Fixed address for triples, the opaque bytes for derived addresses.
    pub fn to_address(&self) -> Option<String> {
        match self {
            Identity::Null => None,
            Identity::Id(id) => Some(id.to_address()),
            Identity::Derived(addr) => Some(addr.to_string()),
        }
    }
}

/// True when `candidate` is address-shaped but decodes outside the
/// shard/realm/num bounds.
pub fn is_derived_address(candidate: &str) -> bool {
    let Some(caps) = ADDRESS_RE.captures(candidate) else {
        return false;
    };
    match decode_address(&caps[3]) {
        Some(bytes) => {
            let (shard, realm, num) = split_address(&bytes);
            check_bounds(shard, realm, num).is_err()
        }
        None => false,
    }
}

/// Parses identities using process-wide defaults and an optional memo cache.
#[derive(Clone, Debug, Default)]
pub struct EntityIdCodec {
    default_shard: u64,
    default_realm: u64,
    cache: Option<Arc<EntityIdCache>>,
}

impl EntityIdCodec {
    pub fn new(default_shard: u64, default_realm: u64) -> Result<Self, EntityIdError> {
        if default_shard > MAX_SHARD {
            return Err(EntityIdError::OutOfRange {
                field: "shard".into(),
                component: "shard",
                value: u128::from(default_shard),
            });
        }
        if default_realm > MAX_REALM {
            return Err(EntityIdError::OutOfRange {
                field: "realm".into(),
                component: "realm",
                value: u128::from(default_realm),
            });
        }
        Ok(Self {
            default_shard,
            default_realm,
            cache: None,
        })
    }

    /// Share a memo cache. The cache must not be shared with a codec that has
    /// different defaults.
    pub fn with_cache(mut self, cache: Arc<EntityIdCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn default_shard(&self) -> u64 {
        self.default_shard
    }

    pub fn default_realm(&self) -> u64 {
        self.default_realm
    }

    pub fn cache(&self) -> Option<&Arc<EntityIdCache>> {
        self.cache.as_ref()
    }

    /// Strict parse: derived addresses are rejected as out of range.
    pub fn parse(
        &self,
        input: Option<&str>,
        field: &str,
        is_nullable: bool,
    ) -> Result<Identity, EntityIdError> {
        self.parse_with(input, field, is_nullable, false)
    }

    /// Like [`Self::parse`] but keeps non-decomposable addresses as
    /// [`Identity::Derived`].
    pub fn parse_allow_derived(
        &self,
        input: Option<&str>,
        field: &str,
        is_nullable: bool,
    ) -> Result<Identity, EntityIdError> {
        self.parse_with(input, field, is_nullable, true)
    }

    /// Non-nullable strict parse returning the triple directly.
    pub fn parse_id(&self, input: &str, field: &str) -> Result<EntityId, EntityIdError> {
        match self.parse(Some(input), field, false)? {
            Identity::Id(id) => Ok(id),
            _ => Err(EntityIdError::Malformed {
                field: field.to_string(),
                input: input.to_string(),
            }),
        }
    }

    fn parse_with(
        &self,
        input: Option<&str>,
        field: &str,
        is_nullable: bool,
        allow_derived: bool,
    ) -> Result<Identity, EntityIdError> {
        let raw = match input {
            Some(s) if !s.is_empty() => s,
            _ if is_nullable => return Ok(Identity::Null),
            _ => {
                return Err(EntityIdError::Missing {
                    field: field.to_string(),
                })
            }
        };

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(raw, allow_derived)) {
            return Ok(hit);
        }

        let parsed = self.parse_uncached(raw, field, allow_derived)?;
        if let Some(cache) = &self.cache {
            cache.insert(raw, allow_derived, parsed);
        }
        Ok(parsed)
    }

    fn parse_uncached(
        &self,
        raw: &str,
        field: &str,
        allow_derived: bool,
    ) -> Result<Identity, EntityIdError> {
        let malformed = || EntityIdError::Malformed {
            field: field.to_string(),
            input: raw.to_string(),
        };
        let out_of_range = |(component, value): (&'static str, u64)| EntityIdError::OutOfRange {
            field: field.to_string(),
            component,
            value: u128::from(value),
        };

        if let Some(caps) = DOTTED_RE.captures(raw) {
            let first = parse_component(&caps[1]).ok_or_else(malformed)?;
            let second = parse_component(&caps[2]).ok_or_else(malformed)?;
            let (shard, realm, num) = match caps.get(3) {
                Some(n) => (
                    first,
                    second,
                    parse_component(n.as_str()).ok_or_else(malformed)?,
                ),
                None => (self.default_shard, first, second),
            };
            return check_bounds(shard, realm, num)
                .map(Identity::Id)
                .map_err(out_of_range);
        }

        if DIGITS_RE.is_match(raw) {
            let value: u128 = raw.parse().map_err(|_| malformed())?;
            if value <= u128::from(MAX_NUM) {
                return check_bounds(self.default_shard, self.default_realm, value as u64)
                    .map(Identity::Id)
                    .map_err(out_of_range);
            }
            if value > i64::MAX as u128 {
                return Err(EntityIdError::OutOfRange {
                    field: field.to_string(),
                    component: "encoded id",
                    value,
                });
            }
            return EntityId::from_packed(value as i64)
                .map(Identity::Id)
                .ok_or_else(malformed);
        }

        if let Some(caps) = ADDRESS_RE.captures(raw) {
            let bytes = decode_address(&caps[3]).ok_or_else(malformed)?;
            let (shard, realm, num) = split_address(&bytes);
            return match check_bounds(shard, realm, num) {
                Ok(id) => {
                    let (prefix_shard, prefix_realm) = match (caps.get(1), caps.get(2)) {
                        (Some(s), Some(r)) => (Some(s.as_str()), Some(r.as_str())),
                        (Some(r), None) => (None, Some(r.as_str())),
                        _ => (None, None),
                    };
                    let agrees = |p: Option<&str>, actual: u64| {
                        p.map_or(true, |p| parse_component(p) == Some(actual))
                    };
                    if agrees(prefix_shard, id.shard()) && agrees(prefix_realm, id.realm()) {
                        Ok(Identity::Id(id))
                    } else {
                        Err(malformed())
                    }
                }
                Err(_) if allow_derived => Ok(Identity::Derived(DerivedAddress(bytes))),
                Err(bad) => Err(out_of_range(bad)),
            };
        }

        Err(malformed())
    }
}

fn parse_component(s: &str) -> Option<u64> {
    s.parse().ok()
}

fn check_bounds(shard: u64, realm: u64, num: u64) -> Result<EntityId, (&'static str, u64)> {
    if shard > MAX_SHARD {
        return Err(("shard", shard));
    }
    if realm > MAX_REALM {
        return Err(("realm", realm));
    }
    if num > MAX_NUM {
        return Err(("num", num));
    }
    Ok(EntityId {
        shard: shard as u16,
        realm: realm as u16,
        num: num as u32,
    })
}

fn decode_address(hex_digits: &str) -> Option<[u8; ADDRESS_LEN]> {
    hex::decode(hex_digits).ok()?.try_into().ok()
}

fn split_address(bytes: &[u8; ADDRESS_LEN]) -> (u64, u64, u64) {
    let mut shard = [0u8; 4];
    let mut realm = [0u8; 8];
    let mut num = [0u8; 8];
    shard.copy_from_slice(&bytes[..4]);
    realm.copy_from_slice(&bytes[4..12]);
    num.copy_from_slice(&bytes[12..]);
    (
        u64::from(u32::from_be_bytes(shard)),
        u64::from_be_bytes(realm),
        u64::from_be_bytes(num),
    )
}

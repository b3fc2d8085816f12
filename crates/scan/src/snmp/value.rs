// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SNMP values as seen by consumers of the client trait.

use std::net::Ipv4Addr;

/// A decoded SNMP variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectId(String),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// Lossy string rendering: octet strings as UTF-8, numerics in
    /// decimal, OIDs and IPs in their dotted forms.
    pub fn display_string(&self) -> String {
        match self {
            SnmpValue::Integer(v) => v.to_string(),
            SnmpValue::OctetString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            SnmpValue::Null
            | SnmpValue::NoSuchObject
            | SnmpValue::NoSuchInstance
            | SnmpValue::EndOfMibView => String::new(),
            SnmpValue::ObjectId(oid) => oid.clone(),
            SnmpValue::IpAddress(ip) => ip.to_string(),
            SnmpValue::Counter32(v) => v.to_string(),
            SnmpValue::Gauge32(v) => v.to_string(),
            SnmpValue::TimeTicks(v) => v.to_string(),
            SnmpValue::Counter64(v) => v.to_string(),
        }
    }

    /// Numeric value widened to u64, when the type is numeric and
    /// non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SnmpValue::Integer(v) if *v >= 0 => Some(*v as u64),
            SnmpValue::Counter32(v) | SnmpValue::Gauge32(v) | SnmpValue::TimeTicks(v) => {
                Some(u64::from(*v))
            }
            SnmpValue::Counter64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as i32, saturating at the type bounds.
    pub fn as_i32_saturating(&self) -> Option<i32> {
        match self {
            SnmpValue::Integer(v) => Some((*v).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32),
            SnmpValue::Counter32(v) | SnmpValue::Gauge32(v) | SnmpValue::TimeTicks(v) => {
                Some((*v).min(i32::MAX as u32) as i32)
            }
            _ => None,
        }
    }

    /// Raw octets for OCTET STRING values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SnmpValue::OctetString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// True for NULL and the v2c exception markers.
    pub fn is_null_like(&self) -> bool {
        matches!(
            self,
            SnmpValue::Null
                | SnmpValue::NoSuchObject
                | SnmpValue::NoSuchInstance
                | SnmpValue::EndOfMibView
        )
    }
}

/// An OID/value pair. OIDs are canonical dotted strings with a leading
/// dot, matching the constants in [`super::oids`].
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: String,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: impl Into<String>, value: SnmpValue) -> Self {
        Self { oid: oid.into(), value }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The OIDs the prober queries. Scalar OIDs include the `.0` instance;
//! table OIDs are walk roots.

// system group (RFC 1213)
pub const SYS_DESCR: &str = ".1.3.6.1.2.1.1.1.0";
pub const SYS_OBJECT_ID: &str = ".1.3.6.1.2.1.1.2.0";
pub const SYS_UPTIME: &str = ".1.3.6.1.2.1.1.3.0";
pub const SYS_CONTACT: &str = ".1.3.6.1.2.1.1.4.0";
pub const SYS_NAME: &str = ".1.3.6.1.2.1.1.5.0";
pub const SYS_LOCATION: &str = ".1.3.6.1.2.1.1.6.0";

// ifTable (RFC 2863): walk root and per-column roots
pub const IF_TABLE: &str = ".1.3.6.1.2.1.2.2.1";
pub const IF_DESCR: &str = ".1.3.6.1.2.1.2.2.1.2";
pub const IF_TYPE: &str = ".1.3.6.1.2.1.2.2.1.3";
pub const IF_SPEED: &str = ".1.3.6.1.2.1.2.2.1.5";
pub const IF_PHYS_ADDRESS: &str = ".1.3.6.1.2.1.2.2.1.6";
pub const IF_ADMIN_STATUS: &str = ".1.3.6.1.2.1.2.2.1.7";
pub const IF_OPER_STATUS: &str = ".1.3.6.1.2.1.2.2.1.8";

/// ifPhysAddress of the first interface, the usual chassis MAC.
pub const IF_PHYS_ADDRESS_1: &str = ".1.3.6.1.2.1.2.2.1.6.1";

// ifXTable
pub const IF_X_TABLE: &str = ".1.3.6.1.2.1.31.1.1.1";
pub const IF_NAME: &str = ".1.3.6.1.2.1.31.1.1.1.1";
pub const IF_HIGH_SPEED: &str = ".1.3.6.1.2.1.31.1.1.1.15";
pub const IF_ALIAS: &str = ".1.3.6.1.2.1.31.1.1.1.18";

// ipAddrTable; the suffix of each instance is the IP address itself
pub const IP_AD_ENT_IF_INDEX: &str = ".1.3.6.1.2.1.4.20.1.2";

// LLDP-MIB remote tables
pub const LLDP_REM_TABLE: &str = ".1.0.8802.1.1.2.1.4.1.1";
pub const LLDP_REM_CHASSIS_ID: &str = ".1.0.8802.1.1.2.1.4.1.1.5";
pub const LLDP_REM_PORT_ID: &str = ".1.0.8802.1.1.2.1.4.1.1.7";
pub const LLDP_REM_PORT_DESC: &str = ".1.0.8802.1.1.2.1.4.1.1.8";
pub const LLDP_REM_SYS_NAME: &str = ".1.0.8802.1.1.2.1.4.1.1.9";
/// Management-address table; the address is encoded in the instance OID.
pub const LLDP_REM_MAN_ADDR_IF_SUBTYPE: &str = ".1.0.8802.1.1.2.1.4.2.1.3";

// CISCO-CDP-MIB cache table
pub const CDP_CACHE_TABLE: &str = ".1.3.6.1.4.1.9.9.23.1.2.1.1";
pub const CDP_CACHE_ADDRESS: &str = ".1.3.6.1.4.1.9.9.23.1.2.1.1.4";
pub const CDP_CACHE_DEVICE_ID: &str = ".1.3.6.1.4.1.9.9.23.1.2.1.1.6";
pub const CDP_CACHE_DEVICE_PORT: &str = ".1.3.6.1.4.1.9.9.23.1.2.1.1.7";
pub const CDP_CACHE_PLATFORM: &str = ".1.3.6.1.4.1.9.9.23.1.2.1.1.8";

/// The scalar system-group OIDs, in query order.
pub const SYSTEM_OIDS: [&str; 6] =
    [SYS_DESCR, SYS_OBJECT_ID, SYS_UPTIME, SYS_CONTACT, SYS_NAME, SYS_LOCATION];

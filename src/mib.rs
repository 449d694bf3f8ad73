//! Well-known object identifiers the poller reads and writes.
//!
//! Covers the MIB-II subtrees (system, interfaces, ip) and the OSPF-MIB
//! interface metric table. Constructors return fresh [`Oid`]s; the arcs fit
//! the inline SmallVec so there is no allocation.

use crate::oid;
use crate::oid::Oid;
use std::net::Ipv4Addr;

/// MIB-II root: 1.3.6.1.2.1
pub fn mib2() -> Oid {
    oid!(1, 3, 6, 1, 2, 1)
}

/// sysDescr.0 - device description string.
pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}

/// sysUpTime.0 - TimeTicks since the management subsystem re-initialized.
///
/// Appended to every timed sample as the device-side clock.
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

/// ifNumber.0 - number of network interfaces.
pub fn if_number() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 1, 0)
}

/// ifTable - the interfaces table.
pub fn if_table() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2)
}

/// ifEntry - the ifTable row prefix; pass this to table reconstruction.
pub fn if_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)
}

/// ifIndex column (1).
pub fn if_index() -> Oid {
    if_entry().child(1)
}

/// ifDescr column (2).
pub fn if_descr() -> Oid {
    if_entry().child(2)
}

/// ifType column (3).
pub fn if_type() -> Oid {
    if_entry().child(3)
}

/// ifInOctets column (10) - inbound octet counter.
pub fn if_in_octets() -> Oid {
    if_entry().child(10)
}

/// ifOutOctets column (16) - outbound octet counter.
pub fn if_out_octets() -> Oid {
    if_entry().child(16)
}

/// ipOutNoRoutes.0 - datagrams discarded for want of a route.
pub fn ip_out_no_routes() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 4, 12, 0)
}

/// ipAddrTable - the address table.
pub fn ip_addr_table() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 4, 20)
}

/// ipAddrEntry - the ipAddrTable row prefix.
pub fn ip_addr_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 4, 20, 1)
}

/// ipAdEntAddr column (1).
pub fn ip_ad_ent_addr() -> Oid {
    ip_addr_entry().child(1)
}

/// ipAdEntIfIndex column (2).
pub fn ip_ad_ent_if_index() -> Oid {
    ip_addr_entry().child(2)
}

/// ipAdEntNetMask column (3).
pub fn ip_ad_ent_net_mask() -> Oid {
    ip_addr_entry().child(3)
}

/// ospfIfMetricTable - per-interface OSPF metrics.
pub fn ospf_if_metric_table() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 14, 8)
}

/// ospfIfMetricEntry - the ospfIfMetricTable row prefix.
pub fn ospf_if_metric_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 14, 8, 1)
}

/// ospfIfMetricValue column (4).
pub fn ospf_if_metric_value() -> Oid {
    ospf_if_metric_entry().child(4)
}

/// Complete an ospfIfMetricTable column OID with its row index.
///
/// The row index of OSPF-MIB::ospfIfMetricTable is
/// `(ospfIfMetricIpAddress, ospfIfMetricAddressLessIf, ospfIfMetricTOS)`.
/// This derives it from the interface address alone, pinning
/// `ospfIfMetricAddressLessIf` to 0 - i.e. it assumes every OSPF interface
/// is numbered. Unnumbered (address-less) interfaces are indexed by ifIndex
/// instead and will not be reachable through this constructor.
///
/// ```
/// use snmpoll::mib;
/// use std::net::Ipv4Addr;
///
/// let oid = mib::ospf_if_metric_instance(
///     &mib::ospf_if_metric_value(),
///     Ipv4Addr::new(10, 0, 0, 1),
///     0,
/// );
/// assert_eq!(oid.to_string(), "1.3.6.1.2.1.14.8.1.4.10.0.0.1.0.0");
/// ```
pub fn ospf_if_metric_instance(column: &Oid, addr: Ipv4Addr, tos: u32) -> Oid {
    let octets = addr.octets();
    column.extend([
        octets[0] as u32,
        octets[1] as u32,
        octets[2] as u32,
        octets[3] as u32,
        0, // ospfIfMetricAddressLessIf: numbered interfaces only
        tos,
    ])
}

/// Convert a TimeTicks reading (hundredths of a second) to milliseconds.
pub fn ticks_to_millis(ticks: u32) -> u64 {
    ticks as u64 * 10
}

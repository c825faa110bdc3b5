//! Network interfaces known to the server, each with its own cache.

#[cfg(feature = "logging")]
use crate::log::trace;
use crate::dns_cache::DnsCache;
use if_addrs::Interface;
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    net::IpAddr,
};

/// Enum to represent the IP version.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum IpVersion {
    V4,
    V6,
}

impl From<&IpAddr> for IpVersion {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Identifies one cache scope: a network interface index with an IP version.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct IntfKey {
    pub index: u32,
    pub ip_version: IpVersion,
}

impl IntfKey {
    pub const fn new(index: u32, ip_version: IpVersion) -> Self {
        Self { index, ip_version }
    }
}

impl fmt::Display for IntfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.index, self.ip_version)
    }
}

/// The network scope of a request: an interface index and an IP version,
/// where `None` stands for all of them.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct IfScope {
    pub index: Option<u32>,
    pub ip_version: Option<IpVersion>,
}

impl IfScope {
    /// All interfaces, both IP versions.
    pub const fn any() -> Self {
        Self {
            index: None,
            ip_version: None,
        }
    }

    pub const fn new(index: u32, ip_version: IpVersion) -> Self {
        Self {
            index: Some(index),
            ip_version: Some(ip_version),
        }
    }

    /// Returns true if `intf` is within this scope.
    pub fn matches(&self, intf: &IntfKey) -> bool {
        self.index.map_or(true, |i| i == intf.index)
            && self.ip_version.map_or(true, |v| v == intf.ip_version)
    }
}

impl From<IntfKey> for IfScope {
    fn from(key: IntfKey) -> Self {
        Self::new(key.index, key.ip_version)
    }
}

/// An interface scope with its cache.
#[derive(Debug)]
pub struct MdnsInterface {
    key: IntfKey,
    name: String,
    addrs: HashSet<IpAddr>,
    pub(crate) cache: DnsCache,
}

impl MdnsInterface {
    fn new(key: IntfKey, name: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            addrs: HashSet::new(),
            cache: DnsCache::new(),
        }
    }

    pub fn key(&self) -> IntfKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addrs(&self) -> &HashSet<IpAddr> {
        &self.addrs
    }

    pub fn cache(&self) -> &DnsCache {
        &self.cache
    }
}

/// The registry of interfaces, looked up by (index, IP version).
#[derive(Debug, Default)]
pub struct InterfaceMonitor {
    interfaces: BTreeMap<IntfKey, MdnsInterface>,
}

impl InterfaceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from the network interfaces of the host,
    /// excluding loopback and interfaces without an index.
    pub fn from_system() -> Self {
        let mut monitor = Self::new();
        for intf in my_ip_interfaces() {
            monitor.add_system_interface(&intf);
        }
        monitor
    }

    fn add_system_interface(&mut self, intf: &Interface) {
        let Some(index) = intf.index else {
            trace!("skip interface without index: {}", &intf.name);
            return;
        };
        let key = IntfKey::new(index, IpVersion::from(&intf.ip()));
        self.add_interface(key, &intf.name)
            .addrs
            .insert(intf.ip());
    }

    /// Adds an interface if not known yet, and returns it.
    pub fn add_interface(&mut self, key: IntfKey, name: &str) -> &mut MdnsInterface {
        self.interfaces.entry(key).or_insert_with(|| {
            trace!("add interface {} ({})", key, name);
            MdnsInterface::new(key, name)
        })
    }

    /// Removes an interface together with its cache.
    pub fn remove_interface(&mut self, key: &IntfKey) -> Option<MdnsInterface> {
        self.interfaces.remove(key)
    }

    pub fn get_interface(&self, index: u32, ip_version: IpVersion) -> Option<&MdnsInterface> {
        self.interfaces.get(&IntfKey::new(index, ip_version))
    }

    pub fn get_interface_mut(
        &mut self,
        index: u32,
        ip_version: IpVersion,
    ) -> Option<&mut MdnsInterface> {
        self.interfaces.get_mut(&IntfKey::new(index, ip_version))
    }

    /// Returns the keys of the interfaces within `scope`, in ascending order.
    pub fn matching(&self, scope: &IfScope) -> Vec<IntfKey> {
        self.interfaces
            .keys()
            .filter(|key| scope.matches(key))
            .copied()
            .collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut MdnsInterface> {
        self.interfaces.values_mut()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

/// Returns valid network interfaces in the host system.
/// Loopback interfaces are excluded.
fn my_ip_interfaces() -> Vec<Interface> {
    if_addrs::get_if_addrs()
        .unwrap_or_default()
        .into_iter()
        .filter(|i| !i.is_loopback())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{IfScope, IntfKey, InterfaceMonitor, IpVersion};
    use test_log::test;

    #[test]
    fn test_scope_matches() {
        let eth_v4 = IntfKey::new(2, IpVersion::V4);
        let eth_v6 = IntfKey::new(2, IpVersion::V6);
        let wlan_v4 = IntfKey::new(3, IpVersion::V4);

        assert!(IfScope::any().matches(&eth_v4));
        assert!(IfScope::any().matches(&wlan_v4));

        let scope = IfScope::new(2, IpVersion::V4);
        assert!(scope.matches(&eth_v4));
        assert!(!scope.matches(&eth_v6));
        assert!(!scope.matches(&wlan_v4));

        let all_v6 = IfScope {
            index: None,
            ip_version: Some(IpVersion::V6),
        };
        assert!(all_v6.matches(&eth_v6));
        assert!(!all_v6.matches(&eth_v4));
    }

    #[test]
    fn test_monitor_lookup() {
        let mut monitor = InterfaceMonitor::new();
        monitor.add_interface(IntfKey::new(3, IpVersion::V4), "wlan0");
        monitor.add_interface(IntfKey::new(2, IpVersion::V6), "eth0");
        monitor.add_interface(IntfKey::new(2, IpVersion::V4), "eth0");

        assert_eq!(monitor.len(), 3);
        assert_eq!(
            monitor.get_interface(3, IpVersion::V4).map(|i| i.name()),
            Some("wlan0")
        );
        assert!(monitor.get_interface(3, IpVersion::V6).is_none());

        let keys = monitor.matching(&IfScope::any());
        assert_eq!(
            keys,
            vec![
                IntfKey::new(2, IpVersion::V4),
                IntfKey::new(2, IpVersion::V6),
                IntfKey::new(3, IpVersion::V4)
            ]
        );

        assert!(monitor
            .remove_interface(&IntfKey::new(2, IpVersion::V6))
            .is_some());
        assert_eq!(monitor.matching(&IfScope::new(2, IpVersion::V6)), vec![]);
    }

    #[test]
    fn test_monitor_from_system() {
        let monitor = InterfaceMonitor::from_system();
        for key in monitor.matching(&IfScope::any()) {
            let intf = monitor.get_interface(key.index, key.ip_version).unwrap();
            assert!(!intf.addrs().is_empty());
            assert!(intf.cache().is_empty());
        }
    }
}

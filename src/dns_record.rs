//! DNS resource records as kept in the cache.
//!
//! [DnsKey] is the (name, class, type) identity of a record, which can also be
//! used as a pattern when its type or class is a wildcard.
//! [DnsRecordExt] is the common trait of all resource records, and its
//! [`matches`](DnsRecordExt::matches) is the TTL-insensitive equality used for
//! reconfirmation.

use std::{
    any::Any,
    fmt,
    net::IpAddr,
    rc::Rc,
    time::SystemTime,
};

/// DNS resource record types, stored as `u16`. Can do `as u16` when needed.
///
/// See [RFC 1035 section 3.2.2](https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.2)
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
#[non_exhaustive]
#[repr(u16)]
pub enum RRType {
    /// DNS record type for IPv4 address
    A = 1,

    /// DNS record type for Canonical Name
    CNAME = 5,

    /// DNS record type for Pointer
    PTR = 12,

    /// DNS record type for Host Info
    HINFO = 13,

    /// DNS record type for Text (properties)
    TXT = 16,

    /// DNS record type for IPv6 address
    AAAA = 28,

    /// DNS record type for Service
    SRV = 33,

    /// DNS record type for Negative Responses
    NSEC = 47,

    /// DNS record type for any records (wildcard)
    ANY = 255,
}

impl RRType {
    /// Converts `u16` into `RRType` if possible.
    ///
    /// `0` is accepted as the wildcard type and becomes [RRType::ANY].
    pub const fn from_u16(value: u16) -> Option<RRType> {
        match value {
            0 | 255 => Some(RRType::ANY),
            1 => Some(RRType::A),
            5 => Some(RRType::CNAME),
            12 => Some(RRType::PTR),
            13 => Some(RRType::HINFO),
            16 => Some(RRType::TXT),
            28 => Some(RRType::AAAA),
            33 => Some(RRType::SRV),
            47 => Some(RRType::NSEC),
            _ => None,
        }
    }
}

impl fmt::Display for RRType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RRType::A => write!(f, "TYPE_A"),
            RRType::CNAME => write!(f, "TYPE_CNAME"),
            RRType::PTR => write!(f, "TYPE_PTR"),
            RRType::HINFO => write!(f, "TYPE_HINFO"),
            RRType::TXT => write!(f, "TYPE_TXT"),
            RRType::AAAA => write!(f, "TYPE_AAAA"),
            RRType::SRV => write!(f, "TYPE_SRV"),
            RRType::NSEC => write!(f, "TYPE_NSEC"),
            RRType::ANY => write!(f, "TYPE_ANY"),
        }
    }
}

/// The class value for the Internet.
pub const CLASS_IN: u16 = 1;

/// The class value for any class (wildcard).
pub const CLASS_ANY: u16 = 255;

pub const CLASS_MASK: u16 = 0x7FFF;

/// Cache-flush bit: the most significant bit of the rrclass field of the resource record.
pub const CLASS_CACHE_FLUSH: u16 = 0x8000;

/// A convenience type alias for DNS record trait objects owned by a cache.
pub type DnsRecordBox = Box<dyn DnsRecordExt>;

/// A shared, reference counted DNS record.
///
/// This is how a record is handed around as the context of a record browser.
pub type DnsRecordRc = Rc<dyn DnsRecordExt>;

impl Clone for DnsRecordBox {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The lookup key of a resource record: (name, class, type).
///
/// Names are compared ASCII case-insensitively. A key with type [RRType::ANY]
/// or class [CLASS_ANY] is a pattern.
#[derive(Debug, Clone, Eq)]
pub struct DnsKey {
    name: String,
    class: u16,
    ty: RRType,
}

impl DnsKey {
    pub fn new(name: &str, class: u16, ty: RRType) -> Self {
        Self {
            name: name.to_string(),
            class: class & CLASS_MASK,
            ty,
        }
    }

    /// Creates a key from raw wire values. Type `0` is the wildcard type.
    ///
    /// Returns `None` if `ty` is not supported.
    pub fn from_raw(name: &str, class: u16, ty: u16) -> Option<Self> {
        RRType::from_u16(ty).map(|ty| Self::new(name, class, ty))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn class(&self) -> u16 {
        self.class
    }

    pub const fn ty(&self) -> RRType {
        self.ty
    }

    /// Returns true if this key has a wildcard type or class.
    pub fn is_pattern(&self) -> bool {
        self.ty == RRType::ANY || self.class == CLASS_ANY
    }

    /// Returns true if `other` is covered by this key, treating wildcards
    /// in this key as matching anything.
    pub fn matches(&self, other: &DnsKey) -> bool {
        names_equal(&self.name, &other.name)
            && (self.class == CLASS_ANY || self.class == other.class)
            && (self.ty == RRType::ANY || self.ty == other.ty)
    }
}

impl PartialEq for DnsKey {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.class == other.class && names_equal(&self.name, &other.name)
    }
}

impl fmt::Display for DnsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} class {} {}", self.name, self.class, self.ty)
    }
}

/// Domain names are compared ignoring ASCII case, and an optional trailing root dot.
pub(crate) fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// A DNS Resource Record - a key, but has a TTL.
/// RFC: https://www.rfc-editor.org/rfc/rfc1035#section-3.2.1
#[derive(Debug, Clone)]
pub struct DnsRecord {
    pub(crate) key: DnsKey,
    cache_flush: bool,
    ttl: u32,     // in seconds, 0 means this record should not be cached
    created: u64, // UNIX time in millis
    expires: u64, // expires at this UNIX time in millis
}

impl DnsRecord {
    fn new(name: &str, ty: RRType, class: u16, ttl: u32) -> Self {
        let created = current_time_millis();
        let expires = get_expiration_time(created, ttl, 100);

        Self {
            key: DnsKey::new(name, class, ty),
            cache_flush: (class & CLASS_CACHE_FLUSH) != 0,
            ttl,
            created,
            expires,
        }
    }

    pub const fn get_ttl(&self) -> u32 {
        self.ttl
    }

    pub const fn get_expire_time(&self) -> u64 {
        self.expires
    }

    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.expires
    }

    /// Return the absolute time for this record being created
    pub const fn get_created(&self) -> u64 {
        self.created
    }

    /// Set the absolute expiration time in millis
    fn set_expire(&mut self, expire_at: u64) {
        self.expires = expire_at;
    }

    fn reset_ttl(&mut self, other: &Self) {
        self.ttl = other.ttl;
        self.created = other.created;
        self.expires = get_expiration_time(self.created, self.ttl, 100);
    }
}

/// Two records are the same record if their keys are the same; TTL and
/// the cache-flush bit do not count.
impl PartialEq for DnsRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Common methods for DNS resource records.
pub trait DnsRecordExt: fmt::Debug {
    fn get_record(&self) -> &DnsRecord;
    fn get_record_mut(&mut self) -> &mut DnsRecord;
    fn any(&self) -> &dyn Any;

    /// Returns whether `other` record is considered the same except TTL.
    fn matches(&self, other: &dyn DnsRecordExt) -> bool;

    /// Returns whether `other` record has the same rdata.
    fn rrdata_match(&self, other: &dyn DnsRecordExt) -> bool;

    /// Returns a human-readable string of rdata.
    fn rdata_print(&self) -> String;

    fn clone_box(&self) -> DnsRecordBox;

    fn key(&self) -> &DnsKey {
        &self.get_record().key
    }

    /// Returns the class only, excluding class_flush / unique bit.
    fn get_class(&self) -> u16 {
        self.get_record().key.class
    }

    fn get_cache_flush(&self) -> bool {
        self.get_record().cache_flush
    }

    fn get_name(&self) -> &str {
        &self.get_record().key.name
    }

    fn get_type(&self) -> RRType {
        self.get_record().key.ty
    }

    /// Resets TTL using `other` record.
    /// `self.expires` is also reset.
    fn reset_ttl(&mut self, other: &dyn DnsRecordExt) {
        self.get_record_mut().reset_ttl(other.get_record());
    }

    fn get_created(&self) -> u64 {
        self.get_record().get_created()
    }

    fn get_expire(&self) -> u64 {
        self.get_record().get_expire_time()
    }

    fn set_expire(&mut self, expire_at: u64) {
        self.get_record_mut().set_expire(expire_at);
    }

    /// Set expire as `expire_at` if it is sooner than the current `expire`.
    fn set_expire_sooner(&mut self, expire_at: u64) {
        if expire_at < self.get_expire() {
            self.get_record_mut().set_expire(expire_at);
        }
    }
}

/// Resource Record for IPv4 address or IPv6 address.
#[derive(Debug, Clone)]
pub struct DnsAddress {
    pub(crate) record: DnsRecord,
    address: IpAddr,
}

impl DnsAddress {
    pub fn new(name: &str, ty: RRType, class: u16, ttl: u32, address: IpAddr) -> Self {
        let record = DnsRecord::new(name, ty, class, ttl);
        Self { record, address }
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }
}

impl DnsRecordExt for DnsAddress {
    fn get_record(&self) -> &DnsRecord {
        &self.record
    }

    fn get_record_mut(&mut self) -> &mut DnsRecord {
        &mut self.record
    }

    fn any(&self) -> &dyn Any {
        self
    }

    fn matches(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_a) = other.any().downcast_ref::<Self>() {
            return self.address == other_a.address && self.record == other_a.record;
        }
        false
    }

    fn rrdata_match(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_a) = other.any().downcast_ref::<Self>() {
            return self.address == other_a.address;
        }
        false
    }

    fn rdata_print(&self) -> String {
        format!("{}", self.address)
    }

    fn clone_box(&self) -> DnsRecordBox {
        Box::new(self.clone())
    }
}

/// Resource Record for a DNS pointer
#[derive(Debug, Clone)]
pub struct DnsPointer {
    record: DnsRecord,
    alias: String, // the full name of Service Instance
}

impl DnsPointer {
    pub fn new(name: &str, ty: RRType, class: u16, ttl: u32, alias: String) -> Self {
        let record = DnsRecord::new(name, ty, class, ttl);
        Self { record, alias }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl DnsRecordExt for DnsPointer {
    fn get_record(&self) -> &DnsRecord {
        &self.record
    }

    fn get_record_mut(&mut self) -> &mut DnsRecord {
        &mut self.record
    }

    fn any(&self) -> &dyn Any {
        self
    }

    fn matches(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_ptr) = other.any().downcast_ref::<Self>() {
            return names_equal(&self.alias, &other_ptr.alias) && self.record == other_ptr.record;
        }
        false
    }

    fn rrdata_match(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_ptr) = other.any().downcast_ref::<Self>() {
            return names_equal(&self.alias, &other_ptr.alias);
        }
        false
    }

    fn rdata_print(&self) -> String {
        self.alias.clone()
    }

    fn clone_box(&self) -> DnsRecordBox {
        Box::new(self.clone())
    }
}

/// Resource Record for a DNS service.
#[derive(Debug, Clone)]
pub struct DnsSrv {
    pub(crate) record: DnsRecord,
    pub(crate) priority: u16, // lower number means higher priority. Should be 0 in common cases.
    pub(crate) weight: u16,   // Should be 0 in common cases
    host: String,
    port: u16,
}

impl DnsSrv {
    pub fn new(
        name: &str,
        class: u16,
        ttl: u32,
        priority: u16,
        weight: u16,
        port: u16,
        host: String,
    ) -> Self {
        let record = DnsRecord::new(name, RRType::SRV, class, ttl);
        Self {
            record,
            priority,
            weight,
            host,
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl DnsRecordExt for DnsSrv {
    fn get_record(&self) -> &DnsRecord {
        &self.record
    }

    fn get_record_mut(&mut self) -> &mut DnsRecord {
        &mut self.record
    }

    fn any(&self) -> &dyn Any {
        self
    }

    fn matches(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_svc) = other.any().downcast_ref::<Self>() {
            return self.rrdata_match(other) && self.record == other_svc.record;
        }
        false
    }

    fn rrdata_match(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_srv) = other.any().downcast_ref::<Self>() {
            return names_equal(&self.host, &other_srv.host)
                && self.port == other_srv.port
                && self.weight == other_srv.weight
                && self.priority == other_srv.priority;
        }
        false
    }

    fn rdata_print(&self) -> String {
        format!(
            "priority: {}, weight: {}, port: {}, host: {}",
            self.priority, self.weight, self.port, self.host
        )
    }

    fn clone_box(&self) -> DnsRecordBox {
        Box::new(self.clone())
    }
}

/// Resource Record for a DNS TXT record.
///
/// The text is kept as the raw rdata: a sequence of length-prefixed strings.
#[derive(Debug, Clone)]
pub struct DnsTxt {
    pub(crate) record: DnsRecord,
    text: Vec<u8>,
}

impl DnsTxt {
    pub fn new(name: &str, class: u16, ttl: u32, text: Vec<u8>) -> Self {
        let record = DnsRecord::new(name, RRType::TXT, class, ttl);
        Self { record, text }
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }
}

impl DnsRecordExt for DnsTxt {
    fn get_record(&self) -> &DnsRecord {
        &self.record
    }

    fn get_record_mut(&mut self) -> &mut DnsRecord {
        &mut self.record
    }

    fn any(&self) -> &dyn Any {
        self
    }

    fn matches(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_txt) = other.any().downcast_ref::<Self>() {
            return self.text == other_txt.text && self.record == other_txt.record;
        }
        false
    }

    fn rrdata_match(&self, other: &dyn DnsRecordExt) -> bool {
        if let Some(other_txt) = other.any().downcast_ref::<Self>() {
            return self.text == other_txt.text;
        }
        false
    }

    fn rdata_print(&self) -> String {
        format!("{:?}", String::from_utf8_lossy(&self.text))
    }

    fn clone_box(&self) -> DnsRecordBox {
        Box::new(self.clone())
    }
}

/// Returns UNIX time in millis
pub(crate) fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Returns the UNIX time in millis at which `percent` of `ttl` has passed since `created`.
const fn get_expiration_time(created: u64, ttl: u32, percent: u32) -> u64 {
    // 'created' is in millis, 'ttl' is in seconds, hence:
    // ttl * 1000 * (percent / 100) => ttl * percent * 10
    created + (ttl as u64) * (percent as u64) * 10
}

#[cfg(test)]
mod tests {
    use super::{
        DnsAddress, DnsKey, DnsPointer, DnsRecordExt, DnsSrv, DnsTxt, RRType, CLASS_ANY,
        CLASS_CACHE_FLUSH, CLASS_IN,
    };
    use std::net::{IpAddr, Ipv4Addr};
    use test_log::test;

    #[test]
    fn test_matches_ignores_ttl() {
        let a = DnsPointer::new(
            "_http._tcp.local",
            RRType::PTR,
            CLASS_IN,
            4500,
            "printer._http._tcp.local".to_string(),
        );
        let b = DnsPointer::new(
            "_http._tcp.local",
            RRType::PTR,
            CLASS_IN,
            10,
            "printer._http._tcp.local".to_string(),
        );

        assert_ne!(a.get_record().get_ttl(), b.get_record().get_ttl());
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn test_matches_ignores_case_and_cache_flush() {
        let srv_a = DnsSrv::new(
            "MyPrinter._ipp._tcp.local",
            CLASS_IN,
            120,
            0,
            0,
            631,
            "printer.local".to_string(),
        );
        let srv_b = DnsSrv::new(
            "myprinter._IPP._tcp.local.",
            CLASS_IN | CLASS_CACHE_FLUSH,
            60,
            0,
            0,
            631,
            "PRINTER.local.".to_string(),
        );

        assert!(srv_b.get_cache_flush());
        assert!(srv_a.matches(&srv_b));
        assert!(srv_b.matches(&srv_a));
    }

    #[test]
    fn test_matches_rdata_and_type() {
        let addr = |ip: [u8; 4]| {
            DnsAddress::new(
                "host.local",
                RRType::A,
                CLASS_IN,
                120,
                IpAddr::V4(Ipv4Addr::from(ip)),
            )
        };
        assert!(addr([192, 168, 1, 2]).matches(&addr([192, 168, 1, 2])));
        assert!(!addr([192, 168, 1, 2]).matches(&addr([192, 168, 1, 3])));

        // Same name, different record types never match.
        let txt = DnsTxt::new("host.local", CLASS_IN, 120, vec![3, b'a', b'=', b'b']);
        assert!(!addr([192, 168, 1, 2]).matches(&txt));
        assert!(!txt.matches(&addr([192, 168, 1, 2])));
    }

    #[test]
    fn test_key_pattern() {
        let wildcard = DnsKey::from_raw("Host.local", CLASS_IN, 0).unwrap();
        assert!(wildcard.is_pattern());
        assert_eq!(wildcard.ty(), RRType::ANY);

        let a_key = DnsKey::new("host.local", CLASS_IN, RRType::A);
        assert!(!a_key.is_pattern());
        assert!(wildcard.matches(&a_key));
        assert!(!a_key.matches(&wildcard));

        let any_class = DnsKey::new("host.local", CLASS_ANY, RRType::A);
        assert!(any_class.matches(&a_key));

        assert!(DnsKey::from_raw("host.local", CLASS_IN, 999).is_none());
    }
}

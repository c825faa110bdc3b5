//! Record reconfirmation for a Multicast DNS cache.
//!
//! A cached record may be stale long before its TTL runs out, for example
//! when a connection to the advertised service fails. Instead of waiting,
//! the record can be reconfirmed: the cache queries the network for it again
//! and flushes it if nobody answers within ten seconds.
//! See [RFC 6762 section 10.4](https://datatracker.ietf.org/doc/html/rfc6762#section-10.4).
//!
//! An [`MdnsServer`] holds the network interfaces, each with its own cache.
//! Calling [`record_reconfirm`](MdnsServer::record_reconfirm) starts a short
//! lived record browser that finds the cached copies of the record and marks
//! them for reconfirmation. For an SRV record, the PTR record of its service
//! type is reconfirmed too.
//!
//! The server is single threaded and does not do any network I/O itself.
//! The owner feeds it with answers through [`cache_update`](MdnsServer::cache_update),
//! drives it with [`dispatch`](MdnsServer::dispatch) and
//! [`run_timers`](MdnsServer::run_timers), and sends the queries it asks for
//! in [`ServerEvent::Query`] events from a [`monitor`](MdnsServer::monitor)
//! channel.
//!
//! # Example
//!
//! ```rust
//! use mdns_reconfirm::{
//!     DnsPointer, DnsRecordExt, DnsRecordRc, IfScope, IntfKey, IpVersion, MdnsServer, RRType,
//!     CLASS_IN,
//! };
//! use std::rc::Rc;
//!
//! let mut server = MdnsServer::new();
//! let eth0 = IntfKey::new(2, IpVersion::V4);
//! server.add_interface(eth0, "eth0");
//!
//! // An answer from the network, cached on eth0.
//! let answer = DnsPointer::new(
//!     "_http._tcp.local",
//!     RRType::PTR,
//!     CLASS_IN,
//!     4500,
//!     "printer._http._tcp.local".to_string(),
//! );
//! server.cache_update(eth0, Box::new(answer.clone())).unwrap();
//!
//! // The printer does not respond: reconfirm its PTR record.
//! let record: DnsRecordRc = Rc::new(answer);
//! server.record_reconfirm(IfScope::from(eth0), &record).unwrap();
//! server.dispatch();
//!
//! let cache = server.get_interface(2, IpVersion::V4).unwrap().cache();
//! assert!(cache.lookup(record.key()).all(|e| e.is_reconfirming()));
//! ```
//!
//! # Logging
//!
//! With the default `logging` feature, this crate logs through the
//! [`log`](https://crates.io/crates/log) facade.

#![forbid(unsafe_code)]

#[cfg(feature = "logging")]
pub(crate) use log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! trace {
        ($($arg:expr),*) => {
            {
                let _ = ($($arg),*); // avoid warnings about unused variables.
            }
        };
    }

    macro_rules! debug {
        ($($arg:expr),*) => {
            {
                let _ = ($($arg),*);
            }
        };
    }

    macro_rules! warn {
        ($($arg:expr),*) => {
            {
                let _ = ($($arg),*);
            }
        };
    }
}

mod dns_cache;
mod dns_name;
mod dns_record;
mod error;
mod interface;
mod reconfirm;
mod record_browser;
mod server;

pub use dns_cache::{CacheEntry, DnsCache};
pub use dns_name::{check_domain_name, service_name_split, DOMAIN_NAME_LEN_MAX, LABEL_LEN_MAX};
pub use dns_record::{
    DnsAddress, DnsKey, DnsPointer, DnsRecord, DnsRecordBox, DnsRecordExt, DnsRecordRc, DnsSrv,
    DnsTxt, RRType, CLASS_ANY, CLASS_CACHE_FLUSH, CLASS_IN, CLASS_MASK,
};
pub use error::{Error, Result};
pub use interface::{IfScope, IntfKey, InterfaceMonitor, IpVersion, MdnsInterface};
pub use record_browser::{BrowseEvent, BrowseHandler, BrowseResult, BrowserId, RecordSource};
pub use server::{
    MdnsServer, Metrics, ServerEvent, ServerOption, ALL_FOR_NOW_DELAY,
    RECONFIRM_TIMEOUT_DEFAULT, RECORD_BROWSERS_MAX_DEFAULT,
};

/// Re-export from `flume`.
pub use flume::Receiver;

//! Record browsers: short-lived subscriptions to the records of one key.
//!
//! A browser first replays the matching records already in the caches of its
//! scope, then reports [BrowseEvent::CacheExhausted]. If it is still alive after
//! that, it goes on reporting records added to or removed from the caches.

use crate::{
    dns_record::{DnsKey, DnsRecordExt, DnsRecordRc},
    error::Error,
    interface::{IfScope, IntfKey},
    server::MdnsServer,
};
use std::fmt;

/// Identifies a record browser within a server. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrowserId(pub(crate) u64);

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "browser-{}", self.0)
    }
}

/// Where a discovered record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Replayed from a cache when the browser started.
    Cache,

    /// Newly added to a cache by an answer from the network.
    Network,
}

/// A record reported by a browser, and the interface it was found on.
#[derive(Debug, Clone)]
pub struct BrowseResult {
    pub intf: IntfKey,
    pub record: DnsRecordRc,
    pub source: RecordSource,
}

/// All events a record browser delivers to its handler.
#[derive(Debug, Clone)]
pub enum BrowseEvent {
    /// A record matching the browser key.
    Discovered(BrowseResult),

    /// A record previously discovered was removed from its cache.
    Removed(BrowseResult),

    /// All records in the caches were delivered. Always the last event of the replay.
    CacheExhausted,

    /// No more records are expected from the network for now.
    AllForNow,

    /// The browser cannot go on, e.g. its interface went away.
    Failure(Error),
}

/// The handler of a record browser's events.
///
/// Events are delivered one at a time from [MdnsServer::dispatch], and the
/// handler gets the server back so it can look into caches, record errors or
/// free its own browser.
pub trait BrowseHandler {
    fn handle(&mut self, server: &mut MdnsServer, browser: BrowserId, event: BrowseEvent);
}

impl<F> BrowseHandler for F
where
    F: FnMut(&mut MdnsServer, BrowserId, BrowseEvent),
{
    fn handle(&mut self, server: &mut MdnsServer, browser: BrowserId, event: BrowseEvent) {
        self(server, browser, event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BrowserState {
    /// Created, the cache replay is not done yet.
    Replaying,

    /// The cache replay is done, following cache changes.
    Live,
}

pub(crate) struct RecordBrowser {
    pub(crate) scope: IfScope,
    pub(crate) key: DnsKey,

    /// Taken out while an event is being handled.
    pub(crate) handler: Option<Box<dyn BrowseHandler>>,

    pub(crate) state: BrowserState,

    /// UNIX time in millis to report `AllForNow`, if not yet reported.
    pub(crate) all_for_now_at: Option<u64>,
}

impl RecordBrowser {
    pub(crate) fn new(
        scope: IfScope,
        key: DnsKey,
        handler: Box<dyn BrowseHandler>,
        all_for_now_at: u64,
    ) -> Self {
        Self {
            scope,
            key,
            handler: Some(handler),
            state: BrowserState::Replaying,
            all_for_now_at: Some(all_for_now_at),
        }
    }

    /// Returns true if a change of `record` on `intf` should be reported to this browser.
    pub(crate) fn follows(&self, intf: &IntfKey, record: &dyn DnsRecordExt) -> bool {
        self.state == BrowserState::Live
            && self.scope.matches(intf)
            && self.key.matches(record.key())
    }
}

impl fmt::Debug for RecordBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBrowser")
            .field("scope", &self.scope)
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

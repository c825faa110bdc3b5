//! The server context: interfaces with their caches, record browsers and
//! the event loop hooks that drive them.
//!
//! The server is single threaded. Nothing here blocks: the owner calls
//! [MdnsServer::dispatch] to deliver browser events, and
//! [MdnsServer::run_timers] when the earliest timer from
//! [MdnsServer::next_timer] is due.

#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::{
    dns_name::check_domain_name,
    dns_record::{current_time_millis, DnsKey, DnsRecordBox, DnsRecordRc, RRType},
    error::{e_fmt, Error, Result},
    interface::{IfScope, IntfKey, InterfaceMonitor, IpVersion, MdnsInterface},
    record_browser::{
        BrowseEvent, BrowseHandler, BrowseResult, BrowserId, BrowserState, RecordBrowser,
        RecordSource,
    },
    Receiver,
};
use flume::{bounded, Sender, TrySendError};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap, HashMap, VecDeque},
    fmt,
    rc::Rc,
    time::Duration,
};

/// The default time for a reconfirmed record to be answered before it is
/// flushed from the cache: 10 seconds, per
/// [RFC 6762 section 10.4](https://datatracker.ietf.org/doc/html/rfc6762#section-10.4)
pub const RECONFIRM_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);

/// The default max number of record browsers alive at the same time.
pub const RECORD_BROWSERS_MAX_DEFAULT: usize = 4096;

/// Delay after a browser is created before it reports [BrowseEvent::AllForNow].
pub const ALL_FOR_NOW_DELAY: Duration = Duration::from_secs(1);

/// Different counters included in the metrics.
#[derive(Hash, Eq, PartialEq)]
pub(crate) enum Counter {
    BrowserNew,
    BrowserFree,
    Reconfirm,
    ReconfirmQuery,
    CacheEvict,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BrowserNew => write!(f, "browser-new"),
            Self::BrowserFree => write!(f, "browser-free"),
            Self::Reconfirm => write!(f, "reconfirm"),
            Self::ReconfirmQuery => write!(f, "reconfirm-query"),
            Self::CacheEvict => write!(f, "cache-evict"),
        }
    }
}

/// The metrics is a HashMap of (name_key, i64_value).
pub type Metrics = HashMap<String, i64>;

/// Some notable events from the server, for monitors possibly in other threads.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ServerEvent {
    /// A query (name, type) should be sent on the interface to reconfirm cached records.
    Query(IntfKey, String, RRType),

    /// A record (name, type) expired from the cache of the interface.
    Expired(IntfKey, String, RRType),

    /// An error was recorded as the last error.
    Error(Error),
}

/// Options to change the server behavior.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ServerOption {
    /// How long a reconfirmed record may stay without an answer.
    ReconfirmTimeout(Duration),

    /// Max number of record browsers alive at the same time.
    RecordBrowsersMax(usize),
}

/// A multicast DNS server context.
pub struct MdnsServer {
    /// Interfaces with their caches.
    monitor: InterfaceMonitor,

    /// Active record browsers.
    browsers: BTreeMap<BrowserId, RecordBrowser>,

    next_browser_id: u64,

    /// Browsers waiting for their cache replay.
    replays: VecDeque<BrowserId>,

    /// Events waiting to be delivered.
    pending: VecDeque<(BrowserId, BrowseEvent)>,

    /// True while `dispatch` runs.
    dispatching: bool,

    /// The last error recorded. Overwritten by every new error.
    error: Option<Error>,

    counters: Metrics,

    /// Channels to notify events.
    monitors: Vec<Sender<ServerEvent>>,

    /// Timestamps in UNIX millis where `run_timers` has something to do.
    timers: BinaryHeap<Reverse<u64>>,

    reconfirm_timeout: Duration,

    record_browsers_max: usize,
}

impl Default for MdnsServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MdnsServer {
    /// Creates a server without any interface.
    pub fn new() -> Self {
        Self::with_monitor(InterfaceMonitor::new())
    }

    /// Creates a server with the network interfaces of the host.
    pub fn with_system_interfaces() -> Self {
        Self::with_monitor(InterfaceMonitor::from_system())
    }

    fn with_monitor(monitor: InterfaceMonitor) -> Self {
        Self {
            monitor,
            browsers: BTreeMap::new(),
            next_browser_id: 1,
            replays: VecDeque::new(),
            pending: VecDeque::new(),
            dispatching: false,
            error: None,
            counters: HashMap::new(),
            monitors: Vec::new(),
            timers: BinaryHeap::new(),
            reconfirm_timeout: RECONFIRM_TIMEOUT_DEFAULT,
            record_browsers_max: RECORD_BROWSERS_MAX_DEFAULT,
        }
    }

    pub fn set_option(&mut self, option: ServerOption) -> Result<()> {
        debug!("set option: {:?}", &option);
        match option {
            ServerOption::ReconfirmTimeout(timeout) => {
                if timeout.is_zero() {
                    return Err(e_fmt!("reconfirm timeout cannot be zero"));
                }
                self.reconfirm_timeout = timeout;
            }
            ServerOption::RecordBrowsersMax(max) => self.record_browsers_max = max,
        }
        Ok(())
    }

    /// Changes how long a reconfirmed record may stay in the cache without
    /// being answered. The default is [RECONFIRM_TIMEOUT_DEFAULT].
    pub fn set_reconfirm_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.set_option(ServerOption::ReconfirmTimeout(timeout))
    }

    /// Changes the max number of record browsers. The default is
    /// [RECORD_BROWSERS_MAX_DEFAULT].
    pub fn set_record_browsers_max(&mut self, max: usize) -> Result<()> {
        self.set_option(ServerOption::RecordBrowsersMax(max))
    }

    pub(crate) fn reconfirm_timeout_millis(&self) -> u64 {
        self.reconfirm_timeout.as_millis() as u64
    }

    /// Returns a channel receiver for [ServerEvent]s.
    pub fn monitor(&mut self) -> Receiver<ServerEvent> {
        let (sender, receiver) = bounded(100);
        self.monitors.push(sender);
        receiver
    }

    fn notify_monitors(&mut self, event: ServerEvent) {
        // Only retain the monitors that are still connected.
        self.monitors.retain(|sender| {
            if let Err(e) = sender.try_send(event.clone()) {
                debug!("notify_monitors: try_send: {}", &e);
                if matches!(e, TrySendError::Disconnected(_)) {
                    return false; // This monitor is dropped.
                }
            }
            true
        });
    }

    /// Returns the current values of the counters.
    pub fn get_metrics(&self) -> Metrics {
        self.counters.clone()
    }

    pub(crate) fn increase_counter(&mut self, counter: Counter, count: i64) {
        let key = counter.to_string();
        match self.counters.get_mut(&key) {
            Some(v) => *v += count,
            None => {
                self.counters.insert(key, count);
            }
        }
    }

    /// Returns the last error recorded by event handling, if any.
    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Records `error` as the last error, replacing the previous one.
    pub(crate) fn set_error(&mut self, error: Error) {
        debug!("set last error: {}", &error);
        self.notify_monitors(ServerEvent::Error(error.clone()));
        self.error = Some(error);
    }

    pub(crate) fn add_timer(&mut self, next_time: u64) {
        self.timers.push(Reverse(next_time));
    }

    /// Returns the earliest time in UNIX millis at which [run_timers](Self::run_timers)
    /// should be called.
    pub fn next_timer(&self) -> Option<u64> {
        self.timers.peek().map(|Reverse(v)| *v)
    }

    pub fn interfaces(&self) -> &InterfaceMonitor {
        &self.monitor
    }

    pub(crate) fn interfaces_mut(&mut self) -> &mut InterfaceMonitor {
        &mut self.monitor
    }

    pub fn get_interface(&self, index: u32, ip_version: IpVersion) -> Option<&MdnsInterface> {
        self.monitor.get_interface(index, ip_version)
    }

    /// Adds an interface with an empty cache. No-op if it exists already.
    pub fn add_interface(&mut self, key: IntfKey, name: &str) {
        self.monitor.add_interface(key, name);
    }

    /// Removes an interface and its cache.
    ///
    /// Browsers bound to exactly this interface get a [BrowseEvent::Failure].
    pub fn remove_interface(&mut self, key: &IntfKey) -> bool {
        if self.monitor.remove_interface(key).is_none() {
            return false;
        }

        let scope = IfScope::from(*key);
        let failed: Vec<BrowserId> = self
            .browsers
            .iter()
            .filter(|(_, b)| b.scope == scope)
            .map(|(id, _)| *id)
            .collect();
        for id in failed {
            self.pending
                .push_back((id, BrowseEvent::Failure(Error::InvalidInterface)));
        }
        true
    }

    /// Adds or updates a record in the cache of `intf`, as received from the network.
    ///
    /// A new record is reported to the live browsers that follow it.
    pub fn cache_update(&mut self, intf: IntfKey, record: DnsRecordBox) -> Result<()> {
        let now = current_time_millis();
        let shared: DnsRecordRc = Rc::from(record.clone_box());
        let mut timers = Vec::new();

        let is_new = self
            .monitor
            .get_interface_mut(intf.index, intf.ip_version)
            .ok_or(Error::InvalidInterface)?
            .cache
            .add_or_update(record, now, &mut timers);

        for timer in timers {
            self.add_timer(timer);
        }

        if is_new {
            trace!("new record on {}: {:?}", intf, &shared);
            self.notify_browsers(&intf, &shared, RecordSource::Network, true);
        }
        Ok(())
    }

    fn notify_browsers(
        &mut self,
        intf: &IntfKey,
        record: &DnsRecordRc,
        source: RecordSource,
        added: bool,
    ) {
        for (id, browser) in self.browsers.iter() {
            if !browser.follows(intf, record.as_ref()) {
                continue;
            }
            let result = BrowseResult {
                intf: *intf,
                record: Rc::clone(record),
                source,
            };
            let event = if added {
                BrowseEvent::Discovered(result)
            } else {
                BrowseEvent::Removed(result)
            };
            self.pending.push_back((*id, event));
        }
    }

    /// Creates a record browser for `key` within `scope`.
    ///
    /// The browser replays the matching cached records to `handler` on the next
    /// [dispatch](Self::dispatch), followed by [BrowseEvent::CacheExhausted].
    ///
    /// On error `handler` is dropped before returning.
    pub fn record_browser_new<H>(&mut self, scope: IfScope, key: DnsKey, handler: H) -> Result<BrowserId>
    where
        H: BrowseHandler + 'static,
    {
        check_domain_name(key.name())?;

        if self.browsers.len() >= self.record_browsers_max {
            debug!("too many record browsers: {}", self.browsers.len());
            return Err(Error::TooManyObjects);
        }

        let id = BrowserId(self.next_browser_id);
        self.next_browser_id += 1;

        let all_for_now_at = current_time_millis() + ALL_FOR_NOW_DELAY.as_millis() as u64;
        self.add_timer(all_for_now_at);

        trace!("new {} for {} in {:?}", id, &key, &scope);
        self.browsers.insert(
            id,
            RecordBrowser::new(scope, key, Box::new(handler), all_for_now_at),
        );
        self.replays.push_back(id);
        self.increase_counter(Counter::BrowserNew, 1);

        Ok(id)
    }

    /// Frees a record browser. No more events are delivered to it afterwards.
    ///
    /// Returns false if the browser does not exist.
    pub fn record_browser_free(&mut self, id: BrowserId) -> bool {
        if self.browsers.remove(&id).is_none() {
            return false;
        }
        trace!("free {}", id);
        self.increase_counter(Counter::BrowserFree, 1);
        true
    }

    pub fn has_record_browser(&self, id: BrowserId) -> bool {
        self.browsers.contains_key(&id)
    }

    pub fn record_browser_count(&self) -> usize {
        self.browsers.len()
    }

    /// Delivers all pending browser events, including cache replays of new
    /// browsers. Handlers may create or free browsers; their events are
    /// delivered in the same call.
    pub fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;

        loop {
            if let Some(id) = self.replays.pop_front() {
                self.replay(id);
                continue;
            }
            if let Some((id, event)) = self.pending.pop_front() {
                self.deliver(id, event);
                continue;
            }
            break;
        }

        self.dispatching = false;
    }

    /// Replays the cached records for browser `id`, then reports `CacheExhausted`.
    fn replay(&mut self, id: BrowserId) {
        let Some(browser) = self.browsers.get(&id) else {
            return;
        };

        let now = current_time_millis();
        let mut results = Vec::new();
        for intf_key in self.monitor.matching(&browser.scope) {
            let Some(intf) = self
                .monitor
                .get_interface(intf_key.index, intf_key.ip_version)
            else {
                continue;
            };
            for record in intf.cache.records_matching(&browser.key, now) {
                results.push(BrowseResult {
                    intf: intf_key,
                    record,
                    source: RecordSource::Cache,
                });
            }
        }

        trace!("{}: replay {} cached records", id, results.len());
        for result in results {
            self.deliver(id, BrowseEvent::Discovered(result));
        }
        self.deliver(id, BrowseEvent::CacheExhausted);

        if let Some(browser) = self.browsers.get_mut(&id) {
            browser.state = BrowserState::Live;
        }
    }

    fn deliver(&mut self, id: BrowserId, event: BrowseEvent) {
        let Some(mut handler) = self.browsers.get_mut(&id).and_then(|b| b.handler.take()) else {
            trace!("{} is gone, drop event {:?}", id, &event);
            return;
        };

        handler.handle(self, id, event);

        // The handler may have freed its own browser.
        if let Some(browser) = self.browsers.get_mut(&id) {
            browser.handler = Some(handler);
        }
    }

    /// Runs the timed work due at `now` (UNIX millis): reconfirmation queries,
    /// cache eviction and `AllForNow` reports. Browser events are queued for
    /// the next [dispatch](Self::dispatch).
    pub fn run_timers(&mut self, now: u64) {
        while let Some(Reverse(t)) = self.timers.peek() {
            if *t > now {
                break;
            }
            self.timers.pop();
        }

        let mut queries = Vec::new();
        let mut expired = Vec::new();
        let mut timers = Vec::new();
        for intf in self.monitor.iter_mut() {
            let key = intf.key();
            for (name, qtype) in intf.cache.due_queries(now, &mut timers) {
                queries.push(ServerEvent::Query(key, name, qtype));
            }
            for record in intf.cache.evict_expired(now) {
                expired.push((key, record));
            }
        }
        for timer in timers {
            self.add_timer(timer);
        }

        self.increase_counter(Counter::ReconfirmQuery, queries.len() as i64);
        for query in queries {
            debug!("reconfirm query due: {:?}", &query);
            self.notify_monitors(query);
        }

        self.increase_counter(Counter::CacheEvict, expired.len() as i64);
        for (intf, record) in expired {
            self.notify_monitors(ServerEvent::Expired(
                intf,
                record.get_name().to_string(),
                record.get_type(),
            ));
            let shared: DnsRecordRc = Rc::from(record);
            self.notify_browsers(&intf, &shared, RecordSource::Cache, false);
        }

        for (id, browser) in self.browsers.iter_mut() {
            if browser.state != BrowserState::Live {
                continue;
            }
            if matches!(browser.all_for_now_at, Some(t) if t <= now) {
                browser.all_for_now_at = None;
                self.pending.push_back((*id, BrowseEvent::AllForNow));
            }
        }
    }
}

impl fmt::Debug for MdnsServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdnsServer")
            .field("interfaces", &self.monitor.len())
            .field("browsers", &self.browsers)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{MdnsServer, ServerEvent, ServerOption, ALL_FOR_NOW_DELAY};
    use crate::{
        dns_record::{
            current_time_millis, DnsKey, DnsPointer, DnsRecordBox, RRType, CLASS_IN,
        },
        error::Error,
        interface::{IfScope, IntfKey, IpVersion},
        record_browser::{BrowseEvent, BrowseResult, BrowserId},
    };
    use std::{cell::RefCell, rc::Rc, time::Duration};
    use test_log::test;

    const ETH0: IntfKey = IntfKey::new(2, IpVersion::V4);
    const WLAN0: IntfKey = IntfKey::new(3, IpVersion::V4);

    fn ptr(alias: &str, ttl: u32) -> DnsRecordBox {
        Box::new(DnsPointer::new(
            "_http._tcp.local",
            RRType::PTR,
            CLASS_IN,
            ttl,
            alias.to_string(),
        ))
    }

    fn http_key() -> DnsKey {
        DnsKey::new("_http._tcp.local", CLASS_IN, RRType::PTR)
    }

    /// Short names of the events, with the alias for discovered / removed records.
    fn describe(event: &BrowseEvent) -> String {
        let alias = |r: &BrowseResult| {
            r.record
                .any()
                .downcast_ref::<DnsPointer>()
                .map(|p| p.alias().to_string())
                .unwrap_or_default()
        };
        match event {
            BrowseEvent::Discovered(r) => format!("discovered {} {:?}", alias(r), r.source),
            BrowseEvent::Removed(r) => format!("removed {}", alias(r)),
            BrowseEvent::CacheExhausted => "exhausted".to_string(),
            BrowseEvent::AllForNow => "all-for-now".to_string(),
            BrowseEvent::Failure(e) => format!("failure {}", e),
        }
    }

    fn server_with_cache() -> MdnsServer {
        let mut server = MdnsServer::new();
        server.add_interface(ETH0, "eth0");
        server.add_interface(WLAN0, "wlan0");
        server.cache_update(ETH0, ptr("a._http._tcp.local", 4500)).unwrap();
        server.cache_update(WLAN0, ptr("b._http._tcp.local", 4500)).unwrap();
        server
    }

    #[test]
    fn test_replay_then_exhausted() {
        let mut server = server_with_cache();
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = events.clone();

        let id = server
            .record_browser_new(
                IfScope::any(),
                http_key(),
                move |_: &mut MdnsServer, _: BrowserId, event: BrowseEvent| {
                    events_clone.borrow_mut().push(describe(&event));
                },
            )
            .unwrap();

        // Nothing is delivered before dispatch.
        assert!(events.borrow().is_empty());
        server.dispatch();

        assert_eq!(
            *events.borrow(),
            vec![
                "discovered a._http._tcp.local Cache",
                "discovered b._http._tcp.local Cache",
                "exhausted",
            ]
        );
        assert!(server.has_record_browser(id));

        // Live now: a new record from the network.
        server.cache_update(ETH0, ptr("c._http._tcp.local", 4500)).unwrap();
        // An update of a known record is not new.
        server.cache_update(ETH0, ptr("a._http._tcp.local", 4500)).unwrap();
        server.dispatch();
        assert_eq!(events.borrow().len(), 4);
        assert_eq!(events.borrow()[3], "discovered c._http._tcp.local Network");
    }

    #[test]
    fn test_scope_limits_replay() {
        let mut server = server_with_cache();
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = events.clone();

        server
            .record_browser_new(
                IfScope::from(WLAN0),
                http_key(),
                move |_: &mut MdnsServer, _: BrowserId, event: BrowseEvent| {
                    events_clone.borrow_mut().push(describe(&event));
                },
            )
            .unwrap();
        server.dispatch();

        assert_eq!(
            *events.borrow(),
            vec!["discovered b._http._tcp.local Cache", "exhausted"]
        );
    }

    #[test]
    fn test_free_in_handler_stops_events() {
        let mut server = server_with_cache();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();

        let id = server
            .record_browser_new(
                IfScope::any(),
                http_key(),
                move |server: &mut MdnsServer, id: BrowserId, _: BrowseEvent| {
                    *count_clone.borrow_mut() += 1;
                    assert!(server.record_browser_free(id));
                },
            )
            .unwrap();
        server.dispatch();

        assert_eq!(*count.borrow(), 1);
        assert!(!server.has_record_browser(id));
        assert!(!server.record_browser_free(id));

        let metrics = server.get_metrics();
        assert_eq!(metrics["browser-new"], 1);
        assert_eq!(metrics["browser-free"], 1);
    }

    #[test]
    fn test_browser_new_errors() {
        let mut server = server_with_cache();

        let bad_key = DnsKey::new("bad..name", CLASS_IN, RRType::PTR);
        let result = server.record_browser_new(
            IfScope::any(),
            bad_key,
            |_: &mut MdnsServer, _: BrowserId, _: BrowseEvent| {},
        );
        assert_eq!(
            result,
            Err(Error::InvalidDomainName("bad..name".to_string()))
        );

        // The handler is dropped when the creation fails.
        let context = Rc::new(());
        let context_clone = context.clone();
        server.set_record_browsers_max(0).unwrap();
        let result = server.record_browser_new(
            IfScope::any(),
            http_key(),
            move |_: &mut MdnsServer, _: BrowserId, _: BrowseEvent| {
                let _ = &context_clone;
            },
        );
        assert_eq!(result, Err(Error::TooManyObjects));
        assert_eq!(Rc::strong_count(&context), 1);
        assert_eq!(server.record_browser_count(), 0);
    }

    #[test]
    fn test_removed_and_all_for_now() {
        let mut server = MdnsServer::new();
        server.add_interface(ETH0, "eth0");
        let monitor = server.monitor();

        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = events.clone();
        server
            .record_browser_new(
                IfScope::any(),
                http_key(),
                move |_: &mut MdnsServer, _: BrowserId, event: BrowseEvent| {
                    events_clone.borrow_mut().push(describe(&event));
                },
            )
            .unwrap();
        server.dispatch();
        server.cache_update(ETH0, ptr("a._http._tcp.local", 1)).unwrap();
        server.dispatch();

        let later = current_time_millis() + ALL_FOR_NOW_DELAY.as_millis() as u64 + 1000;
        server.run_timers(later);
        server.dispatch();

        // All-for-now is reported once only.
        server.run_timers(later + 1);
        server.dispatch();

        assert_eq!(
            *events.borrow(),
            vec![
                "exhausted",
                "discovered a._http._tcp.local Network",
                "removed a._http._tcp.local",
                "all-for-now",
            ]
        );

        match monitor.try_recv() {
            Ok(ServerEvent::Expired(intf, name, qtype)) => {
                assert_eq!(intf, ETH0);
                assert_eq!(name, "_http._tcp.local");
                assert_eq!(qtype, RRType::PTR);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(server.get_metrics()["cache-evict"], 1);
    }

    #[test]
    fn test_remove_interface_fails_bound_browsers() {
        let mut server = server_with_cache();
        let events = Rc::new(RefCell::new(Vec::new()));

        for scope in [IfScope::from(ETH0), IfScope::any()].iter() {
            let events_clone = events.clone();
            let scope = *scope;
            server
                .record_browser_new(
                    scope,
                    http_key(),
                    move |_: &mut MdnsServer, _: BrowserId, event: BrowseEvent| {
                        if let BrowseEvent::Failure(e) = event {
                            events_clone.borrow_mut().push((scope, e));
                        }
                    },
                )
                .unwrap();
        }
        server.dispatch();

        assert!(server.remove_interface(&ETH0));
        assert!(!server.remove_interface(&ETH0));
        server.dispatch();

        assert_eq!(
            *events.borrow(),
            vec![(IfScope::from(ETH0), Error::InvalidInterface)]
        );
        assert_eq!(
            server.cache_update(ETH0, ptr("x._http._tcp.local", 10)),
            Err(Error::InvalidInterface)
        );
    }

    #[test]
    fn test_set_option() {
        let mut server = MdnsServer::new();
        assert_eq!(
            server.set_reconfirm_timeout(Duration::ZERO),
            Err(Error::Msg("reconfirm timeout cannot be zero".to_string()))
        );
        assert_eq!(server.reconfirm_timeout_millis(), 10_000);

        server
            .set_option(ServerOption::ReconfirmTimeout(Duration::from_secs(2)))
            .unwrap();
        assert_eq!(server.reconfirm_timeout_millis(), 2000);
    }

    #[test]
    fn test_next_timer() {
        let mut server = MdnsServer::new();
        assert!(server.next_timer().is_none());

        server.add_interface(ETH0, "eth0");
        server.cache_update(ETH0, ptr("a._http._tcp.local", 120)).unwrap();
        let next = server.next_timer().unwrap();
        assert!(next > current_time_millis());

        server.run_timers(next);
        assert!(server.next_timer().map_or(true, |t| t > next));
        assert!(server.interfaces().get_interface(2, IpVersion::V4).unwrap().cache().is_empty());
    }
}

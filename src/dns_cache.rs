//! A cache for DNS records of one network interface.
//!
//! Besides the usual insert / update / evict, a cache entry can be asked to
//! reconfirm itself, see [RFC 6762 section 10.4](https://datatracker.ietf.org/doc/html/rfc6762#section-10.4).

#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::dns_record::{DnsKey, DnsRecordBox, DnsRecordExt, DnsRecordRc, RRType};
use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

/// Delay before the first reconfirmation query is sent, randomized within this range.
const RECONFIRM_QUERY_DELAY_MILLIS: std::ops::RangeInclusive<u64> = 20..=120;

/// Interval between the reconfirmation queries.
const RECONFIRM_QUERY_INTERVAL_MILLIS: u64 = 1000;

/// A record owned by the cache, plus its reconfirmation state.
#[derive(Debug)]
pub struct CacheEntry {
    record: DnsRecordBox,

    /// Pending query times in UNIX millis, ascending. `Some` while a
    /// reconfirmation is in progress, even after all queries are sent.
    reconfirm: Option<Vec<u64>>,
}

impl CacheEntry {
    fn new(record: DnsRecordBox) -> Self {
        Self {
            record,
            reconfirm: None,
        }
    }

    pub fn record(&self) -> &dyn DnsRecordExt {
        self.record.as_ref()
    }

    /// Returns true if this entry is being reconfirmed.
    pub fn is_reconfirming(&self) -> bool {
        self.reconfirm.is_some()
    }

    /// Starts to reconfirm this entry.
    ///
    /// From RFC 6762 section 10.4:
    /// "When the cache receives this hint that it should reconfirm some
    /// record, it MUST issue two or more queries for the resource record in
    /// dispute.  If no response is received within ten seconds, then, even
    /// though its TTL may indicate that it is not yet due to expire, that
    /// record SHOULD be promptly flushed from the cache."
    ///
    /// A reconfirmation already in progress is left alone. New timers are
    /// pushed into `timers`.
    pub(crate) fn reconfirm(&mut self, now: u64, timeout_millis: u64, timers: &mut Vec<u64>) {
        if self.reconfirm.is_some() {
            trace!(
                "already reconfirming {} {}",
                self.record.get_name(),
                self.record.rdata_print()
            );
            return;
        }

        let expire_at = now + timeout_millis;
        self.record.set_expire_sooner(expire_at);
        timers.push(self.record.get_expire());

        let first = now + fastrand::u64(RECONFIRM_QUERY_DELAY_MILLIS);
        let second = first + RECONFIRM_QUERY_INTERVAL_MILLIS;
        timers.push(first);
        timers.push(second);

        debug!(
            "reconfirm {} {} {}: expire at {}",
            self.record.get_name(),
            self.record.get_type(),
            self.record.rdata_print(),
            self.record.get_expire()
        );
        self.reconfirm = Some(vec![first, second]);
    }

    /// Pops the earliest pending query if it is due at `now`. Returns true if so.
    ///
    /// The next query is kept at least one interval after `now`, so a late
    /// call does not merge the queries. Its new time is pushed into `timers`.
    fn take_due_query(&mut self, now: u64, timers: &mut Vec<u64>) -> bool {
        let Some(queries) = self.reconfirm.as_mut() else {
            return false;
        };

        match queries.first() {
            Some(t) if *t <= now => {}
            _ => return false,
        }
        queries.remove(0);

        if let Some(next) = queries.first_mut() {
            let earliest = now + RECONFIRM_QUERY_INTERVAL_MILLIS;
            if *next < earliest {
                *next = earliest;
                timers.push(earliest);
            }
        }
        true
    }
}

/// A cache for all types of DNS records on one interface.
#[derive(Debug, Default)]
pub struct DnsCache {
    /// Entries indexed by the lower-cased record name.
    entries: HashMap<String, Vec<CacheEntry>>,
}

impl DnsCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the number of records in the cache.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entries whose keys are covered by `key`, in enumeration order.
    pub fn lookup<'a>(&'a self, key: &'a DnsKey) -> impl Iterator<Item = &'a CacheEntry> + 'a {
        self.entries
            .get(&cache_key(key.name()))
            .into_iter()
            .flatten()
            .filter(move |entry| key.matches(entry.record.key()))
    }

    /// Returns shared copies of the live records covered by `key`, in enumeration order.
    pub(crate) fn records_matching(&self, key: &DnsKey, now: u64) -> Vec<DnsRecordRc> {
        self.lookup(key)
            .filter(|entry| !entry.record.get_record().is_expired(now))
            .map(|entry| Rc::from(entry.record.clone_box()))
            .collect()
    }

    /// Walks the entries covered by `key` and returns the first one accepted by `matcher`.
    pub(crate) fn walk<F>(&mut self, key: &DnsKey, mut matcher: F) -> Option<&mut CacheEntry>
    where
        F: FnMut(&CacheEntry) -> bool,
    {
        self.entries
            .get_mut(&cache_key(key.name()))?
            .iter_mut()
            .find(|entry| key.matches(entry.record.key()) && matcher(entry))
    }

    /// Update a DNS record TTL if already exists, otherwise insert a new record.
    ///
    /// Returns true if `incoming` is a new record.
    ///
    /// If you need to add new timers for related records, push into `timers`.
    pub(crate) fn add_or_update(
        &mut self,
        incoming: DnsRecordBox,
        now: u64,
        timers: &mut Vec<u64>,
    ) -> bool {
        let record_vec = self
            .entries
            .entry(cache_key(incoming.get_name()))
            .or_default();

        if incoming.get_cache_flush() {
            record_vec.iter_mut().for_each(|entry| {
                // When cache flush is asked, we set expire date to 1 second in the future if:
                // - The record has the same key but different rdata
                // - The record was created more than 1 second ago.
                // - The record expire is more than 1 second away.
                // Ref: RFC 6762 Section 10.2
                let r = &mut entry.record;
                if r.key() == incoming.key()
                    && !r.rrdata_match(incoming.as_ref())
                    && now > r.get_created() + 1000
                    && r.get_expire() > now + 1000
                {
                    trace!("FLUSH one record: {} {}", r.get_name(), r.rdata_print());
                    r.set_expire(now + 1000);
                    timers.push(now + 1000);
                }
            });
        }

        match record_vec
            .iter_mut()
            .find(|entry| entry.record.matches(incoming.as_ref()))
        {
            Some(entry) => {
                if incoming.get_record().get_ttl() == 0 {
                    // A goodbye packet: RFC 6762 section 10.1, the record
                    // is deleted 1 second later.
                    entry.record.set_expire(now + 1000);
                    timers.push(now + 1000);
                } else {
                    entry.record.reset_ttl(incoming.as_ref());
                    timers.push(entry.record.get_expire());
                }

                if entry.reconfirm.take().is_some() {
                    debug!(
                        "reconfirmed by answer: {} {}",
                        entry.record.get_name(),
                        entry.record.rdata_print()
                    );
                }
                false
            }
            None => {
                if incoming.get_record().get_ttl() == 0 {
                    return false;
                }
                timers.push(incoming.get_expire());
                record_vec.insert(0, CacheEntry::new(incoming)); // A new record.
                true
            }
        }
    }

    /// Returns the (name, type) queries due at `now` for reconfirming records.
    ///
    /// Times of queries delayed by a late call are pushed into `timers`.
    pub(crate) fn due_queries(
        &mut self,
        now: u64,
        timers: &mut Vec<u64>,
    ) -> Vec<(String, RRType)> {
        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        for entry in self.entries.values_mut().flatten() {
            if !entry.take_due_query(now, timers) {
                continue;
            }
            let name = entry.record.get_name().to_string();
            let qtype = entry.record.get_type();
            if seen.insert((cache_key(&name), qtype)) {
                queries.push((name, qtype));
            }
        }

        queries
    }

    /// Iterates all records and removes ones that expired.
    pub(crate) fn evict_expired(&mut self, now: u64) -> Vec<DnsRecordBox> {
        let mut removed = Vec::new();

        self.entries.retain(|_, entries| {
            let mut i = 0;
            while i < entries.len() {
                if entries[i].record.get_record().is_expired(now) {
                    let entry = entries.remove(i);
                    trace!(
                        "evict expired: {} {}",
                        entry.record.get_name(),
                        entry.record.rdata_print()
                    );
                    removed.push(entry.record);
                } else {
                    i += 1;
                }
            }
            !entries.is_empty()
        });

        removed
    }
}

fn cache_key(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

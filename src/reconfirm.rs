//! Reconfirmation of cached records, see
//! [RFC 6762 section 10.4](https://datatracker.ietf.org/doc/html/rfc6762#section-10.4).
//!
//! A reconfirmation request finds the cache entries of a record with a short
//! lived record browser: the browser replays what the caches hold, and every
//! replayed copy of the record gets its cache entry reconfirmed. The browser
//! is freed once the replay is exhausted.
//!
//! An SRV record exists only because of the PTR record pointing to it, so
//! reconfirming an SRV record also reconfirms that PTR record.

#[cfg(feature = "logging")]
use crate::log::{debug, trace, warn};
use crate::{
    dns_cache::CacheEntry,
    dns_name::service_name_split,
    dns_record::{current_time_millis, DnsPointer, DnsRecordExt, DnsRecordRc, RRType},
    error::{Error, Result},
    interface::IfScope,
    record_browser::{BrowseEvent, BrowseHandler, BrowseResult, BrowserId, RecordSource},
    server::{Counter, MdnsServer},
};
use std::rc::Rc;

/// Returns true if the record of `entry` is `record`, ignoring TTL.
fn lookup_reconfirm_record(entry: &CacheEntry, record: &dyn DnsRecordExt) -> bool {
    entry.record().matches(record)
}

/// Handles the events of a reconfirmation browser.
struct RecordReconfirmer {
    /// The record to reconfirm. Released when the cache replay is exhausted.
    record: Option<DnsRecordRc>,
}

impl RecordReconfirmer {
    fn new(record: DnsRecordRc) -> Self {
        Self {
            record: Some(record),
        }
    }

    fn on_discovered(&self, server: &mut MdnsServer, result: BrowseResult) {
        debug_assert_eq!(result.source, RecordSource::Cache);

        let Some(record) = self.record.as_ref() else {
            return;
        };
        if !record.matches(result.record.as_ref()) {
            trace!("not the record to reconfirm: {:?}", &result.record);
            return;
        }

        let now = current_time_millis();
        let timeout = server.reconfirm_timeout_millis();
        let mut timers = Vec::new();

        let outcome = match server
            .interfaces_mut()
            .get_interface_mut(result.intf.index, result.intf.ip_version)
        {
            None => Err(Error::InvalidInterface),
            Some(intf) => match intf
                .cache
                .walk(record.key(), |entry| {
                    lookup_reconfirm_record(entry, record.as_ref())
                }) {
                None => Err(Error::InvalidRecord),
                Some(entry) => {
                    entry.reconfirm(now, timeout, &mut timers);
                    Ok(())
                }
            },
        };

        match outcome {
            Ok(()) => {
                for timer in timers {
                    server.add_timer(timer);
                }
                server.increase_counter(Counter::Reconfirm, 1);
            }
            Err(e) => {
                debug!("cannot reconfirm on {}: {}", result.intf, &e);
                server.set_error(e);
            }
        }
    }
}

impl BrowseHandler for RecordReconfirmer {
    fn handle(&mut self, server: &mut MdnsServer, browser: BrowserId, event: BrowseEvent) {
        match event {
            BrowseEvent::Discovered(result) => self.on_discovered(server, result),
            BrowseEvent::CacheExhausted => {
                trace!("{}: cache exhausted", browser);
                server.record_browser_free(browser);
                drop(self.record.take());
            }
            BrowseEvent::Removed(_) | BrowseEvent::AllForNow | BrowseEvent::Failure(_) => {}
        }
    }
}

impl MdnsServer {
    /// Reconfirms `record` in the caches of `scope`.
    ///
    /// Every cached copy of the record is queried again on the network and is
    /// flushed from its cache if nobody answers in time. For an SRV record,
    /// the PTR record of its service type is reconfirmed as well.
    ///
    /// The work happens in the next [dispatch](Self::dispatch). Failures to
    /// find an interface or a cache entry are recorded as the last error.
    ///
    /// If the SRV name cannot be split into instance, service type and domain,
    /// an error is returned while the reconfirmation of the SRV record itself
    /// goes on.
    pub fn record_reconfirm(&mut self, scope: IfScope, record: &DnsRecordRc) -> Result<()> {
        let key = record.key().clone();
        self.record_browser_new(scope, key, RecordReconfirmer::new(Rc::clone(record)))?;

        if record.get_type() != RRType::SRV {
            return Ok(());
        }

        let (_, service_type, domain) = service_name_split(record.get_name()).map_err(|e| {
            warn!("cannot reconfirm the PTR of {}: {}", record.get_name(), &e);
            e
        })?;

        let ptr_name = format!("{}.{}", service_type, domain);
        let ptr: DnsRecordRc = Rc::new(DnsPointer::new(
            &ptr_name,
            RRType::PTR,
            record.get_class(),
            0,
            record.get_name().to_string(),
        ));
        let ptr_key = ptr.key().clone();

        self.record_browser_new(scope, ptr_key, RecordReconfirmer::new(ptr))?;
        Ok(())
    }
}

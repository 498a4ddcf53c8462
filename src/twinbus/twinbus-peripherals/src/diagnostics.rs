use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{error, warn};
use std::collections::HashMap;
use std::thread::JoinHandle;

use twinbus_core::memory::periph::{AccessKind, DiagnosticSink, UnhandledAccess};
use twinbus_core::memory::{Domain, Width};

type AccessKey = (Domain, AccessKind, Width, u32);

/// Distinct unhandled accesses seen during a run, with how often each occurred
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticSummary {
    pub entries: Vec<(UnhandledAccess, u64)>,
}

impl DiagnosticSummary {
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Collector thread: logs each distinct access once and counts repeats
fn collector_thread(rx: Receiver<UnhandledAccess>) -> DiagnosticSummary {
    let mut seen: HashMap<AccessKey, (UnhandledAccess, u64)> = HashMap::new();

    for access in rx.iter() {
        let key = (access.domain, access.kind, access.width, access.address);
        let entry = seen.entry(key).or_insert_with(|| {
            warn!("{}", access);
            (access, 0)
        });
        entry.1 += 1;
    }

    let mut entries: Vec<(UnhandledAccess, u64)> = seen.into_values().collect();
    entries.sort_by_key(|(access, _)| (access.address, access.kind == AccessKind::Write));
    DiagnosticSummary { entries }
}

/// Forwards unhandled accesses to a collector thread over a channel
pub struct ChannelDiagnostics {
    tx: Option<Sender<UnhandledAccess>>,
    handle: Option<JoinHandle<DiagnosticSummary>>,
}

impl ChannelDiagnostics {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();

        // Spawn thread to aggregate reports off the emulation thread
        let handle = std::thread::spawn(move || collector_thread(rx));
        ChannelDiagnostics {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Closes the channel and waits for the collector's summary
    pub fn finish(mut self) -> DiagnosticSummary {
        self.tx.take();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                error!("Diagnostics collector thread panicked");
                DiagnosticSummary::default()
            }
            None => DiagnosticSummary::default(),
        }
    }
}

impl Default for ChannelDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for ChannelDiagnostics {
    fn unhandled(&mut self, access: UnhandledAccess) {
        if let Some(tx) = &self.tx {
            if tx.send(access).is_err() {
                error!("Diagnostics collector is gone, dropping {}", access);
            }
        }
    }
}

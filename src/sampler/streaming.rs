//! Incremental record extraction for large JSON files.
//!
//! [`RecordScanner`] is fed raw bytes chunk by chunk. It looks for the first
//! `[` outside a string, then slices out every object that opens and closes
//! at depth zero inside that array and parses each slice on its own. Only the
//! object currently being scanned is buffered, so memory stays bounded by the
//! largest single record rather than the file size.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the first `[`.
    Seeking,
    /// Inside the record array.
    InArray,
    /// Array closed or enough records collected.
    Done,
}

/// Byte-level scanner that extracts top-level objects from a JSON array.
#[derive(Debug)]
pub(crate) struct RecordScanner {
    state: State,
    max_records: usize,
    array_depth: usize,
    object_depth: usize,
    in_string: bool,
    escaped: bool,
    current: Vec<u8>,
    consumed: u64,
    consumed_at_last_record: u64,
    records: Vec<Value>,
    fields: BTreeSet<String>,
    skipped: usize,
}

impl RecordScanner {
    pub(crate) fn new(max_records: usize) -> Self {
        Self {
            state: if max_records == 0 {
                State::Done
            } else {
                State::Seeking
            },
            max_records,
            array_depth: 0,
            object_depth: 0,
            in_string: false,
            escaped: false,
            current: Vec::new(),
            consumed: 0,
            consumed_at_last_record: 0,
            records: Vec::new(),
            fields: BTreeSet::new(),
            skipped: 0,
        }
    }

    /// Whether the scanner needs no more input.
    pub(crate) fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Whether the record array was closed (all records seen).
    pub(crate) fn array_closed(&self) -> bool {
        self.state == State::Done && self.array_depth == 0 && self.object_depth == 0
    }

    /// Feeds one chunk. Bytes after the point where scanning finished are
    /// ignored.
    pub(crate) fn feed(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            if self.state == State::Done {
                return;
            }
            self.consumed += 1;
            self.step(byte);
        }
    }

    fn step(&mut self, byte: u8) {
        if self.object_depth > 0 {
            self.current.push(byte);
        }

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return;
        }

        match byte {
            b'"' => self.in_string = true,
            b'[' => match self.state {
                State::Seeking => {
                    self.state = State::InArray;
                    self.array_depth = 1;
                }
                State::InArray if self.object_depth == 0 => self.array_depth += 1,
                _ => {}
            },
            b']' if self.state == State::InArray && self.object_depth == 0 => {
                self.array_depth = self.array_depth.saturating_sub(1);
                if self.array_depth == 0 {
                    self.state = State::Done;
                }
            }
            b'{' if self.state == State::InArray => {
                if self.object_depth == 0 {
                    self.current.clear();
                    self.current.push(byte);
                }
                self.object_depth += 1;
            }
            b'}' if self.state == State::InArray && self.object_depth > 0 => {
                self.object_depth -= 1;
                if self.object_depth == 0 {
                    self.finish_record();
                }
            }
            _ => {}
        }
    }

    fn finish_record(&mut self) {
        match serde_json::from_slice::<Value>(&self.current) {
            Ok(value) => {
                if let Value::Object(map) = &value {
                    self.fields.extend(map.keys().cloned());
                }
                self.records.push(value);
                self.consumed_at_last_record = self.consumed;
            }
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, offset = self.consumed, "Skipping malformed record");
            }
        }
        self.current.clear();

        if self.records.len() >= self.max_records {
            self.state = State::Done;
        }
    }

    /// Number of malformed object slices that were skipped.
    pub(crate) fn skipped(&self) -> usize {
        self.skipped
    }

    /// Extrapolates the total record count from the bytes-per-record seen so
    /// far. Approximate: assumes the remaining records are the same size.
    pub(crate) fn estimate_total(&self, total_size: u64) -> u64 {
        if self.records.is_empty() || self.consumed_at_last_record == 0 {
            return 0;
        }
        let bytes_per_record = self.consumed_at_last_record as f64 / self.records.len() as f64;
        (total_size as f64 / bytes_per_record).round() as u64
    }

    /// Consumes the scanner, returning the records and the key union.
    pub(crate) fn into_parts(self) -> (Vec<Value>, BTreeSet<String>) {
        (self.records, self.fields)
    }
}

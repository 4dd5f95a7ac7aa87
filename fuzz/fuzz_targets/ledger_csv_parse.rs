//! Fuzz target for ledger CSV parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use platelabel::ledger::from_ledger_csv_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_ledger_csv_slice(data);
});

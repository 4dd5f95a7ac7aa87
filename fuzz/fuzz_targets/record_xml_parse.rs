//! Fuzz target for record XML parsing.
//!
//! Feeds arbitrary bytes to the record parser and, when parsing succeeds,
//! checks that a rewrite parses back with the same classification.

#![no_main]

use libfuzzer_sys::fuzz_target;
use platelabel::record::xml::fuzz_rewrite_record;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_rewrite_record(data);
});

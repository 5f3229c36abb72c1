//! Fuzz target for pagination `Link` header parsing.

#![no_main]

use hubtrail::hub::api::fuzz_parse_next_link;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|header: &str| {
    let _ = fuzz_parse_next_link(header);
});

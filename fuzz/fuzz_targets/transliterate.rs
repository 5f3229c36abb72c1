//! Fuzz target for ASCII transliteration.

#![no_main]

use hubtrail::normalize::transliterate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let out = transliterate(text);
    assert!(out.is_ascii());
});

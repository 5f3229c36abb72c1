//! Fuzz target for catalog record parsing.
//!
//! Feeds arbitrary bytes to the record parser and, for anything that parses,
//! runs the gate accessors, normalization, and table flattening.

#![no_main]

use hubtrail::catalog::CatalogTable;
use hubtrail::normalize::normalize_properties;
use hubtrail::record::CatalogRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(record) = CatalogRecord::from_json_slice(data) {
        let _ = record.model_id();
        let _ = record.has_license();
        let _ = record.card_datasets();
        let props = normalize_properties(&record);
        assert!(props.values().all(|v| v.is_ascii() && !v.contains('"')));
        let _ = CatalogTable::from_records(std::slice::from_ref(&record));
    }
});

//! Fuzz target for hub reference parsing.
//!
//! Accepted ids are used as local directory names, so they must never
//! contain relative path segments.

#![no_main]

use hubtrail::hub::resolve::parse_repo_input;
use hubtrail::hub::RepoKind;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    if let Ok(repo) = parse_repo_input(input, RepoKind::Model, None) {
        assert!(repo.repo_id.split('/').all(|part| part != ".." && part != "."));
    }
});

// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use opsgate::engine::matcher::glob_match;

#[derive(Debug, Arbitrary)]
struct FuzzGlobInput {
    pattern: String,
    origin: String,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    if let Ok(input) = FuzzGlobInput::arbitrary(&mut unstructured) {
        let matched = glob_match(&input.pattern, &input.origin);
        // A pattern with no wildcards only matches itself
        if !input.pattern.contains(&['*', '?'][..]) {
            assert_eq!(matched, input.pattern == input.origin);
        }
    }
});

// Copyright (c) 2026 bizast contributors
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding adversarial bytes must never panic, regardless of what comes in.
    let _ = bizast::record::decode(data);
});

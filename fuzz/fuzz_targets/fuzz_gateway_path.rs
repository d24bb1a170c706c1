// Copyright (c) 2026 bizast contributors
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (key_part, _subpath) = bizast::gateway::parse_path(s);
        let _ = bizast::record::parse_record_key(&key_part);
    }
});

// Copyright (c) 2026 bizast contributors
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    candidate: &'a [u8],
    prior: Option<&'a [u8]>,
    use_expected_key: bool,
    expected_key: [u8; 20],
}

fuzz_target!(|input: Input| {
    let expected = input.use_expected_key.then_some(&input.expected_key);
    // The full validation pipeline must reject cleanly, never panic, no
    // matter how the candidate/prior bytes are shaped.
    let _ = bizast::validate::validate(expected, input.candidate, input.prior);
});

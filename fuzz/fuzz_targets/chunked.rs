#![no_main]
use libfuzzer_sys::fuzz_target;
use log::debug;
use strata_rs_fuzz::{parse_chunked, parse_whole, split_plan};

fuzz_target!(|data: &[u8]| {
    let (sizes, payload) = split_plan(data);

    let whole = parse_whole(&payload);
    let chunked = parse_chunked(&payload, &sizes);

    if whole.nodes() != chunked.nodes() || whole.error() != chunked.error() {
        debug!("payload: {payload:?}");
        debug!("plan: {sizes:?}");
        panic!("chunked parse diverged from single-chunk parse");
    }
});

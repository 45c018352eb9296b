#![no_main]
use libfuzzer_sys::fuzz_target;
use log::debug;
use strata_json::{encode, ByteSink, Parser};
use strata_rs_fuzz::parse_whole;

fuzz_target!(|data: &[u8]| {
    let parser = parse_whole(data);
    if parser.error().is_some() || parser.node_count() == 0 {
        return;
    }

    // accepted input must round-trip through the compact encoder
    let doc = parser.document(data);
    let mut out = ByteSink::new();
    let root = match doc.root() {
        Some(root) => root,
        None => return,
    };
    encode(root, false, &mut out);

    let mut second = Parser::new(data.len() + 1, 256);
    if second.feed(out.as_slice()).is_err() || second.finish().is_err() {
        debug!("original: {data:?}");
        debug!("re-encoded: {:?}", out.as_slice());
        panic!("compact re-serialization of accepted input failed to parse");
    }

    assert_eq!(
        parser.node_count(),
        second.node_count(),
        "round-trip changed the node count"
    );
    for (a, b) in parser.nodes().iter().zip(second.nodes()) {
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.children(), b.children());
        assert_eq!(a.hash(), b.hash());
    }
});

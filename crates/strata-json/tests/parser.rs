//! Cross-module parser properties: structural invariants of the arena,
//! chunking invariance, and capacity boundaries.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_json::{key_hash, Error, Node, NodeKind, Parser};

fn parse_whole(input: &[u8]) -> Parser {
    let mut parser = Parser::new(input.len() + 1, 128);
    parser.feed(input).expect("feed");
    parser.finish().expect("finish");
    parser
}

/// Feed `input` split at the given boundaries, then finish. Returns the
/// node sequence, the recorded error, and whether finish succeeded.
fn parse_split(input: &[u8], bounds: &[usize]) -> (Vec<Node>, Option<Error>, bool) {
    let mut parser = Parser::new(input.len() + 1, 128);
    let mut start = 0;
    let mut fed_ok = true;
    for &end in bounds {
        if parser.feed(&input[start..end]).is_err() {
            fed_ok = false;
            break;
        }
        start = end;
    }
    if fed_ok {
        fed_ok = parser.feed(&input[start..]).is_ok();
    }
    let finished = fed_ok && parser.finish().is_ok();
    (parser.nodes().to_vec(), parser.error().copied(), finished)
}

/// Walk the subtree at `index`, checking the arena invariants:
/// contiguous children, descendant-count skips, alternating key/value
/// layout with hash agreement inside objects. Returns the index just
/// past the subtree.
fn check_subtree(nodes: &[Node], source: &[u8], index: usize) -> usize {
    let node = &nodes[index];
    match node.kind() {
        NodeKind::Array => {
            let mut child = index + 1;
            for _ in 0..node.children() {
                child = check_subtree(nodes, source, child);
            }
            assert_eq!(child, index + 1 + node.hash() as usize);
            child
        }
        NodeKind::Object => {
            let mut child = index + 1;
            for _ in 0..node.children() {
                let key = &nodes[child];
                assert_eq!(key.kind(), NodeKind::String);
                assert_eq!(key.children(), 0);
                let raw = &source[key.offset() as usize..(key.offset() + key.len()) as usize];
                assert_eq!(key.hash(), key_hash(raw));

                let value = &nodes[child + 1];
                if !value.kind().is_container() {
                    assert_eq!(value.hash(), key.hash());
                }
                child = check_subtree(nodes, source, child + 1);
            }
            assert_eq!(child, index + 1 + node.hash() as usize);
            child
        }
        _ => {
            assert_eq!(node.children(), 0);
            index + 1
        }
    }
}

fn check_invariants(parser: &Parser, source: &[u8]) {
    let nodes = parser.nodes();
    assert!(!nodes.is_empty());
    let end = check_subtree(nodes, source, 0);
    assert_eq!(end, nodes.len());
}

const CORPUS: &[&[u8]] = &[
    b"null",
    b"true",
    b"-0",
    b"6.02e+23",
    b"\"\"",
    b"[]",
    b"{}",
    b"[1, 2.5, true, false, null, \"hi\"]",
    br#"{"a":1,"b":true,"c":null}"#,
    br#"{"user":{"name":"Alice","age":30,"active":true},"tags":[]}"#,
    br#"[[[["deep"]]],{"a":[{"b":[0]}]}]"#,
    br#"{"esc":"\"\\/\b\f\n\r\t\u0020","empty":"","num":-1.5e-3}"#,
    b" \n [ 1 , \n {\t\"k\":\t2 } ] \r\n",
];

const BAD_CORPUS: &[&[u8]] = &[
    b"",
    b"   \n ",
    b"{",
    br#"{"a":}"#,
    b"[1,]",
    br#"{"a":1,}"#,
    b"{1:2}",
    b"[1}",
    b"]",
    b"null null",
    b"007",
    b"-.5",
    b"1.",
    b"1e+",
    b"tru",
    b"nulL",
    b"\"unterminated",
    b"\"bad\\q\"",
    b"\"bad\\u00g0\"",
    b"[\"a\" \"b\"]",
    br#"{"a" :1}"#,
];

#[test]
fn invariants_hold_across_the_corpus() {
    for input in CORPUS {
        let parser = parse_whole(input);
        check_invariants(&parser, input);
    }
}

#[test]
fn every_two_way_split_matches_the_single_chunk_parse() {
    for input in CORPUS.iter().chain(BAD_CORPUS) {
        let (whole_nodes, whole_err, whole_done) = parse_split(input, &[]);
        for cut in 0..=input.len() {
            let (nodes, err, done) = parse_split(input, &[cut]);
            assert_eq!(nodes, whole_nodes, "input {input:?} cut at {cut}");
            assert_eq!(err, whole_err, "input {input:?} cut at {cut}");
            assert_eq!(done, whole_done, "input {input:?} cut at {cut}");
        }
    }
}

#[test]
fn every_three_way_split_matches_on_escape_heavy_input() {
    let input: &[u8] = br#"{"esc":"\"\\/\b\f\n\r\t\u0020","n":-1.5e-3,"t":true}"#;
    let (whole_nodes, whole_err, whole_done) = parse_split(input, &[]);
    for first in 0..=input.len() {
        for second in first..=input.len() {
            let (nodes, err, done) = parse_split(input, &[first, second]);
            assert_eq!(nodes, whole_nodes, "cuts at {first},{second}");
            assert_eq!(err, whole_err, "cuts at {first},{second}");
            assert_eq!(done, whole_done, "cuts at {first},{second}");
        }
    }
}

#[test]
fn random_chunk_schedules_match_the_single_chunk_parse() {
    // a larger document than the corpus entries, assembled by repetition
    let mut input = Vec::from(&b"["[..]);
    for i in 0..200 {
        if i > 0 {
            input.push(b',');
        }
        input.extend_from_slice(
            format!(r#"{{"id":{i},"name":"node-{i}","vals":[{i}.5,true,null,"\u00{:02x}"]}}"#, i % 256)
                .as_bytes(),
        );
    }
    input.push(b']');

    let (whole_nodes, whole_err, whole_done) = parse_split(&input, &[]);
    assert!(whole_done);

    let mut rng = StdRng::seed_from_u64(0x5742_4a51);
    for _ in 0..50 {
        let mut bounds = Vec::new();
        let mut at = 0;
        while at < input.len() {
            at = (at + rng.gen_range(1..=97)).min(input.len());
            bounds.push(at);
        }
        let (nodes, err, done) = parse_split(&input, &bounds);
        assert_eq!(nodes, whole_nodes);
        assert_eq!(err, whole_err);
        assert_eq!(done, whole_done);
    }

    let parser = parse_whole(&input);
    check_invariants(&parser, &input);
}

#[test]
fn bad_corpus_never_finishes_cleanly() {
    for input in BAD_CORPUS {
        let mut parser = Parser::new(input.len() + 1, 128);
        let fed = parser.feed(input);
        let finished = fed.and_then(|_| parser.finish());
        assert!(finished.is_err(), "accepted {input:?}");
    }
}

#[test]
fn deep_nesting_hits_the_stack_bound_exactly() {
    let depth = 128;
    let mut input = vec![b'['; depth];
    input.extend(std::iter::repeat(b']').take(depth));

    let mut parser = Parser::new(input.len() + 1, depth);
    parser.feed(&input).unwrap();
    parser.finish().unwrap();
    assert_eq!(parser.depth_usage().high, depth);

    let mut deeper = vec![b'['; depth + 1];
    deeper.extend(std::iter::repeat(b']').take(depth + 1));
    let mut parser = Parser::new(deeper.len() + 1, depth);
    let err = parser.feed(&deeper).unwrap_err();
    assert_eq!(err.kind(), strata_json::ErrorKind::Capacity);
    assert_eq!(err.offset(), depth);
}

#[test]
fn node_capacity_error_does_not_write() {
    let mut parser = Parser::new(3, 8);
    let err = parser.feed(b"[1,2,3]").unwrap_err();
    assert_eq!(err.kind(), strata_json::ErrorKind::Capacity);
    assert_eq!(parser.node_count(), 3);
}

#[test]
fn reinit_is_idempotent() {
    let mut fresh = Parser::new(64, 16);
    fresh.feed(br#"{"x":[1,2]}"#).unwrap();
    fresh.finish().unwrap();
    let expected = fresh.nodes().to_vec();

    // a parser that went through an unrelated failed parse first
    let mut reused = Parser::new(64, 16);
    assert!(reused.feed(b"[true,]").is_err());
    reused.reset();
    reused.feed(br#"{"x":[1,2]}"#).unwrap();
    reused.finish().unwrap();
    assert_eq!(reused.nodes(), expected.as_slice());
}

#[test]
fn byte_at_a_time_equals_single_chunk() {
    for input in CORPUS {
        let whole = parse_whole(input);
        let mut parser = Parser::new(input.len() + 1, 128);
        for byte in input.iter() {
            parser.feed(std::slice::from_ref(byte)).unwrap();
        }
        parser.finish().unwrap();
        assert_eq!(parser.nodes(), whole.nodes());
    }
}

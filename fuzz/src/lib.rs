use arbitrary::Unstructured;
use strata_json::Parser;

/// Carve a chunk-size plan off the front of the fuzz input; the rest is
/// the document to parse. An empty plan means "feed in one piece".
pub fn split_plan(input: &[u8]) -> (Vec<usize>, Vec<u8>) {
    drop(env_logger::try_init());

    let mut u = Unstructured::new(input);
    let mut sizes = Vec::new();
    for _ in 0..4 {
        if let Ok(size) = u.int_in_range::<u16>(1..=4096) {
            sizes.push(size as usize);
        }
    }
    (sizes, u.take_rest().to_vec())
}

/// Parse `payload` in one `feed` call.
pub fn parse_whole(payload: &[u8]) -> Parser {
    let mut parser = Parser::new(payload.len() + 1, 256);
    if parser.feed(payload).is_ok() {
        let _ = parser.finish();
    }
    parser
}

/// Parse `payload` fed in chunks, cycling through `sizes`.
pub fn parse_chunked(payload: &[u8], sizes: &[usize]) -> Parser {
    let mut parser = Parser::new(payload.len() + 1, 256);
    let mut fed = 0;
    let mut next = 0;
    while fed < payload.len() {
        let take = if sizes.is_empty() {
            payload.len()
        } else {
            let size = sizes[next % sizes.len()];
            next += 1;
            size.min(payload.len() - fed)
        };
        if parser.feed(&payload[fed..fed + take]).is_err() {
            return parser;
        }
        fed += take;
    }
    let _ = parser.finish();
    parser
}

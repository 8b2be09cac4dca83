#![no_main]

use agentix::{Chunk, DecodeError, SseDecoder};
use libfuzzer_sys::fuzz_target;

fn summarize(events: Vec<Result<Chunk, DecodeError>>) -> Vec<Result<(String, bool), String>> {
    events
        .into_iter()
        .map(|event| match event {
            Ok(chunk) => Ok((chunk.text().to_owned(), chunk.is_terminal())),
            Err(e) => Err(e.payload().to_owned()),
        })
        .collect()
}

// First byte picks the fragment size; the rest is the stream body.
fuzz_target!(|data: &[u8]| {
    let Some((&split, body)) = data.split_first() else {
        return;
    };

    let mut whole = SseDecoder::new();
    let expected = summarize(whole.feed(body));

    let mut pieces = SseDecoder::new();
    let mut actual = Vec::new();
    for fragment in body.chunks(usize::from(split % 16) + 1) {
        actual.extend(summarize(pieces.feed(fragment)));
    }

    assert_eq!(expected, actual);
    assert_eq!(whole.is_finished(), pieces.is_finished());
    if whole.is_finished() {
        assert_eq!(pieces.pending_len(), 0);
    }
});

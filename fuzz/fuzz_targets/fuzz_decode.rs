#![no_main]
use libfuzzer_sys::fuzz_target;
use libmbcursor::core::{decode, DecodeState, Decoded, EncodingBackend, HostUtf8, Utf8Codec};

// The bundled decoder and the standard library agree on every input,
// however it is split across calls.
fuzz_target!(|data: &[u8]| {
    let split = data.first().map(|&b| b as usize % (data.len() + 1)).unwrap_or(0);
    let (head, rest) = data.split_at(split);

    let mut ours = DecodeState::new();
    let mut host = DecodeState::new();
    let a = Utf8Codec.decode(head, &mut ours);
    let b = HostUtf8.decode(head, &mut host);
    assert_eq!(a, b);
    if a == Decoded::Incomplete {
        assert_eq!(decode(rest, &mut ours), HostUtf8.decode(rest, &mut host));
    }
});

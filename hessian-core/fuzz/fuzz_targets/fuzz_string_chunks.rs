#![no_main]

use libfuzzer_sys::fuzz_target;

use hessian_core::{CodecConfig, Decoder, Encoder};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let chunk_size = 2 + usize::from(u16::from_be_bytes([data[0], data[1]])) % 0xfffe;
    let text = String::from_utf8_lossy(&data[2..]);

    let config = CodecConfig::builder()
        .chunk_size(chunk_size)
        .build()
        .expect("chunk size in range");
    let mut encoder = Encoder::with_config(config.clone());
    encoder.encode(&*text).expect("strings always encode");

    let mut decoder = Decoder::with_config(encoder.buffer(), config);
    let decoded: String = decoder.decode_as().expect("encoded string decodes");
    assert_eq!(decoded, text);
    assert_eq!(decoder.remaining(), 0);
});

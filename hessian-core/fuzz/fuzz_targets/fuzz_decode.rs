#![no_main]

use libfuzzer_sys::fuzz_target;

use hessian_core::{CodecConfig, Decoder};

fuzz_target!(|data: &[u8]| {
    let config = match CodecConfig::builder().max_depth(64).build() {
        Ok(config) => config,
        Err(_) => return,
    };
    let mut decoder = Decoder::with_config(data, config);

    while decoder.remaining() > 0 {
        match decoder.decode() {
            Ok(value) => {
                let _ = value.kind();
                let _ = value.identity();
                let _ = format!("{:?}", value);
                value.dismantle();
            }
            Err(_) => break,
        }
    }
});

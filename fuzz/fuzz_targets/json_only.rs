#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_canon::json::{from_json_bytes, from_json_str, to_json_string};
use cbor_canon::JsonOptions;

fuzz_target!(|data: &[u8]| {
    let opts = JsonOptions::default();
    let _ = from_json_bytes(data, &opts);

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(v) = from_json_str(text, &opts) {
            // Text-keyed output of parsed JSON must parse again.
            let out = to_json_string(&v, &opts).expect("write");
            from_json_str(&out, &opts).expect("reparse");
        }
    }
});

#![no_main]
use covenant_proof::preimage::{reconstruct_masked, Preimage, ANYPREVOUT_MASK};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(preimage) = Preimage::parse(data) {
        // Parsing is exact: re-serialization reproduces the input
        assert_eq!(preimage.serialize().as_bytes(), data);

        let masked = reconstruct_masked(data, ANYPREVOUT_MASK).unwrap();
        let masked = Preimage::parse(&masked).unwrap();
        assert_eq!(masked.hash_outputs(), preimage.hash_outputs());
        assert_eq!(masked.script_code(), preimage.script_code());
        assert_eq!(masked.outpoint().index, 0);
    }
});

#![no_main]
use covenant_proof::config::TxParseLimits;
use covenant_proof::serialization::transaction::{deserialize_transaction, serialize_transaction};
use covenant_proof::tx_fields::{get_prevout, prevout_count, TxFieldExtractor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Bounded scan over arbitrary bytes: errors are fine, panics are not
    let extractor = TxFieldExtractor::default();
    for index in 0..4 {
        let _ = extractor.read_output(data, index);
    }

    // Anything the strict decoder accepts must agree with the bounded scan
    if let Ok(tx) = deserialize_transaction(data) {
        assert_eq!(serialize_transaction(&tx), data, "canonical round-trip");

        let limits = TxParseLimits::new(tx.inputs.len(), tx.outputs.len());
        let wide = TxFieldExtractor::new(limits);
        for (i, output) in tx.outputs.iter().enumerate() {
            assert_eq!(&wide.read_output(data, i).unwrap(), output);
        }
    }

    if let Ok(count) = prevout_count(data) {
        for i in 0..count {
            assert!(get_prevout(data, i).is_ok());
        }
        assert!(get_prevout(data, count).is_err());
    }
});

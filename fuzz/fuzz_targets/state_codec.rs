#![no_main]
use covenant_proof::config::StateCodecConfig;
use covenant_proof::state::{get_state_start, split_state, StateReader, StateWriter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Read pushes until the reader fails or runs out
    let mut reader = StateReader::new(data);
    let mut pushes = Vec::new();
    while !reader.eof() {
        match reader.read_bytes() {
            Ok(bytes) => pushes.push(bytes),
            Err(_) => break,
        }
    }

    // Re-encoding what was read and reading it back is stable
    let mut writer = StateWriter::with_config(&StateCodecConfig::default());
    for push in &pushes {
        writer.write_bytes(push).unwrap();
    }
    if let Ok(state) = writer.finish() {
        let body = &state[..state.len() - 3];
        let mut reader = StateReader::new(body);
        for push in &pushes {
            assert_eq!(&reader.read_bytes().unwrap(), push);
        }
        assert!(reader.eof());
    }

    // Trailer handling never panics and splits within bounds
    if let Ok(start) = get_state_start(data) {
        assert!(start + 3 <= data.len());
        let (code, state) = split_state(data).unwrap();
        assert_eq!(code.len() + state.len() + 3, data.len());
    }
});

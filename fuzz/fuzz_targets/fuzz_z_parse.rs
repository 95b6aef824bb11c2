#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // must never panic, only return typed errors
    let _ = relzw::ZFile::parse(data);
});

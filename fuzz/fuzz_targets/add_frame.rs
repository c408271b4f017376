// cargo fuzz run add_frame corpus/add_frame -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::time::Duration;

use gifweave::Assembler;

fuzz_target!(|data: &[u8]| {
    let mut out = Vec::new();
    let mut asm = Assembler::new(&mut out, 0);
    if asm.add_frame(data, Duration::from_millis(100)).is_ok() {
        asm.close().unwrap();
    }
});

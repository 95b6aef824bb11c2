#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use relzw::{GifImage, GifRecompressor, Recompress, RecompressConfig};

fuzz_target!(|data: &[u8]| {
    // any input we can decode must recompress into a file that decodes to
    // the same index streams
    let Ok(before) = GifImage::parse(data) else { return };

    let mut output = Vec::new();
    let config = RecompressConfig { alignment: 32, ..Default::default() };
    GifRecompressor::new(config)
        .recompress(Cursor::new(data), &mut output)
        .expect("decodable input must recompress");

    let after = GifImage::parse(&output).expect("output must parse");
    assert_eq!(before.frames().len(), after.frames().len());
    for (b, a) in before.frames().iter().zip(after.frames()) {
        assert_eq!(b.pixels, a.pixels);
    }
});

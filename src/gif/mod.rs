pub mod image;
pub mod interlace;

pub use image::{GifFrame, GifImage};

/// Quick signature sniff, without parsing anything else.
pub fn is_gif(data: &[u8]) -> bool {
    data.len() >= 6 && &data[..3] == b"GIF"
}

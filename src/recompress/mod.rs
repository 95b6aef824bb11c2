pub mod parallel;
pub mod single;

pub use parallel::ParallelGifRecompressor;
pub use single::{GifRecompressor, ZRecompressor};

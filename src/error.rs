use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Container errors
    #[error("invalid GIF signature (expected \"GIF87a\" or \"GIF89a\")")]
    BadGifSignature,

    #[error("unsupported GIF version {0:?} (only 87a and 89a supported)")]
    BadGifVersion([u8; 3]),

    #[error("expected image descriptor (0x2c), got {0:#04x}")]
    BadImageDescriptor(u8),

    #[error("invalid .Z magic bytes: expected 0x1f9d, got {0:#06x}")]
    BadZMagic(u16),

    #[error(".Z stream is not in block mode (settings byte {0:#04x})")]
    NotBlockMode(u8),

    #[error("unknown .Z settings flags (settings byte {0:#04x})")]
    UnknownZFlags(u8),

    #[error("unsupported LZW code width {0} (supported: 9-16)")]
    UnsupportedCodeWidth(u8),

    // LZW decoding errors
    #[error("invalid LZW token {token} at output position {position} (dictionary holds {dict_size} entries)")]
    InvalidToken { token: u32, dict_size: u32, position: u64 },

    #[error("LZW payload is not terminated by a zero-length sub-block")]
    BadRestartFraming,

    #[error("unexpected end of input")]
    TruncatedInput,

    // Unsupported features
    #[error("{0}")]
    Unsupported(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

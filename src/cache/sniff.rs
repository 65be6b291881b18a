/// Payload type detected from magic bytes, used to pick the storage
/// subdirectory and file suffix for a cached body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
    Ico,
    Tiff,
    Pdf,
    Gzip,
    Zip,
    Unknown,
}

impl PayloadKind {
    /// Sniffs the payload prefix. Total: anything unrecognized, truncated or
    /// empty comes back as `Unknown`.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::Unknown;
        }
        if bytes[0..4] == [0x89, b'P', b'N', b'G'] {
            return Self::Png;
        }
        if bytes[0..3] == [0xFF, 0xD8, 0xFF] {
            return Self::Jpeg;
        }
        if &bytes[0..4] == b"GIF8" {
            return Self::Gif;
        }
        // RIFF container; only the WEBP form counts here.
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Self::WebP;
        }
        if &bytes[0..2] == b"BM" {
            return Self::Bmp;
        }
        if bytes[0..4] == [0x00, 0x00, 0x01, 0x00] {
            return Self::Ico;
        }
        if &bytes[0..4] == b"II*\0" || &bytes[0..4] == b"MM\0*" {
            return Self::Tiff;
        }
        if &bytes[0..4] == b"%PDF" {
            return Self::Pdf;
        }
        if bytes[0..2] == [0x1F, 0x8B] {
            return Self::Gzip;
        }
        if &bytes[0..4] == b"PK\x03\x04" {
            return Self::Zip;
        }
        Self::Unknown
    }

    /// File suffix including the leading dot; empty for unknown payloads.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
            Self::Gif => ".gif",
            Self::WebP => ".webp",
            Self::Bmp => ".bmp",
            Self::Ico => ".ico",
            Self::Tiff => ".tiff",
            Self::Pdf => ".pdf",
            Self::Gzip => ".gz",
            Self::Zip => ".zip",
            Self::Unknown => "",
        }
    }

    pub const fn is_image(&self) -> bool {
        matches!(
            self,
            Self::Png | Self::Jpeg | Self::Gif | Self::WebP | Self::Bmp | Self::Ico | Self::Tiff
        )
    }
}

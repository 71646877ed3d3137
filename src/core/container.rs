//! Synthetic media containers
//!
//! Produces tiny byte buffers that pass a magic-number check for MP3 or MP4.
//! Nothing here encodes audio or video.

use bytes::{BufMut, Bytes, BytesMut};

use crate::core::models::MediaFormat;

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const MP3_FRAME_LEN: usize = 417;
const MP3_FRAME_COUNT: usize = 8;

const FTYP_MAJOR_BRAND: &[u8; 4] = b"isom";
const FTYP_MINOR_VERSION: u32 = 512;
const FTYP_COMPATIBLE_BRANDS: [&[u8; 4]; 4] = [b"isom", b"iso2", b"avc1", b"mp41"];

/// Build the placeholder file for `format`.
pub fn synthesize(format: MediaFormat, title: &str) -> Bytes {
    match format {
        MediaFormat::Audio => synthesize_mp3(title),
        MediaFormat::Video => synthesize_mp4(),
    }
}

/// ID3v2.3 tag carrying a `TIT2` title frame followed by silent MPEG frames.
pub fn synthesize_mp3(title: &str) -> Bytes {
    let mut title_frame = BytesMut::new();
    let text = title.as_bytes();
    title_frame.put_slice(b"TIT2");
    title_frame.put_u32(text.len() as u32 + 1);
    title_frame.put_u16(0);
    // ISO-8859-1 marker; non-ASCII bytes are passed through untouched.
    title_frame.put_u8(0);
    title_frame.put_slice(text);

    let mut buf = BytesMut::with_capacity(10 + title_frame.len() + MP3_FRAME_LEN * MP3_FRAME_COUNT);
    buf.put_slice(b"ID3");
    buf.put_u8(3);
    buf.put_u8(0);
    buf.put_u8(0);
    buf.put_slice(&synchsafe(title_frame.len() as u32));
    buf.put_slice(&title_frame);

    for _ in 0..MP3_FRAME_COUNT {
        buf.put_slice(&MP3_FRAME_HEADER);
        buf.put_bytes(0, MP3_FRAME_LEN - MP3_FRAME_HEADER.len());
    }
    buf.freeze()
}

/// `ftyp` + `free` + empty `mdat`, all sizes big-endian.
pub fn synthesize_mp4() -> Bytes {
    let mut buf = BytesMut::new();

    let ftyp_len = 8 + 4 + 4 + 4 * FTYP_COMPATIBLE_BRANDS.len();
    buf.put_u32(ftyp_len as u32);
    buf.put_slice(b"ftyp");
    buf.put_slice(FTYP_MAJOR_BRAND);
    buf.put_u32(FTYP_MINOR_VERSION);
    for brand in FTYP_COMPATIBLE_BRANDS {
        buf.put_slice(brand);
    }

    buf.put_u32(8);
    buf.put_slice(b"free");

    buf.put_u32(8);
    buf.put_slice(b"mdat");

    buf.freeze()
}

fn synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// Whether `data` starts like an MP3 (ID3 tag or bare frame sync).
pub fn looks_like_mp3(data: &[u8]) -> bool {
    data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0)
}

/// Whether `data` starts with an ISO base media `ftyp` box.
pub fn looks_like_mp4(data: &[u8]) -> bool {
    data.len() >= 8 && &data[4..8] == b"ftyp"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp3_layout() {
        let data = synthesize_mp3("Song");
        assert!(looks_like_mp3(&data));

        // header (10) + TIT2 frame header (10) + encoding byte + "Song"
        let tag_len = 10 + 10 + 1 + 4;
        assert_eq!(&data[6..10], &[0, 0, 0, 15]);
        assert_eq!(&data[10..14], b"TIT2");
        assert_eq!(&data[21..25], b"Song");
        assert_eq!(&data[tag_len..tag_len + 2], &[0xFF, 0xFB]);
        assert_eq!(data.len(), tag_len + MP3_FRAME_LEN * MP3_FRAME_COUNT);
    }

    #[test]
    fn test_mp4_layout() {
        let data = synthesize_mp4();
        assert!(looks_like_mp4(&data));
        assert!(!looks_like_mp3(&data));

        assert_eq!(&data[0..4], &[0, 0, 0, 32]);
        assert_eq!(&data[8..12], b"isom");
        assert_eq!(&data[12..16], &512u32.to_be_bytes());
        assert_eq!(&data[16..32], b"isomiso2avc1mp41");
        assert_eq!(&data[36..40], b"free");
        assert_eq!(&data[44..48], b"mdat");
        assert_eq!(data.len(), 48);
    }

    #[test]
    fn test_synchsafe() {
        assert_eq!(synchsafe(0), [0, 0, 0, 0]);
        assert_eq!(synchsafe(128), [0, 0, 1, 0]);
        assert_eq!(synchsafe(257), [0, 0, 2, 1]);
    }
}

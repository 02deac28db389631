//! Magic-byte sniffing for the preview dispatch rules.
//!
//! All checks run against the first (and, for the binary test, last) 512
//! bytes of the file, read once by the engine. Archive detection is a
//! byte-table heuristic; some tar variants are deliberately not matched.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Leading and trailing windows of a file, enough for every sniffer here.
pub struct FileHead {
    pub head: Vec<u8>,
    pub tail: Vec<u8>,
    pub empty: bool,
}

pub const SNIFF_LEN: usize = 512;

impl FileHead {
    pub fn read(path: &Path) -> io::Result<FileHead> {
        let mut f = File::open(path)?;
        let len = f.metadata()?.len();

        let mut head = vec![0u8; SNIFF_LEN.min(len as usize)];
        f.read_exact(&mut head)?;

        let tail = if len as usize > SNIFF_LEN {
            let mut buf = vec![0u8; SNIFF_LEN];
            f.seek(SeekFrom::End(-(SNIFF_LEN as i64)))?;
            f.read_exact(&mut buf)?;
            buf
        } else {
            head.clone()
        };

        Ok(FileHead {
            head,
            tail,
            empty: len == 0,
        })
    }
}

pub fn is_pdf(head: &[u8]) -> bool {
    head.starts_with(b"%PDF")
}

/// DECSIXEL introducer: ESC P.
pub fn is_sixel(head: &[u8]) -> bool {
    head.len() >= 2 && head[0] == 0x1B && head[1] == 0x50
}

/// Suffixes handed to the audio-tag reader.
pub fn is_audio_suffix(suffix: &str) -> bool {
    matches!(
        suffix.to_lowercase().as_str(),
        "mp3" | "mp4" | "flac" | "wav" | "ogg" | "wv" | "tta" | "aiff" | "asf"
    )
}

/// gzip / bzip2 / xz / zip / 7z / rar / cab / lzh / tar, by magic bytes.
pub fn is_archive(head: &[u8]) -> bool {
    let mut h = [0u8; 280];
    let n = head.len().min(280);
    h[..n].copy_from_slice(&head[..n]);

    // gzip
    if h[0] == 0x1F && h[1] == 0x8B && h[2] == 0x08 {
        return true;
    }
    // bzip2
    if h[0] == 0x42 && h[1] == 0x5A && h[2] == 0x68 {
        if h[3] < b'1' || h[3] > b'9' {
            return false;
        }
        if (h[4] == 0x31 && h[5] == 0x41 && h[6] == 0x59
            && h[7] == 0x26 && h[8] == 0x53 && h[9] == 0x59)
            || (h[4] == 0x17 && h[5] == 0x72 && h[6] == 0x45
                && h[7] == 0x38 && h[8] == 0x50 && h[9] == 0x90)
        {
            return true;
        }
    }
    // xz
    if h[0] == 0xFD && h[1] == 0x37 && h[2] == 0x7A && h[3] == 0x58 && h[4] == 0x5A && h[5] == 0x00
    {
        return true;
    }
    // zip
    if h[0] == 0x50 && h[1] == 0x4B && h[2] == 0x03 && h[3] == 0x04 {
        return true;
    }
    // 7z
    if h[0] == 0x37 && h[1] == 0x7A && h[2] == 0xBC && h[3] == 0xAF && h[4] == 0x27 && h[5] == 0x1C
    {
        return true;
    }
    // rar
    if h[0] == 0x52
        && h[1] == 0x61
        && h[2] == 0x72
        && h[3] == 0x21
        && h[4] == 0x1A
        && h[5] == 0x07
        && (h[6] == 0x00 || (h[6] == 0x01 && h[7] == 0x00))
    {
        return true;
    }
    // cab
    if h[0] == 0x4D && h[1] == 0x53 && h[2] == 0x43 && h[3] == 0x46
        && h[4] == 0x00 && h[5] == 0x00 && h[6] == 0x00 && h[7] == 0x00
    {
        return true;
    }
    // lzh
    if h[2] == 0x2D && h[3] == 0x6C && h[4] == 0x68 && h[6] == 0x2D {
        if (h[5] >= b'0' && h[5] <= b'7') || h[5] == b'd' || h[5] == b's' {
            return true;
        }
    }
    // tar (ustar at offset 257)
    if (h[257] == 0x75 && h[258] == 0x73 && h[259] == 0x74 && h[260] == 0x61
        && h[261] == 0x72 && h[262] == 0x20 && h[263] == 0x20 && h[264] == 0x00)
        || (h[257] == 0x75 && h[258] == 0x73 && h[259] == 0x74 && h[260] == 0x61
            && h[261] == 0x72 && h[262] == 0x00 && h[263] == 0x30 && h[264] == 0x30)
    {
        return true;
    }

    false
}

/// Binary means: empty, PDF, sixel, or any byte ≤ 0x08 within the first or
/// last window.
pub fn is_binary(fh: &FileHead) -> bool {
    if fh.empty {
        return true;
    }
    if is_pdf(&fh.head) || is_sixel(&fh.head) {
        return true;
    }
    fh.head.iter().any(|&b| b <= 0x08) || fh.tail.iter().any(|&b| b <= 0x08)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn head_of(bytes: &[u8]) -> FileHead {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("f");
        fs::write(&p, bytes).unwrap();
        FileHead::read(&p).unwrap()
    }

    #[test]
    fn pdf_and_sixel_are_binary() {
        assert!(is_binary(&head_of(b"%PDF-1.7 rest")));
        assert!(is_binary(&head_of(&[0x1B, 0x50, b'q'])));
    }

    #[test]
    fn empty_file_is_binary() {
        assert!(is_binary(&head_of(b"")));
    }

    #[test]
    fn control_bytes_are_binary_text_is_not() {
        assert!(is_binary(&head_of(b"abc\x00def")));
        assert!(!is_binary(&head_of(b"plain text\nwith lines\n")));
    }

    #[test]
    fn control_byte_only_in_tail_still_binary() {
        let mut data = vec![b'a'; 2048];
        data[2000] = 0x01;
        assert!(is_binary(&head_of(&data)));
    }

    #[test]
    fn archive_magics() {
        assert!(is_archive(&[0x1F, 0x8B, 0x08, 0, 0, 0, 0, 0, 0, 0]));
        assert!(is_archive(b"PK\x03\x04rest"));
        assert!(is_archive(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]));
        assert!(is_archive(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]));
        assert!(is_archive(b"BZh91AY&SY"));
        assert!(!is_archive(b"BZh01AY&SY"));
        assert!(!is_archive(b"just text"));
    }

    #[test]
    fn tar_magic_at_offset_257() {
        let mut data = vec![0u8; 512];
        data[257..265].copy_from_slice(b"ustar  \x00");
        assert!(is_archive(&data));
        let mut gnu = vec![0u8; 512];
        gnu[257..265].copy_from_slice(b"ustar\x0000");
        assert!(is_archive(&gnu));
    }

    #[test]
    fn audio_suffixes() {
        assert!(is_audio_suffix("mp3"));
        assert!(is_audio_suffix("FLAC"));
        assert!(!is_audio_suffix("txt"));
    }
}

//! Bitmap header parsing and the aspect-preserving scale used to size the
//! sixel converter's output.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tga,
}

/// Recognise a bitmap header in the first bytes of a file. The TGA check is
/// structural (there is no magic), so callers additionally require a `.tga`
/// suffix before trusting it.
pub fn detect(head: &[u8]) -> Option<ImageFormat> {
    let mut h = [0u8; 17];
    let n = head.len().min(17);
    h[..n].copy_from_slice(&head[..n]);

    if h[0] == 0x89 && h[1] == 0x50 && h[2] == 0x4E && h[3] == 0x47
        && h[4] == 0x0D && h[5] == 0x0A && h[6] == 0x1A && h[7] == 0x0A
    {
        return Some(ImageFormat::Png);
    }
    if h[0] == 0xFF && h[1] == 0xD8 {
        return Some(ImageFormat::Jpeg);
    }
    if h[0] == 0x42 && h[1] == 0x4D && h[6] == 0x00 && h[7] == 0x00
        && h[8] == 0x00 && h[9] == 0x00
        && (h[14] == 0x28 || h[14] == 0x0C || h[14] == 40 || h[14] == 108 || h[14] == 124)
    {
        return Some(ImageFormat::Bmp);
    }
    if h[0] == 0x47 && h[1] == 0x49 && h[2] == 0x46 {
        for i in 3..15 {
            if h[i] < 0x08 && h[i] != 0x00 {
                return Some(ImageFormat::Gif);
            }
        }
    }

    // TGA: colour-map/image-type fields plus plausible dimensions and depth.
    let w = u16::from_le_bytes([h[12], h[13]]);
    let hgt = u16::from_le_bytes([h[14], h[15]]);
    if h[1] == 0x01 {
        if (h[2] == 0x01 || h[2] == 0x09) && w >= 1 && hgt >= 1 && (h[16] == 8 || h[16] == 16) {
            return Some(ImageFormat::Tga);
        }
    } else if h[1] == 0x00
        && (h[2] == 0x02 || h[2] == 0x03 || h[2] == 0x0A || h[2] == 0x0B)
        && w >= 1
        && hgt >= 1
        && matches!(h[16], 8 | 15 | 16 | 24 | 32)
    {
        return Some(ImageFormat::Tga);
    }

    None
}

/// Pull the pixel dimensions out of a bitmap header.
pub fn dimensions(f: &mut File, format: ImageFormat) -> io::Result<Option<(u32, u32)>> {
    match format {
        ImageFormat::Png => {
            let mut buf = [0u8; 33];
            f.seek(SeekFrom::Start(0))?;
            f.read_exact(&mut buf)?;
            let w = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);
            let h = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);
            Ok(Some((w, h)))
        }
        ImageFormat::Jpeg => jpeg_dimensions(f),
        ImageFormat::Bmp => {
            f.seek(SeekFrom::Start(14))?;
            let mut buf = [0u8; 4];
            f.read_exact(&mut buf)?;
            let header_size = u32::from_le_bytes(buf);
            if header_size == 40 || header_size == 108 || header_size == 124 {
                let mut dims = [0u8; 8];
                f.read_exact(&mut dims)?;
                let w = u32::from_le_bytes([dims[0], dims[1], dims[2], dims[3]]);
                let h = u32::from_le_bytes([dims[4], dims[5], dims[6], dims[7]]);
                Ok(Some((w, h)))
            } else if header_size == 12 {
                let mut dims = [0u8; 4];
                f.read_exact(&mut dims)?;
                let w = u16::from_le_bytes([dims[0], dims[1]]) as u32;
                let h = u16::from_le_bytes([dims[2], dims[3]]) as u32;
                Ok(Some((w, h)))
            } else {
                Ok(None)
            }
        }
        ImageFormat::Gif => {
            f.seek(SeekFrom::Start(6))?;
            let mut buf = [0u8; 4];
            f.read_exact(&mut buf)?;
            let w = u16::from_le_bytes([buf[0], buf[1]]) as u32;
            let h = u16::from_le_bytes([buf[2], buf[3]]) as u32;
            Ok(Some((w, h)))
        }
        ImageFormat::Tga => {
            f.seek(SeekFrom::Start(12))?;
            let mut buf = [0u8; 4];
            f.read_exact(&mut buf)?;
            let w = u16::from_le_bytes([buf[0], buf[1]]) as u32;
            let h = u16::from_le_bytes([buf[2], buf[3]]) as u32;
            Ok(Some((w, h)))
        }
    }
}

/// Scan JPEG markers for the first SOF segment.
fn jpeg_dimensions(f: &mut File) -> io::Result<Option<(u32, u32)>> {
    f.seek(SeekFrom::Start(2))?;
    loop {
        let mut marker = [0u8; 4];
        if f.read_exact(&mut marker).is_err() {
            return Ok(None);
        }
        if marker[0] != 0xFF {
            return Ok(None);
        }
        let seg_len = u16::from_be_bytes([marker[2], marker[3]]) as i64;
        if matches!(marker[1], 0xC0 | 0xC1 | 0xC2 | 0xC3) {
            let mut dims = [0u8; 5];
            if f.read_exact(&mut dims).is_err() {
                return Ok(None);
            }
            let h = u16::from_be_bytes([dims[1], dims[2]]) as u32;
            let w = u16::from_be_bytes([dims[3], dims[4]]) as u32;
            return Ok(Some((w, h)));
        }
        if seg_len < 2 {
            return Ok(None);
        }
        f.seek(SeekFrom::Current(seg_len - 2))?;
    }
}

/// Shrink `(src_w, src_h)` to fit `(box_w, box_h)` preserving aspect ratio:
/// the smaller of the two axis ratios applies to both, floored.
pub fn scale_to_fit(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let w_ratio = box_w as f64 / src_w as f64;
    let h_ratio = box_h as f64 / src_h as f64;
    let ratio = w_ratio.min(h_ratio);
    (
        (src_w as f64 * ratio).floor() as u32,
        (src_h as f64 * ratio).floor() as u32,
    )
}

/// Terminal geometry in cells and pixels, from the kernel's window size.
/// Pixel fields are zero on terminals that don't report them.
pub fn terminal_pixel_size() -> Option<(u16, u16, u16, u16)> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc == -1 {
        return None;
    }
    Some((ws.ws_col, ws.ws_row, ws.ws_xpixel, ws.ws_ypixel))
}

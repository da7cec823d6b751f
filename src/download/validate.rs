//! Binary-type validation of completed download artifacts.
//!
//! A completed transfer is not a valid artifact just because every byte
//! arrived: origins serve error pages and placeholder HTML under media
//! URLs. Validation inspects the file's leading bytes against known
//! per-format signatures and falls back to the extension whitelist of the
//! expected media family. Failure is reported, never thrown; the engine
//! deletes rejected artifacts.

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::request::MediaFamily;

/// Number of leading bytes inspected for signature matching.
const SIGNATURE_PREFIX_LEN: usize = 16;

/// Known per-format binary signatures, matched at offset 0.
///
/// RIFF covers both WEBP and AVI containers; the fourcc at offset 8
/// distinguishes them but either way the bytes are a real media container.
const MAGIC_NUMBERS: &[(&str, &[u8])] = &[
    ("jpeg", &[0xFF, 0xD8, 0xFF]),
    ("png", &[0x89, 0x50, 0x4E, 0x47]),
    ("gif", &[0x47, 0x49, 0x46]),
    ("riff", &[0x52, 0x49, 0x46, 0x46]),
];

/// MP4-family files start with a box size followed by the `ftyp` fourcc.
const MP4_FTYP: &[u8] = b"ftyp";
const MP4_FTYP_OFFSET: usize = 4;

/// Checks whether a completed file looks like the expected media family.
///
/// `filename` is the artifact's logical name; the file itself may still sit
/// at a staging path with a different suffix.
///
/// The check is cheap and layered:
/// 1. the file must exist and be at least `min_len` bytes long;
/// 2. the leading bytes must match a known media signature;
/// 3. failing that, the extension must be on the expected family's
///    whitelist (either whitelist for [`MediaFamily::Unknown`]).
pub async fn validate_media_file(
    path: &Path,
    filename: &str,
    expected: MediaFamily,
    min_len: u64,
) -> bool {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(error) => {
            warn!(path = %path.display(), %error, "validation failed: file not readable");
            return false;
        }
    };

    if metadata.len() == 0 {
        warn!(path = %path.display(), "validation failed: file is empty");
        return false;
    }
    if metadata.len() < min_len {
        warn!(
            path = %path.display(),
            len = metadata.len(),
            min_len,
            "validation failed: file too small to be real media"
        );
        return false;
    }

    let mut prefix = [0u8; SIGNATURE_PREFIX_LEN];
    let read = match read_prefix(path, &mut prefix).await {
        Ok(read) => read,
        Err(error) => {
            warn!(path = %path.display(), %error, "validation failed: cannot read file prefix");
            return false;
        }
    };

    if let Some(format) = match_signature(&prefix[..read]) {
        debug!(path = %path.display(), format, "signature match");
        return true;
    }

    if extension_matches_family(filename, expected) {
        debug!(
            path = %path.display(),
            filename,
            "no signature match, extension accepted for expected family"
        );
        return true;
    }

    warn!(
        path = %path.display(),
        filename,
        ?expected,
        "validation failed: no signature match and extension not recognized"
    );
    false
}

async fn read_prefix(path: &Path, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut read = 0;
    // read() may return short counts; fill as much of the prefix as the
    // file allows.
    loop {
        let n = file.read(&mut buffer[read..]).await?;
        if n == 0 || read + n == buffer.len() {
            return Ok(read + n);
        }
        read += n;
    }
}

/// Matches the prefix against the signature table. Returns the format name.
fn match_signature(prefix: &[u8]) -> Option<&'static str> {
    for (format, magic) in MAGIC_NUMBERS {
        if prefix.len() >= magic.len() && &prefix[..magic.len()] == *magic {
            return Some(format);
        }
    }
    if prefix.len() >= MP4_FTYP_OFFSET + MP4_FTYP.len()
        && &prefix[MP4_FTYP_OFFSET..MP4_FTYP_OFFSET + MP4_FTYP.len()] == MP4_FTYP
    {
        return Some("mp4");
    }
    None
}

/// Whether the filename's extension is on the expected family's whitelist.
fn extension_matches_family(filename: &str, expected: MediaFamily) -> bool {
    let derived = MediaFamily::from_filename(filename);
    match expected {
        MediaFamily::Unknown => derived != MediaFamily::Unknown,
        family => derived == family,
    }
}

//! File checksums for comparing what was uploaded with what the workers stored.

use std::path::Path;

use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

const CHUNK: usize = 64 * 1024;

/// Lowercase hex MD5 of the file at `path`, read in chunks.
pub async fn md5_hex(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

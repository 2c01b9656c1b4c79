//! Content digest shown after a push.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of `content`.
pub fn checksum(content: &str) -> String {
    hex::encode(Md5::digest(content.as_bytes()))
}

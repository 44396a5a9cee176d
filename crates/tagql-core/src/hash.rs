//! blake3 digests keying join buckets, set membership and result reports.

use std::fmt;

use blake3::Hasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Run `feed` against a fresh hasher and finalize.
pub fn digest_with<F>(feed: F) -> Hash256
where
    F: FnOnce(&mut Hasher),
{
    let mut h = Hasher::new();
    feed(&mut h);
    Hash256(h.finalize().into())
}

/// Hash a sequence of lines, each terminated by `\n`.
pub fn hash_lines<'a, I>(lines: I) -> Hash256
where
    I: IntoIterator<Item = &'a str>,
{
    digest_with(|h| {
        for line in lines {
            h.update(line.as_bytes());
            h.update(b"\n");
        }
    })
}

use std::fmt;

/// Location of a bucket in the store hierarchy, outermost name first.
///
/// Always holds at least one segment: the root itself only contains buckets
/// and is never addressed directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketPath {
    segments: Vec<Vec<u8>>,
}

impl BucketPath {
    /// Path of a top-level bucket
    pub fn root(name: impl AsRef<[u8]>) -> Self {
        Self {
            segments: vec![name.as_ref().to_vec()],
        }
    }

    /// Path of a bucket nested directly under this one
    pub fn child(&self, name: impl AsRef<[u8]>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.as_ref().to_vec());
        Self { segments }
    }

    /// Enclosing bucket, or `None` for a top-level bucket
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Name of the bucket itself (last segment)
    pub fn name(&self) -> &[u8] {
        // Constructors never produce an empty path
        &self.segments[self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match std::str::from_utf8(segment) {
                Ok(s) => f.write_str(s)?,
                Err(_) => {
                    for b in segment {
                        write!(f, "{:02x}", b)?;
                    }
                }
            }
        }
        Ok(())
    }
}

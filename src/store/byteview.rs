use bytes::Bytes;
use std::fmt;

/// Immutable view over cached bytes.
///
/// Values move through the system as `ByteView`s: the loader's output is
/// captured into one, the store retains it, and every concurrent caller gets
/// its own handle to the same frozen buffer. Cloning is cheap (the buffer is
/// shared), and nothing handed out by the accessors can reach back into the
/// cache: slices passed to [`ByteView::new`] are copied in, and
/// [`ByteView::byte_slice`] copies out.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Copies `data` into a new view.
    pub fn new(data: impl AsRef<[u8]>) -> Self {
        Self {
            data: Bytes::copy_from_slice(data.as_ref()),
        }
    }

    /// Number of bytes held, used for store accounting.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a copy of the underlying bytes.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Borrows the bytes without copying. Safe to expose because the buffer
    /// itself is immutable.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Adopts a freshly-allocated buffer without copying. Callers that still
/// hold aliases to the bytes must go through [`ByteView::new`] instead.
impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self { data: Bytes::from(data) }
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.data))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes)", self.data.len())
    }
}

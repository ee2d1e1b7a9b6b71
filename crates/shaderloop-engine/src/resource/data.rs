use std::borrow::Cow;

/// Typed host-side array backing a buffer, texture or vertex attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum HostData {
    F32(Vec<f32>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U16(Vec<u16>),
    U8(Vec<u8>),
}

impl HostData {
    /// Number of elements (not bytes).
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte width of one element.
    pub fn element_size(&self) -> usize {
        match self {
            Self::F32(_) | Self::U32(_) | Self::I32(_) => 4,
            Self::U16(_) => 2,
            Self::U8(_) => 1,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.len() * self.element_size()
    }

    /// Raw little-endian bytes of the array.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
            Self::I32(v) => bytemuck::cast_slice(v),
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U8(v) => v,
        }
    }

    /// Bytes padded with zeros to `wgpu::COPY_BUFFER_ALIGNMENT`.
    pub(crate) fn padded_bytes(&self) -> Cow<'_, [u8]> {
        let bytes = self.bytes();
        let padded_len = padded_size(bytes.len() as u64) as usize;
        if padded_len == bytes.len() {
            return Cow::Borrowed(bytes);
        }

        let mut owned = Vec::with_capacity(padded_len);
        owned.extend_from_slice(bytes);
        owned.resize(padded_len, 0);
        Cow::Owned(owned)
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Self::U32(v) => Some(v),
            _ => None,
        }
    }
}

/// Rounds a byte size up to the device copy alignment.
pub(crate) fn padded_size(len: u64) -> u64 {
    wgpu::util::align_to(len, wgpu::COPY_BUFFER_ALIGNMENT)
}

impl From<Vec<f32>> for HostData {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<u32>> for HostData {
    fn from(v: Vec<u32>) -> Self {
        Self::U32(v)
    }
}

impl From<Vec<i32>> for HostData {
    fn from(v: Vec<i32>) -> Self {
        Self::I32(v)
    }
}

impl From<Vec<u16>> for HostData {
    fn from(v: Vec<u16>) -> Self {
        Self::U16(v)
    }
}

impl From<Vec<u8>> for HostData {
    fn from(v: Vec<u8>) -> Self {
        Self::U8(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_follows_element_width() {
        assert_eq!(HostData::from(vec![0.0f32; 3]).byte_len(), 12);
        assert_eq!(HostData::from(vec![0u16; 3]).byte_len(), 6);
        assert_eq!(HostData::from(vec![0u8; 3]).byte_len(), 3);
    }

    #[test]
    fn padding_only_when_unaligned() {
        let aligned = HostData::from(vec![1u16, 2]);
        assert!(matches!(aligned.padded_bytes(), Cow::Borrowed(_)));

        let odd = HostData::from(vec![1u16, 2, 3]);
        let padded = odd.padded_bytes();
        assert_eq!(padded.len(), 8);
        assert_eq!(&padded[6..], &[0, 0]);
    }

    #[test]
    fn typed_views_match_variant() {
        let mut data = HostData::from(vec![1.0f32, 2.0]);
        assert!(data.as_u32().is_none());
        if let Some(v) = data.as_f32_mut() {
            v[1] = 5.0;
        }
        assert_eq!(data.as_f32(), Some(&[1.0, 5.0][..]));
    }
}

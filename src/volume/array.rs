use std::marker::PhantomData;

use bytemuck::Pod;
use bytes::Bytes;

use super::VolumeDims;
use crate::error::{invariant_violation, FetchResult};

/// Dense 3-D array backed by an immutable payload
///
/// Voxels are stored x fastest, then y, then z. The payload is a [`Bytes`]
/// handle so a volume can be handed on as a block payload without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume<T: Pod> {
    dims: VolumeDims,
    data: Bytes,
    _element: PhantomData<T>,
}

/// 8-bit intensity volume
pub type GrayVolume = Volume<u8>;

/// 64-bit label volume
pub type LabelVolume = Volume<u64>;

impl<T: Pod> Volume<T> {
    pub const ELEMENT_WIDTH: usize = std::mem::size_of::<T>();

    /// Wrap an existing payload; its length must match `dims`
    pub fn from_bytes(dims: VolumeDims, data: Bytes) -> FetchResult<Self> {
        let expected = Self::byte_len_for(dims);
        if data.len() != expected {
            return Err(invariant_violation(format!(
                "volume {:?} needs {} bytes, payload has {}",
                dims,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            dims,
            data,
            _element: PhantomData,
        })
    }

    pub fn from_elements(dims: VolumeDims, elements: &[T]) -> FetchResult<Self> {
        Self::from_bytes(dims, Bytes::copy_from_slice(bytemuck::cast_slice(elements)))
    }

    pub fn byte_len_for(dims: VolumeDims) -> usize {
        dims.iter().product::<usize>() * Self::ELEMENT_WIDTH
    }

    pub fn dims(&self) -> VolumeDims {
        self.dims
    }

    /// Raw payload bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Decode the payload into typed elements
    pub fn to_elements(&self) -> Vec<T> {
        self.data
            .chunks_exact(Self::ELEMENT_WIDTH)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<T> {
        if x >= self.dims[0] || y >= self.dims[1] || z >= self.dims[2] {
            return None;
        }
        let index = (z * self.dims[1] + y) * self.dims[0] + x;
        let start = index * Self::ELEMENT_WIDTH;
        Some(bytemuck::pod_read_unaligned(
            &self.data[start..start + Self::ELEMENT_WIDTH],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_volume_indexing() {
        let elements: Vec<u64> = (0..24).collect();
        let volume = LabelVolume::from_elements([4, 3, 2], &elements).unwrap();
        assert_eq!(volume.as_raw().len(), 24 * 8);
        assert_eq!(volume.get(0, 0, 0), Some(0));
        assert_eq!(volume.get(3, 0, 0), Some(3));
        assert_eq!(volume.get(0, 1, 0), Some(4));
        assert_eq!(volume.get(1, 2, 1), Some(12 + 8 + 1));
        assert_eq!(volume.get(4, 0, 0), None);
        assert_eq!(volume.to_elements(), elements);
    }

    #[test]
    fn test_payload_length_checked() {
        let err = GrayVolume::from_bytes([2, 2, 2], Bytes::from(vec![0u8; 7])).unwrap_err();
        assert!(matches!(err, crate::FetchError::InvariantViolation { .. }));
    }

    #[test]
    fn test_into_bytes_shares_buffer() {
        let volume = GrayVolume::from_bytes([2, 2, 1], Bytes::from(vec![1u8, 2, 3, 4])).unwrap();
        let ptr = volume.as_raw().as_ptr();
        let bytes = volume.into_bytes();
        assert_eq!(bytes.as_ptr(), ptr);
    }
}

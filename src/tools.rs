//! Typed element access over accessors.
//!
//! An [`Element`] maps a Rust type onto an accessor shape: `[f32; 3]` reads
//! `VEC3` data, `u16` reads unsigned-short scalars, and so on. Components are
//! converted from whatever the accessor stores to the element's component
//! type, so a `[f32; 3]` element can read quantized byte positions.
//!
//! Buffer bytes are resolved through a [`BufferDataAdapter`], letting hosts
//! that keep buffer payloads outside the asset plug their storage in.

use byteorder::{ByteOrder, LE};

use crate::accessor::{Accessor, ComponentType, Type};
use crate::asset::Asset;
use crate::buffer::DataSource;
use crate::Error;

/// Maps `Buffer` to its raw bytes.
pub trait BufferDataAdapter {
    /// The bytes of buffer `index`, or `None` when they are unavailable.
    fn buffer_data<'a>(&self, asset: &'a Asset, index: usize) -> Option<&'a [u8]>;
}

/// Resolves buffers whose bytes the asset owns; anything else (unloaded
/// URIs, host-mapped buffers, fallback buffers) is unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBufferDataAdapter;

impl BufferDataAdapter for DefaultBufferDataAdapter {
    fn buffer_data<'a>(&self, asset: &'a Asset, index: usize) -> Option<&'a [u8]> {
        match &asset.buffers.get(index)?.data {
            DataSource::Bytes { bytes, .. } => Some(bytes),
            _ => None,
        }
    }
}

/// A numeric component of an element.
pub trait Component: Copy + Default + 'static {
    /// The component type this Rust type corresponds to.
    const COMPONENT_TYPE: ComponentType;

    /// Numeric cast from a stored value.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_component {
    ($($rust:ty => $component:ident),* $(,)?) => {
        $(impl Component for $rust {
            const COMPONENT_TYPE: ComponentType = ComponentType::$component;

            fn from_f64(value: f64) -> Self {
                value as $rust
            }
        })*
    };
}

impl_component! {
    i8 => Byte,
    u8 => UnsignedByte,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
    f64 => Double,
}

/// A value assembled from one accessor element.
pub trait Element: Sized {
    /// The accessor shape this element reads.
    const TYPE: Type;

    /// The component type values convert into.
    type Component: Component;

    /// Assembles the element from exactly `TYPE.multiplicity()` components.
    fn from_components(components: &[Self::Component]) -> Self;

    /// The all-zero element, used for absent sparse base views.
    fn zero() -> Self;
}

impl<C: Component> Element for C {
    const TYPE: Type = Type::Scalar;
    type Component = C;

    fn from_components(components: &[C]) -> Self {
        components[0]
    }

    fn zero() -> Self {
        C::default()
    }
}

macro_rules! impl_vector_element {
    ($($n:literal => $type_:ident),* $(,)?) => {
        $(impl<C: Component> Element for [C; $n] {
            const TYPE: Type = Type::$type_;
            type Component = C;

            fn from_components(components: &[C]) -> Self {
                let mut out = [C::default(); $n];
                out.copy_from_slice(&components[..$n]);
                out
            }

            fn zero() -> Self {
                [C::default(); $n]
            }
        })*
    };
}

impl_vector_element! {
    2 => Vec2,
    3 => Vec3,
    4 => Vec4,
}

macro_rules! impl_matrix_element {
    ($($n:literal => $type_:ident),* $(,)?) => {
        $(impl<C: Component> Element for [[C; $n]; $n] {
            const TYPE: Type = Type::$type_;
            type Component = C;

            fn from_components(components: &[C]) -> Self {
                let mut out = [[C::default(); $n]; $n];
                for (column, chunk) in out.iter_mut().zip(components.chunks_exact($n)) {
                    column.copy_from_slice(chunk);
                }
                out
            }

            fn zero() -> Self {
                [[C::default(); $n]; $n]
            }
        })*
    };
}

impl_matrix_element! {
    2 => Mat2,
    3 => Mat3,
    4 => Mat4,
}

fn read_stored(bytes: &[u8], component_type: ComponentType) -> f64 {
    match component_type {
        ComponentType::Byte => bytes[0] as i8 as f64,
        ComponentType::UnsignedByte => bytes[0] as f64,
        ComponentType::Short => LE::read_i16(bytes) as f64,
        ComponentType::UnsignedShort => LE::read_u16(bytes) as f64,
        ComponentType::Int => LE::read_i32(bytes) as f64,
        ComponentType::UnsignedInt => LE::read_u32(bytes) as f64,
        ComponentType::Float => LE::read_f32(bytes) as f64,
        ComponentType::Double => LE::read_f64(bytes),
    }
}

fn decode_element<E: Element>(bytes: &[u8], component_type: ComponentType) -> E {
    let multiplicity = E::TYPE.multiplicity();
    let size = component_type.size();
    let mut components = [E::Component::default(); 16];
    for (i, slot) in components[..multiplicity].iter_mut().enumerate() {
        *slot = E::Component::from_f64(read_stored(&bytes[i * size..], component_type));
    }
    E::from_components(&components[..multiplicity])
}

fn view_bytes<'a>(
    asset: &'a Asset,
    view_index: usize,
    adapter: &impl BufferDataAdapter,
) -> Result<&'a [u8], Error> {
    let view = asset.buffer_views.get(view_index).ok_or(Error::InvalidGltf)?;
    let data = adapter
        .buffer_data(asset, view.buffer)
        .ok_or(Error::MissingExternalBuffer)?;
    data.get(view.byte_offset..view.byte_offset + view.byte_length)
        .ok_or(Error::InvalidGltf)
}

struct Window<'a> {
    bytes: &'a [u8],
    stride: usize,
}

impl Window<'_> {
    fn element(&self, index: usize, size: usize) -> Result<&[u8], Error> {
        let start = index * self.stride;
        self.bytes.get(start..start + size).ok_or(Error::InvalidGltf)
    }
}

fn accessor_window<'a>(
    asset: &'a Asset,
    accessor: &Accessor,
    adapter: &impl BufferDataAdapter,
) -> Result<Option<Window<'a>>, Error> {
    let view_index = match accessor.buffer_view {
        Some(view_index) => view_index,
        None => return Ok(None),
    };
    let view = asset.buffer_views.get(view_index).ok_or(Error::InvalidGltf)?;
    let bytes = view_bytes(asset, view_index, adapter)?;
    let bytes = bytes.get(accessor.byte_offset..).ok_or(Error::InvalidGltf)?;
    Ok(Some(Window {
        bytes,
        stride: view.byte_stride.unwrap_or_else(|| accessor.element_size()),
    }))
}

fn check_shape<E: Element>(accessor: &Accessor) -> Result<(), Error> {
    if accessor.type_ != E::TYPE {
        return Err(Error::InvalidGltf);
    }
    Ok(())
}

/// Reads the sparse index list as plain indices.
fn sparse_indices(
    asset: &Asset,
    accessor: &Accessor,
    adapter: &impl BufferDataAdapter,
) -> Result<Vec<u32>, Error> {
    let sparse = accessor.sparse.as_ref().ok_or(Error::InvalidGltf)?;
    let bytes = view_bytes(asset, sparse.indices.buffer_view, adapter)?;
    let bytes = bytes
        .get(sparse.indices.byte_offset..)
        .ok_or(Error::InvalidGltf)?;
    let size = sparse.indices.component_type.size();
    let mut out = Vec::with_capacity(sparse.count);
    for i in 0..sparse.count {
        let chunk = bytes.get(i * size..i * size + size).ok_or(Error::InvalidGltf)?;
        out.push(read_stored(chunk, sparse.indices.component_type) as u32);
    }
    Ok(out)
}

/// Fetches element `index` of an accessor, converting components as needed.
/// Sparse overlays are applied.
pub fn get_accessor_element<E: Element>(
    asset: &Asset,
    accessor_index: usize,
    index: usize,
    adapter: &impl BufferDataAdapter,
) -> Result<E, Error> {
    let accessor = asset
        .accessors
        .get(accessor_index)
        .ok_or(Error::InvalidGltf)?;
    check_shape::<E>(accessor)?;
    if index >= accessor.count {
        return Err(Error::InvalidGltf);
    }

    if let Some(sparse) = accessor.sparse.as_ref() {
        let indices = sparse_indices(asset, accessor, adapter)?;
        if let Ok(position) = indices.binary_search(&(index as u32)) {
            let values = view_bytes(asset, sparse.values.buffer_view, adapter)?;
            let values = values
                .get(sparse.values.byte_offset..)
                .ok_or(Error::InvalidGltf)?;
            let size = accessor.element_size();
            let bytes = values
                .get(position * size..position * size + size)
                .ok_or(Error::InvalidGltf)?;
            return Ok(decode_element(bytes, accessor.component_type));
        }
    }

    match accessor_window(asset, accessor, adapter)? {
        Some(window) => {
            let bytes = window.element(index, accessor.element_size())?;
            Ok(decode_element(bytes, accessor.component_type))
        }
        None => Ok(E::zero()),
    }
}

/// Visits every element of an accessor in index order, sparse overlay
/// applied.
pub fn iterate_accessor<E: Element, F: FnMut(E)>(
    asset: &Asset,
    accessor_index: usize,
    adapter: &impl BufferDataAdapter,
    mut visit: F,
) -> Result<(), Error> {
    let accessor = asset
        .accessors
        .get(accessor_index)
        .ok_or(Error::InvalidGltf)?;
    check_shape::<E>(accessor)?;
    let element_size = accessor.element_size();
    let window = accessor_window(asset, accessor, adapter)?;

    if let Some(sparse) = accessor.sparse.as_ref() {
        let indices = sparse_indices(asset, accessor, adapter)?;
        let values = view_bytes(asset, sparse.values.buffer_view, adapter)?;
        let values = values
            .get(sparse.values.byte_offset..)
            .ok_or(Error::InvalidGltf)?;
        let mut next_sparse = 0usize;
        for index in 0..accessor.count {
            if next_sparse < indices.len() && indices[next_sparse] as usize == index {
                let bytes = values
                    .get(next_sparse * element_size..(next_sparse + 1) * element_size)
                    .ok_or(Error::InvalidGltf)?;
                visit(decode_element(bytes, accessor.component_type));
                next_sparse += 1;
            } else {
                match window.as_ref() {
                    Some(window) => {
                        let bytes = window.element(index, element_size)?;
                        visit(decode_element(bytes, accessor.component_type));
                    }
                    None => visit(E::zero()),
                }
            }
        }
        return Ok(());
    }

    match window {
        Some(window) => {
            for index in 0..accessor.count {
                let bytes = window.element(index, element_size)?;
                visit(decode_element(bytes, accessor.component_type));
            }
        }
        // No backing view and no sparse overlay: every element is zero.
        None => {
            for _ in 0..accessor.count {
                visit(E::zero());
            }
        }
    }
    Ok(())
}

/// Copies every element of an accessor into `dst`. When the stored layout
/// matches the destination exactly (same component type, tight stride, no
/// sparse overlay) the copy is a single `memcpy`.
pub fn copy_from_accessor<E: Element>(
    asset: &Asset,
    accessor_index: usize,
    dst: &mut [E],
    adapter: &impl BufferDataAdapter,
) -> Result<(), Error> {
    let accessor = asset
        .accessors
        .get(accessor_index)
        .ok_or(Error::InvalidGltf)?;
    check_shape::<E>(accessor)?;
    if dst.len() < accessor.count {
        return Err(Error::InvalidGltf);
    }

    let element_size = accessor.element_size();
    if accessor.sparse.is_none()
        && accessor.component_type == E::Component::COMPONENT_TYPE
        && element_size == std::mem::size_of::<E>()
    {
        if let Some(window) = accessor_window(asset, accessor, adapter)? {
            if window.stride == element_size {
                let total = element_size * accessor.count;
                let src = window.bytes.get(..total).ok_or(Error::InvalidGltf)?;
                // Component layouts agree and both sides are tightly packed.
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        src.as_ptr(),
                        dst.as_mut_ptr() as *mut u8,
                        total,
                    );
                }
                return Ok(());
            }
        }
    }

    let mut index = 0;
    iterate_accessor(asset, accessor_index, adapter, |element: E| {
        dst[index] = element;
        index += 1;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Sparse, SparseIndices, SparseValues};
    use crate::buffer::{Buffer, MimeType, View};

    fn asset_with_buffer(bytes: Vec<u8>, views: Vec<View>, accessors: Vec<Accessor>) -> Asset {
        Asset {
            buffers: vec![Buffer {
                byte_length: bytes.len(),
                data: DataSource::Bytes {
                    bytes,
                    mime_type: MimeType::GltfBuffer,
                },
                name: None,
            }],
            buffer_views: views,
            accessors,
            ..Default::default()
        }
    }

    fn plain_view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> View {
        View {
            buffer: 0,
            byte_offset,
            byte_length,
            byte_stride,
            target: None,
            meshopt_compression: None,
            name: None,
        }
    }

    fn float_vec3_accessor(count: usize) -> Accessor {
        Accessor {
            buffer_view: Some(0),
            byte_offset: 0,
            count,
            type_: Type::Vec3,
            component_type: ComponentType::Float,
            normalized: false,
            min: None,
            max: None,
            sparse: None,
            name: None,
        }
    }

    #[test]
    fn reads_tight_float_vectors() {
        let values: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let bytes: Vec<u8> = bytemuck::cast_slice(&values).to_vec();
        let asset = asset_with_buffer(
            bytes,
            vec![plain_view(0, 24, None)],
            vec![float_vec3_accessor(2)],
        );

        let adapter = DefaultBufferDataAdapter;
        let first: [f32; 3] = get_accessor_element(&asset, 0, 0, &adapter).unwrap();
        let second: [f32; 3] = get_accessor_element(&asset, 0, 1, &adapter).unwrap();
        assert_eq!(first, [1.0, 2.0, 3.0]);
        assert_eq!(second, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn respects_byte_stride() {
        // Two vec3s padded to a 16-byte stride.
        let mut bytes = Vec::new();
        for chunk in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]] {
            bytes.extend_from_slice(bytemuck::cast_slice(&chunk));
            bytes.extend_from_slice(&[0u8; 4]);
        }
        let asset = asset_with_buffer(
            bytes,
            vec![plain_view(0, 32, Some(16))],
            vec![float_vec3_accessor(2)],
        );

        let adapter = DefaultBufferDataAdapter;
        let second: [f32; 3] = get_accessor_element(&asset, 0, 1, &adapter).unwrap();
        assert_eq!(second, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn iteration_matches_random_access() {
        let values: Vec<u16> = (0..7).map(|i| i * 3).collect();
        let bytes: Vec<u8> = bytemuck::cast_slice(&values).to_vec();
        let mut accessor = float_vec3_accessor(7);
        accessor.type_ = Type::Scalar;
        accessor.component_type = ComponentType::UnsignedShort;
        let asset = asset_with_buffer(bytes, vec![plain_view(0, 14, None)], vec![accessor]);

        let adapter = DefaultBufferDataAdapter;
        let mut collected = Vec::new();
        iterate_accessor(&asset, 0, &adapter, |value: u16| collected.push(value)).unwrap();
        assert_eq!(collected.len(), 7);
        for (index, &value) in collected.iter().enumerate() {
            let direct: u16 = get_accessor_element(&asset, 0, index, &adapter).unwrap();
            assert_eq!(direct, value);
        }
    }

    #[test]
    fn converts_components() {
        let bytes = vec![0u8, 128, 255, 0];
        let mut accessor = float_vec3_accessor(3);
        accessor.type_ = Type::Scalar;
        accessor.component_type = ComponentType::UnsignedByte;
        let asset = asset_with_buffer(bytes, vec![plain_view(0, 3, None)], vec![accessor]);

        let adapter = DefaultBufferDataAdapter;
        let mut collected = Vec::new();
        iterate_accessor(&asset, 0, &adapter, |value: f32| collected.push(value)).unwrap();
        assert_eq!(collected, vec![0.0, 128.0, 255.0]);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let asset = asset_with_buffer(
            vec![0u8; 12],
            vec![plain_view(0, 12, None)],
            vec![float_vec3_accessor(1)],
        );
        let adapter = DefaultBufferDataAdapter;
        let result: Result<[f32; 2], _> = get_accessor_element(&asset, 0, 0, &adapter);
        assert_eq!(result.unwrap_err(), Error::InvalidGltf);
    }

    fn sparse_asset() -> Asset {
        // Base: 1024 zero floats. Sparse: values {1.0, 2.0, 3.0} at
        // indices {10, 20, 30}, stored as unsigned shorts.
        let base = vec![0u8; 4096];
        let indices: Vec<u8> = [10u16, 20, 30]
            .iter()
            .flat_map(|i| i.to_le_bytes())
            .collect();
        let values: Vec<u8> = [1.0f32, 2.0, 3.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let mut bytes = base;
        let indices_offset = bytes.len();
        bytes.extend_from_slice(&indices);
        let values_offset = bytes.len();
        bytes.extend_from_slice(&values);
        let total = bytes.len();

        let mut accessor = float_vec3_accessor(1024);
        accessor.type_ = Type::Scalar;
        accessor.sparse = Some(Sparse {
            count: 3,
            indices: SparseIndices {
                buffer_view: 1,
                byte_offset: 0,
                component_type: ComponentType::UnsignedShort,
            },
            values: SparseValues {
                buffer_view: 2,
                byte_offset: 0,
            },
        });

        let mut asset = asset_with_buffer(
            vec![],
            vec![
                plain_view(0, 4096, None),
                plain_view(indices_offset, 6, None),
                plain_view(values_offset, 12, None),
            ],
            vec![accessor],
        );
        asset.buffers[0] = Buffer {
            byte_length: total,
            data: DataSource::Bytes {
                bytes,
                mime_type: MimeType::GltfBuffer,
            },
            name: None,
        };
        asset
    }

    #[test]
    fn sparse_overlay_replaces_selected_elements() {
        let asset = sparse_asset();
        let adapter = DefaultBufferDataAdapter;
        let mut collected = Vec::new();
        iterate_accessor(&asset, 0, &adapter, |value: f32| collected.push(value)).unwrap();
        assert_eq!(collected.len(), 1024);
        for (index, value) in collected.iter().enumerate() {
            let expected = match index {
                10 => 1.0,
                20 => 2.0,
                30 => 3.0,
                _ => 0.0,
            };
            assert_eq!(*value, expected, "element {index}");
        }

        let direct: f32 = get_accessor_element(&asset, 0, 20, &adapter).unwrap();
        assert_eq!(direct, 2.0);
        let direct: f32 = get_accessor_element(&asset, 0, 21, &adapter).unwrap();
        assert_eq!(direct, 0.0);
    }

    #[test]
    fn copy_fast_path_and_slow_path_agree() {
        let values: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let bytes: Vec<u8> = bytemuck::cast_slice(&values).to_vec();
        let asset = asset_with_buffer(
            bytes,
            vec![plain_view(0, 48, None)],
            vec![float_vec3_accessor(4)],
        );
        let adapter = DefaultBufferDataAdapter;

        let mut fast = [[0.0f32; 3]; 4];
        copy_from_accessor(&asset, 0, &mut fast, &adapter).unwrap();

        let mut slow = Vec::new();
        iterate_accessor(&asset, 0, &adapter, |v: [f32; 3]| slow.push(v)).unwrap();
        assert_eq!(fast.to_vec(), slow);
    }
}

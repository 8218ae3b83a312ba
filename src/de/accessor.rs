//! Accessor array parsing.

use serde_json::{Map, Value};

use super::{as_array, as_object, get_index, get_name, req_index, req_u64, Ctx};
use crate::accessor::{Accessor, Bounds, ComponentType, Sparse, SparseIndices, SparseValues, Type};
use crate::asset::Category;
use crate::{extensions, Error, Extensions, Options};

pub(super) fn parse_accessors(ctx: &mut Ctx<'_>, value: &Value) -> Result<(), Error> {
    let entries = as_array(value)?;
    ctx.asset.accessors.reserve(entries.len());
    for entry in entries {
        let accessor = parse_accessor(ctx, as_object(entry)?)?;
        ctx.asset.accessors.push(accessor);
    }
    ctx.asset.available_categories |= Category::ACCESSORS;
    Ok(())
}

fn allow_wide_types(ctx: &Ctx<'_>) -> bool {
    ctx.options.contains(Options::ALLOW_DOUBLE)
        || (ctx.enabled.contains(Extensions::KHR_ACCESSOR_FLOAT64)
            && ctx
                .asset
                .extensions_used
                .iter()
                .any(|used| used == extensions::KHR_ACCESSOR_FLOAT64))
}

fn parse_accessor(ctx: &Ctx<'_>, object: &Map<String, Value>) -> Result<Accessor, Error> {
    let component_type =
        ComponentType::from_gl_enum(req_u64(object, "componentType")?).ok_or(Error::InvalidGltf)?;
    if matches!(component_type, ComponentType::Int | ComponentType::Double)
        && !allow_wide_types(ctx)
    {
        return Err(Error::InvalidGltf);
    }

    let type_ = Type::from_str(object.get("type").and_then(Value::as_str).ok_or(
        if object.contains_key("type") {
            Error::InvalidGltf
        } else {
            Error::MissingField
        },
    )?)
    .ok_or(Error::InvalidGltf)?;

    let count = req_u64(object, "count")? as usize;
    if count < 1 {
        return Err(Error::InvalidGltf);
    }

    let normalized = super::get_bool(object, "normalized")?.unwrap_or(false);
    if normalized && (component_type == ComponentType::UnsignedInt || component_type.is_float()) {
        return Err(Error::InvalidGltf);
    }

    let min = parse_bounds(object.get("min"), type_, component_type)?;
    let max = parse_bounds(object.get("max"), type_, component_type)?;
    let sparse = match super::get_object(object, "sparse")? {
        Some(sparse) => Some(parse_sparse(sparse)?),
        None => None,
    };

    Ok(Accessor {
        buffer_view: get_index(object, "bufferView")?,
        byte_offset: get_index(object, "byteOffset")?.unwrap_or(0),
        count,
        type_,
        component_type,
        normalized,
        min,
        max,
        sparse,
        name: get_name(object)?,
    })
}

/// Parses a `min`/`max` array into the storage matching the component type:
/// `f64` for float accessors, `i64` otherwise. Elements of the wrong kind
/// are rejected rather than coerced.
fn parse_bounds(
    value: Option<&Value>,
    type_: Type,
    component_type: ComponentType,
) -> Result<Option<Bounds>, Error> {
    let value = match value {
        None => return Ok(None),
        Some(value) => value,
    };
    let array = value.as_array().ok_or(Error::InvalidGltf)?;
    if array.len() != type_.multiplicity() {
        return Err(Error::InvalidGltf);
    }
    if component_type.is_float() {
        let mut out = Vec::with_capacity(array.len());
        for entry in array {
            out.push(entry.as_f64().ok_or(Error::InvalidGltf)?);
        }
        Ok(Some(Bounds::F64(out)))
    } else {
        let mut out = Vec::with_capacity(array.len());
        for entry in array {
            out.push(entry.as_i64().ok_or(Error::InvalidGltf)?);
        }
        Ok(Some(Bounds::I64(out)))
    }
}

fn parse_sparse(object: &Map<String, Value>) -> Result<Sparse, Error> {
    let count = req_u64(object, "count")? as usize;

    let indices = super::get_object(object, "indices")?.ok_or(Error::MissingField)?;
    let index_component_type = ComponentType::from_gl_enum(req_u64(indices, "componentType")?)
        .ok_or(Error::InvalidGltf)?;
    if !matches!(
        index_component_type,
        ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
    ) {
        return Err(Error::InvalidGltf);
    }
    let indices = SparseIndices {
        buffer_view: req_index(indices, "bufferView")?,
        byte_offset: get_index(indices, "byteOffset")?.unwrap_or(0),
        component_type: index_component_type,
    };

    let values = super::get_object(object, "values")?.ok_or(Error::MissingField)?;
    let values = SparseValues {
        buffer_view: req_index(values, "bufferView")?,
        byte_offset: get_index(values, "byteOffset")?.unwrap_or(0),
    };

    Ok(Sparse {
        count,
        indices,
        values,
    })
}

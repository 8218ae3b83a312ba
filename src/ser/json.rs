//! Deterministic asset → JSON string composition.
//!
//! The writer emits each populated section in a fixed order, omits fields
//! that hold their specification defaults, and prints floats with Rust's
//! shortest-round-trip formatting. Array order always matches the asset;
//! key order within objects is an implementation detail.

use std::fmt::Write;

use crate::accessor::{Accessor, Bounds};
use crate::animation::Animation;
use crate::asset::Asset;
use crate::buffer::{Buffer, DataSource, View};
use crate::camera::{Camera, Projection};
use crate::light::{Kind, Light};
use crate::material::{Material, NormalTextureInfo, OcclusionTextureInfo, TextureInfo};
use crate::mesh::{Attribute, Mesh, Primitive, Topology};
use crate::scene::{Node, Transform};
use crate::texture::{Sampler, Texture, WrappingMode};
use crate::{extensions, Error};

/// Escapes `"` and `\`, plus control characters, into `out`.
pub(crate) fn write_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

fn push_str_value(out: &mut String, text: &str) {
    out.push('"');
    write_escaped(out, text);
    out.push('"');
}

fn push_f32(out: &mut String, value: f32) {
    let _ = write!(out, "{value}");
}

fn push_f32_slice(out: &mut String, values: &[f32]) {
    out.push('[');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_f32(out, *value);
    }
    out.push(']');
}

/// Tracks comma placement inside one object or array.
struct Block<'a> {
    out: &'a mut String,
    first: bool,
    close: char,
}

impl<'a> Block<'a> {
    fn object(out: &'a mut String) -> Self {
        out.push('{');
        Self {
            out,
            first: true,
            close: '}',
        }
    }

    fn array(out: &'a mut String) -> Self {
        out.push('[');
        Self {
            out,
            first: true,
            close: ']',
        }
    }

    fn sep(&mut self) {
        if self.first {
            self.first = false;
        } else {
            self.out.push(',');
        }
    }

    /// Starts a field and returns the sink for its value.
    fn field(&mut self, key: &str) -> &mut String {
        self.sep();
        self.out.push('"');
        self.out.push_str(key);
        self.out.push_str("\":");
        self.out
    }

    /// Starts an array element and returns the sink for its value.
    fn item(&mut self) -> &mut String {
        self.sep();
        self.out
    }

    fn str_field(&mut self, key: &str, value: &str) {
        push_str_value(self.field(key), value);
    }

    fn u64_field(&mut self, key: &str, value: u64) {
        let _ = write!(self.field(key), "{value}");
    }

    fn f32_field(&mut self, key: &str, value: f32) {
        push_f32(self.field(key), value);
    }

    fn bool_field(&mut self, key: &str, value: bool) {
        let _ = write!(self.field(key), "{value}");
    }

    fn opt_name(&mut self, name: &Option<String>) {
        if let Some(name) = name {
            self.str_field("name", name);
        }
    }

    fn finish(self) {
        self.out.push(self.close);
    }
}

/// Composes the complete document.
pub(crate) fn write_json(
    asset: &Asset,
    buffer_uris: &[Option<String>],
    image_uris: &[Option<String>],
) -> Result<String, Error> {
    let mut out = String::with_capacity(4096);
    let mut root = Block::object(&mut out);

    {
        let info = asset.info.as_ref();
        let mut block = Block::object(root.field("asset"));
        block.str_field("version", info.map_or("2.0", |info| info.version.as_str()));
        if let Some(info) = info {
            if let Some(min_version) = &info.min_version {
                block.str_field("minVersion", min_version);
            }
            if let Some(generator) = &info.generator {
                block.str_field("generator", generator);
            }
            if let Some(copyright) = &info.copyright {
                block.str_field("copyright", copyright);
            }
        }
        block.finish();
    }

    if !asset.extensions_used.is_empty() {
        let mut block = Block::array(root.field("extensionsUsed"));
        for name in &asset.extensions_used {
            push_str_value(block.item(), name);
        }
        block.finish();
    }
    if !asset.extensions_required.is_empty() {
        let mut block = Block::array(root.field("extensionsRequired"));
        for name in &asset.extensions_required {
            push_str_value(block.item(), name);
        }
        block.finish();
    }

    if !asset.buffers.is_empty() {
        let mut block = Block::array(root.field("buffers"));
        for (index, buffer) in asset.buffers.iter().enumerate() {
            write_buffer(block.item(), buffer, buffer_uris.get(index).and_then(Option::as_deref));
        }
        block.finish();
    }

    if !asset.buffer_views.is_empty() {
        let mut block = Block::array(root.field("bufferViews"));
        for view in &asset.buffer_views {
            write_buffer_view(block.item(), view);
        }
        block.finish();
    }

    if !asset.accessors.is_empty() {
        let mut block = Block::array(root.field("accessors"));
        for accessor in &asset.accessors {
            write_accessor(block.item(), accessor);
        }
        block.finish();
    }

    if !asset.images.is_empty() {
        let mut block = Block::array(root.field("images"));
        for (index, image) in asset.images.iter().enumerate() {
            write_image(
                block.item(),
                image,
                image_uris.get(index).and_then(Option::as_deref),
            );
        }
        block.finish();
    }

    if !asset.samplers.is_empty() {
        let mut block = Block::array(root.field("samplers"));
        for sampler in &asset.samplers {
            write_sampler(block.item(), sampler);
        }
        block.finish();
    }

    if !asset.textures.is_empty() {
        let mut block = Block::array(root.field("textures"));
        for texture in &asset.textures {
            write_texture(block.item(), texture);
        }
        block.finish();
    }

    if !asset.materials.is_empty() {
        let mut block = Block::array(root.field("materials"));
        for material in &asset.materials {
            write_material(block.item(), material);
        }
        block.finish();
    }

    if !asset.meshes.is_empty() {
        let mut block = Block::array(root.field("meshes"));
        for mesh in &asset.meshes {
            write_mesh(block.item(), mesh);
        }
        block.finish();
    }

    if !asset.cameras.is_empty() {
        let mut block = Block::array(root.field("cameras"));
        for camera in &asset.cameras {
            write_camera(block.item(), camera);
        }
        block.finish();
    }

    if !asset.nodes.is_empty() {
        let mut block = Block::array(root.field("nodes"));
        for node in &asset.nodes {
            write_node(block.item(), node);
        }
        block.finish();
    }

    if !asset.skins.is_empty() {
        let mut block = Block::array(root.field("skins"));
        for skin in &asset.skins {
            let mut object = Block::object(block.item());
            if let Some(ibm) = skin.inverse_bind_matrices {
                object.u64_field("inverseBindMatrices", ibm as u64);
            }
            if let Some(skeleton) = skin.skeleton {
                object.u64_field("skeleton", skeleton as u64);
            }
            write_index_array(&mut object, "joints", &skin.joints);
            object.opt_name(&skin.name);
            object.finish();
        }
        block.finish();
    }

    if !asset.animations.is_empty() {
        let mut block = Block::array(root.field("animations"));
        for animation in &asset.animations {
            write_animation(block.item(), animation);
        }
        block.finish();
    }

    if !asset.scenes.is_empty() {
        let mut block = Block::array(root.field("scenes"));
        for scene in &asset.scenes {
            let mut object = Block::object(block.item());
            if !scene.nodes.is_empty() {
                write_index_array(&mut object, "nodes", &scene.nodes);
            }
            object.opt_name(&scene.name);
            object.finish();
        }
        block.finish();
    }

    if let Some(default_scene) = asset.default_scene {
        root.u64_field("scene", default_scene as u64);
    }

    if !asset.lights.is_empty() || !asset.material_variants.is_empty() {
        let mut block = Block::object(root.field("extensions"));
        if !asset.lights.is_empty() {
            let mut ext = Block::object(block.field(extensions::KHR_LIGHTS_PUNCTUAL));
            let mut lights = Block::array(ext.field("lights"));
            for light in &asset.lights {
                write_light(lights.item(), light);
            }
            lights.finish();
            ext.finish();
        }
        if !asset.material_variants.is_empty() {
            let mut ext = Block::object(block.field(extensions::KHR_MATERIALS_VARIANTS));
            let mut variants = Block::array(ext.field("variants"));
            for name in &asset.material_variants {
                let mut variant = Block::object(variants.item());
                variant.str_field("name", name);
                variant.finish();
            }
            variants.finish();
            ext.finish();
        }
        block.finish();
    }

    root.finish();
    Ok(out)
}

fn write_index_array(object: &mut Block<'_>, key: &str, indices: &[usize]) {
    let mut array = Block::array(object.field(key));
    for &index in indices {
        let _ = write!(array.item(), "{index}");
    }
    array.finish();
}

fn write_buffer(out: &mut String, buffer: &Buffer, uri: Option<&str>) {
    let mut object = Block::object(out);
    object.u64_field("byteLength", buffer.byte_length as u64);
    match (&buffer.data, uri) {
        (DataSource::Uri { uri, .. }, None) => object.str_field("uri", uri.as_str()),
        (_, Some(uri)) => object.str_field("uri", uri),
        (DataSource::Fallback, None) => {
            let mut ext = Block::object(object.field("extensions"));
            let mut meshopt = Block::object(ext.field(extensions::EXT_MESHOPT_COMPRESSION));
            meshopt.bool_field("fallback", true);
            meshopt.finish();
            ext.finish();
        }
        _ => {}
    }
    object.opt_name(&buffer.name);
    object.finish();
}

fn write_buffer_view(out: &mut String, view: &View) {
    let mut object = Block::object(out);
    object.u64_field("buffer", view.buffer as u64);
    if view.byte_offset != 0 {
        object.u64_field("byteOffset", view.byte_offset as u64);
    }
    object.u64_field("byteLength", view.byte_length as u64);
    if let Some(stride) = view.byte_stride {
        object.u64_field("byteStride", stride as u64);
    }
    if let Some(target) = view.target {
        object.u64_field("target", target.as_gl_enum() as u64);
    }
    if let Some(meshopt) = &view.meshopt_compression {
        let mut ext = Block::object(object.field("extensions"));
        let mut block = Block::object(ext.field(extensions::EXT_MESHOPT_COMPRESSION));
        block.u64_field("buffer", meshopt.buffer as u64);
        if meshopt.byte_offset != 0 {
            block.u64_field("byteOffset", meshopt.byte_offset as u64);
        }
        block.u64_field("byteLength", meshopt.byte_length as u64);
        block.u64_field("byteStride", meshopt.byte_stride as u64);
        block.u64_field("count", meshopt.count as u64);
        block.str_field("mode", meshopt.mode.as_str());
        if meshopt.filter != crate::buffer::CompressionFilter::None {
            block.str_field("filter", meshopt.filter.as_str());
        }
        block.finish();
        ext.finish();
    }
    object.opt_name(&view.name);
    object.finish();
}

fn write_bounds(object: &mut Block<'_>, key: &str, bounds: &Bounds) {
    let mut array = Block::array(object.field(key));
    match bounds {
        Bounds::I64(values) => {
            for value in values {
                let _ = write!(array.item(), "{value}");
            }
        }
        Bounds::F64(values) => {
            for value in values {
                let _ = write!(array.item(), "{value}");
            }
        }
    }
    array.finish();
}

fn write_accessor(out: &mut String, accessor: &Accessor) {
    let mut object = Block::object(out);
    if let Some(view) = accessor.buffer_view {
        object.u64_field("bufferView", view as u64);
    }
    if accessor.byte_offset != 0 {
        object.u64_field("byteOffset", accessor.byte_offset as u64);
    }
    object.u64_field("count", accessor.count as u64);
    object.u64_field("componentType", accessor.component_type.as_gl_enum() as u64);
    object.str_field("type", accessor.type_.as_str());
    if accessor.normalized {
        object.bool_field("normalized", true);
    }
    if let Some(min) = &accessor.min {
        write_bounds(&mut object, "min", min);
    }
    if let Some(max) = &accessor.max {
        write_bounds(&mut object, "max", max);
    }
    if let Some(sparse) = &accessor.sparse {
        let mut block = Block::object(object.field("sparse"));
        block.u64_field("count", sparse.count as u64);
        {
            let mut indices = Block::object(block.field("indices"));
            indices.u64_field("bufferView", sparse.indices.buffer_view as u64);
            if sparse.indices.byte_offset != 0 {
                indices.u64_field("byteOffset", sparse.indices.byte_offset as u64);
            }
            indices.u64_field(
                "componentType",
                sparse.indices.component_type.as_gl_enum() as u64,
            );
            indices.finish();
        }
        {
            let mut values = Block::object(block.field("values"));
            values.u64_field("bufferView", sparse.values.buffer_view as u64);
            if sparse.values.byte_offset != 0 {
                values.u64_field("byteOffset", sparse.values.byte_offset as u64);
            }
            values.finish();
        }
        block.finish();
    }
    object.opt_name(&accessor.name);
    object.finish();
}

fn write_image(out: &mut String, image: &crate::image::Image, uri: Option<&str>) {
    let mut object = Block::object(out);
    match (&image.data, uri) {
        (DataSource::BufferView {
            buffer_view,
            mime_type,
        }, _) => {
            object.u64_field("bufferView", *buffer_view as u64);
            if let Some(mime) = mime_type.as_str() {
                object.str_field("mimeType", mime);
            }
        }
        (DataSource::Uri { uri, mime_type, .. }, None) => {
            object.str_field("uri", uri.as_str());
            if let Some(mime) = mime_type.as_str() {
                object.str_field("mimeType", mime);
            }
        }
        (DataSource::Bytes { mime_type, .. }, Some(uri)) => {
            object.str_field("uri", uri);
            if let Some(mime) = mime_type.as_str() {
                object.str_field("mimeType", mime);
            }
        }
        _ => {}
    }
    object.opt_name(&image.name);
    object.finish();
}

fn write_sampler(out: &mut String, sampler: &Sampler) {
    let mut object = Block::object(out);
    if let Some(mag) = sampler.mag_filter {
        object.u64_field("magFilter", mag.as_gl_enum() as u64);
    }
    if let Some(min) = sampler.min_filter {
        object.u64_field("minFilter", min.as_gl_enum() as u64);
    }
    if sampler.wrap_s != WrappingMode::Repeat {
        object.u64_field("wrapS", sampler.wrap_s.as_gl_enum() as u64);
    }
    if sampler.wrap_t != WrappingMode::Repeat {
        object.u64_field("wrapT", sampler.wrap_t.as_gl_enum() as u64);
    }
    object.opt_name(&sampler.name);
    object.finish();
}

fn write_texture(out: &mut String, texture: &Texture) {
    let mut object = Block::object(out);
    if let Some(sampler) = texture.sampler {
        object.u64_field("sampler", sampler as u64);
    }
    if let Some(image) = texture.image {
        object.u64_field("source", image as u64);
    }
    let has_ext = texture.basisu_image.is_some()
        || texture.dds_image.is_some()
        || texture.webp_image.is_some();
    if has_ext {
        let mut ext = Block::object(object.field("extensions"));
        if let Some(source) = texture.basisu_image {
            let mut block = Block::object(ext.field(extensions::KHR_TEXTURE_BASISU));
            block.u64_field("source", source as u64);
            block.finish();
        }
        if let Some(source) = texture.dds_image {
            let mut block = Block::object(ext.field(extensions::MSFT_TEXTURE_DDS));
            block.u64_field("source", source as u64);
            block.finish();
        }
        if let Some(source) = texture.webp_image {
            let mut block = Block::object(ext.field(extensions::EXT_TEXTURE_WEBP));
            block.u64_field("source", source as u64);
            block.finish();
        }
        ext.finish();
    }
    object.opt_name(&texture.name);
    object.finish();
}

fn write_texture_info_fields(object: &mut Block<'_>, info: &TextureInfo) {
    object.u64_field("index", info.texture as u64);
    if info.tex_coord != 0 {
        object.u64_field("texCoord", info.tex_coord as u64);
    }
    if let Some(transform) = &info.transform {
        let mut ext = Block::object(object.field("extensions"));
        let mut block = Block::object(ext.field(extensions::KHR_TEXTURE_TRANSFORM));
        if transform.uv_offset != [0.0, 0.0] {
            push_f32_slice(block.field("offset"), &transform.uv_offset);
        }
        if transform.rotation != 0.0 {
            block.f32_field("rotation", transform.rotation);
        }
        if transform.uv_scale != [1.0, 1.0] {
            push_f32_slice(block.field("scale"), &transform.uv_scale);
        }
        if let Some(tex_coord) = transform.tex_coord {
            block.u64_field("texCoord", tex_coord as u64);
        }
        block.finish();
        ext.finish();
    }
}

fn write_texture_info(object: &mut Block<'_>, key: &str, info: &TextureInfo) {
    let mut block = Block::object(object.field(key));
    write_texture_info_fields(&mut block, info);
    block.finish();
}

fn write_normal_texture(object: &mut Block<'_>, key: &str, info: &NormalTextureInfo) {
    let mut block = Block::object(object.field(key));
    write_texture_info_fields(&mut block, &info.texture);
    if info.scale != 1.0 {
        block.f32_field("scale", info.scale);
    }
    block.finish();
}

fn write_occlusion_texture(object: &mut Block<'_>, key: &str, info: &OcclusionTextureInfo) {
    let mut block = Block::object(object.field(key));
    write_texture_info_fields(&mut block, &info.texture);
    if info.strength != 1.0 {
        block.f32_field("strength", info.strength);
    }
    block.finish();
}

fn write_material(out: &mut String, material: &Material) {
    let mut object = Block::object(out);

    let pbr = &material.pbr;
    let pbr_default = crate::material::PbrMetallicRoughness::default();
    if *pbr != pbr_default {
        let mut block = Block::object(object.field("pbrMetallicRoughness"));
        if pbr.base_color_factor != pbr_default.base_color_factor {
            push_f32_slice(block.field("baseColorFactor"), &pbr.base_color_factor);
        }
        if let Some(info) = &pbr.base_color_texture {
            write_texture_info(&mut block, "baseColorTexture", info);
        }
        if pbr.metallic_factor != pbr_default.metallic_factor {
            block.f32_field("metallicFactor", pbr.metallic_factor);
        }
        if pbr.roughness_factor != pbr_default.roughness_factor {
            block.f32_field("roughnessFactor", pbr.roughness_factor);
        }
        if let Some(info) = &pbr.metallic_roughness_texture {
            write_texture_info(&mut block, "metallicRoughnessTexture", info);
        }
        block.finish();
    }

    if let Some(info) = &material.normal_texture {
        write_normal_texture(&mut object, "normalTexture", info);
    }
    if let Some(info) = &material.occlusion_texture {
        write_occlusion_texture(&mut object, "occlusionTexture", info);
    }
    if let Some(info) = &material.emissive_texture {
        write_texture_info(&mut object, "emissiveTexture", info);
    }
    if material.emissive_factor != [0.0; 3] {
        push_f32_slice(object.field("emissiveFactor"), &material.emissive_factor);
    }
    if material.alpha_mode != crate::material::AlphaMode::Opaque {
        object.str_field("alphaMode", material.alpha_mode.as_str());
    }
    if material.alpha_cutoff != 0.5 {
        object.f32_field("alphaCutoff", material.alpha_cutoff);
    }
    if material.double_sided {
        object.bool_field("doubleSided", true);
    }

    write_material_extensions(&mut object, material);
    object.opt_name(&material.name);
    object.finish();
}

fn write_material_extensions(object: &mut Block<'_>, material: &Material) {
    let any = material.anisotropy.is_some()
        || material.clearcoat.is_some()
        || material.sheen.is_some()
        || material.specular.is_some()
        || material.transmission.is_some()
        || material.volume.is_some()
        || material.iridescence.is_some()
        || material.diffuse_transmission.is_some()
        || material.ior.is_some()
        || material.dispersion.is_some()
        || material.emissive_strength.is_some()
        || material.unlit
        || material.packed_normal_roughness_metallic.is_some()
        || material.packed_occlusion_roughness_metallic.is_some();
    if !any {
        return;
    }

    let mut ext = Block::object(object.field("extensions"));

    if let Some(anisotropy) = &material.anisotropy {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_ANISOTROPY));
        if anisotropy.anisotropy_strength != 0.0 {
            block.f32_field("anisotropyStrength", anisotropy.anisotropy_strength);
        }
        if anisotropy.anisotropy_rotation != 0.0 {
            block.f32_field("anisotropyRotation", anisotropy.anisotropy_rotation);
        }
        if let Some(info) = &anisotropy.anisotropy_texture {
            write_texture_info(&mut block, "anisotropyTexture", info);
        }
        block.finish();
    }
    if let Some(clearcoat) = &material.clearcoat {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_CLEARCOAT));
        if clearcoat.clearcoat_factor != 0.0 {
            block.f32_field("clearcoatFactor", clearcoat.clearcoat_factor);
        }
        if let Some(info) = &clearcoat.clearcoat_texture {
            write_texture_info(&mut block, "clearcoatTexture", info);
        }
        if clearcoat.clearcoat_roughness_factor != 0.0 {
            block.f32_field("clearcoatRoughnessFactor", clearcoat.clearcoat_roughness_factor);
        }
        if let Some(info) = &clearcoat.clearcoat_roughness_texture {
            write_texture_info(&mut block, "clearcoatRoughnessTexture", info);
        }
        if let Some(info) = &clearcoat.clearcoat_normal_texture {
            write_normal_texture(&mut block, "clearcoatNormalTexture", info);
        }
        block.finish();
    }
    if let Some(sheen) = &material.sheen {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_SHEEN));
        if sheen.sheen_color_factor != [0.0; 3] {
            push_f32_slice(block.field("sheenColorFactor"), &sheen.sheen_color_factor);
        }
        if let Some(info) = &sheen.sheen_color_texture {
            write_texture_info(&mut block, "sheenColorTexture", info);
        }
        if sheen.sheen_roughness_factor != 0.0 {
            block.f32_field("sheenRoughnessFactor", sheen.sheen_roughness_factor);
        }
        if let Some(info) = &sheen.sheen_roughness_texture {
            write_texture_info(&mut block, "sheenRoughnessTexture", info);
        }
        block.finish();
    }
    if let Some(specular) = &material.specular {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_SPECULAR));
        if specular.specular_factor != 1.0 {
            block.f32_field("specularFactor", specular.specular_factor);
        }
        if let Some(info) = &specular.specular_texture {
            write_texture_info(&mut block, "specularTexture", info);
        }
        if specular.specular_color_factor != [1.0; 3] {
            push_f32_slice(
                block.field("specularColorFactor"),
                &specular.specular_color_factor,
            );
        }
        if let Some(info) = &specular.specular_color_texture {
            write_texture_info(&mut block, "specularColorTexture", info);
        }
        block.finish();
    }
    if let Some(transmission) = &material.transmission {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_TRANSMISSION));
        if transmission.transmission_factor != 0.0 {
            block.f32_field("transmissionFactor", transmission.transmission_factor);
        }
        if let Some(info) = &transmission.transmission_texture {
            write_texture_info(&mut block, "transmissionTexture", info);
        }
        block.finish();
    }
    if let Some(volume) = &material.volume {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_VOLUME));
        if volume.thickness_factor != 0.0 {
            block.f32_field("thicknessFactor", volume.thickness_factor);
        }
        if let Some(info) = &volume.thickness_texture {
            write_texture_info(&mut block, "thicknessTexture", info);
        }
        if volume.attenuation_distance.is_finite() {
            block.f32_field("attenuationDistance", volume.attenuation_distance);
        }
        if volume.attenuation_color != [1.0; 3] {
            push_f32_slice(block.field("attenuationColor"), &volume.attenuation_color);
        }
        block.finish();
    }
    if let Some(iridescence) = &material.iridescence {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_IRIDESCENCE));
        if iridescence.iridescence_factor != 0.0 {
            block.f32_field("iridescenceFactor", iridescence.iridescence_factor);
        }
        if let Some(info) = &iridescence.iridescence_texture {
            write_texture_info(&mut block, "iridescenceTexture", info);
        }
        if iridescence.iridescence_ior != 1.3 {
            block.f32_field("iridescenceIor", iridescence.iridescence_ior);
        }
        if iridescence.iridescence_thickness_minimum != 100.0 {
            block.f32_field(
                "iridescenceThicknessMinimum",
                iridescence.iridescence_thickness_minimum,
            );
        }
        if iridescence.iridescence_thickness_maximum != 400.0 {
            block.f32_field(
                "iridescenceThicknessMaximum",
                iridescence.iridescence_thickness_maximum,
            );
        }
        if let Some(info) = &iridescence.iridescence_thickness_texture {
            write_texture_info(&mut block, "iridescenceThicknessTexture", info);
        }
        block.finish();
    }
    if let Some(diffuse_transmission) = &material.diffuse_transmission {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_DIFFUSE_TRANSMISSION));
        if diffuse_transmission.diffuse_transmission_factor != 0.0 {
            block.f32_field(
                "diffuseTransmissionFactor",
                diffuse_transmission.diffuse_transmission_factor,
            );
        }
        if let Some(info) = &diffuse_transmission.diffuse_transmission_texture {
            write_texture_info(&mut block, "diffuseTransmissionTexture", info);
        }
        if diffuse_transmission.diffuse_transmission_color_factor != [1.0; 3] {
            push_f32_slice(
                block.field("diffuseTransmissionColorFactor"),
                &diffuse_transmission.diffuse_transmission_color_factor,
            );
        }
        if let Some(info) = &diffuse_transmission.diffuse_transmission_color_texture {
            write_texture_info(&mut block, "diffuseTransmissionColorTexture", info);
        }
        block.finish();
    }
    if let Some(ior) = material.ior {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_IOR));
        if ior != 1.5 {
            block.f32_field("ior", ior);
        }
        block.finish();
    }
    if let Some(dispersion) = material.dispersion {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_DISPERSION));
        block.f32_field("dispersion", dispersion);
        block.finish();
    }
    if let Some(emissive_strength) = material.emissive_strength {
        let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_EMISSIVE_STRENGTH));
        if emissive_strength != 1.0 {
            block.f32_field("emissiveStrength", emissive_strength);
        }
        block.finish();
    }
    if material.unlit {
        let block = Block::object(ext.field(extensions::KHR_MATERIALS_UNLIT));
        block.finish();
    }
    if let Some(packed) = &material.packed_normal_roughness_metallic {
        let mut block = Block::object(ext.field(extensions::MSFT_PACKING_NORMAL_ROUGHNESS_METALLIC));
        if let Some(info) = &packed.normal_roughness_metallic_texture {
            write_texture_info(&mut block, "normalRoughnessMetallicTexture", info);
        }
        block.finish();
    }
    if let Some(packed) = &material.packed_occlusion_roughness_metallic {
        let mut block = Block::object(
            ext.field(extensions::MSFT_PACKING_OCCLUSION_ROUGHNESS_METALLIC),
        );
        if let Some(info) = &packed.occlusion_roughness_metallic_texture {
            write_texture_info(&mut block, "occlusionRoughnessMetallicTexture", info);
        }
        if let Some(info) = &packed.roughness_metallic_occlusion_texture {
            write_texture_info(&mut block, "roughnessMetallicOcclusionTexture", info);
        }
        if let Some(info) = &packed.normal_texture {
            write_normal_texture(&mut block, "normalTexture", info);
        }
        block.finish();
    }

    ext.finish();
}

fn write_attribute_map(object: &mut Block<'_>, key: &str, attributes: &[Attribute]) {
    let mut block = Block::object(object.field(key));
    for attribute in attributes {
        let mut name = String::new();
        let _ = write!(name, "{}", attribute.semantic);
        block.u64_field(&name, attribute.accessor as u64);
    }
    block.finish();
}

fn write_primitive(out: &mut String, primitive: &Primitive) {
    let mut object = Block::object(out);
    write_attribute_map(&mut object, "attributes", &primitive.attributes);
    if let Some(indices) = primitive.indices {
        object.u64_field("indices", indices as u64);
    }
    if let Some(material) = primitive.material {
        object.u64_field("material", material as u64);
    }
    if primitive.topology != Topology::Triangles {
        object.u64_field("mode", primitive.topology.as_gl_enum() as u64);
    }
    if !primitive.targets.is_empty() {
        let mut targets = Block::array(object.field("targets"));
        for target in &primitive.targets {
            let mut block = Block::object(targets.item());
            for attribute in target {
                let mut name = String::new();
                let _ = write!(name, "{}", attribute.semantic);
                block.u64_field(&name, attribute.accessor as u64);
            }
            block.finish();
        }
        targets.finish();
    }

    let has_ext = primitive.draco.is_some() || !primitive.mapped_materials.is_empty();
    if has_ext {
        let mut ext = Block::object(object.field("extensions"));
        if let Some(draco) = &primitive.draco {
            let mut block = Block::object(ext.field(extensions::KHR_DRACO_MESH_COMPRESSION));
            block.u64_field("bufferView", draco.buffer_view as u64);
            write_attribute_map(&mut block, "attributes", &draco.attributes);
            block.finish();
        }
        if !primitive.mapped_materials.is_empty() {
            let mut block = Block::object(ext.field(extensions::KHR_MATERIALS_VARIANTS));
            let mut mappings = Block::array(block.field("mappings"));
            for (material, variants) in group_variant_mappings(&primitive.mapped_materials) {
                let mut mapping = Block::object(mappings.item());
                mapping.u64_field("material", material as u64);
                write_index_array(&mut mapping, "variants", &variants);
                mapping.finish();
            }
            mappings.finish();
            block.finish();
        }
        ext.finish();
    }

    object.finish();
}

/// Regroups the flattened variant table back into `(material, variants)`
/// mappings, ordered by first appearance.
fn group_variant_mappings(mapped: &[Option<usize>]) -> Vec<(usize, Vec<usize>)> {
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for (variant, material) in mapped.iter().enumerate() {
        if let Some(material) = material {
            match groups.iter_mut().find(|(m, _)| *m == *material) {
                Some((_, variants)) => variants.push(variant),
                None => groups.push((*material, vec![variant])),
            }
        }
    }
    groups
}

fn write_mesh(out: &mut String, mesh: &Mesh) {
    let mut object = Block::object(out);
    let mut primitives = Block::array(object.field("primitives"));
    for primitive in &mesh.primitives {
        write_primitive(primitives.item(), primitive);
    }
    primitives.finish();
    if !mesh.weights.is_empty() {
        push_f32_slice(object.field("weights"), &mesh.weights);
    }
    object.opt_name(&mesh.name);
    object.finish();
}

fn write_camera(out: &mut String, camera: &Camera) {
    let mut object = Block::object(out);
    match &camera.projection {
        Projection::Perspective(perspective) => {
            object.str_field("type", "perspective");
            let mut block = Block::object(object.field("perspective"));
            if let Some(aspect) = perspective.aspect_ratio {
                block.f32_field("aspectRatio", aspect);
            }
            block.f32_field("yfov", perspective.yfov);
            if let Some(zfar) = perspective.zfar {
                block.f32_field("zfar", zfar);
            }
            block.f32_field("znear", perspective.znear);
            block.finish();
        }
        Projection::Orthographic(orthographic) => {
            object.str_field("type", "orthographic");
            let mut block = Block::object(object.field("orthographic"));
            block.f32_field("xmag", orthographic.xmag);
            block.f32_field("ymag", orthographic.ymag);
            block.f32_field("zfar", orthographic.zfar);
            block.f32_field("znear", orthographic.znear);
            block.finish();
        }
    }
    object.opt_name(&camera.name);
    object.finish();
}

fn write_node(out: &mut String, node: &Node) {
    let mut object = Block::object(out);
    if let Some(camera) = node.camera {
        object.u64_field("camera", camera as u64);
    }
    if let Some(mesh) = node.mesh {
        object.u64_field("mesh", mesh as u64);
    }
    if let Some(skin) = node.skin {
        object.u64_field("skin", skin as u64);
    }
    if !node.children.is_empty() {
        write_index_array(&mut object, "children", &node.children);
    }

    match &node.transform {
        Transform::Matrix { matrix } => {
            let mut array = Block::array(object.field("matrix"));
            for column in matrix {
                for value in column {
                    push_f32(array.item(), *value);
                }
            }
            array.finish();
        }
        Transform::Trs {
            translation,
            rotation,
            scale,
        } => {
            if *translation != [0.0; 3] {
                push_f32_slice(object.field("translation"), translation);
            }
            if *rotation != [0.0, 0.0, 0.0, 1.0] {
                push_f32_slice(object.field("rotation"), rotation);
            }
            if *scale != [1.0; 3] {
                push_f32_slice(object.field("scale"), scale);
            }
        }
    }

    if !node.weights.is_empty() {
        push_f32_slice(object.field("weights"), &node.weights);
    }

    let has_ext = node.light.is_some() || !node.instancing_attributes.is_empty();
    if has_ext {
        let mut ext = Block::object(object.field("extensions"));
        if let Some(light) = node.light {
            let mut block = Block::object(ext.field(extensions::KHR_LIGHTS_PUNCTUAL));
            block.u64_field("light", light as u64);
            block.finish();
        }
        if !node.instancing_attributes.is_empty() {
            let mut block = Block::object(ext.field(extensions::EXT_MESH_GPU_INSTANCING));
            let mut attributes = Block::object(block.field("attributes"));
            for (name, accessor) in &node.instancing_attributes {
                attributes.u64_field(name, *accessor as u64);
            }
            attributes.finish();
            block.finish();
        }
        ext.finish();
    }

    object.opt_name(&node.name);
    object.finish();
}

fn write_animation(out: &mut String, animation: &Animation) {
    let mut object = Block::object(out);
    {
        let mut channels = Block::array(object.field("channels"));
        for channel in &animation.channels {
            let mut block = Block::object(channels.item());
            block.u64_field("sampler", channel.sampler as u64);
            let mut target = Block::object(block.field("target"));
            if let Some(node) = channel.node {
                target.u64_field("node", node as u64);
            }
            target.str_field("path", channel.path.as_str());
            target.finish();
            block.finish();
        }
        channels.finish();
    }
    {
        let mut samplers = Block::array(object.field("samplers"));
        for sampler in &animation.samplers {
            let mut block = Block::object(samplers.item());
            block.u64_field("input", sampler.input as u64);
            block.u64_field("output", sampler.output as u64);
            if sampler.interpolation != crate::animation::Interpolation::Linear {
                block.str_field("interpolation", sampler.interpolation.as_str());
            }
            block.finish();
        }
        samplers.finish();
    }
    object.opt_name(&animation.name);
    object.finish();
}

fn write_light(out: &mut String, light: &Light) {
    let mut object = Block::object(out);
    object.str_field("type", light.kind.as_str());
    if light.color != [1.0; 3] {
        push_f32_slice(object.field("color"), &light.color);
    }
    if light.intensity != 1.0 {
        object.f32_field("intensity", light.intensity);
    }
    if let Some(range) = light.range {
        object.f32_field("range", range);
    }
    if light.kind == Kind::Spot {
        let mut spot = Block::object(object.field("spot"));
        if let Some(inner) = light.inner_cone_angle {
            if inner != Light::DEFAULT_INNER_CONE_ANGLE {
                spot.f32_field("innerConeAngle", inner);
            }
        }
        if let Some(outer) = light.outer_cone_angle {
            if outer != Light::DEFAULT_OUTER_CONE_ANGLE {
                spot.f32_field("outerConeAngle", outer);
            }
        }
        spot.finish();
    }
    object.opt_name(&light.name);
    object.finish();
}

/// Walks composed JSON once, skipping string literals, and inserts a newline
/// plus one tab per open bracket around structural tokens.
pub(crate) fn pretty_print(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    let indent = |out: &mut String, depth: usize| {
        out.push('\n');
        for _ in 0..depth {
            out.push('\t');
        }
    };

    for c in json.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                out.push(c);
                depth += 1;
                indent(&mut out, depth);
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                indent(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                indent(&mut out, depth);
            }
            ':' => {
                out.push(c);
                out.push(' ');
            }
            c => out.push(c),
        }
    }
    out
}

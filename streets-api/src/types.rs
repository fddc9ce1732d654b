use crate::{StreetsError, StreetsResult};

/// Whether a resource is a texture or a buffer. The graph never coerces one
/// into the other, even when the byte sizes would line up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Buffer,
}

/// Texel formats supported by the renderer backends. Buffers use `Undefined`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    Undefined,
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    R16Float,
    Rg16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgba32Float,
    Depth24Stencil8,
    Depth32Float,
}

impl Default for ResourceFormat {
    fn default() -> Self {
        ResourceFormat::Undefined
    }
}

impl ResourceFormat {
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            ResourceFormat::Depth24Stencil8 | ResourceFormat::Depth32Float
        )
    }
}

bitflags::bitflags! {
    /// Indicates how a resource will be used. Multiple flags are allowed, and
    /// aliased resources end up with the union of the flags of every resource
    /// sharing the allocation.
    #[derive(Default)]
    pub struct ResourceUsageFlags: u32 {
        const SAMPLED = 1<<0;
        const RENDER_TARGET = 1<<1;
        const DEPTH_STENCIL = 1<<2;
        const STORAGE = 1<<3;
        const COPY_SRC = 1<<4;
        const COPY_DST = 1<<5;
        const VERTEX_BUFFER = 1<<6;
        const INDEX_BUFFER = 1<<7;
        const UNIFORM_BUFFER = 1<<8;
        const INDIRECT_BUFFER = 1<<9;
    }
}

/// Immutable, backend-agnostic description of a resource. For textures,
/// `width`/`height` are texels; for buffers, `width` is the size in bytes and
/// `height` is 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub width: u32,
    pub height: u32,
    pub format: ResourceFormat,
    pub usage_flags: ResourceUsageFlags,
    pub mip_count: u32,
    pub array_count: u32,
}

impl ResourceDescriptor {
    pub fn texture_2d(
        width: u32,
        height: u32,
        format: ResourceFormat,
        usage_flags: ResourceUsageFlags,
    ) -> Self {
        ResourceDescriptor {
            kind: ResourceKind::Texture,
            width,
            height,
            format,
            usage_flags,
            mip_count: 1,
            array_count: 1,
        }
    }

    pub fn buffer(
        size: u32,
        usage_flags: ResourceUsageFlags,
    ) -> Self {
        ResourceDescriptor {
            kind: ResourceKind::Buffer,
            width: size,
            height: 1,
            format: ResourceFormat::Undefined,
            usage_flags,
            mip_count: 1,
            array_count: 1,
        }
    }

    /// Construction-time validation, run before a descriptor is attached to a
    /// graph resource
    pub fn validate(&self) -> StreetsResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StreetsError::InvalidDescriptor(format!(
                "dimensions must be > 0, got {}x{}",
                self.width, self.height
            )));
        }

        if self.mip_count == 0 || self.array_count == 0 {
            return Err(StreetsError::InvalidDescriptor(format!(
                "mip_count/array_count must be >= 1, got {}/{}",
                self.mip_count, self.array_count
            )));
        }

        match self.kind {
            ResourceKind::Texture => {
                if self.format == ResourceFormat::Undefined {
                    return Err(StreetsError::InvalidDescriptor(
                        "textures require a format".to_string(),
                    ));
                }
            }
            ResourceKind::Buffer => {
                if self.format != ResourceFormat::Undefined {
                    return Err(StreetsError::InvalidDescriptor(
                        "buffers do not take a texel format".to_string(),
                    ));
                }
                if self.height != 1 {
                    return Err(StreetsError::InvalidDescriptor(
                        "buffers are one-dimensional".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns true if two descriptors may share one physical allocation:
    /// kind, format, and dimensions must match exactly, no implicit coercion.
    /// Usage flags are deliberately excluded, they merge instead.
    pub fn can_alias(
        &self,
        other: &ResourceDescriptor,
    ) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if self.format != other.format {
            return false;
        }
        if self.width != other.width || self.height != other.height {
            return false;
        }
        if self.mip_count != other.mip_count {
            return false;
        }
        if self.array_count != other.array_count {
            return false;
        }

        true
    }

    /// Merge other's requirements into self, but only if the two descriptors
    /// are alias-compatible. No modification occurs on conflict.
    pub fn try_merge(
        &mut self,
        other: &ResourceDescriptor,
    ) -> bool {
        if !self.can_alias(other) {
            return false;
        }

        self.usage_flags |= other.usage_flags;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_dimensions() {
        let descriptor = ResourceDescriptor::texture_2d(
            0,
            600,
            ResourceFormat::Rgba8Unorm,
            ResourceUsageFlags::RENDER_TARGET,
        );
        assert!(matches!(
            descriptor.validate(),
            Err(StreetsError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn validate_rejects_texture_without_format() {
        let descriptor = ResourceDescriptor::texture_2d(
            16,
            16,
            ResourceFormat::Undefined,
            ResourceUsageFlags::SAMPLED,
        );
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn buffers_never_alias_textures() {
        let buffer = ResourceDescriptor::buffer(256, ResourceUsageFlags::UNIFORM_BUFFER);
        let mut texture = ResourceDescriptor::texture_2d(
            256,
            1,
            ResourceFormat::R8Unorm,
            ResourceUsageFlags::SAMPLED,
        );
        assert!(!buffer.can_alias(&texture));
        assert!(!texture.try_merge(&buffer));
    }

    #[test]
    fn try_merge_unions_usage_flags() {
        let mut a = ResourceDescriptor::texture_2d(
            128,
            128,
            ResourceFormat::Rgba16Float,
            ResourceUsageFlags::RENDER_TARGET,
        );
        let b = ResourceDescriptor::texture_2d(
            128,
            128,
            ResourceFormat::Rgba16Float,
            ResourceUsageFlags::SAMPLED,
        );

        assert!(a.try_merge(&b));
        assert_eq!(
            a.usage_flags,
            ResourceUsageFlags::RENDER_TARGET | ResourceUsageFlags::SAMPLED
        );
    }

    #[test]
    fn mismatched_dimensions_do_not_merge() {
        let mut a = ResourceDescriptor::texture_2d(
            128,
            128,
            ResourceFormat::Rgba8Unorm,
            ResourceUsageFlags::RENDER_TARGET,
        );
        let b = ResourceDescriptor::texture_2d(
            64,
            64,
            ResourceFormat::Rgba8Unorm,
            ResourceUsageFlags::RENDER_TARGET,
        );

        assert!(!a.try_merge(&b));
        assert_eq!(a.usage_flags, ResourceUsageFlags::RENDER_TARGET);
    }
}

use canvas_automata::Pixmap;
use wgpu::{Device, Queue, Texture, TextureView};

/// Texture mirroring the simulation's software surface.
///
/// The pixmap is re-uploaded every frame; the texture is recreated whenever
/// the surface changes size.
pub struct FrameTexture {
    texture: Texture,
    view: TextureView,
    width: u32,
    height: u32,
}

impl FrameTexture {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Pixmap bytes are already sRGB encoded
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Whether this texture can hold `pixmap` as is
    pub fn matches(&self, pixmap: &Pixmap) -> bool {
        self.width == pixmap.width() && self.height == pixmap.height()
    }

    /// Copy the pixmap into the texture. Mismatched sizes are skipped; the
    /// caller recreates the texture on resize.
    pub fn upload(&self, queue: &Queue, pixmap: &Pixmap) {
        if !self.matches(pixmap) {
            log::debug!(
                "Skipping upload of {}x{} pixmap into {}x{} texture",
                pixmap.width(),
                pixmap.height(),
                self.width,
                self.height
            );
            return;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixmap.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

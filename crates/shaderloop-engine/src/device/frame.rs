/// The texture a single frame renders into.
///
/// For a window surface this wraps the acquired swapchain image; it must be
/// presented (or dropped) promptly, since holding it blocks acquisition of the
/// next image.
pub struct Drawable {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Drawable {
    pub(crate) fn from_surface(surface_texture: wgpu::SurfaceTexture) -> Self {
        let texture = surface_texture.texture.clone();
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            surface_texture: Some(surface_texture),
        }
    }

    pub(crate) fn from_texture(texture: &wgpu::Texture) -> Self {
        Self {
            texture: texture.clone(),
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            surface_texture: None,
        }
    }

    /// Presents a swapchain image; a no-op for off-screen textures.
    ///
    /// Must be called after the frame's commands were submitted.
    pub fn present(self) {
        let Self {
            texture,
            view,
            surface_texture,
        } = self;
        drop(view);
        drop(texture);
        if let Some(surface_texture) = surface_texture {
            surface_texture.present();
        }
    }
}

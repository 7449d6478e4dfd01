use std::collections::HashMap;
use std::path::Path;

use crate::error::TextureLoadError;

use super::decode::{decode_file, DecodedImage};
use super::source::{BufferSlot, TextureSource};

/// Opaque index into a [`TextureCache`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Creates the backing storage for cache entries.
pub trait TextureAllocator {
    type Texture;

    /// Uploads a decoded image read from `path`. Fails with
    /// [`TextureLoadError::Unsupported`] when the backend cannot hold it.
    fn upload(
        &mut self,
        path: &Path,
        image: &DecodedImage,
    ) -> Result<Self::Texture, TextureLoadError>;

    /// Creates a render-target placeholder with no storage yet; the owning
    /// pass sizes it on first use.
    fn render_target(&mut self, slot: BufferSlot) -> Self::Texture;
}

/// Deduplicating texture store keyed by [`TextureSource`].
///
/// Entries live until [`TextureCache::clear`]; there is no eviction.
pub struct TextureCache<T> {
    handles: HashMap<TextureSource, TextureHandle>,
    entries: Vec<T>,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `source`, allocating on first request only.
    pub fn acquire<A>(
        &mut self,
        source: &TextureSource,
        allocator: &mut A,
    ) -> Result<TextureHandle, TextureLoadError>
    where
        A: TextureAllocator<Texture = T>,
    {
        let path = match source {
            TextureSource::RenderTarget(slot) => {
                return Ok(self.acquire_render_target(*slot, allocator));
            }
            TextureSource::File(path) => path,
        };

        if let Some(handle) = self.lookup(source) {
            return Ok(handle);
        }

        let image = decode_file(path)?;
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        let texture = allocator.upload(path, &image)?;
        Ok(self.insert(source.clone(), texture))
    }

    /// Render-target placeholders cannot fail to allocate.
    pub fn acquire_render_target<A>(&mut self, slot: BufferSlot, allocator: &mut A) -> TextureHandle
    where
        A: TextureAllocator<Texture = T>,
    {
        let source = TextureSource::RenderTarget(slot);
        if let Some(handle) = self.lookup(&source) {
            return handle;
        }
        let texture = allocator.render_target(slot);
        self.insert(source, texture)
    }

    fn insert(&mut self, source: TextureSource, texture: T) -> TextureHandle {
        let handle = TextureHandle(self.entries.len() as u32);
        self.handles.insert(source, handle);
        self.entries.push(texture);
        handle
    }

    pub fn lookup(&self, source: &TextureSource) -> Option<TextureHandle> {
        self.handles.get(source).copied()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&T> {
        self.entries.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: TextureHandle) -> Option<&mut T> {
        self.entries.get_mut(handle.index())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every texture. Outstanding handles become dangling.
    pub fn clear(&mut self) {
        self.handles.clear();
        self.entries.clear();
    }
}

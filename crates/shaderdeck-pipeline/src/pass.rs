use std::fmt;
use std::path::Path;

use shaderdeck_config::{Filter, Wrap};

use crate::shader::{PassTarget, Program, CHANNEL_COUNT};
use crate::texture::{BufferSlot, SampleKey, TextureHandle};

/// Which pass of the pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PassKind {
    Buffer(BufferSlot),
    Image,
}

impl PassKind {
    pub fn target(self) -> PassTarget {
        match self {
            Self::Buffer(_) => PassTarget::Offscreen,
            Self::Image => PassTarget::Screen,
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(slot) => write!(f, "{slot}"),
            Self::Image => f.write_str("Image"),
        }
    }
}

/// A texture bound to a channel unit with its sampling state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelBinding {
    pub texture: TextureHandle,
    pub filter: Filter,
    pub wrap: Wrap,
}

/// What each channel unit samples when a bind group is built; `None` units
/// get the fallback texture.
pub type BindGroupKey = [Option<SampleKey>; CHANNEL_COUNT];

/// The most recent bind groups of one pass, by [`BindGroupKey`].
///
/// Ping-pong targets alternate between two keys frame to frame, so two
/// slots hold the steady state.
#[derive(Debug)]
pub struct BindGroupCache<G> {
    entries: Vec<(BindGroupKey, G)>,
}

impl<G> BindGroupCache<G> {
    const SLOTS: usize = 2;

    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(Self::SLOTS),
        }
    }

    /// Returns the entry for `key`, building it with `make` on a miss and
    /// evicting the oldest entry when full.
    pub fn get_or_insert_with(&mut self, key: BindGroupKey, make: impl FnOnce() -> G) -> &G {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                if self.entries.len() == Self::SLOTS {
                    self.entries.remove(0);
                }
                self.entries.push((key, make()));
                self.entries.len() - 1
            }
        };
        &self.entries[index].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<G> Default for BindGroupCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// One render step: program, inputs and (for buffers) output target.
pub struct Pass {
    kind: PassKind,
    channels: [Option<ChannelBinding>; CHANNEL_COUNT],
    program: Program,
    output: Option<TextureHandle>,
    name: String,
    bind_groups: BindGroupCache<wgpu::BindGroup>,
}

impl Pass {
    pub fn new(
        kind: PassKind,
        source_path: &Path,
        channels: [Option<ChannelBinding>; CHANNEL_COUNT],
        program: Program,
        output: Option<TextureHandle>,
    ) -> Self {
        Self {
            kind,
            channels,
            program,
            output,
            name: format!("{kind} ({})", source_path.display()),
            bind_groups: BindGroupCache::new(),
        }
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bindings by unit; `None` units sample the fallback texture.
    pub fn channels(&self) -> &[Option<ChannelBinding>; CHANNEL_COUNT] {
        &self.channels
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Render target written by this pass; `None` for the Image pass.
    pub fn output(&self) -> Option<TextureHandle> {
        self.output
    }

    /// Bind group for `key`; `make` receives the channel bindings and the
    /// pass name and runs only when no cached group matches.
    pub(crate) fn bind_group(
        &mut self,
        key: BindGroupKey,
        make: impl FnOnce(&[Option<ChannelBinding>; CHANNEL_COUNT], &str) -> wgpu::BindGroup,
    ) -> &wgpu::BindGroup {
        let Self {
            channels,
            name,
            bind_groups,
            ..
        } = self;
        bind_groups.get_or_insert_with(key, || make(&*channels, name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_targets_and_names() {
        assert_eq!(PassKind::Image.target(), PassTarget::Screen);
        assert_eq!(PassKind::Buffer(BufferSlot::B).target(), PassTarget::Offscreen);
        assert_eq!(PassKind::Buffer(BufferSlot::B).to_string(), "Buffer B");
        assert_eq!(PassKind::Image.to_string(), "Image");
    }

    fn key(front: usize) -> BindGroupKey {
        [
            Some(SampleKey {
                generation: 1,
                front,
            }),
            None,
            None,
            None,
        ]
    }

    #[test]
    fn ping_pong_keys_reuse_cached_groups() {
        let mut cache = BindGroupCache::new();
        let mut built = 0;

        for frame in 0..6 {
            let group = *cache.get_or_insert_with(key(frame % 2), || {
                built += 1;
                frame % 2
            });
            assert_eq!(group, frame % 2);
        }
        assert_eq!(built, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn new_generation_evicts_the_oldest_group() {
        let mut cache = BindGroupCache::new();
        cache.get_or_insert_with(key(0), || "a");
        cache.get_or_insert_with(key(1), || "b");

        let mut reallocated = key(0);
        reallocated[0] = Some(SampleKey {
            generation: 2,
            front: 0,
        });
        assert_eq!(*cache.get_or_insert_with(reallocated, || "c"), "c");
        assert_eq!(cache.len(), 2);

        // key(0) was evicted and is rebuilt.
        assert_eq!(*cache.get_or_insert_with(key(0), || "d"), "d");
        assert_eq!(*cache.get_or_insert_with(reallocated, || "e"), "c");
    }

    #[test]
    fn cache_starts_empty() {
        assert!(BindGroupCache::<()>::default().is_empty());
    }
}

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the four off-screen buffer passes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum BufferSlot {
    A,
    B,
    C,
    D,
}

impl BufferSlot {
    /// Execution order.
    pub const ALL: [BufferSlot; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Name a channel uses to sample this buffer's output.
    pub fn reserved_name(self) -> &'static str {
        match self {
            Self::A => "buffer_a",
            Self::B => "buffer_b",
            Self::C => "buffer_c",
            Self::D => "buffer_d",
        }
    }

    pub fn from_reserved_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.reserved_name() == name)
    }
}

impl fmt::Display for BufferSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        };
        write!(f, "Buffer {letter}")
    }
}

/// Cache key for a texture.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TextureSource {
    File(PathBuf),
    RenderTarget(BufferSlot),
}

impl TextureSource {
    /// Maps a configured channel path to a source; `buffer_a`..`buffer_d`
    /// name render targets, anything else is an image file.
    pub fn from_channel_path(path: &Path) -> Self {
        match path.to_str().and_then(BufferSlot::from_reserved_name) {
            Some(slot) => Self::RenderTarget(slot),
            None => Self::File(path.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_resolve_to_render_targets() {
        for slot in BufferSlot::ALL {
            let src = TextureSource::from_channel_path(Path::new(slot.reserved_name()));
            assert_eq!(src, TextureSource::RenderTarget(slot));
        }
    }

    #[test]
    fn other_paths_are_files() {
        assert_eq!(
            TextureSource::from_channel_path(Path::new("textures/buffer_a.png")),
            TextureSource::File(PathBuf::from("textures/buffer_a.png"))
        );
        assert_eq!(
            TextureSource::from_channel_path(Path::new("Buffer_A")),
            TextureSource::File(PathBuf::from("Buffer_A"))
        );
    }

    #[test]
    fn slots_display_as_pass_names() {
        assert_eq!(BufferSlot::C.to_string(), "Buffer C");
        assert_eq!(BufferSlot::D.index(), 3);
    }
}

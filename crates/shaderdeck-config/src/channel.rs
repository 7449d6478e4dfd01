use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::error::UnknownCode;

/// Number of channel slots a pass can sample from.
pub const MAX_CHANNELS: usize = 4;

/// Sampler dimensionality requested for a channel (`Type`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ChannelType {
    #[default]
    Texture2D,
    Cube,
}

/// Texture filtering (`Filter`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Filter {
    Nearest,
    Linear,
    /// Trilinear over a full mip chain.
    #[default]
    Mipmap,
}

/// Texture addressing (`Wrap`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
}

impl TryFrom<i64> for ChannelType {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 | 1 => Ok(Self::Texture2D),
            2 => Ok(Self::Cube),
            _ => Err(UnknownCode { field: "Type", code }),
        }
    }
}

impl TryFrom<i64> for Filter {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 | 3 => Ok(Self::Mipmap),
            1 => Ok(Self::Nearest),
            2 => Ok(Self::Linear),
            _ => Err(UnknownCode { field: "Filter", code }),
        }
    }
}

impl TryFrom<i64> for Wrap {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 | 2 => Ok(Self::Repeat),
            1 => Ok(Self::ClampToEdge),
            _ => Err(UnknownCode { field: "Wrap", code }),
        }
    }
}

/// Unknown codes fall back to the default instead of rejecting the file.
fn lenient_code<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64, Error = UnknownCode> + Default,
{
    let code = i64::deserialize(deserializer)?;
    Ok(T::try_from(code).unwrap_or_else(|err| {
        log::warn!("{err}; using default");
        T::default()
    }))
}

/// One texture input of a pass.
///
/// `Path` is either an image file or one of the reserved buffer names
/// `buffer_a`..`buffer_d`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelConfig {
    pub path: PathBuf,

    #[serde(default, rename = "Type", deserialize_with = "lenient_code")]
    pub kind: ChannelType,

    #[serde(default, deserialize_with = "lenient_code")]
    pub filter: Filter,

    #[serde(default, deserialize_with = "lenient_code")]
    pub wrap: Wrap,
}

impl ChannelConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChannelType::default(),
            filter: Filter::default(),
            wrap: Wrap::default(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }
}

use std::path::PathBuf;

use serde::Deserialize;

use crate::channel::{ChannelConfig, MAX_CHANNELS};

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 400;

/// Top-level configuration file.
///
/// Two layouts are accepted: a single shader (`FragmentPath` + `Channels`)
/// or a multi-pass `Pipeline`. Use [`AppConfig::pipeline`] to get the
/// normalized form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    pub fragment_path: Option<PathBuf>,
    pub channels: Vec<ChannelConfig>,
    #[serde(rename = "Pipeline")]
    pub pipeline_section: Option<PipelineConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fragment_path: None,
            channels: Vec::new(),
            pipeline_section: None,
        }
    }
}

impl AppConfig {
    /// Window size in physical pixels; zero dimensions are raised to one.
    pub fn window_size(&self) -> (u32, u32) {
        (self.width.max(1), self.height.max(1))
    }

    /// Returns the pass layout to build, if any shader is configured.
    ///
    /// `Pipeline` wins when both layouts are present.
    pub fn pipeline(&self) -> Option<PipelineConfig> {
        match (&self.pipeline_section, &self.fragment_path) {
            (Some(pipeline), fragment) => {
                if fragment.is_some() {
                    log::warn!("config has both Pipeline and FragmentPath; using Pipeline");
                }
                Some(pipeline.clone())
            }
            (None, Some(path)) => Some(PipelineConfig {
                image: Some(PassConfig {
                    path: path.clone(),
                    textures: self.channels.clone(),
                }),
                ..PipelineConfig::default()
            }),
            (None, None) => None,
        }
    }
}

/// Multi-pass layout: up to four buffers, the mandatory image pass and an
/// optional common source shared by all of them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(rename = "Buffer_A")]
    pub buffer_a: Option<PassConfig>,
    #[serde(rename = "Buffer_B")]
    pub buffer_b: Option<PassConfig>,
    #[serde(rename = "Buffer_C")]
    pub buffer_c: Option<PassConfig>,
    #[serde(rename = "Buffer_D")]
    pub buffer_d: Option<PassConfig>,
    #[serde(rename = "Image")]
    pub image: Option<PassConfig>,
    #[serde(rename = "Common")]
    pub common: Option<CommonConfig>,
}

impl PipelineConfig {
    /// Buffer passes in execution order A, B, C, D.
    pub fn buffers(&self) -> [Option<&PassConfig>; 4] {
        [
            self.buffer_a.as_ref(),
            self.buffer_b.as_ref(),
            self.buffer_c.as_ref(),
            self.buffer_d.as_ref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PassConfig {
    pub path: PathBuf,
    #[serde(default, alias = "Channels")]
    pub textures: Vec<ChannelConfig>,
}

impl PassConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            textures: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.textures.push(channel);
        self
    }

    /// Channels that map onto slots 0..4; extras are dropped with a warning.
    pub fn bound_channels(&self) -> &[ChannelConfig] {
        if self.textures.len() > MAX_CHANNELS {
            log::warn!(
                "{}: {} channels configured, only the first {MAX_CHANNELS} are used",
                self.path.display(),
                self.textures.len()
            );
            &self.textures[..MAX_CHANNELS]
        } else {
            &self.textures
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonConfig {
    pub path: PathBuf,
}

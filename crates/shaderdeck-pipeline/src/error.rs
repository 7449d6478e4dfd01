use std::path::PathBuf;

/// A channel texture could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("texture {path} not found")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported texture {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
}

impl TextureLoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path, .. } | Self::Decode { path, .. } | Self::Unsupported { path, .. } => {
                path
            }
        }
    }
}

/// Shader diagnostics; `log` is the raw compiler/validator output.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShaderError {
    #[error("shader compilation failed:\n{log}")]
    Compile { log: String },

    #[error("shader link failed:\n{log}")]
    Link { log: String },
}

impl ShaderError {
    pub fn log(&self) -> &str {
        match self {
            Self::Compile { log } | Self::Link { log } => log,
        }
    }
}

/// Fatal pipeline construction failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline has no Image pass")]
    MissingImagePass,

    #[error("failed to read shader source {path}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{pass}: channel {unit} could not be loaded")]
    Texture {
        pass: String,
        unit: usize,
        #[source]
        source: TextureLoadError,
    },

    #[error("{pass}: shader build failed")]
    Shader {
        pass: String,
        #[source]
        source: ShaderError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = TextureLoadError::Unsupported {
            path: PathBuf::from("textures/wide.png"),
            reason: "too wide".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported texture textures/wide.png: too wide");

        let err = PipelineError::ReadSource {
            path: PathBuf::from("shaders/image.glsl"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "failed to read shader source shaders/image.glsl");
    }
}

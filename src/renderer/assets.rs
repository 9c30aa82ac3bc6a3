//! Shader and texture atlas loading

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to read or validate a startup asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader {path} is empty")]
    EmptyShader { path: PathBuf },

    #[error("shader {path} has no `{entry_point}` entry point")]
    MissingEntryPoint {
        path: PathBuf,
        entry_point: &'static str,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} has no pixels")]
    EmptyTexture { path: PathBuf },
}

/// WGSL sources for the sprite pipeline
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub const VERTEX_ENTRY: &'static str = "vs_main";
    pub const FRAGMENT_ENTRY: &'static str = "fs_main";

    pub fn load(vertex_path: &Path, fragment_path: &Path) -> Result<Self, AssetError> {
        let vertex = read_shader(vertex_path, Self::VERTEX_ENTRY)?;
        let fragment = read_shader(fragment_path, Self::FRAGMENT_ENTRY)?;
        log::debug!(
            "Loaded shaders {} ({} bytes) and {} ({} bytes)",
            vertex_path.display(),
            vertex.len(),
            fragment_path.display(),
            fragment.len()
        );
        Ok(Self { vertex, fragment })
    }
}

fn read_shader(path: &Path, entry_point: &'static str) -> Result<String, AssetError> {
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    validate_shader(path, &source, entry_point)?;
    Ok(source)
}

/// Cheap sanity check before handing the source to the GPU compiler
fn validate_shader(path: &Path, source: &str, entry_point: &'static str) -> Result<(), AssetError> {
    if source.trim().is_empty() {
        return Err(AssetError::EmptyShader {
            path: path.to_path_buf(),
        });
    }
    if !source.contains(&format!("fn {entry_point}")) {
        return Err(AssetError::MissingEntryPoint {
            path: path.to_path_buf(),
            entry_point,
        });
    }
    Ok(())
}

/// Decoded RGBA8 texture atlas
#[derive(Debug, Clone)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl AtlasImage {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path)
            .map_err(|source| match source {
                image::ImageError::IoError(source) => AssetError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                source => AssetError::Image {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .to_rgba8();

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyTexture {
                path: path.to_path_buf(),
            });
        }

        log::info!("Loaded atlas {} ({}x{})", path.display(), width, height);
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }
}

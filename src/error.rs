//! Error types for the particle field.
//!
//! Failures are local to one mounted field. A missing adapter never reaches
//! the caller as an error: it selects the static backdrop instead (see
//! [`crate::field::Backdrop`]).

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// An instance buffer would exceed the device's buffer size limit.
    BufferTooLarge { requested: u64, limit: u64 },
    /// Acquiring the next frame failed.
    Surface(wgpu::SurfaceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found"),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferTooLarge { requested, limit } => write!(
                f,
                "Instance buffer of {} bytes exceeds the device limit of {} bytes",
                requested, limit
            ),
            GpuError::Surface(e) => write!(f, "Surface error: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::Surface(e) => Some(e),
            GpuError::NoAdapter | GpuError::BufferTooLarge { .. } => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

impl From<wgpu::SurfaceError> for GpuError {
    fn from(e: wgpu::SurfaceError) -> Self {
        GpuError::Surface(e)
    }
}

/// Errors that can occur while loading or validating a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    Io(std::io::Error),
    /// The file is not valid JSON for a field config.
    Parse(serde_json::Error),
    /// A value is out of its accepted range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when hosting a field in its own window.
#[derive(Debug)]
pub enum FieldError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The configuration was rejected.
    Config(ConfigError),
    /// Writing the static backdrop image failed.
    Image(image::ImageError),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            FieldError::Window(e) => write!(f, "Failed to create window: {}", e),
            FieldError::Gpu(e) => write!(f, "GPU error: {}", e),
            FieldError::Config(e) => write!(f, "Config error: {}", e),
            FieldError::Image(e) => write!(f, "Failed to write backdrop image: {}", e),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldError::EventLoop(e) => Some(e),
            FieldError::Window(e) => Some(e),
            FieldError::Gpu(e) => Some(e),
            FieldError::Config(e) => Some(e),
            FieldError::Image(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for FieldError {
    fn from(e: winit::error::EventLoopError) -> Self {
        FieldError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for FieldError {
    fn from(e: winit::error::OsError) -> Self {
        FieldError::Window(e)
    }
}

impl From<GpuError> for FieldError {
    fn from(e: GpuError) -> Self {
        FieldError::Gpu(e)
    }
}

impl From<ConfigError> for FieldError {
    fn from(e: ConfigError) -> Self {
        FieldError::Config(e)
    }
}

impl From<image::ImageError> for FieldError {
    fn from(e: image::ImageError) -> Self {
        FieldError::Image(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err = FieldError::from(ConfigError::from(io));

        assert!(err.to_string().contains("missing.json"));
        let inner = err.source().expect("field error wraps config error");
        assert!(inner.source().is_some());
    }

    #[test]
    fn test_buffer_too_large_reports_sizes() {
        let err = GpuError::BufferTooLarge {
            requested: 640_000_000,
            limit: 268_435_456,
        };
        assert!(err.source().is_none());
        let msg = err.to_string();
        assert!(msg.contains("640000000") && msg.contains("268435456"));
    }

    #[test]
    fn test_invalid_config_has_no_source() {
        let err = ConfigError::Invalid("fov_degrees must be in (0, 180)".into());
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "Invalid config: fov_degrees must be in (0, 180)");
    }
}

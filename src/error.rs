use std::{collections::BTreeMap, fmt, io, sync::Arc};

#[derive(Debug, Clone)]
pub struct ViewerError {
    pub key: &'static str,
    pub args: BTreeMap<&'static str, String>,
    pub causes: Vec<ViewerCause>,
}

#[derive(Debug, Clone)]
pub enum ViewerCause {
    Viewer(Box<ViewerError>),
    Std(Arc<dyn std::error::Error + Send + Sync>),
}

impl ViewerError {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: BTreeMap::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_arg(mut self, k: &'static str, v: impl ToString) -> Self {
        self.args.insert(k, v.to_string());
        self
    }

    pub fn push_viewer(mut self, cause: ViewerError) -> Self {
        self.causes.push(ViewerCause::Viewer(Box::new(cause)));
        self
    }

    fn push_std(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.causes.push(ViewerCause::Std(Arc::new(cause)));
        self
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.key)?;
        let mut first = true;
        for (k, v) in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")?;
        for cause in &self.causes {
            match cause {
                ViewerCause::Viewer(e) => write!(f, ": {e}")?,
                ViewerCause::Std(e) => write!(f, ": {e}")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes.iter().find_map(|c| match c {
            ViewerCause::Viewer(e) => Some(e.as_ref() as &dyn std::error::Error),
            ViewerCause::Std(e) => Some(e.as_ref() as &(dyn std::error::Error + 'static)),
        })
    }
}

impl From<io::Error> for ViewerError {
    fn from(err: io::Error) -> Self {
        ViewerError::new("io-error").push_std(err)
    }
}

impl From<gltf::Error> for ViewerError {
    fn from(err: gltf::Error) -> Self {
        ViewerError::new("gltf-error").push_std(err)
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        ViewerError::new("image-error").push_std(err)
    }
}

impl From<wgpu::CreateSurfaceError> for ViewerError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        ViewerError::new("wgpu::CreateSurfaceError").push_std(err)
    }
}

impl From<wgpu::RequestAdapterError> for ViewerError {
    fn from(err: wgpu::RequestAdapterError) -> Self {
        ViewerError::new("wgpu::RequestAdapterError").push_std(err)
    }
}

impl From<wgpu::RequestDeviceError> for ViewerError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        ViewerError::new("wgpu::RequestDeviceError").push_std(err)
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(err: winit::error::EventLoopError) -> Self {
        ViewerError::new("winit::error::EventLoopError").push_std(err)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(err: winit::error::OsError) -> Self {
        ViewerError::new("winit::error::OsError").push_std(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_args_in_key_order_then_causes() {
        let err = ViewerError::new("unsupported-format")
            .with_arg("path", "dwarf.x")
            .with_arg("ext", "x");
        assert_eq!(err.to_string(), "unsupported-format(ext=x, path=dwarf.x)");

        let io = io::Error::new(io::ErrorKind::NotFound, "missing");
        let wrapped = ViewerError::new("load-failed")
            .with_arg("slot", 2)
            .push_std(io);
        assert_eq!(wrapped.to_string(), "load-failed(slot=2): missing");
    }

    #[test]
    fn source_returns_first_cause() {
        let inner = ViewerError::new("empty-model");
        let outer = ViewerError::new("load-failed").push_viewer(inner);
        let source = std::error::Error::source(&outer).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("empty-model()"));
    }
}

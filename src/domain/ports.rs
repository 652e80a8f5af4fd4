use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
    fn exists(&self, path: &str) -> bool;
    /// Human-readable location of `path`, used in log and result messages.
    fn display_path(&self, path: &str) -> String;
}

/// A figure generator split into the three stages driven by `FigureEngine`.
pub trait Pipeline {
    type Extracted;
    type Transformed;

    fn name(&self) -> &'static str;
    fn extract(&self) -> Result<Self::Extracted>;
    fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    /// Writes the artifacts and returns their display paths.
    fn load(&self, result: Self::Transformed) -> Result<Vec<String>>;
}

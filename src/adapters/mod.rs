// Concrete readers and renderers used by the figure pipelines.

pub mod dicom;
pub mod raster;
pub mod report_reader;
pub mod svg_canvas;

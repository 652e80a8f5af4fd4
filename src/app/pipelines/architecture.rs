//! Side-by-side diagrams of a monolithic DICOM container and a modular set of
//! linked formats.

use crate::adapters::svg_canvas::{
    centered, render_svg, BoxStyle, Canvas, SvgArea, FOREST_GREEN, LIGHT_STEEL_BLUE, NAVY,
    PALE_GREEN,
};
use crate::core::{Pipeline, Storage};
use crate::utils::error::Result;
use plotters::prelude::*;

const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);

/// A labelled box in figure fractions, lower-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: &'static str,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Block {
    const fn new(label: &'static str, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { label, x, y, w, h }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

pub const DICOM_SECTIONS: [Block; 4] = [
    Block::new("Image Data", 0.15, 0.65, 0.7, 0.2),
    Block::new("Metadata", 0.15, 0.45, 0.7, 0.15),
    Block::new("Annotations", 0.15, 0.25, 0.7, 0.15),
    Block::new("DICOM Headers", 0.15, 0.15, 0.7, 0.05),
];

pub const MODULAR_COMPONENTS: [Block; 4] = [
    Block::new("Image Data\n(OME-TIFF)", 0.1, 0.6, 0.35, 0.25),
    Block::new("Clinical Metadata\n(FHIR JSON)", 0.55, 0.6, 0.35, 0.25),
    Block::new("Annotations\n(GeoJSON)", 0.1, 0.25, 0.35, 0.25),
    Block::new("Analysis Results\n(Custom JSON)", 0.55, 0.25, 0.35, 0.25),
];

#[derive(Debug, Clone)]
pub struct ArchitectureOptions {
    pub output_dir: String,
}

impl Default for ArchitectureOptions {
    fn default() -> Self {
        Self {
            output_dir: "figures".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchitectureLayout {
    pub sections: Vec<Block>,
    pub components: Vec<Block>,
    /// Index pairs of connected components, each pair once.
    pub links: Vec<(usize, usize)>,
}

pub struct ArchitecturePipeline<S: Storage> {
    storage: S,
    options: ArchitectureOptions,
}

impl<S: Storage> ArchitecturePipeline<S> {
    pub fn new(storage: S, options: ArchitectureOptions) -> Self {
        Self { storage, options }
    }

    fn output(&self, file: &str) -> String {
        format!("{}/{}", self.options.output_dir.trim_end_matches('/'), file)
    }
}

impl<S: Storage> Pipeline for ArchitecturePipeline<S> {
    type Extracted = ();
    type Transformed = ArchitectureLayout;

    fn name(&self) -> &'static str {
        "architecture"
    }

    fn extract(&self) -> Result<()> {
        Ok(())
    }

    fn transform(&self, _: ()) -> Result<ArchitectureLayout> {
        Ok(ArchitectureLayout {
            sections: DICOM_SECTIONS.to_vec(),
            components: MODULAR_COMPONENTS.to_vec(),
            links: pairwise(MODULAR_COMPONENTS.len()),
        })
    }

    fn load(&self, layout: ArchitectureLayout) -> Result<Vec<String>> {
        let figures = [
            (
                "dicom_architecture.svg",
                render_svg(800, 600, |area| draw_monolithic(area, &layout))?,
            ),
            (
                "modular_architecture.svg",
                render_svg(800, 600, |area| draw_modular(area, &layout))?,
            ),
            (
                "architecture_comparison.svg",
                render_svg(1600, 660, |area| draw_comparison(area, &layout))?,
            ),
        ];

        let mut written = Vec::with_capacity(figures.len());
        for (file, svg) in figures {
            let path = self.output(file);
            self.storage.write_file(&path, svg.as_bytes())?;
            written.push(self.storage.display_path(&path));
        }
        Ok(written)
    }
}

pub fn pairwise(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

fn draw_monolithic(area: &SvgArea<'_>, layout: &ArchitectureLayout) -> Result<()> {
    let canvas = Canvas::new(area);
    canvas.rect(
        0.1,
        0.1,
        0.8,
        0.8,
        BoxStyle::filled(LIGHT_STEEL_BLUE, 0.7).with_stroke(NAVY, 2),
    )?;
    for section in &layout.sections {
        canvas.rect(
            section.x,
            section.y,
            section.w,
            section.h,
            BoxStyle::filled(WHITE, 0.9).with_stroke(DARK_BLUE, 1),
        )?;
        let (cx, cy) = section.center();
        canvas.text(cx, cy, section.label, &centered(16.0, false, &BLACK))?;
    }
    canvas.text(
        0.5,
        0.95,
        "Monolithic DICOM Architecture",
        &centered(19.0, true, &BLACK),
    )
}

fn draw_modular(area: &SvgArea<'_>, layout: &ArchitectureLayout) -> Result<()> {
    let canvas = Canvas::new(area);
    for &(i, j) in &layout.links {
        canvas.line(
            layout.components[i].center(),
            layout.components[j].center(),
            BLACK.mix(0.2),
            1,
        )?;
    }
    for component in &layout.components {
        canvas.rect(
            component.x,
            component.y,
            component.w,
            component.h,
            BoxStyle::filled(PALE_GREEN, 0.7).with_stroke(FOREST_GREEN, 2),
        )?;
        let (cx, cy) = component.center();
        canvas.text_block(cx, cy, component.label, &centered(16.0, false, &BLACK), 1.3)?;
    }
    canvas.text(
        0.5,
        0.95,
        "Modular Architecture Approach",
        &centered(19.0, true, &BLACK),
    )
}

fn draw_comparison(area: &SvgArea<'_>, layout: &ArchitectureLayout) -> Result<()> {
    let (header, body) = area.split_vertically(60);
    Canvas::new(&header).text(
        0.5,
        0.5,
        "DICOM vs. Modular Architecture for Digital Pathology",
        &centered(22.0, true, &BLACK),
    )?;
    let (left, right) = body.split_horizontally(800);
    draw_monolithic(&left, layout)?;
    draw_modular(&right, layout)
}

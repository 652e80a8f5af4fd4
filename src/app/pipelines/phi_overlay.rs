//! PHI masking example: a synthetic slide with identifying text, a GeoJSON
//! overlay of mask rectangles, and the slide with the overlay burnt in.

use crate::adapters::raster::{draw_text_centered, encode_png, BLACK, WHITE};
use crate::core::synthetic::{labelled_slide, seeded_rng, PhiElement, SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::core::{Pipeline, Storage};
use crate::utils::error::Result;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

const CHAR_WIDTH: i32 = 15;
const TEXT_HEIGHT: i32 = 30;
const PADDING: i32 = 5;
const DEFAULT_MASK_COLOR: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
    pub properties: OverlayProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayProperties {
    pub name: String,
    pub description: String,
    pub timestamp: String,
    pub version: String,
    pub image_dimensions: ImageDimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub geometry: Geometry,
    pub properties: MaskProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// Linear rings; the first ring is the outline.
    pub coordinates: Vec<Vec<[i32; 2]>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskProperties {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub mask_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_color: Option<String>,
    pub text_description: String,
}

#[derive(Debug, Clone)]
pub struct PhiOverlayOptions {
    pub output_dir: String,
}

impl Default for PhiOverlayOptions {
    fn default() -> Self {
        Self {
            output_dir: "samples".to_string(),
        }
    }
}

pub struct OverlayArtifacts {
    pub original: RgbImage,
    pub overlay: FeatureCollection,
    pub masked: RgbImage,
    pub comparison: RgbImage,
}

pub struct PhiOverlayPipeline<S: Storage> {
    storage: S,
    options: PhiOverlayOptions,
}

impl<S: Storage> PhiOverlayPipeline<S> {
    pub fn new(storage: S, options: PhiOverlayOptions) -> Self {
        Self { storage, options }
    }

    fn output(&self, file: &str) -> String {
        format!("{}/{}", self.options.output_dir.trim_end_matches('/'), file)
    }

    fn write(&self, file: &str, bytes: &[u8], written: &mut Vec<String>) -> Result<()> {
        let path = self.output(file);
        self.storage.write_file(&path, bytes)?;
        written.push(self.storage.display_path(&path));
        Ok(())
    }
}

impl<S: Storage> Pipeline for PhiOverlayPipeline<S> {
    type Extracted = (RgbImage, Vec<PhiElement>);
    type Transformed = OverlayArtifacts;

    fn name(&self) -> &'static str {
        "phi-overlay"
    }

    fn extract(&self) -> Result<(RgbImage, Vec<PhiElement>)> {
        Ok(labelled_slide(&mut seeded_rng(), SLIDE_WIDTH, SLIDE_HEIGHT))
    }

    fn transform(&self, (original, phi): (RgbImage, Vec<PhiElement>)) -> Result<OverlayArtifacts> {
        let timestamp = chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let overlay = mask_overlay(&phi, original.width(), original.height(), timestamp);
        tracing::debug!("{} mask regions", overlay.features.len());

        let masked = apply_masks(&original, &overlay);
        let comparison = comparison_figure(&original, &masked);
        Ok(OverlayArtifacts {
            original,
            overlay,
            masked,
            comparison,
        })
    }

    fn load(&self, artifacts: OverlayArtifacts) -> Result<Vec<String>> {
        let mut written = Vec::new();
        self.write("sample_wsi.png", &encode_png(&artifacts.original)?, &mut written)?;
        let geojson = serde_json::to_vec_pretty(&artifacts.overlay)?;
        self.write("phi_mask_overlay.geojson", &geojson, &mut written)?;
        self.write("masked_wsi.png", &encode_png(&artifacts.masked)?, &mut written)?;
        self.write(
            "phi_masking_comparison.png",
            &encode_png(&artifacts.comparison)?,
            &mut written,
        )?;
        Ok(written)
    }
}

/// One padded rectangle per PHI element, sized from an estimated glyph box
/// of 15x30 pixels per character.
pub fn mask_overlay(phi: &[PhiElement], width: u32, height: u32, timestamp: String) -> FeatureCollection {
    let features = phi
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let (x, y) = element.position;
            let text_width = element.text.chars().count() as i32 * CHAR_WIDTH;
            let (x1, y1) = (x - PADDING, y - PADDING);
            let (x2, y2) = (x + text_width + PADDING, y + TEXT_HEIGHT + PADDING);
            Feature {
                kind: "Feature".to_string(),
                id: format!("phi-mask-{}", i),
                geometry: Geometry {
                    kind: "Polygon".to_string(),
                    coordinates: vec![vec![[x1, y1], [x2, y1], [x2, y2], [x1, y2], [x1, y1]]],
                },
                properties: MaskProperties {
                    kind: "phi-mask".to_string(),
                    category: "patient-identifier".to_string(),
                    mask_method: "rectangle".to_string(),
                    mask_color: Some(DEFAULT_MASK_COLOR.to_string()),
                    text_description: "Patient identifiable information".to_string(),
                },
            }
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features,
        properties: OverlayProperties {
            name: "PHI Masking Overlay".to_string(),
            description: "Protected Health Information masking regions".to_string(),
            timestamp,
            version: "1.0".to_string(),
            image_dimensions: ImageDimensions { width, height },
        },
    }
}

/// `#RRGGBB` to a pixel colour.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Fills every polygon feature with its mask colour on a copy of `image`.
pub fn apply_masks(image: &RgbImage, overlay: &FeatureCollection) -> RgbImage {
    let mut masked = image.clone();
    for feature in &overlay.features {
        if feature.geometry.kind != "Polygon" {
            continue;
        }
        let Some(ring) = feature.geometry.coordinates.first() else {
            continue;
        };

        let color_spec = feature
            .properties
            .mask_color
            .as_deref()
            .unwrap_or(DEFAULT_MASK_COLOR);
        let color = parse_hex_color(color_spec).unwrap_or_else(|| {
            tracing::warn!("{}: unreadable mask colour '{}', using black", feature.id, color_spec);
            BLACK
        });

        let mut points: Vec<Point<i32>> = ring.iter().map(|&[x, y]| Point::new(x, y)).collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            continue;
        }
        draw_polygon_mut(&mut masked, &points, color);
    }
    masked
}

/// Original and masked images side by side, each under a title.
pub fn comparison_figure(original: &RgbImage, masked: &RgbImage) -> RgbImage {
    let margin = 40;
    let title_band = 80;
    let (w, h) = (original.width(), original.height());
    let mut figure = RgbImage::from_pixel(w * 2 + margin * 3, h + title_band + margin, WHITE);

    let panels = [
        (original, "Original Image with PHI"),
        (masked, "Image with PHI Masking Applied"),
    ];
    for (i, (image, title)) in panels.into_iter().enumerate() {
        let x = margin + i as u32 * (w + margin);
        draw_text_centered(&mut figure, (x + w / 2) as i32, 30, title, 3, BLACK);
        imageops::overlay(&mut figure, image, x as i64, title_band as i64);
    }
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::core::synthetic::phi_elements;
    use crate::utils::test_support::MockStorage;

    fn overlay() -> FeatureCollection {
        mask_overlay(&phi_elements(1024), 1024, 768, "2024-01-01T00:00:00".to_string())
    }

    #[test]
    fn test_mask_rectangles() {
        let overlay = overlay();
        assert_eq!(overlay.features.len(), 4);

        let first = &overlay.features[0];
        assert_eq!(first.id, "phi-mask-0");
        // "Patient: John Doe" is 17 characters at (50, 30).
        assert_eq!(
            first.geometry.coordinates[0],
            vec![[45, 25], [310, 25], [310, 65], [45, 65], [45, 25]]
        );
        assert_eq!(overlay.features[3].geometry.coordinates[0][0], [769, 55]);
    }

    #[test]
    fn test_geojson_shape() {
        let json = serde_json::to_value(overlay()).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["properties"]["image_dimensions"]["width"], 1024);
        assert_eq!(json["features"][1]["geometry"]["type"], "Polygon");
        assert_eq!(json["features"][1]["properties"]["mask_color"], "#000000");
        assert_eq!(json["features"][1]["properties"]["type"], "phi-mask");
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#000000"), Some(Rgb([0, 0, 0])));
        assert_eq!(parse_hex_color("#ff8000"), Some(Rgb([255, 128, 0])));
        assert_eq!(parse_hex_color("ff8000"), None);
        assert_eq!(parse_hex_color("#ff80"), None);
    }

    #[test]
    fn test_masks_fill_regions_with_their_colour() {
        let image = RgbImage::from_pixel(100, 100, WHITE);
        let mut overlay = mask_overlay(
            &[PhiElement {
                text: "AB".to_string(),
                position: (20, 20),
            }],
            100,
            100,
            String::new(),
        );
        overlay.features[0].properties.mask_color = Some("#ff0000".to_string());

        let masked = apply_masks(&image, &overlay);

        assert_eq!(*masked.get_pixel(30, 30), Rgb([255, 0, 0]));
        assert_eq!(*masked.get_pixel(80, 80), WHITE);
        assert_eq!(*image.get_pixel(30, 30), WHITE);
    }

    #[test]
    fn test_missing_colour_defaults_to_black() {
        let json = r#"{"type":"FeatureCollection","properties":{"name":"n","description":"d",
            "timestamp":"t","version":"1.0","image_dimensions":{"width":10,"height":10}},
            "features":[{"type":"Feature","id":"phi-mask-0",
            "geometry":{"type":"Polygon","coordinates":[[[1,1],[8,1],[8,8],[1,8],[1,1]]]},
            "properties":{"type":"phi-mask","category":"c","mask_method":"rectangle",
            "text_description":"x"}}]}"#;
        let overlay: FeatureCollection = serde_json::from_str(json).unwrap();

        let masked = apply_masks(&RgbImage::from_pixel(10, 10, WHITE), &overlay);

        assert_eq!(*masked.get_pixel(4, 4), BLACK);
    }

    #[test]
    fn test_writes_four_artifacts() {
        let storage = MockStorage::new();
        let outputs = FigureEngine::new(PhiOverlayPipeline::new(
            storage.clone(),
            PhiOverlayOptions::default(),
        ))
        .run()
        .unwrap();

        assert_eq!(
            outputs,
            vec![
                "samples/sample_wsi.png",
                "samples/phi_mask_overlay.geojson",
                "samples/masked_wsi.png",
                "samples/phi_masking_comparison.png",
            ]
        );

        let masked = image::load_from_memory(&storage.get_file("samples/masked_wsi.png").unwrap())
            .unwrap()
            .to_rgb8();
        // Inside the first mask rectangle.
        assert_eq!(*masked.get_pixel(100, 45), BLACK);
    }
}

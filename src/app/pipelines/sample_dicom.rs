//! Synthetic whole-slide DICOM file with every clinical, specimen and
//! annotation attribute packed into the one object, plus a preview sheet
//! rendered from the written bytes.

use crate::adapters::dicom::{
    from_part10, generate_uid, items, text, to_part10, DatasetBuilder, WSI_SOP_CLASS,
};
use crate::adapters::raster::{
    draw_lines, draw_text, draw_text_centered, encode_png, fill_rect, paste_centered, text_width,
    BLACK, WHITE,
};
use crate::core::synthetic::{
    fake_patient, pyramid, seeded_rng, stained_slide, FakePatient, SLIDE_HEIGHT, SLIDE_WIDTH,
};
use crate::core::{Pipeline, Storage};
use crate::utils::error::{dicom_error, Result};
use chrono::NaiveDateTime;
use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use rand::Rng;

const PYRAMID_LEVELS: usize = 3;

const PRIVATE_CREATOR: Tag = Tag(0x0009, 0x0010);
const PRIVATE_CREATOR_NAME: &str = "ACME PATHOLOGY";
const SCANNER_MANUFACTURER: Tag = Tag(0x0009, 0x1001);
const SCANNER_MODEL_NAME: Tag = Tag(0x0009, 0x1002);
const SCANNER_SERIAL_NUMBER: Tag = Tag(0x0009, 0x1003);
const SCAN_DATE: Tag = Tag(0x0009, 0x1004);
const SCAN_TIME: Tag = Tag(0x0009, 0x1005);
const MAGNIFICATION_FACTOR: Tag = Tag(0x0009, 0x1006);
const LENS_NUMERICAL_APERTURE: Tag = Tag(0x0009, 0x1007);
const PIXEL_SPACING_UM: Tag = Tag(0x0009, 0x1008);
const FOCUS_QUALITY_SCORE: Tag = Tag(0x0009, 0x1009);
const STAIN_QUALITY_SCORE: Tag = Tag(0x0009, 0x100A);
const TISSUE_DETECTED_PERCENTAGE: Tag = Tag(0x0009, 0x100B);
const NUMBER_OF_ANNOTATIONS: Tag = Tag(0x0009, 0x100C);
const ANNOTATION_FORMAT: Tag = Tag(0x0009, 0x100D);
const LUMINANCE_PERCENT: Tag = Tag(0x0009, 0x1020);

const MANUFACTURER: &str = "ACME Digital Pathology";
const MODEL_NAME: &str = "ACME WSI Scanner 3000";

/// Annotation coordinates are drawn on a 500 unit canvas scaled from 1024.
const SKETCH_UNITS: f32 = 500.0;
const SKETCH_SOURCE: f32 = 1024.0;

#[derive(Debug, Clone)]
pub struct SampleDicomOptions {
    pub output_dir: String,
    pub with_pixel_data: bool,
}

impl Default for SampleDicomOptions {
    fn default() -> Self {
        Self {
            output_dir: "samples".to_string(),
            with_pixel_data: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudyUids {
    pub study: String,
    pub series: String,
    pub sop_instance: String,
    pub frame_of_reference: String,
    pub specimen: String,
    pub implementation_class: String,
}

impl StudyUids {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            sop_instance: generate_uid(rng),
            series: generate_uid(rng),
            study: generate_uid(rng),
            frame_of_reference: generate_uid(rng),
            specimen: generate_uid(rng),
            implementation_class: generate_uid(rng),
        }
    }
}

/// Everything needed to write one slide instance.
#[derive(Debug, Clone)]
pub struct SlideStudy {
    pub patient: FakePatient,
    pub study_id: String,
    pub acquired: NaiveDateTime,
    pub uids: StudyUids,
    /// Level 0 is stored as pixel data; `None` writes a metadata-only file.
    pub pyramid: Option<Vec<RgbImage>>,
}

pub struct DicomArtifacts {
    pub dicom: Vec<u8>,
    pub preview: RgbImage,
}

pub struct SampleDicomPipeline<S: Storage> {
    storage: S,
    options: SampleDicomOptions,
}

impl<S: Storage> SampleDicomPipeline<S> {
    pub fn new(storage: S, options: SampleDicomOptions) -> Self {
        Self { storage, options }
    }

    fn output(&self, file: &str) -> String {
        format!("{}/{}", self.options.output_dir.trim_end_matches('/'), file)
    }
}

impl<S: Storage> Pipeline for SampleDicomPipeline<S> {
    type Extracted = SlideStudy;
    type Transformed = DicomArtifacts;

    fn name(&self) -> &'static str {
        "sample-dicom"
    }

    fn extract(&self) -> Result<SlideStudy> {
        let acquired = chrono::Local::now().naive_local();
        let mut rng = seeded_rng();
        let patient = fake_patient(&mut rng, acquired.date());
        let study_id = format!("STUDY-{}", rng.gen_range(1000..=9999));

        let pyramid = self.options.with_pixel_data.then(|| {
            let base = stained_slide(&mut rng, SLIDE_WIDTH, SLIDE_HEIGHT);
            pyramid(base, PYRAMID_LEVELS)
        });
        if let Some(levels) = &pyramid {
            tracing::debug!("Synthesized {} pyramid levels", levels.len());
        }

        Ok(SlideStudy {
            patient,
            study_id,
            acquired,
            uids: StudyUids::generate(&mut rand::thread_rng()),
            pyramid,
        })
    }

    fn transform(&self, study: SlideStudy) -> Result<DicomArtifacts> {
        let dicom = to_part10(
            slide_dataset(&study),
            WSI_SOP_CLASS,
            &study.uids.sop_instance,
            &study.uids.implementation_class,
            "DICOM-WSI-DEMO",
        )?;
        tracing::info!("Encoded {} bytes of DICOM", dicom.len());

        let written = from_part10(&dicom)?;
        let preview = preview_sheet(&written)?;
        Ok(DicomArtifacts { dicom, preview })
    }

    fn load(&self, artifacts: DicomArtifacts) -> Result<Vec<String>> {
        let dicom_path = self.output("sample_pathology_wsi.dcm");
        self.storage.write_file(&dicom_path, &artifacts.dicom)?;

        let preview_path = self.output("sample_pathology_wsi_preview.png");
        self.storage
            .write_file(&preview_path, &encode_png(&artifacts.preview)?)?;

        Ok(vec![
            self.storage.display_path(&dicom_path),
            self.storage.display_path(&preview_path),
        ])
    }
}

fn code_item(value: &str, meaning: &str) -> InMemDicomObject {
    DatasetBuilder::new()
        .str(tags::CODE_VALUE, VR::SH, value)
        .str(tags::CODING_SCHEME_DESIGNATOR, VR::SH, "DCM")
        .str(tags::CODE_MEANING, VR::LO, meaning)
        .build()
}

fn preparation_step(code: &str, meaning: &str, value: &str) -> InMemDicomObject {
    let content = DatasetBuilder::new()
        .str(tags::VALUE_TYPE, VR::CS, "TEXT")
        .sequence(tags::CONCEPT_NAME_CODE_SEQUENCE, vec![code_item(code, meaning)])
        .str(tags::TEXT_VALUE, VR::UT, value)
        .build();
    DatasetBuilder::new()
        .sequence(
            tags::SPECIMEN_PREPARATION_STEP_CONTENT_ITEM_SEQUENCE,
            vec![content],
        )
        .build()
}

fn annotation(kind: &str, data: &[f32], filled: bool, label: &str) -> InMemDicomObject {
    DatasetBuilder::new()
        .str(tags::GRAPHIC_TYPE, VR::CS, kind)
        .f32s(tags::GRAPHIC_DATA, data)
        .str(tags::GRAPHIC_FILLED, VR::CS, if filled { "Y" } else { "N" })
        .str(tags::TEXT_VALUE, VR::UT, label)
        .build()
}

fn specimen(uid: &str) -> InMemDicomObject {
    DatasetBuilder::new()
        .str(tags::CONTAINER_IDENTIFIER, VR::LO, "CONTAINER-12345")
        .str(tags::SPECIMEN_IDENTIFIER, VR::LO, "SPECIMEN-67890")
        .str(tags::SPECIMEN_UID, VR::UI, uid)
        .str(tags::SPECIMEN_SHORT_DESCRIPTION, VR::LO, "Liver biopsy")
        .str(
            tags::SPECIMEN_DETAILED_DESCRIPTION,
            VR::UT,
            "Liver biopsy from segment 7",
        )
        .sequence(
            tags::SPECIMEN_PREPARATION_SEQUENCE,
            vec![
                preparation_step("111701", "Processing type", "FORMALIN FIXED PARAFFIN EMBEDDED"),
                preparation_step("111702", "Staining", "H&E"),
            ],
        )
        .build()
}

/// The full slide data set: patient, trial, study, series, equipment, image,
/// optical path, annotation, specimen and vendor attributes.
pub fn slide_dataset(study: &SlideStudy) -> InMemDicomObject {
    let patient = &study.patient;
    let date = study.acquired.format("%Y%m%d").to_string();
    let time = study.acquired.format("%H%M%S").to_string();
    let uids = &study.uids;

    let mut builder = DatasetBuilder::new()
        .str(tags::SPECIFIC_CHARACTER_SET, VR::CS, "ISO_IR 192")
        .str(tags::SOP_CLASS_UID, VR::UI, WSI_SOP_CLASS)
        .str(tags::SOP_INSTANCE_UID, VR::UI, &uids.sop_instance)
        .str(tags::PATIENT_NAME, VR::PN, &patient.name)
        .str(tags::PATIENT_ID, VR::LO, &patient.mrn)
        .str(tags::PATIENT_BIRTH_DATE, VR::DA, &patient.dob)
        .str(tags::PATIENT_SEX, VR::CS, &patient.sex.to_string())
        .str(tags::PATIENT_ADDRESS, VR::LO, &patient.address)
        .str(tags::CLINICAL_TRIAL_SPONSOR_NAME, VR::LO, "ACME Research")
        .str(tags::CLINICAL_TRIAL_PROTOCOL_ID, VR::LO, "PATHOLOGY-2023-001")
        .str(
            tags::CLINICAL_TRIAL_PROTOCOL_NAME,
            VR::LO,
            "Advanced Digital Pathology Workflow Study",
        )
        .str(tags::STUDY_INSTANCE_UID, VR::UI, &uids.study)
        .str(tags::STUDY_DATE, VR::DA, &date)
        .str(tags::STUDY_TIME, VR::TM, &time)
        .str(tags::REFERRING_PHYSICIAN_NAME, VR::PN, "Smith^John")
        .str(tags::STUDY_ID, VR::SH, &study.study_id)
        .str(tags::ACCESSION_NUMBER, VR::SH, &patient.accession_number)
        .str(tags::STUDY_DESCRIPTION, VR::LO, "Liver biopsy, suspected carcinoma")
        .str(
            tags::ADMITTING_DIAGNOSES_DESCRIPTION,
            VR::LO,
            "Suspected hepatocellular carcinoma",
        )
        .str(tags::MODALITY, VR::CS, "SM")
        .str(tags::SERIES_INSTANCE_UID, VR::UI, &uids.series)
        .str(tags::SERIES_NUMBER, VR::IS, "1")
        .str(tags::SERIES_DESCRIPTION, VR::LO, "H&E stained slide")
        .str(tags::FRAME_OF_REFERENCE_UID, VR::UI, &uids.frame_of_reference)
        .str(tags::MANUFACTURER, VR::LO, MANUFACTURER)
        .str(tags::MANUFACTURER_MODEL_NAME, VR::LO, MODEL_NAME)
        .str(tags::SOFTWARE_VERSIONS, VR::LO, "1.0")
        .str(tags::INSTANCE_NUMBER, VR::IS, "1")
        .str(tags::PATIENT_ORIENTATION, VR::CS, "")
        .str(tags::CONTENT_DATE, VR::DA, &date)
        .str(tags::CONTENT_TIME, VR::TM, &time)
        .strs(tags::IMAGE_TYPE, VR::CS, &["ORIGINAL", "PRIMARY"]);

    if let Some(base) = study.pyramid.as_ref().and_then(|levels| levels.first()) {
        builder = builder
            .u16(tags::SAMPLES_PER_PIXEL, 3)
            .str(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "RGB")
            .u16(tags::PLANAR_CONFIGURATION, 0)
            .u16(tags::ROWS, base.height() as u16)
            .u16(tags::COLUMNS, base.width() as u16)
            .u16(tags::BITS_ALLOCATED, 8)
            .u16(tags::BITS_STORED, 8)
            .u16(tags::HIGH_BIT, 7)
            .u16(tags::PIXEL_REPRESENTATION, 0)
            .bytes(tags::PIXEL_DATA, VR::OB, base.as_raw().clone());
    }

    let optical_path = DatasetBuilder::new()
        .str(tags::OPTICAL_PATH_IDENTIFIER, VR::SH, "1")
        .str(tags::OPTICAL_PATH_DESCRIPTION, VR::ST, "Brightfield illumination")
        .sequence(
            tags::ILLUMINATION_TYPE_CODE_SEQUENCE,
            vec![code_item("111741", "Brightfield illumination")],
        )
        .bytes(tags::ICC_PROFILE, VR::OB, Vec::new())
        .str(PRIVATE_CREATOR, VR::LO, PRIVATE_CREATOR_NAME)
        .f64(LUMINANCE_PERCENT, 70.0)
        .build();

    builder
        .f32s(tags::IMAGED_VOLUME_WIDTH, &[15.0])
        .f32s(tags::IMAGED_VOLUME_HEIGHT, &[15.0])
        .f32s(tags::IMAGED_VOLUME_DEPTH, &[0.004])
        .u32(tags::TOTAL_PIXEL_MATRIX_COLUMNS, 40000)
        .u32(tags::TOTAL_PIXEL_MATRIX_ROWS, 30000)
        .sequence(tags::OPTICAL_PATH_SEQUENCE, vec![optical_path])
        .sequence(
            tags::GRAPHIC_ANNOTATION_SEQUENCE,
            vec![
                annotation(
                    "POLYLINE",
                    &[100.0, 100.0, 300.0, 100.0, 300.0, 300.0, 100.0, 300.0, 100.0, 100.0],
                    true,
                    "Region of Interest",
                ),
                annotation("CIRCLE", &[500.0, 400.0, 40.0], false, "Suspicious Area"),
            ],
        )
        .sequence(
            tags::SPECIMEN_DESCRIPTION_SEQUENCE,
            vec![specimen(&uids.specimen)],
        )
        .str(PRIVATE_CREATOR, VR::LO, PRIVATE_CREATOR_NAME)
        .str(SCANNER_MANUFACTURER, VR::LO, MANUFACTURER)
        .str(SCANNER_MODEL_NAME, VR::LO, MODEL_NAME)
        .str(SCANNER_SERIAL_NUMBER, VR::LO, "WSI30000123")
        .str(SCAN_DATE, VR::DA, &date)
        .str(SCAN_TIME, VR::TM, &time)
        .str(MAGNIFICATION_FACTOR, VR::LO, "40x")
        .str(LENS_NUMERICAL_APERTURE, VR::DS, "0.95")
        .str(PIXEL_SPACING_UM, VR::DS, "0.25")
        .str(FOCUS_QUALITY_SCORE, VR::DS, "0.92")
        .str(STAIN_QUALITY_SCORE, VR::DS, "0.88")
        .str(TISSUE_DETECTED_PERCENTAGE, VR::DS, "76.4")
        .str(NUMBER_OF_ANNOTATIONS, VR::IS, "2")
        .str(ANNOTATION_FORMAT, VR::CS, "DICOM")
        .build()
}

const SHEET_WIDTH: u32 = 1600;
const SHEET_HEIGHT: u32 = 1200;
const PANEL_WIDTH: u32 = 770;
const PANEL_HEIGHT: u32 = 540;
const PANEL_TITLE: u32 = 40;

fn panel_origin(index: u32) -> (i32, i32) {
    let x = 20 + (index % 2) * (PANEL_WIDTH + 20);
    let y = 80 + (index / 2) * (PANEL_HEIGHT + 20);
    (x as i32, y as i32)
}

/// Four-panel overview of a written slide file: pixels, annotation sketch,
/// patient and study text, specimen and scanner text.
pub fn preview_sheet(object: &InMemDicomObject) -> Result<RgbImage> {
    let field = |tag: Tag| text(object, tag).unwrap_or_default();
    let mut sheet = RgbImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, WHITE);

    let title = format!("Sample Pathology DICOM - {}", field(tags::PATIENT_NAME));
    draw_text_centered(&mut sheet, SHEET_WIDTH as i32 / 2, 24, &title, 4, BLACK);

    let content_height = PANEL_HEIGHT - PANEL_TITLE;
    let titles = [
        "WSI Preview (Synthetic Data)",
        "Annotation Visualization",
        "Patient & Study Information",
        "Specimen & Technical Information",
    ];
    for (i, title) in titles.iter().enumerate() {
        let (x, y) = panel_origin(i as u32);
        draw_text_centered(&mut sheet, x + PANEL_WIDTH as i32 / 2, y, title, 2, BLACK);
    }

    let (x, y) = panel_origin(0);
    let y = y + PANEL_TITLE as i32;
    match pixel_image(object)? {
        Some(image) => paste_centered(&mut sheet, &image, x, y, PANEL_WIDTH, content_height),
        None => draw_text_centered(
            &mut sheet,
            x + PANEL_WIDTH as i32 / 2,
            y + content_height as i32 / 2,
            "No image data available",
            2,
            BLACK,
        ),
    }

    let (x, y) = panel_origin(1);
    draw_annotation_sketch(&mut sheet, object, x, y + PANEL_TITLE as i32, content_height)?;

    let study_lines = vec![
        format!("Patient Name: {}", field(tags::PATIENT_NAME)),
        format!("Patient ID: {}", field(tags::PATIENT_ID)),
        format!("Patient Sex: {}", field(tags::PATIENT_SEX)),
        format!("Patient DOB: {}", field(tags::PATIENT_BIRTH_DATE)),
        String::new(),
        format!("Accession #: {}", field(tags::ACCESSION_NUMBER)),
        format!("Study Date: {}", field(tags::STUDY_DATE)),
        format!("Study Description: {}", field(tags::STUDY_DESCRIPTION)),
        format!("Modality: {} (Slide Microscopy)", field(tags::MODALITY)),
    ];
    let (x, y) = panel_origin(2);
    draw_lines(&mut sheet, x + 20, y + PANEL_TITLE as i32 + 20, &study_lines, 2, BLACK);

    let mut technical_lines = Vec::new();
    if let Some(specimen) = items(object, tags::SPECIMEN_DESCRIPTION_SEQUENCE).first() {
        let spec = |tag: Tag| text(specimen, tag).unwrap_or_default();
        technical_lines.push(format!("Specimen ID: {}", spec(tags::SPECIMEN_IDENTIFIER)));
        technical_lines.push(format!("Description: {}", spec(tags::SPECIMEN_SHORT_DESCRIPTION)));
        technical_lines.push(format!("Container: {}", spec(tags::CONTAINER_IDENTIFIER)));
        technical_lines.push(String::new());
    }
    technical_lines.extend([
        format!(
            "Scanner: {} {}",
            field(SCANNER_MANUFACTURER),
            field(SCANNER_MODEL_NAME)
        ),
        format!("Scan Date: {}", field(SCAN_DATE)),
        format!("Magnification: {}", field(MAGNIFICATION_FACTOR)),
        format!("Pixel Spacing: {} um", field(PIXEL_SPACING_UM)),
        format!("Focus Quality: {}", field(FOCUS_QUALITY_SCORE)),
        format!("Stain Quality: {}", field(STAIN_QUALITY_SCORE)),
    ]);
    let (x, y) = panel_origin(3);
    draw_lines(&mut sheet, x + 20, y + PANEL_TITLE as i32 + 20, &technical_lines, 2, BLACK);

    Ok(sheet)
}

/// Interleaved 8-bit RGB pixel data, if the object carries any.
fn pixel_image(object: &InMemDicomObject) -> Result<Option<RgbImage>> {
    let Ok(pixels) = object.element(tags::PIXEL_DATA) else {
        return Ok(None);
    };
    let dimension = |tag: Tag| -> Result<u32> {
        object
            .element(tag)
            .map_err(dicom_error)?
            .to_int::<u32>()
            .map_err(dicom_error)
    };
    let (rows, columns) = (dimension(tags::ROWS)?, dimension(tags::COLUMNS)?);
    let samples = dimension(tags::SAMPLES_PER_PIXEL)?;
    let bytes = pixels.to_bytes().map_err(dicom_error)?;

    let image = if samples == 3 {
        RgbImage::from_raw(columns, rows, bytes.to_vec())
    } else {
        image::GrayImage::from_raw(columns, rows, bytes.to_vec())
            .map(|gray| image::DynamicImage::ImageLuma8(gray).to_rgb8())
    };
    image
        .map(Some)
        .ok_or_else(|| dicom_error("pixel data does not match the image dimensions"))
}

fn draw_annotation_sketch(
    sheet: &mut RgbImage,
    object: &InMemDicomObject,
    x: i32,
    y: i32,
    height: u32,
) -> Result<()> {
    let annotations = items(object, tags::GRAPHIC_ANNOTATION_SEQUENCE);
    if annotations.is_empty() {
        draw_text_centered(
            sheet,
            x + PANEL_WIDTH as i32 / 2,
            y + height as i32 / 2,
            "No annotations available",
            2,
            BLACK,
        );
        return Ok(());
    }

    let side = height.min(PANEL_WIDTH);
    let left = x + (PANEL_WIDTH - side) as i32 / 2;
    fill_rect(sheet, left, y, side, side, Rgb([240, 240, 240]));

    let k = side as f32 / SKETCH_UNITS;
    // Sketch units grow upwards from the bottom edge.
    let to_px = |ux: f32, uy: f32| (left as f32 + ux * k, y as f32 + (SKETCH_UNITS - uy) * k);
    let scale = SKETCH_UNITS / SKETCH_SOURCE;
    let red = Rgb([255, 0, 0]);
    let blue = Rgb([0, 0, 255]);

    for item in annotations {
        let kind = text(item, tags::GRAPHIC_TYPE).unwrap_or_default();
        let label = text(item, tags::TEXT_VALUE);
        let data: Vec<f32> = item
            .element(tags::GRAPHIC_DATA)
            .map_err(dicom_error)?
            .to_multi_float32()
            .map_err(dicom_error)?
            .into_iter()
            .map(|v| v * scale)
            .collect();

        let anchor = match kind.as_str() {
            "POLYLINE" if data.len() >= 4 => {
                let points: Vec<(f32, f32)> = data.chunks_exact(2).map(|p| to_px(p[0], p[1])).collect();
                for pair in points.windows(2) {
                    for offset in [0.0, 1.0] {
                        draw_line_segment_mut(
                            sheet,
                            (pair[0].0 + offset, pair[0].1 + offset),
                            (pair[1].0 + offset, pair[1].1 + offset),
                            red,
                        );
                    }
                }
                let n = points.len() as f32;
                let cx = points.iter().map(|p| p.0).sum::<f32>() / n;
                let cy = points.iter().map(|p| p.1).sum::<f32>() / n;
                Some((cx, cy))
            }
            "CIRCLE" if data.len() >= 3 => {
                let (cx, cy) = to_px(data[0], data[1]);
                let radius = (data[2] * k).round() as i32;
                let center = (cx.round() as i32, cy.round() as i32);
                draw_hollow_circle_mut(sheet, center, radius, blue);
                draw_hollow_circle_mut(sheet, center, radius - 1, blue);
                Some((cx, cy))
            }
            _ => None,
        };

        if let (Some((cx, cy)), Some(label)) = (anchor, label) {
            let w = text_width(&label, 1) + 8;
            let (bx, by) = (cx as i32 - w as i32 / 2, cy as i32 - 8);
            fill_rect(sheet, bx, by, w, 16, WHITE);
            draw_text(sheet, bx + 4, by + 4, &label, 1, BLACK);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::utils::test_support::MockStorage;
    use chrono::NaiveDate;

    fn study(with_pixels: bool) -> SlideStudy {
        let acquired = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut rng = seeded_rng();
        SlideStudy {
            patient: fake_patient(&mut rng, acquired.date()),
            study_id: "STUDY-1234".to_string(),
            acquired,
            uids: StudyUids::generate(&mut rng),
            pyramid: with_pixels.then(|| vec![RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]))]),
        }
    }

    fn encoded(study: &SlideStudy) -> Vec<u8> {
        to_part10(
            slide_dataset(study),
            WSI_SOP_CLASS,
            &study.uids.sop_instance,
            &study.uids.implementation_class,
            "DICOM-WSI-DEMO",
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_round_trips_through_part10() {
        let study = study(false);
        let object = from_part10(&encoded(&study)).unwrap();

        assert_eq!(text(&object, tags::PATIENT_NAME), Some(study.patient.name.clone()));
        assert_eq!(text(&object, tags::MODALITY).as_deref(), Some("SM"));
        assert_eq!(text(&object, tags::STUDY_DATE).as_deref(), Some("20250314"));
        assert_eq!(text(&object, tags::SOP_CLASS_UID).as_deref(), Some(WSI_SOP_CLASS));
        assert_eq!(text(&object, PRIVATE_CREATOR).as_deref(), Some(PRIVATE_CREATOR_NAME));
        assert_eq!(text(&object, SCANNER_SERIAL_NUMBER).as_deref(), Some("WSI30000123"));
        assert!(object.element(tags::PIXEL_DATA).is_err());

        let annotations = items(&object, tags::GRAPHIC_ANNOTATION_SEQUENCE);
        assert_eq!(annotations.len(), 2);
        assert_eq!(text(&annotations[1], tags::GRAPHIC_TYPE).as_deref(), Some("CIRCLE"));

        let specimen = &items(&object, tags::SPECIMEN_DESCRIPTION_SEQUENCE)[0];
        let steps = items(specimen, tags::SPECIMEN_PREPARATION_SEQUENCE);
        assert_eq!(steps.len(), 2);
        let staining = &items(&steps[1], tags::SPECIMEN_PREPARATION_STEP_CONTENT_ITEM_SEQUENCE)[0];
        assert_eq!(text(staining, tags::TEXT_VALUE).as_deref(), Some("H&E"));
    }

    #[test]
    fn test_pixel_module_is_written_with_pixels() {
        let object = from_part10(&encoded(&study(true))).unwrap();

        let image = pixel_image(&object).unwrap().unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(*image.get_pixel(7, 3), Rgb([10, 20, 30]));
        assert_eq!(text(&object, tags::PHOTOMETRIC_INTERPRETATION).as_deref(), Some("RGB"));
    }

    #[test]
    fn test_preview_without_pixels() {
        let object = from_part10(&encoded(&study(false))).unwrap();
        let sheet = preview_sheet(&object).unwrap();

        assert_eq!(sheet.dimensions(), (SHEET_WIDTH, SHEET_HEIGHT));
        // The annotation sketch background sits in the second panel.
        let (x, y) = panel_origin(1);
        let left = x + (PANEL_WIDTH - (PANEL_HEIGHT - PANEL_TITLE)) as i32 / 2;
        assert_eq!(
            *sheet.get_pixel(left as u32 + 2, (y + PANEL_TITLE as i32 + 2) as u32),
            Rgb([240, 240, 240])
        );
    }

    #[test]
    fn test_pipeline_writes_file_and_preview() {
        let storage = MockStorage::new();
        let options = SampleDicomOptions {
            output_dir: "out".to_string(),
            with_pixel_data: true,
        };
        let outputs = FigureEngine::new(SampleDicomPipeline::new(storage.clone(), options))
            .run()
            .unwrap();

        assert_eq!(
            outputs,
            vec!["out/sample_pathology_wsi.dcm", "out/sample_pathology_wsi_preview.png"]
        );
        let dicom = storage.get_file("out/sample_pathology_wsi.dcm").unwrap();
        assert_eq!(&dicom[128..132], b"DICM");
        let object = from_part10(&dicom).unwrap();
        assert_eq!(
            object.element(tags::ROWS).unwrap().to_int::<u16>().unwrap(),
            768
        );
    }
}

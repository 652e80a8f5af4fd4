//! DICOM-shaped metadata document for a synthetic slide, the slide image it
//! describes and a poster laying out the monolithic file structure.

use crate::adapters::dicom::WSI_SOP_CLASS;
use crate::adapters::raster::encode_png;
use crate::adapters::svg_canvas::{
    draw_raster, render_svg, text_style, BoxStyle, Canvas, SvgArea, LIGHT_STEEL_BLUE,
    LIGHT_YELLOW, NAVY,
};
use crate::core::synthetic::{
    annotated_slide, fake_patient, seeded_rng, FakePatient, SLIDE_HEIGHT, SLIDE_WIDTH,
};
use crate::core::{Pipeline, Storage};
use crate::utils::error::{render_error, FigureError, Result};
use chrono::NaiveDateTime;
use image::{imageops, RgbImage};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use rand::Rng;
use serde_json::{json, Value};

const UID_ROOT: &str = "1.2.840.10008.1.2.3.4";
const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Region of the slide shown enlarged next to the full image.
const ROI_CROP: (u32, u32, u32, u32) = (180, 180, 420, 370);

const FILE_STRUCTURE: [(&str, &str); 12] = [
    ("DICOM Header", "128-byte preamble + DICM prefix"),
    (
        "File Meta Information",
        "Media Storage SOP Class UID\nTransfer Syntax UID\nImplementation UID",
    ),
    ("Patient Module", "Name, ID, DOB, Sex, Address"),
    (
        "Study Module",
        "Study Description\nAccession Number\nStudy Date/Time",
    ),
    ("Series Module", "Series Description\nModality (SM)"),
    (
        "Equipment Module",
        "Manufacturer\nScanner Model\nSoftware Version",
    ),
    (
        "Specimen Module",
        "Specimen ID\nPreparation\nStaining Method",
    ),
    (
        "Whole Slide Microscopy Module",
        "Optical Path\nVolume Dimensions\nTotal Pixel Matrix",
    ),
    (
        "Image Pixel Module",
        "Photometric Interpretation\nSamples Per Pixel\nBits Allocated",
    ),
    (
        "Image Data",
        "Pixel Data Element (7FE0,0010)\nMulti-resolution pyramid\nImage frames",
    ),
    ("Annotations", "Graphic Type\nGraphic Data\nText Value"),
    (
        "Pathology Extensions",
        "Scanner Details\nScan Parameters\nQuality Metrics",
    ),
];

const MODULAR_COMPARISON: &str = "In contrast, a modular approach would:

• Separate components into specialized files
  - OME-TIFF for image data
  - FHIR for patient/clinical metadata
  - GeoJSON for annotations

• Enable independent security mechanisms
  - Different access controls per component
  - Role-based permissions

• Facilitate immutability
  - Base image data remains unchanged
  - Annotations stored separately

• Allow cryptographic signatures
  - Easily signed immutable components
  - Verifiable data integrity

• Support distributed storage
  - Scalable cloud architecture
  - Flexible database approaches";

pub const SECURITY_TABLE: [[&str; 3]; 7] = [
    ["Feature", "DICOM (Monolithic)", "Modular Approach"],
    [
        "Data Modifications",
        "All components change together",
        "Components evolve independently",
    ],
    [
        "Annotation Updates",
        "Requires modifying entire file",
        "Updates only annotation files",
    ],
    [
        "Access Control",
        "All-or-nothing file access",
        "Granular component-level access",
    ],
    [
        "Cryptographic Signing",
        "Challenging (file changes frequently)",
        "Simple (immutable components)",
    ],
    [
        "PHI Protection",
        "PHI embedded within file",
        "PHI separated from image data",
    ],
    [
        "Audit Trail",
        "Complex to implement",
        "Native versioning of components",
    ],
];

const TABLE_HEADER: RGBColor = RGBColor(0x44, 0x72, 0xc4);
const TABLE_FEATURE: RGBColor = RGBColor(0xd9, 0xe1, 0xf2);
const TABLE_DICOM: RGBColor = RGBColor(0xe9, 0xec, 0xf5);
const TABLE_MODULAR: RGBColor = RGBColor(0xc6, 0xe0, 0xb4);

#[derive(Debug, Clone)]
pub struct DicomMetadataOptions {
    pub output_dir: String,
}

impl Default for DicomMetadataOptions {
    fn default() -> Self {
        Self {
            output_dir: "samples".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlideSample {
    pub patient: FakePatient,
    pub image: RgbImage,
    pub acquired: NaiveDateTime,
    /// Five-digit suffix shared by every generated UID.
    pub uid_suffix: u32,
    pub study_number: u32,
}

pub struct MetadataArtifacts {
    pub metadata: Value,
    pub image: RgbImage,
    pub structure: String,
}

pub struct DicomMetadataPipeline<S: Storage> {
    storage: S,
    options: DicomMetadataOptions,
}

impl<S: Storage> DicomMetadataPipeline<S> {
    pub fn new(storage: S, options: DicomMetadataOptions) -> Self {
        Self { storage, options }
    }

    fn output(&self, file: &str) -> String {
        format!("{}/{}", self.options.output_dir.trim_end_matches('/'), file)
    }
}

impl<S: Storage> Pipeline for DicomMetadataPipeline<S> {
    type Extracted = SlideSample;
    type Transformed = MetadataArtifacts;

    fn name(&self) -> &'static str {
        "dicom-metadata"
    }

    fn extract(&self) -> Result<SlideSample> {
        let acquired = chrono::Local::now().naive_local();
        let patient = fake_patient(&mut seeded_rng(), acquired.date());

        let mut rng = seeded_rng();
        let image = annotated_slide(&mut rng, SLIDE_WIDTH, SLIDE_HEIGHT);
        Ok(SlideSample {
            patient,
            image,
            acquired,
            uid_suffix: rng.gen_range(10_000..=99_999),
            study_number: rng.gen_range(1000..=9999),
        })
    }

    fn transform(&self, sample: SlideSample) -> Result<MetadataArtifacts> {
        let metadata = dicom_metadata(&sample);
        let structure = structure_poster(&metadata, &sample.image)?;
        Ok(MetadataArtifacts {
            metadata,
            image: sample.image,
            structure,
        })
    }

    fn load(&self, artifacts: MetadataArtifacts) -> Result<Vec<String>> {
        let json_path = self.output("sample_dicom_metadata.json");
        let json = serde_json::to_string_pretty(&artifacts.metadata)?;
        self.storage.write_file(&json_path, json.as_bytes())?;

        let image_path = self.output("sample_wsi_image.png");
        self.storage
            .write_file(&image_path, &encode_png(&artifacts.image)?)?;

        let structure_path = self.output("dicom_wsi_structure.svg");
        self.storage
            .write_file(&structure_path, artifacts.structure.as_bytes())?;

        Ok([json_path, image_path, structure_path]
            .iter()
            .map(|path| self.storage.display_path(path))
            .collect())
    }
}

/// `1.2.840.10008.1.2.3.4.<timestamp>.<n><suffix>`
pub fn demo_uid(timestamp: &str, n: u8, suffix: u32) -> String {
    format!("{}.{}.{}{}", UID_ROOT, timestamp, n, suffix)
}

/// Module-by-module description of the slide, keyed the way the DICOM
/// standard names modules and attributes.
pub fn dicom_metadata(sample: &SlideSample) -> Value {
    let patient = &sample.patient;
    let timestamp = sample.acquired.format("%Y%m%d%H%M%S").to_string();
    let date = sample.acquired.format("%Y%m%d").to_string();
    let time = sample.acquired.format("%H%M%S").to_string();
    let uid = |n| demo_uid(&timestamp, n, sample.uid_suffix);
    let instance_uid = uid(3);

    json!({
        "FileMetaInformation": {
            "MediaStorageSOPClassUID": WSI_SOP_CLASS,
            "MediaStorageSOPInstanceUID": instance_uid,
            "TransferSyntaxUID": EXPLICIT_VR_LITTLE_ENDIAN,
            "ImplementationClassUID": "1.2.3.4.5.6.7.8.9",
            "ImplementationVersionName": "DICOM-WSI-DEMO"
        },
        "PatientModule": {
            "PatientName": patient.name,
            "PatientID": patient.mrn,
            "PatientBirthDate": patient.dob,
            "PatientSex": patient.sex.to_string(),
            "PatientAddress": patient.address
        },
        "ClinicalTrialSubjectModule": {
            "ClinicalTrialSponsorName": "ACME Research",
            "ClinicalTrialProtocolID": "PATHOLOGY-2025-001",
            "ClinicalTrialProtocolName": "Advanced Digital Pathology Workflow Study"
        },
        "GeneralStudyModule": {
            "StudyInstanceUID": uid(1),
            "StudyDate": date,
            "StudyTime": time,
            "ReferringPhysicianName": "Smith^John",
            "StudyID": format!("ST{}", sample.study_number),
            "AccessionNumber": patient.accession_number,
            "StudyDescription": "Liver biopsy, suspected carcinoma"
        },
        "PatientStudyModule": {
            "AdmittingDiagnosesDescription": "Suspected hepatocellular carcinoma"
        },
        "GeneralSeriesModule": {
            "Modality": "SM",
            "SeriesInstanceUID": uid(2),
            "SeriesNumber": "1",
            "SeriesDescription": "H&E stained slide"
        },
        "FrameOfReferenceModule": {
            "FrameOfReferenceUID": uid(4)
        },
        "GeneralEquipmentModule": {
            "Manufacturer": "ACME Digital Pathology",
            "ManufacturerModelName": "ACME WSI Scanner 3000",
            "SoftwareVersions": "1.0"
        },
        "GeneralImageModule": {
            "InstanceNumber": "1",
            "PatientOrientation": "",
            "ContentDate": date,
            "ContentTime": time,
            "ImageType": ["ORIGINAL", "PRIMARY"]
        },
        "ImagePixelModule": {
            "SamplesPerPixel": 3,
            "PhotometricInterpretation": "RGB",
            "PlanarConfiguration": 0,
            "Rows": 40000,
            "Columns": 30000,
            "BitsAllocated": 8,
            "BitsStored": 8,
            "HighBit": 7,
            "PixelRepresentation": 0
        },
        "WholeSlideMicroscopyImageModule": {
            "ImagedVolumeWidth": 15.0,
            "ImagedVolumeHeight": 15.0,
            "ImagedVolumeDepth": 0.004,
            "TotalPixelMatrixColumns": 40000,
            "TotalPixelMatrixRows": 30000,
            "OpticalPathSequence": [{
                "OpticalPathIdentifier": "1",
                "OpticalPathDescription": "Brightfield illumination",
                "IlluminationTypeCodeSequence": {
                    "CodeValue": "111741",
                    "CodingSchemeDesignator": "DCM",
                    "CodeMeaning": "Brightfield illumination"
                },
                "LuminanceOfSingleReferencePercent": 70.0
            }]
        },
        "SpecimenModule": {
            "SpecimenDescriptionSequence": [{
                "SpecimenIdentifier": patient.specimen_id,
                "SpecimenUID": uid(5),
                "SpecimenShortDescription": "Liver biopsy",
                "SpecimenDetailedDescription": "Liver biopsy from segment 7",
                "SpecimenPreparationSequence": [{
                    "PreparationType": "FORMALIN FIXED PARAFFIN EMBEDDED",
                    "StainingMethod": "H&E"
                }]
            }]
        },
        "AnnotationModule": {
            "GraphicAnnotationSequence": [
                {
                    "GraphicType": "POLYLINE",
                    "GraphicData": [200, 200, 400, 200, 400, 350, 200, 350, 200, 200],
                    "GraphicFilled": "Y",
                    "TextValue": "Region of Interest"
                },
                {
                    "GraphicType": "CIRCLE",
                    "GraphicData": [640, 390, 40],
                    "GraphicFilled": "N",
                    "TextValue": "Suspicious Area"
                }
            ]
        },
        "PathologyExtensions": {
            "ScannerManufacturer": "ACME Digital Pathology",
            "ScannerModelName": "ACME WSI Scanner 3000",
            "ScannerSerialNumber": "WSI30000123",
            "ScanDate": date,
            "ScanTime": time,
            "MagnificationFactor": "40x",
            "LensNumericalAperture": "0.95",
            "PixelSpacing": "0.25",
            "FocusQualityScore": "0.92",
            "StainQualityScore": "0.88",
            "TissueDetectedPercentage": "76.4"
        },
        "SOPCommonModule": {
            "SOPClassUID": WSI_SOP_CLASS,
            "SOPInstanceUID": instance_uid
        }
    })
}

/// Renders a JSON scalar without quotes.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Grouped "Label: value" lines for the metadata column of the poster.
pub fn metadata_highlights(metadata: &Value) -> Result<Vec<(&'static str, Vec<String>)>> {
    let field = |pointer: &str| -> Result<String> {
        metadata
            .pointer(pointer)
            .map(plain)
            .ok_or_else(|| FigureError::ValidationError {
                message: format!("metadata is missing {}", pointer),
            })
    };
    let specimen = "/SpecimenModule/SpecimenDescriptionSequence/0";

    Ok(vec![
        (
            "Patient Information",
            vec![
                format!("Name: {}", field("/PatientModule/PatientName")?),
                format!("ID: {}", field("/PatientModule/PatientID")?),
                format!("DOB: {}", field("/PatientModule/PatientBirthDate")?),
                format!("Sex: {}", field("/PatientModule/PatientSex")?),
            ],
        ),
        (
            "Study Information",
            vec![
                format!("Accession #: {}", field("/GeneralStudyModule/AccessionNumber")?),
                format!("Study Date: {}", field("/GeneralStudyModule/StudyDate")?),
                format!("Description: {}", field("/GeneralStudyModule/StudyDescription")?),
            ],
        ),
        (
            "Specimen Information",
            vec![
                format!("ID: {}", field(&format!("{}/SpecimenIdentifier", specimen))?),
                format!(
                    "Description: {}",
                    field(&format!("{}/SpecimenShortDescription", specimen))?
                ),
                format!(
                    "Preparation: {}",
                    field(&format!("{}/SpecimenPreparationSequence/0/PreparationType", specimen))?
                ),
                format!(
                    "Stain: {}",
                    field(&format!("{}/SpecimenPreparationSequence/0/StainingMethod", specimen))?
                ),
            ],
        ),
        (
            "WSI Information",
            vec![
                format!(
                    "Scanner: {} {}",
                    field("/PathologyExtensions/ScannerManufacturer")?,
                    field("/PathologyExtensions/ScannerModelName")?
                ),
                format!("Magnification: {}", field("/PathologyExtensions/MagnificationFactor")?),
                format!("Pixel Spacing: {} µm", field("/PathologyExtensions/PixelSpacing")?),
                format!("Width: {} pixels", field("/ImagePixelModule/Columns")?),
                format!("Height: {} pixels", field("/ImagePixelModule/Rows")?),
            ],
        ),
        (
            "Technical Information",
            vec![
                "SOP Class: Whole Slide Microscopy Image Storage".to_string(),
                "Transfer Syntax: Explicit VR Little Endian".to_string(),
                format!(
                    "Photometric Interpretation: {}",
                    field("/ImagePixelModule/PhotometricInterpretation")?
                ),
                format!("Bits Allocated: {}", field("/ImagePixelModule/BitsAllocated")?),
            ],
        ),
    ])
}

const POSTER_WIDTH: u32 = 1800;
const POSTER_HEIGHT: u32 = 1400;

fn panel<'a>(area: &SvgArea<'a>, x: i32, y: i32, w: u32, h: u32) -> SvgArea<'a> {
    area.clone().shrink((x, y), (w, h))
}

fn left_text(size: f64, bold: bool, color: &RGBColor) -> TextStyle<'static> {
    text_style(size, bold, color, HPos::Left, VPos::Top)
}

fn panel_title(area: &SvgArea<'_>, title: &str) -> Result<()> {
    Canvas::new(area).text(0.5, 1.0, title, &text_style(22.0, false, &BLACK, HPos::Center, VPos::Top))
}

/// Poster of the monolithic layout: file structure, slide and ROI, selected
/// metadata, the modular alternative and a security comparison.
pub fn structure_poster(metadata: &Value, image: &RgbImage) -> Result<String> {
    let highlights = metadata_highlights(metadata)?;
    let (x0, y0, x1, y1) = ROI_CROP;
    let roi = imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();

    render_svg(POSTER_WIDTH, POSTER_HEIGHT, |root| {
        let canvas = Canvas::new(root);
        canvas.text(
            0.5,
            0.985,
            "DICOM Format for Digital Pathology WSI (Monolithic Approach)",
            &text_style(32.0, true, &BLACK, HPos::Center, VPos::Top),
        )?;
        canvas.text_down(
            0.5,
            0.95,
            "This diagram illustrates how pathology whole slide images and associated metadata are stored in a single DICOM file,\n\
             demonstrating the monolithic approach discussed in 'Wearing a Fur Coat in the Summertime'",
            &text_style(16.0, false, &BLACK, HPos::Center, VPos::Top),
            1.3,
        )?;

        draw_file_structure(&panel(root, 30, 140, 420, 880))?;

        let slide = panel(root, 470, 140, 560, 430);
        panel_title(&slide, "WSI Image Data")?;
        draw_raster(&panel(&slide, 0, 40, 560, 390), image, 8)?;

        let crop = panel(root, 470, 590, 560, 430);
        panel_title(&crop, "Region of Interest (Annotation)")?;
        draw_raster(&panel(&crop, 0, 40, 560, 390), &roi, 2)?;

        draw_highlights(&panel(root, 1050, 140, 420, 880), &highlights)?;
        draw_modular_notes(&panel(root, 1490, 140, 280, 880))?;
        draw_security_table(&panel(root, 300, 1040, 1200, 280))?;

        let note = panel(root, 150, 1330, 1500, 56);
        Canvas::new(&note).rect(
            0.0,
            0.0,
            1.0,
            1.0,
            BoxStyle::filled(LIGHT_YELLOW, 0.6).with_stroke(BLACK, 1),
        )?;
        Canvas::new(&note).text_block(
            0.5,
            0.5,
            "Note: This visualization compares DICOM's monolithic file format with a modular approach to digital pathology data management.\n\
             The monolithic approach bundles all components in a single file, while the modular approach separates concerns, enhancing flexibility, security, and immutability.",
            &text_style(14.0, false, &BLACK, HPos::Center, VPos::Center),
            1.4,
        )?;

        let (w, h) = (POSTER_WIDTH as i32, POSTER_HEIGHT as i32);
        root.draw(&Rectangle::new([(1, 1), (w - 1, h - 1)], NAVY.stroke_width(2)))
            .map_err(render_error)?;
        Ok(())
    })
}

fn draw_file_structure(area: &SvgArea<'_>) -> Result<()> {
    panel_title(area, "DICOM File Structure (Monolithic)")?;
    let body = panel(area, 0, 40, 420, 840);
    let canvas = Canvas::new(&body);

    let n = FILE_STRUCTURE.len();
    let box_height = 0.065;
    for (i, (title, details)) in FILE_STRUCTURE.iter().enumerate() {
        let y = 0.96 - (0.92 * i as f64) / (n - 1) as f64;
        canvas.rect(
            0.05,
            y - box_height / 2.0,
            0.9,
            box_height,
            BoxStyle::filled(LIGHT_STEEL_BLUE, 0.7).with_stroke(NAVY, 1),
        )?;
        canvas.text(
            0.5,
            y + 0.026,
            title,
            &text_style(13.0, true, &BLACK, HPos::Center, VPos::Top),
        )?;
        canvas.text_down(
            0.5,
            y + 0.008,
            details,
            &text_style(9.0, false, &BLACK, HPos::Center, VPos::Top),
            1.15,
        )?;
    }
    Ok(())
}

fn draw_highlights(area: &SvgArea<'_>, highlights: &[(&'static str, Vec<String>)]) -> Result<()> {
    panel_title(area, "DICOM Metadata (Selected Fields)")?;
    let body = panel(area, 0, 40, 420, 840);
    let canvas = Canvas::new(&body);
    canvas.rect(
        0.02,
        0.02,
        0.96,
        0.96,
        BoxStyle::filled(RGBColor(0xf8, 0xf8, 0xf8), 0.8).with_stroke(RGBColor(0xcc, 0xcc, 0xcc), 1),
    )?;

    let mut y = 0.95;
    for (category, lines) in highlights {
        canvas.text(0.05, y, category, &left_text(16.0, true, &BLACK))?;
        y -= 0.035;
        for line in lines {
            canvas.text(0.08, y, line, &left_text(12.0, false, &BLACK))?;
            y -= 0.026;
        }
        y -= 0.03;
    }
    Ok(())
}

fn draw_modular_notes(area: &SvgArea<'_>) -> Result<()> {
    panel_title(area, "Modular Approach Comparison")?;
    let body = panel(area, 0, 40, 280, 840);
    let canvas = Canvas::new(&body);
    canvas.rect(
        0.02,
        0.02,
        0.96,
        0.96,
        BoxStyle::filled(RGBColor(0xea, 0xf4, 0xf4), 0.8).with_stroke(RGBColor(0x2c, 0x78, 0x73), 1),
    )?;
    canvas.text_down(0.05, 0.96, MODULAR_COMPARISON, &left_text(11.0, false, &BLACK), 1.5)?;
    Ok(())
}

fn draw_security_table(area: &SvgArea<'_>) -> Result<()> {
    panel_title(area, "Security & Immutability Comparison")?;
    let body = panel(area, 0, 40, 1200, 240);
    let canvas = Canvas::new(&body);

    let widths = [0.2, 0.35, 0.35];
    let total: f64 = widths.iter().sum();
    let rows = SECURITY_TABLE.len() as f64;
    let row_height = 1.0 / rows;

    for (r, row) in SECURITY_TABLE.iter().enumerate() {
        let y = 1.0 - (r as f64 + 1.0) * row_height;
        let mut x = 0.0;
        for (c, cell) in row.iter().enumerate() {
            let w = widths[c] / total;
            let (fill, color, bold) = match (r, c) {
                (0, _) => (TABLE_HEADER, WHITE, true),
                (_, 0) => (TABLE_FEATURE, BLACK, false),
                (_, 1) => (TABLE_DICOM, BLACK, false),
                _ => (TABLE_MODULAR, BLACK, false),
            };
            canvas.rect(
                x,
                y,
                w,
                row_height,
                BoxStyle::filled(fill, 1.0).with_stroke(BLACK, 1),
            )?;
            canvas.text(
                x + w / 2.0,
                y + row_height / 2.0,
                cell,
                &text_style(12.0, bold, &color, HPos::Center, VPos::Center),
            )?;
            x += w;
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

    fn sample() -> SlideSample {
        let acquired = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        SlideSample {
            patient: fake_patient(&mut seeded_rng(), acquired.date()),
            image: RgbImage::from_pixel(SLIDE_WIDTH, SLIDE_HEIGHT, image::Rgb([240, 240, 240])),
            acquired,
            uid_suffix: 12345,
            study_number: 4321,
        }
    }

    #[test]
    fn test_uids_share_timestamp_and_suffix() {
        let metadata = dicom_metadata(&sample());

        assert_eq!(
            metadata["GeneralStudyModule"]["StudyInstanceUID"],
            "1.2.840.10008.1.2.3.4.20250314093005.112345"
        );
        assert_eq!(
            metadata["SpecimenModule"]["SpecimenDescriptionSequence"][0]["SpecimenUID"],
            "1.2.840.10008.1.2.3.4.20250314093005.512345"
        );
        assert_eq!(
            metadata["SOPCommonModule"]["SOPInstanceUID"],
            metadata["FileMetaInformation"]["MediaStorageSOPInstanceUID"]
        );
        assert_eq!(metadata["GeneralStudyModule"]["StudyID"], "ST4321");
    }

    #[test]
    fn test_modules_follow_patient() {
        let sample = sample();
        let metadata = dicom_metadata(&sample);

        let modules: Vec<&str> = metadata
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(modules.first(), Some(&"FileMetaInformation"));
        assert_eq!(modules.last(), Some(&"SOPCommonModule"));
        assert_eq!(modules.len(), 15);

        assert_eq!(metadata["PatientModule"]["PatientName"], sample.patient.name);
        assert_eq!(
            metadata["SpecimenModule"]["SpecimenDescriptionSequence"][0]["SpecimenIdentifier"],
            sample.patient.specimen_id
        );
        assert_eq!(metadata["ImagePixelModule"]["Rows"], 40000);
    }

    #[test]
    fn test_highlights_read_from_metadata() {
        let metadata = dicom_metadata(&sample());
        let highlights = metadata_highlights(&metadata).unwrap();

        assert_eq!(highlights.len(), 5);
        assert_eq!(highlights[2].1[3], "Stain: H&E");
        assert_eq!(highlights[3].1[2], "Pixel Spacing: 0.25 µm");
        assert_eq!(highlights[3].1[3], "Width: 30000 pixels");

        assert!(metadata_highlights(&json!({})).is_err());
    }

    #[test]
    fn test_pipeline_writes_three_outputs() {
        let storage = MockStorage::new();
        let pipeline = DicomMetadataPipeline::new(storage.clone(), DicomMetadataOptions::default());
        let outputs = FigureEngine::new(pipeline).run().unwrap();

        assert_eq!(
            outputs,
            vec![
                "samples/sample_dicom_metadata.json",
                "samples/sample_wsi_image.png",
                "samples/dicom_wsi_structure.svg",
            ]
        );
        let json: Value =
            serde_json::from_str(&storage.get_text("samples/sample_dicom_metadata.json").unwrap())
                .unwrap();
        assert_eq!(json["GeneralSeriesModule"]["Modality"], "SM");

        let svg = storage.get_text("samples/dicom_wsi_structure.svg").unwrap();
        assert!(svg.contains("Monolithic Approach"));
        assert!(svg.contains("Immutability Comparison"));
        assert!(svg.contains("Native versioning of components"));
    }
}

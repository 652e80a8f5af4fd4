//! Thin helpers over `dicom-object` for building and re-reading Part-10
//! files held in memory.

use crate::utils::error::{dicom_error, Result};
use dicom_core::value::DataSetSequence;
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::uids;
use dicom_object::{DefaultDicomObject, FileMetaTableBuilder, InMemDicomObject};
use rand::Rng;

/// Length of the Part-10 preamble that precedes the `DICM` magic code.
pub const PREAMBLE_LEN: usize = 128;

/// VL Whole Slide Microscopy Image Storage.
pub const WSI_SOP_CLASS: &str = "1.2.840.10008.5.1.4.1.1.77.1.6";

/// Random UUID-derived UID under the `2.25` root.
pub fn generate_uid<R: Rng>(rng: &mut R) -> String {
    format!("2.25.{}", rng.gen::<u128>())
}

/// Accumulates elements into an in-memory data set.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    object: InMemDicomObject,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            object: InMemDicomObject::new_empty(),
        }
    }

    pub fn str(mut self, tag: Tag, vr: VR, value: &str) -> Self {
        self.object
            .put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
        self
    }

    pub fn strs(mut self, tag: Tag, vr: VR, values: &[&str]) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.object
            .put(DataElement::new(tag, vr, PrimitiveValue::Strs(values)));
        self
    }

    pub fn u16(mut self, tag: Tag, value: u16) -> Self {
        self.object
            .put(DataElement::new(tag, VR::US, PrimitiveValue::from(value)));
        self
    }

    pub fn u32(mut self, tag: Tag, value: u32) -> Self {
        self.object
            .put(DataElement::new(tag, VR::UL, PrimitiveValue::from(value)));
        self
    }

    pub fn f32s(mut self, tag: Tag, values: &[f32]) -> Self {
        let values = values.iter().copied().collect();
        self.object
            .put(DataElement::new(tag, VR::FL, PrimitiveValue::F32(values)));
        self
    }

    pub fn f64(mut self, tag: Tag, value: f64) -> Self {
        self.object
            .put(DataElement::new(tag, VR::FD, PrimitiveValue::from(value)));
        self
    }

    pub fn bytes(mut self, tag: Tag, vr: VR, value: Vec<u8>) -> Self {
        self.object
            .put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
        self
    }

    pub fn sequence(mut self, tag: Tag, items: Vec<InMemDicomObject>) -> Self {
        self.object
            .put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
        self
    }

    pub fn build(self) -> InMemDicomObject {
        self.object
    }
}

/// Serializes `object` as an Explicit VR Little Endian Part-10 file,
/// preamble included.
pub fn to_part10(
    object: InMemDicomObject,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    implementation_class_uid: &str,
    implementation_version: &str,
) -> Result<Vec<u8>> {
    let file = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(sop_class_uid)
                .media_storage_sop_instance_uid(sop_instance_uid)
                .implementation_class_uid(implementation_class_uid)
                .implementation_version_name(implementation_version),
        )
        .map_err(dicom_error)?;

    let mut bytes = Vec::new();
    file.write_all(&mut bytes).map_err(dicom_error)?;
    Ok(bytes)
}

/// Parses Part-10 bytes produced by `to_part10`.
pub fn from_part10(bytes: &[u8]) -> Result<DefaultDicomObject> {
    if bytes.len() < PREAMBLE_LEN + 4 || &bytes[PREAMBLE_LEN..PREAMBLE_LEN + 4] != b"DICM" {
        return Err(dicom_error("missing DICM magic code after the preamble"));
    }
    dicom_object::from_reader(&bytes[PREAMBLE_LEN..]).map_err(dicom_error)
}

/// String value of `tag`, trimmed of DICOM padding.
pub fn text(object: &InMemDicomObject, tag: Tag) -> Option<String> {
    let element = object.element(tag).ok()?;
    let value = element.to_str().ok()?;
    Some(value.trim_end_matches(['\0', ' ']).to_string())
}

/// Items of the sequence at `tag`; empty when absent.
pub fn items(object: &InMemDicomObject, tag: Tag) -> &[InMemDicomObject] {
    object
        .element(tag)
        .ok()
        .and_then(|element| element.items())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_dictionary_std::tags;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uids_use_the_uuid_root() {
        let mut rng = StdRng::seed_from_u64(1);
        let uid = generate_uid(&mut rng);
        assert!(uid.starts_with("2.25."));
        assert!(uid.len() <= 64);
        assert!(uid[5..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_part10_round_trip_keeps_values() {
        let item = DatasetBuilder::new()
            .str(tags::CODE_VALUE, VR::SH, "111741")
            .build();
        let object = DatasetBuilder::new()
            .str(tags::PATIENT_NAME, VR::PN, "Doe^Jane")
            .str(tags::SOP_CLASS_UID, VR::UI, WSI_SOP_CLASS)
            .str(tags::SOP_INSTANCE_UID, VR::UI, "2.25.1")
            .u16(tags::ROWS, 768)
            .sequence(tags::ILLUMINATION_TYPE_CODE_SEQUENCE, vec![item])
            .build();

        let bytes = to_part10(object, WSI_SOP_CLASS, "2.25.1", "2.25.2", "TEST").unwrap();
        assert_eq!(&bytes[128..132], b"DICM");

        let parsed = from_part10(&bytes).unwrap();
        assert_eq!(text(&parsed, tags::PATIENT_NAME).as_deref(), Some("Doe^Jane"));
        assert_eq!(
            parsed.element(tags::ROWS).unwrap().to_int::<u16>().unwrap(),
            768
        );
        let seq = items(&parsed, tags::ILLUMINATION_TYPE_CODE_SEQUENCE);
        assert_eq!(seq.len(), 1);
        assert_eq!(text(&seq[0], tags::CODE_VALUE).as_deref(), Some("111741"));
        assert!(items(&parsed, tags::GRAPHIC_ANNOTATION_SEQUENCE).is_empty());
    }

    #[test]
    fn test_rejects_bytes_without_magic() {
        assert!(from_part10(&[0u8; 200]).is_err());
    }
}

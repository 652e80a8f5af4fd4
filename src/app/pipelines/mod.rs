// One module per generator; each exposes `<Name>Options` and `<Name>Pipeline`.

pub mod architecture;
pub mod breach_trends;
pub mod csv_markdown;
pub mod dicom_metadata;
pub mod location_pie;
pub mod phi_overlay;
pub mod risk_heat_map;
pub mod sample_dicom;

//! Seeded fake data: patient demographics and tissue-like slide images.

use crate::adapters::raster::{draw_outline, draw_text, BLACK};
use chrono::{Duration, Months, NaiveDate};
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

pub const SEED: u64 = 42;

pub const SLIDE_WIDTH: u32 = 1024;
pub const SLIDE_HEIGHT: u32 = 768;

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FakePatient {
    /// `Last^First`
    pub name: String,
    pub mrn: String,
    /// `YYYYMMDD`
    pub dob: String,
    pub sex: char,
    pub address: String,
    pub ssn: String,
    pub phone: String,
    pub specimen_id: String,
    pub accession_number: String,
}

/// Draws a patient from `rng`; `today` anchors the birth date and accession number.
pub fn fake_patient<R: Rng>(rng: &mut R, today: NaiveDate) -> FakePatient {
    let sex = if rng.gen_bool(0.5) { 'M' } else { 'F' };
    let first: String = FirstName().fake_with_rng(rng);
    let last: String = LastName().fake_with_rng(rng);
    let mrn = rng.gen_range(1_000_000..=9_999_999).to_string();

    let age_years: u32 = rng.gen_range(18..90);
    let extra_days: i64 = rng.gen_range(0..365);
    let dob = today
        .checked_sub_months(Months::new(age_years * 12))
        .map(|d| d - Duration::days(extra_days))
        .unwrap_or(today);

    let building: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);
    let state: String = StateAbbr().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);

    let ssn = format!(
        "{:03}-{:02}-{:04}",
        rng.gen_range(100..900),
        rng.gen_range(1..100),
        rng.gen_range(1..10_000)
    );
    let phone: String = PhoneNumber().fake_with_rng(rng);

    FakePatient {
        name: format!("{}^{}", last, first),
        mrn,
        dob: dob.format("%Y%m%d").to_string(),
        sex,
        address: format!("{} {}, {}, {} {}", building, street, city, state, zip),
        ssn,
        phone,
        specimen_id: format!("SP-{}", rng.gen_range(10_000..=99_999)),
        accession_number: format!(
            "A{}-{}",
            today.format("%Y%m%d"),
            rng.gen_range(1000..=9999)
        ),
    }
}

/// Identifying text burnt into a slide image.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiElement {
    pub text: String,
    pub position: (i32, i32),
}

pub fn phi_elements(width: u32) -> Vec<PhiElement> {
    let w = width as i32;
    [
        ("Patient: John Doe", (50, 30)),
        ("DOB: 01/15/1965", (50, 60)),
        ("MRN: 12345678", (w - 200, 30)),
        ("Accession: WSI20230601", (w - 250, 60)),
    ]
    .into_iter()
    .map(|(text, position)| PhiElement {
        text: text.to_string(),
        position,
    })
    .collect()
}

/// White slide with a pink tissue area, grey cells, coloured features,
/// PHI labels and a scale bar.
pub fn labelled_slide<R: Rng>(rng: &mut R, width: u32, height: u32) -> (RgbImage, Vec<PhiElement>) {
    let (w, h) = (width as i32, height as i32);
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    draw_filled_rect_mut(
        &mut img,
        Rect::at(100, 100).of_size(width - 199, height - 199),
        Rgb([255, 240, 240]),
    );

    for _ in 0..200 {
        let x = rng.gen_range(150..w - 150);
        let y = rng.gen_range(150..h - 150);
        let radius = rng.gen_range(3..8);
        let grey = rng.gen_range(180..220u8);
        draw_filled_circle_mut(&mut img, (x, y), radius, Rgb([grey, grey, grey]));
    }

    for _ in 0..20 {
        let x = rng.gen_range(150..w - 150);
        let y = rng.gen_range(150..h - 150);
        let radius = rng.gen_range(10..25);
        let (r, g, b) = (
            rng.gen_range(180..240u8),
            rng.gen_range(180..240u8),
            rng.gen_range(180..240u8),
        );
        draw_filled_circle_mut(&mut img, (x, y), radius, Rgb([r, g, b]));
        draw_hollow_circle_mut(&mut img, (x, y), radius, Rgb([r - 30, g - 30, b - 30]));
    }

    let phi = phi_elements(width);
    for element in &phi {
        let (x, y) = element.position;
        draw_text(&mut img, x, y, &element.text, 2, BLACK);
    }

    draw_filled_rect_mut(&mut img, Rect::at(w - 150, h - 50).of_size(101, 11), BLACK);
    draw_text(&mut img, w - 150, h - 36, "100 um", 2, BLACK);

    (img, phi)
}

/// H&E-like base image: beige background, purple cells and brown
/// structures. Cells are seeded over the leading square of the image.
pub fn stained_slide<R: Rng>(rng: &mut R, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([220, 200, 180]));
    let span = width.min(height) as i32;

    let positions: Vec<(i32, i32)> = (0..1000)
        .map(|_| (rng.gen_range(0..span), rng.gen_range(0..span)))
        .collect();
    let sizes: Vec<i32> = (0..1000).map(|_| rng.gen_range(3..12)).collect();

    for ((x, y), size) in positions.into_iter().zip(sizes) {
        if x < width as i32 - size && y < height as i32 - size {
            let color = Rgb([
                rng.gen_range(100..180),
                rng.gen_range(50..100),
                rng.gen_range(150..220),
            ]);
            draw_filled_circle_mut(&mut img, (x, y), size, color);
        }
    }

    for _ in 0..5 {
        let x = rng.gen_range(50..width as i32 - 100);
        let y = rng.gen_range(50..height as i32 - 100);
        let w = rng.gen_range(100..200);
        let h = rng.gen_range(100..200);
        let color = Rgb([
            rng.gen_range(160..200),
            rng.gen_range(140..160),
            rng.gen_range(100..130),
        ]);
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), color);
    }

    img
}

/// Resolution pyramid by 2x decimation; level 0 is `base`.
pub fn pyramid(base: RgbImage, levels: usize) -> Vec<RgbImage> {
    let mut out = vec![base];
    while out.len() < levels {
        let Some(prev) = out.last() else { break };
        let (w, h) = (prev.width() / 2, prev.height() / 2);
        if w == 0 || h == 0 {
            break;
        }
        let next = RgbImage::from_fn(w, h, |x, y| *prev.get_pixel(x * 2, y * 2));
        out.push(next);
    }
    out
}

/// Grey slide with a tissue rectangle, cells, structures and the two
/// annotated regions (ROI rectangle and suspicious-area circle).
pub fn annotated_slide<R: Rng>(rng: &mut R, width: u32, height: u32) -> RgbImage {
    let (w, h) = (width as i32, height as i32);
    let mut img = RgbImage::from_pixel(width, height, Rgb([240, 240, 240]));
    draw_filled_rect_mut(
        &mut img,
        Rect::at(100, 100).of_size(width - 199, height - 199),
        Rgb([220, 200, 180]),
    );

    for _ in 0..1000 {
        let x = rng.gen_range(150..=w - 150);
        let y = rng.gen_range(150..=h - 150);
        let radius = rng.gen_range(2..=8);
        let color = Rgb([
            rng.gen_range(120..=180),
            rng.gen_range(50..=100),
            rng.gen_range(150..=220),
        ]);
        draw_filled_circle_mut(&mut img, (x, y), radius, color);
    }

    for _ in 0..5 {
        let x = rng.gen_range(120..=w - 200);
        let y = rng.gen_range(120..=h - 200);
        let sw = rng.gen_range(80..=180u32);
        let sh = rng.gen_range(80..=180u32);
        let color = Rgb([
            rng.gen_range(160..=200),
            rng.gen_range(140..=160),
            rng.gen_range(100..=130),
        ]);
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(sw + 1, sh + 1), color);
    }

    let red = Rgb([255, 0, 0]);
    let blue = Rgb([0, 0, 255]);
    draw_outline(&mut img, 200, 200, 201, 151, 3, red);
    for r in 38..=40 {
        draw_hollow_circle_mut(&mut img, (640, 390), r, blue);
    }
    draw_text(&mut img, 300, 180, "Region of Interest", 2, red);
    draw_text(&mut img, 640, 334, "Suspicious Area", 2, blue);

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_patient_is_reproducible() {
        let a = fake_patient(&mut seeded_rng(), today());
        let b = fake_patient(&mut seeded_rng(), today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_patient_field_shapes() {
        let patient = fake_patient(&mut seeded_rng(), today());

        assert!(patient.name.contains('^'));
        assert_eq!(patient.mrn.len(), 7);
        assert_eq!(patient.dob.len(), 8);
        assert!(matches!(patient.sex, 'M' | 'F'));
        assert!(patient.specimen_id.starts_with("SP-"));
        assert_eq!(patient.specimen_id.len(), 8);
        assert!(patient.accession_number.starts_with("A20250314-"));

        let dob = NaiveDate::parse_from_str(&patient.dob, "%Y%m%d").unwrap();
        let age = today().years_since(dob).unwrap();
        assert!((18..=90).contains(&age));
    }

    #[test]
    fn test_phi_positions_follow_width() {
        let phi = phi_elements(1024);
        assert_eq!(phi.len(), 4);
        assert_eq!(phi[2].position, (824, 30));
        assert_eq!(phi[3].text, "Accession: WSI20230601");
    }

    #[test]
    fn test_labelled_slide_background() {
        let (img, _) = labelled_slide(&mut seeded_rng(), SLIDE_WIDTH, SLIDE_HEIGHT);
        assert_eq!(img.dimensions(), (1024, 768));
        assert_eq!(*img.get_pixel(5, 760), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(110, 110), Rgb([255, 240, 240]));
    }

    #[test]
    fn test_pyramid_halves_each_level() {
        let base = stained_slide(&mut seeded_rng(), SLIDE_WIDTH, SLIDE_HEIGHT);
        let corner = *base.get_pixel(2, 2);
        let levels = pyramid(base, 3);

        let sizes: Vec<_> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(1024, 768), (512, 384), (256, 192)]);
        assert_eq!(*levels[1].get_pixel(1, 1), corner);
    }

    #[test]
    fn test_annotated_slide_has_roi_outline() {
        let img = annotated_slide(&mut seeded_rng(), SLIDE_WIDTH, SLIDE_HEIGHT);
        assert_eq!(*img.get_pixel(300, 350), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(10, 10), Rgb([240, 240, 240]));
    }
}

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Colour per class index, used to tell classes apart in model plots.
#[derive(Debug, Clone)]
pub struct ClassColors {
    labels: Vec<String>,
    colors: Vec<Color32>,
}

impl ClassColors {
    pub fn new(labels: &[String]) -> Self {
        ClassColors {
            labels: labels.to_vec(),
            colors: generate_palette(labels.len()),
        }
    }

    /// Legend entries (label → colour) in class order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.labels
            .iter()
            .cloned()
            .zip(self.colors.iter().copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Diverging colour map for correlations
// ---------------------------------------------------------------------------

const COOL: (f32, f32, f32) = (59.0, 76.0, 192.0);
const NEUTRAL: (f32, f32, f32) = (221.0, 221.0, 221.0);
const WARM: (f32, f32, f32) = (180.0, 4.0, 38.0);

/// Blue → grey → red colour for a value in `[-1, 1]`. NaN maps to dark grey.
pub fn diverging(value: f64) -> Color32 {
    if value.is_nan() {
        return Color32::DARK_GRAY;
    }
    let v = value.clamp(-1.0, 1.0) as f32;
    if v < 0.0 {
        mix(NEUTRAL, COOL, -v)
    } else {
        mix(NEUTRAL, WARM, v)
    }
}

/// Readable annotation colour on top of [`diverging`].
pub fn text_color_on(value: f64) -> Color32 {
    if value.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

fn mix(from: (f32, f32, f32), to: (f32, f32, f32), t: f32) -> Color32 {
    let a: LinSrgb = Srgb::new(from.0 / 255.0, from.1 / 255.0, from.2 / 255.0).into_linear();
    let b: LinSrgb = Srgb::new(to.0 / 255.0, to.1 / 255.0, to.2 / 255.0).into_linear();
    to_color32(Srgb::from_linear(a.mix(b, t)))
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

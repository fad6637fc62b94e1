use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues
/// (used for the top-N region bars).
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging colormap for the correlation heatmap
// ---------------------------------------------------------------------------

const COOL: (f32, f32, f32) = (0.23, 0.30, 0.75); // blue at r = -1
const WARM: (f32, f32, f32) = (0.71, 0.02, 0.15); // red at r = +1

/// Map a correlation coefficient in [-1, 1] to a cool/warm diverging colour
/// (blue → white → red).  Out-of-range input is clamped.
pub fn diverging_color(r: f64) -> Color32 {
    let t = (r.clamp(-1.0, 1.0) as f32 + 1.0) / 2.0;
    let cool = LinSrgb::new(COOL.0, COOL.1, COOL.2);
    let warm = LinSrgb::new(WARM.0, WARM.1, WARM.2);
    let white = LinSrgb::new(1.0, 1.0, 1.0);

    let lin = if t < 0.5 {
        cool.mix(white, t * 2.0)
    } else {
        white.mix(warm, (t - 0.5) * 2.0)
    };
    let rgb: Srgb = Srgb::from_linear(lin);
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Text colour that stays readable over a heatmap cell.
pub fn contrast_text(r: f64) -> Color32 {
    if r.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_length() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(12).len(), 12);
    }

    #[test]
    fn diverging_endpoints_are_blue_and_red() {
        let lo = diverging_color(-1.0);
        let hi = diverging_color(1.0);
        assert!(lo.b() > lo.r());
        assert!(hi.r() > hi.b());
        // Midpoint is near-white.
        let mid = diverging_color(0.0);
        assert!(mid.r() > 200 && mid.g() > 200 && mid.b() > 200);
    }
}

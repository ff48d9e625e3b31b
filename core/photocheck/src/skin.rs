/// One independent skin-tone predicate over an RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkinRule {
    /// Classic red-dominant range with a minimum chroma spread.
    RedDominant,
    /// Very light tones where channels sit close together.
    Light,
    /// Broad range for darker tones: red at least 15% above green.
    Dark,
    /// Medium tones with strictly descending channels.
    Medium,
    /// Warm tones with a bounded red/green gap.
    Warm,
    /// Mid-luminance pixels where red is not dominated by green or blue.
    Luminance,
}

/// All rules, in evaluation order.
pub const SKIN_RULES: [SkinRule; 6] = [
    SkinRule::RedDominant,
    SkinRule::Light,
    SkinRule::Dark,
    SkinRule::Medium,
    SkinRule::Warm,
    SkinRule::Luminance,
];

impl SkinRule {
    /// Whether this rule accepts the pixel.
    pub fn matches(self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        match self {
            SkinRule::RedDominant => {
                let spread = r.max(g).max(b) - r.min(g).min(b);
                r > 95 && g > 40 && b > 20 && spread > 15 && (r - g).abs() > 15 && r > g && r > b
            }
            SkinRule::Light => {
                r > 220 && g > 210 && b > 170 && (r - g).abs() <= 15 && r >= g && g >= b
            }
            SkinRule::Dark => {
                r >= 60
                    && g >= 40
                    && b >= 20
                    && r as f64 >= 1.15 * g as f64
                    && r > b
                    && r + g + b >= 80
            }
            SkinRule::Medium => {
                r > 80 && g > 50 && b > 30 && r > g && g > b && r - g >= 10 && g - b >= 5
            }
            SkinRule::Warm => {
                r > 120 && g > 80 && b > 50 && (r - g).abs() < 50 && r >= g && g >= b
            }
            SkinRule::Luminance => {
                let (rf, gf, bf) = (r as f64, g as f64, b as f64);
                let luminance = 0.299 * rf + 0.587 * gf + 0.114 * bf;
                luminance > 50.0 && luminance < 230.0 && rf > gf * 0.8 && rf > bf * 0.8
            }
        }
    }
}

/// Whether any skin rule accepts the pixel.
pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
    SKIN_RULES.iter().any(|rule| rule.matches(r, g, b))
}

/// The rules that accept the pixel, in table order.
pub fn matching_rules(r: u8, g: u8, b: u8) -> impl Iterator<Item = SkinRule> {
    SKIN_RULES
        .into_iter()
        .filter(move |rule| rule.matches(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typical_skin_matches_red_dominant_and_medium() {
        let rules: Vec<_> = matching_rules(150, 100, 80).collect();
        assert!(rules.contains(&SkinRule::RedDominant));
        assert!(rules.contains(&SkinRule::Medium));
        assert!(is_skin(150, 100, 80));
    }

    #[test]
    fn near_black_is_not_skin() {
        assert!(!is_skin(10, 10, 10));
        assert_eq!(matching_rules(10, 10, 10).count(), 0);
    }

    #[test]
    fn red_dominant_needs_red_green_gap() {
        // |r - g| == 15 is not enough.
        assert!(!SkinRule::RedDominant.matches(115, 100, 60));
        assert!(SkinRule::RedDominant.matches(116, 100, 60));
    }

    #[test]
    fn light_rule_accepts_pale_tones() {
        assert!(SkinRule::Light.matches(240, 230, 200));
        // Green above red breaks r >= g.
        assert!(!SkinRule::Light.matches(225, 230, 200));
    }

    #[test]
    fn dark_rule_uses_ratio_and_channel_floor() {
        assert!(SkinRule::Dark.matches(70, 45, 25));
        // 1.15 × 60 = 69 > 68
        assert!(!SkinRule::Dark.matches(68, 60, 25));
        // blue below its floor
        assert!(!SkinRule::Dark.matches(90, 50, 19));
    }

    #[test]
    fn medium_rule_needs_descending_gaps() {
        assert!(SkinRule::Medium.matches(120, 100, 80));
        assert!(!SkinRule::Medium.matches(120, 115, 80));
        assert!(!SkinRule::Medium.matches(120, 100, 97));
    }

    #[test]
    fn warm_rule_bounds_red_green_gap() {
        assert!(SkinRule::Warm.matches(180, 140, 100));
        assert!(!SkinRule::Warm.matches(200, 150, 100));
    }

    #[test]
    fn luminance_rule_band() {
        // Pure grey at luminance ~100 passes: r > 0.8g and r > 0.8b.
        assert!(SkinRule::Luminance.matches(100, 100, 100));
        // Dark grey sits below the band.
        assert!(!SkinRule::Luminance.matches(40, 40, 40));
        // Blue-green pixel fails red dominance.
        assert!(!SkinRule::Luminance.matches(60, 90, 200));
    }

    #[test]
    fn saturated_green_is_not_skin() {
        assert!(!is_skin(0, 255, 0));
    }

    #[test]
    fn pure_white_matches_light_and_warm() {
        let rules: Vec<_> = matching_rules(255, 255, 255).collect();
        assert_eq!(rules, vec![SkinRule::Light, SkinRule::Warm]);
    }
}

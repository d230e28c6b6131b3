//! Condition label to icon and color.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    CloudRain,
    Sun,
    Cloudy,
    CloudFog,
    PartlySunny,
}

impl Icon {
    /// Terminal stand-in for the icon artwork.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::CloudRain => "🌧",
            Self::Sun => "☀",
            Self::Cloudy => "☁",
            Self::CloudFog => "🌫",
            Self::PartlySunny => "⛅",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionStyle {
    pub icon: Icon,
    /// Hex RGB, e.g. `#FFC436`.
    pub color: &'static str,
}

/// Used for every label not in [`CONDITION_STYLES`].
pub const DEFAULT_STYLE: ConditionStyle = ConditionStyle {
    icon: Icon::PartlySunny,
    color: "#7B2869",
};

/// Known labels, matched exactly (case-sensitive).
pub const CONDITION_STYLES: [(&str, ConditionStyle); 4] = [
    (
        "Rain",
        ConditionStyle {
            icon: Icon::CloudRain,
            color: "#272829",
        },
    ),
    (
        "Clear",
        ConditionStyle {
            icon: Icon::Sun,
            color: "#FFC436",
        },
    ),
    (
        "Clouds",
        ConditionStyle {
            icon: Icon::Cloudy,
            color: "#102C57",
        },
    ),
    (
        "Mist",
        ConditionStyle {
            icon: Icon::CloudFog,
            color: "#279EFF",
        },
    ),
];

pub fn condition_style(label: &str) -> ConditionStyle {
    CONDITION_STYLES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_labels_map_to_documented_pairs() {
        let cases = [
            ("Rain", Icon::CloudRain, "#272829"),
            ("Clear", Icon::Sun, "#FFC436"),
            ("Clouds", Icon::Cloudy, "#102C57"),
            ("Mist", Icon::CloudFog, "#279EFF"),
        ];

        for (label, icon, color) in cases {
            assert_eq!(condition_style(label), ConditionStyle { icon, color }, "{label}");
        }
    }

    #[test]
    fn unknown_labels_fall_back_to_default() {
        for label in ["Snow", "Thunderstorm", "Haze", "", "rain", "CLEAR", " Mist"] {
            assert_eq!(condition_style(label), DEFAULT_STYLE, "{label:?}");
        }
        assert_eq!(DEFAULT_STYLE.icon, Icon::PartlySunny);
        assert_eq!(DEFAULT_STYLE.color, "#7B2869");
    }

    #[test]
    fn every_case_has_a_distinct_icon() {
        let icons: HashSet<Icon> = CONDITION_STYLES
            .iter()
            .map(|(_, s)| s.icon)
            .chain(std::iter::once(DEFAULT_STYLE.icon))
            .collect();
        assert_eq!(icons.len(), 5);
    }
}

//! Mapping from external weather provider vocabulary to simulation weather.
//!
//! Providers describe conditions with free-form labels such as `"Clouds"`
//! or `"Thunderstorm"`. These are normalized to a [`ConditionCategory`],
//! which in turn maps onto a [`WeatherKind`]. Unknown labels fall back to
//! cloudy weather.

use tilth_types::{ConditionCategory, WeatherKind};

/// Normalize a provider's primary condition label.
pub fn parse_condition(label: &str) -> ConditionCategory {
    match label.trim().to_ascii_lowercase().as_str() {
        "clear" | "sunny" => ConditionCategory::Clear,
        "clouds" | "cloudy" | "mist" | "fog" | "haze" | "smoke" | "dust" => {
            ConditionCategory::Clouds
        }
        "rain" | "drizzle" | "shower" => ConditionCategory::Rain,
        "snow" | "sleet" => ConditionCategory::Snow,
        "thunderstorm" | "storm" | "squall" | "tornado" => ConditionCategory::Storm,
        _ => ConditionCategory::Unknown,
    }
}

/// The simulation weather kind for a condition category.
pub const fn kind_for_condition(condition: ConditionCategory) -> WeatherKind {
    match condition {
        ConditionCategory::Clear => WeatherKind::Sunny,
        ConditionCategory::Rain => WeatherKind::Rainy,
        ConditionCategory::Snow => WeatherKind::Snow,
        ConditionCategory::Storm => WeatherKind::Stormy,
        ConditionCategory::Clouds | ConditionCategory::Unknown => WeatherKind::Cloudy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_labels_map_to_kinds() {
        let cases = [
            ("Clear", WeatherKind::Sunny),
            ("Clouds", WeatherKind::Cloudy),
            ("Mist", WeatherKind::Cloudy),
            ("Rain", WeatherKind::Rainy),
            ("Drizzle", WeatherKind::Rainy),
            ("Thunderstorm", WeatherKind::Stormy),
            ("Snow", WeatherKind::Snow),
            ("Volcanic Ash", WeatherKind::Cloudy),
        ];
        for (label, expected) in cases {
            assert_eq!(kind_for_condition(parse_condition(label)), expected, "{label}");
        }
    }

    #[test]
    fn unknown_label_is_unknown_category() {
        assert_eq!(parse_condition(""), ConditionCategory::Unknown);
    }
}

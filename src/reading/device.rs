use super::DeviceType;
use crate::settings::Settings;

/// Infers the device from recognized text, falling back on the row count.
///
/// Fragments are checked in order; for each fragment the keyword lists are
/// tried blood-pressure, glucose, weight, temperature, and the first hit
/// decides. Tokens listed in `prefix_tokens` only match at the start of a
/// fragment; all other keywords match anywhere. Matching ignores case.
pub fn classify(texts: &[&str], row_count: usize, settings: &Settings) -> DeviceType {
    let keywords = &settings.keywords;
    let lists = [
        (DeviceType::BloodPressure, &keywords.blood_pressure),
        (DeviceType::GlucoseMeter, &keywords.glucose),
        (DeviceType::Scale, &keywords.weight),
        (DeviceType::Thermometer, &keywords.temperature),
    ];

    for text in texts {
        let lower = text.to_lowercase();
        for (device, list) in &lists {
            if list
                .iter()
                .any(|keyword| keyword_matches(&lower, keyword, &keywords.prefix_tokens))
            {
                return *device;
            }
        }
    }

    if !settings.classify_fallback {
        return DeviceType::Undefined;
    }
    if row_count >= settings.thresholds.bp_min_rows {
        DeviceType::BloodPressure
    } else {
        DeviceType::Thermometer
    }
}

fn keyword_matches(lower: &str, keyword: &str, prefix_tokens: &[String]) -> bool {
    let needle = keyword.to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let prefix_only = prefix_tokens
        .iter()
        .any(|token| token.eq_ignore_ascii_case(keyword));
    if prefix_only {
        lower.starts_with(&needle)
    } else {
        lower.contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_default(texts: &[&str], rows: usize) -> DeviceType {
        classify(texts, rows, &Settings::default())
    }

    #[test]
    fn keyword_beats_row_count_fallback() {
        assert_eq!(classify_default(&["SYS120"], 2), DeviceType::BloodPressure);
    }

    #[test]
    fn prefix_tokens_must_lead_the_fragment() {
        assert_eq!(classify_default(&["sys"], 1), DeviceType::BloodPressure);
        assert_eq!(classify_default(&["ASYS"], 1), DeviceType::Thermometer);
        assert_eq!(classify_default(&["mgdl"], 1), DeviceType::GlucoseMeter);
        assert_eq!(classify_default(&["5mg"], 1), DeviceType::Thermometer);
    }

    #[test]
    fn first_matching_fragment_wins() {
        assert_eq!(
            classify_default(&["mmol/L", "mmHg"], 0),
            DeviceType::GlucoseMeter
        );
        assert_eq!(classify_default(&["kg", "°C"], 0), DeviceType::Scale);
        assert_eq!(classify_default(&["37", "°c"], 0), DeviceType::Thermometer);
    }

    #[test]
    fn blood_pressure_list_is_checked_before_glucose_within_a_fragment() {
        assert_eq!(classify_default(&["mmHg mmol"], 0), DeviceType::BloodPressure);
    }

    #[test]
    fn fallback_uses_row_count() {
        assert_eq!(classify_default(&[], 3), DeviceType::BloodPressure);
        assert_eq!(classify_default(&["1", "2"], 2), DeviceType::Thermometer);
        assert_eq!(classify_default(&[], 0), DeviceType::Thermometer);
    }

    #[test]
    fn disabled_fallback_reports_undefined() {
        let mut settings = Settings::default();
        settings.classify_fallback = false;
        assert_eq!(classify(&["12"], 5, &settings), DeviceType::Undefined);
    }

    #[test]
    fn keyword_lists_can_be_substituted() {
        let mut settings = Settings::default();
        settings.keywords.temperature = vec!["TEMP".to_string()];
        assert_eq!(classify(&["temp 36"], 0, &settings), DeviceType::Thermometer);
        settings.keywords.blood_pressure.push("tensio".to_string());
        assert_eq!(classify(&["Tensiometer"], 0, &settings), DeviceType::BloodPressure);
    }
}

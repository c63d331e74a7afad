//! WMO weather code to condition label mapping
//!
//! Open-Meteo reports conditions as WMO codes. Both current readings and
//! daily summaries use this single table; labels are compared literally by
//! downstream consumers, so existing entries must never change.

/// Label returned for codes missing from the table
pub const UNKNOWN_CONDITION: &str = "不明";

/// Map a WMO weather code to its condition label
///
/// Codes from WMO (World Meteorological Organization):
/// - 0-3: Clear to overcast
/// - 45, 48: Fog
/// - 51-57: Drizzle, freezing drizzle
/// - 61-67: Rain, freezing rain
/// - 71-77: Snow, snow grains
/// - 80-86: Rain and snow showers
/// - 95-99: Thunderstorm, with hail
pub fn map_code(code: i64) -> &'static str {
    match code {
        0 => "快晴",
        1 => "ほぼ晴れ",
        2 => "一部曇り",
        3 => "曇り",
        45 => "霧",
        48 => "霧氷",
        51 => "軽い霧雨",
        53 => "霧雨",
        55 => "濃い霧雨",
        56 => "軽い凍る霧雨",
        57 => "濃い凍る霧雨",
        61 => "小雨",
        63 => "雨",
        65 => "大雨",
        66 => "軽い凍雨",
        67 => "凍雨",
        71 => "小雪",
        73 => "雪",
        75 => "大雪",
        77 => "あられ",
        80 => "にわか雨",
        81 => "強いにわか雨",
        82 => "激しいにわか雨",
        85 => "にわか雪",
        86 => "激しいにわか雪",
        95 => "雷雨",
        96 => "ひょうを伴う雷雨",
        99 => "激しいひょうを伴う雷雨",
        _ => UNKNOWN_CONDITION,
    }
}

/// Codes reporting snow or thunderstorms
const SEVERE_CODES: &[i64] = &[71, 73, 75, 77, 85, 86, 95, 96, 99];

/// True when a condition label reports snow or thunderstorms
///
/// Daily summaries only carry the label, so the check runs on text.
pub fn is_severe_condition(label: &str) -> bool {
    SEVERE_CODES.iter().any(|&code| map_code(code) == label)
}

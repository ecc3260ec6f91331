/// Language codes offered by the selectors, in display order.
pub const LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh-CN", "zh-TW", "ar", "hi", "tr", "id",
];

pub fn display_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh-CN" => "Chinese (Simplified)",
        "zh-TW" => "Chinese (Traditional)",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "tr" => "Turkish",
        "id" => "Indonesian",
        _ => code,
    }
}

pub fn is_supported(code: &str) -> bool {
    LANGUAGES.contains(&code)
}

/// Maps a UI language code to the code LibreTranslate expects.
/// Unlisted codes pass through unchanged.
pub fn to_libretranslate(code: &str) -> &str {
    match code {
        "zh-CN" | "zh-TW" => "zh",
        "en" => "en",
        _ => code,
    }
}

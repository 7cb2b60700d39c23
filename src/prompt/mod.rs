use crate::settings::Settings;

/// The farm context line prepended to every question. Values are used
/// verbatim; the destination is a natural-language prompt, not markup.
pub fn build_context(settings: &Settings) -> String {
    format!(
        "Context: farmer in {region}, {country}. Soil: {soil}. Water: {water}. Crop: {crop}. Respond in {language}.",
        region = settings.location.region,
        country = settings.location.country,
        soil = settings.soil_type,
        water = settings.water_condition,
        crop = settings.crop,
        language = settings.language,
    )
}

pub fn build_prompt(settings: &Settings, query: &str) -> String {
    format!("{}\nQuestion: {}", build_context(settings), query)
}

/// Suggested questions for the home screen. The first three depend on the
/// farm settings.
pub fn personalized_prompts(settings: &Settings) -> Vec<String> {
    let loc = format!("{}, {}", settings.location.region, settings.location.country);
    let mut prompts = vec![
        format!("Best crop rotation plan for {loc}?"),
        format!("How to improve {} health organically?", settings.soil_type),
        format!("Water saving techniques for {} water availability.", settings.water_condition),
    ];
    prompts.extend(STANDING_PROMPTS.iter().map(|p| p.to_string()));
    prompts
}

const STANDING_PROMPTS: &[&str] = &[
    "Current market prices for major crops in my mandi.",
    "Pest control measures for Fall Armyworm.",
    "Government subsidies available for drip irrigation.",
    "Weather forecast impact on sowing this week.",
    "Identify this plant disease (upload image).",
    "Optimal fertilizer schedule for sugarcane.",
    "Storage tips to prevent post-harvest losses.",
];

pub fn tips_prompt(settings: &Settings) -> String {
    format!(
        "Give 3 short, critical farming tips for {} right now considering {} water.",
        settings.location.region, settings.water_condition
    )
}

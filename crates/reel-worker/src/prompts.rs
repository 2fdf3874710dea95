//! Prompts for storyboard generation.

use reel_models::{StoryboardRequest, VisualType};

use crate::duration::DurationBounds;

pub fn system_prompt(brand_name: &str, target_secs: u32, bounds: DurationBounds) -> String {
    let visual_types = VisualType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a video storyboard generator for {brand}, a Filipino meal box packaging company. You create scene-by-scene storyboards for {target}-second vertical (9:16) social media videos.

RULES:
1. Total duration across ALL scenes MUST equal exactly {target} seconds.
2. Each scene duration must be between {min} and {max} seconds.
3. Use 4-8 scenes per video (typical: 5-6 scenes).
4. visual_type must be one of: {visual_types}
5. Use "motion-graphics" for text-heavy scenes (intro hooks, CTAs, key stats).
6. Use "ai-photo" for product showcases, food imagery, lifestyle shots.
7. Use "ai-video" sparingly (1-2 per video max) for dynamic action shots.
8. narration_text MUST be in Taglish (mix of Tagalog and English, natural Filipino speech).
9. ai_prompt must be detailed, visual, and optimized for AI image/video generation.
10. onscreen_text should be short, punchy text overlays (English preferred for readability).
11. First scene should be a hook (grab attention in 3 seconds).
12. Last scene should be a call-to-action.

Respond with a JSON object: {{ "scenes": [...] }}
Each scene: {{ "scene_number": N, "duration_seconds": N, "visual_description": "...", "visual_type": "...", "narration_text": "...", "onscreen_text": "...", "ai_prompt": "..." }}"#,
        brand = brand_name,
        target = target_secs,
        min = bounds.min,
        max = bounds.max,
        visual_types = visual_types,
    )
}

pub fn user_prompt(request: &StoryboardRequest, target_secs: u32) -> String {
    format!(
        "Create a {target}-second video storyboard for this topic:\n\n\
         Title: {title}\n\
         Summary: {summary}\n\
         Content Pillar: {pillar}\n\n\
         Remember: scenes must total EXACTLY {target} seconds.",
        target = target_secs,
        title = request.topic_title,
        summary = request.topic_summary,
        pillar = request.content_pillar,
    )
}

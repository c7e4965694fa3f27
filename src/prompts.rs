//! Fixed instructions sent to the generative service.

use crate::models::MAX_FRAMES;

/// Frame count asked of the image model. A hint only; the client enforces its own bounds.
pub const REQUESTED_MIN_FRAMES: usize = 5;

pub const FRAME_STYLE: &str = "Simple, vibrant, varied-colored doodle/hand-drawn sketch";

/// Style policy for the prompt-expansion call.
pub const SYSTEM_INSTRUCTION: &str = "**Generate simple, animated doodle GIFs on white from user input, prioritizing key visual identifiers in an animated doodle style with ethical considerations.** \
**Core GIF:** Doodle/cartoonish (simple lines, stylized forms, no photorealism), subtle looping motion (primary subject(s) only: wiggle, shimmer, etc.), white background, lighthearted/positive tone (playful, avoids trivializing serious subjects), uses specified colors (unless monochrome/outline requested). \
**Input Analysis:** Identify subject (type, specificity), prioritize visual attributes (hair C/T, skin tone neutrally if discernible/needed, clothes C/P, accessories C, facial hair type, other distinct features neutrally for people; breed, fur C/P for animals; key parts, colors for objects), extract text (content, style hints described, display as requested: speech bubble [format: 'Speech bubble says \"[Text]\" is persistent.'], caption/title [format: 'with the [title/caption] \"[Text]\" [position]'], or text-as-subject [format: 'the word \"[Text]\" in [style/color description]']), note style modifiers (e.g., \"pencil sketch,\" \"monochrome\"), and action (usually \"subtle motion\"). If the subject or description is too vague, add specific characteristics to make it more unique and detailed. \
**Prompt Template:** \"[Style Descriptor(s)] [Subject Description with Specificity, Attributes, Colors, Skin Tone if applicable] [Text Component if applicable and NOT speech bubble]. [Speech Bubble Component if applicable]\" \
**Template Notes:** '[Style Descriptor(s)]' includes \"cartoonish\" or \"doodle style\" (especially for people) plus any user-requested modifiers. '[Subject Description...]' combines all relevant subject and attribute details. '[Text Component...]' is for captions, titles, or text-as-subject only. '[Speech Bubble Component...]' is for speech bubbles only (mutually exclusive with Text Component). \
**Key Constraints:** No racial labels. Neutral skin tone descriptors when included. Cartoonish/doodle style always implied, especially for people. One text display method only.";

/// Wraps the stage-1 expansion into the prompt returned to callers.
pub fn enhance(expansion: &str) -> String {
    format!(
        "A doodle animation on a white background of {}. Subtle motion but nothing else moves.",
        expansion.trim().trim_end_matches('.')
    )
}

/// Stage-2 instruction embedding the enhanced prompt and the structural requests.
pub fn frame_instruction(enhanced_prompt: &str) -> String {
    format!(
        "Generate at least {min} square, white-background doodle animation frames with smooth, fluid, vibrantly colored motion depicting {prompt}. \
*Mandatory Requirements:** **Style:** {style}. \
**Background:** Plain solid white (no background colors/elements). Absolutely no black background. \
**Content & Motion:** Clearly depict **{prompt}** action with colored, moving subject (no static images). If there's an action specified, it should be the main difference between frames. \
**Frame Count:** At least {min} frames showing continuous progression and at most {max} frames. \
**Format:** Square image (1:1 aspect ratio). \
**Cropping:** Absolutely no black bars/letterboxing; colorful doodle fully visible against white. \
**Output:** Actual image files for a smooth, colorful doodle-style GIF on a white background. Make sure every frame is different enough from the previous one.",
        min = REQUESTED_MIN_FRAMES,
        max = MAX_FRAMES,
        prompt = enhanced_prompt,
        style = FRAME_STYLE,
    )
}

/// Single-frame prompt describing where frame `n` of `total` sits in the motion.
pub fn frame_phase_prompt(base: &str, n: usize, total: usize) -> String {
    if n <= 1 {
        return format!("{} - starting position, beginning of animation", base);
    }
    if n >= total {
        return format!("{} - ending position, completion of animation", base);
    }
    let progress = (n - 1) as f64 / (total - 1) as f64;
    let percent = (progress * 100.0).round() as u32;
    if progress < 0.5 {
        format!("{} - early animation phase, {}% through motion", base, percent)
    } else {
        format!("{} - late animation phase, {}% through motion", base, percent)
    }
}

//! Layered parsing of raw language-model output into a script draft.
//!
//! The script model is asked to answer with marker-delimited sections
//! (`<<VIDEO_SCRIPT_START>> … <<VIDEO_SCRIPT_END>>` and friends), but models
//! drift. Each section is therefore recovered through an ordered list of
//! strategies tried in sequence (marker block, then legacy heading prefixes,
//! then positional heuristics), each returning `Option` rather than erroring.
//! Only when every strategy yields nothing does a section fall back to a
//! fixed placeholder. Parsing never fails and never panics.
//!
//! # Examples
//!
//! ```rust
//! use newsreel::draft::parse_draft;
//!
//! let raw = r#"<<EMOTION_START>>excited<<EMOTION_END>>
//! <<VIDEO_SCRIPT_START>>
//! [INTRO]
//! Narrator: "Big week for the city council!"
//! <<VIDEO_SCRIPT_END>>
//! <<IMAGE_PROMPTS_START>>
//! A city hall at dusk
//! <<IMAGE_PROMPTS_END>>
//! <<TITLE_START>>Council Shakeup Explained<<TITLE_END>>
//! <<DESCRIPTION_START>>What the vote means. #news<<DESCRIPTION_END>>"#;
//!
//! let draft = parse_draft(raw);
//! assert_eq!(draft.emotion, "excited");
//! assert_eq!(draft.image_prompts, vec!["A city hall at dusk"]);
//! assert_eq!(draft.narration, "Big week for the city council!");
//! ```

/// Emotional tones the speech synthesizer understands.
pub const EMOTION_TAGS: &[&str] = &[
    "happy", "sad", "excited", "calm", "angry", "whisper", "nervous",
];

/// Tone used when no recognizable emotion is found.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Fixed placeholder when no script text can be recovered at all.
const FALLBACK_SCRIPT: &str = "Narrator: \"No script is available for this story.\"";

/// Fixed placeholder when no image prompts can be recovered at all.
const FALLBACK_PROMPT: &str = "Generic news image";

/// Parsed sections of a model response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptDraft {
    pub script: String,
    /// Continuous narration joined from the script's `Narrator: "…"` lines.
    pub narration: String,
    pub image_prompts: Vec<String>,
    pub emotion: String,
    pub title: String,
    pub description: String,
}

/// Parse raw model output into a [`ScriptDraft`], degrading section by
/// section through the fallback chain instead of erroring.
#[must_use]
pub fn parse_draft(raw: &str) -> ScriptDraft {
    const SCRIPT_STRATEGIES: &[fn(&str) -> Option<String>] = &[
        script_from_markers,
        script_from_legacy_headings,
        script_from_position,
    ];
    const PROMPT_STRATEGIES: &[fn(&str) -> Option<Vec<String>>] = &[
        prompts_from_markers,
        prompts_from_legacy_heading,
        prompts_from_position,
    ];
    const EMOTION_STRATEGIES: &[fn(&str) -> Option<String>] =
        &[emotion_from_markers, emotion_from_prefixes];
    const TITLE_STRATEGIES: &[fn(&str) -> Option<String>] =
        &[title_from_markers, title_from_prefixes];
    const DESCRIPTION_STRATEGIES: &[fn(&str) -> Option<String>] =
        &[description_from_markers, description_from_prefixes];

    let script = first_match(SCRIPT_STRATEGIES, raw).unwrap_or_else(|| {
        tracing::warn!("no script section recovered; using placeholder");
        FALLBACK_SCRIPT.to_string()
    });
    let script = ensure_narrator_format(&script);
    let narration = extract_narration(&script);

    let image_prompts = first_match(PROMPT_STRATEGIES, raw).unwrap_or_else(|| {
        tracing::warn!("no image prompts recovered; using placeholder prompt");
        vec![FALLBACK_PROMPT.to_string()]
    });

    let emotion =
        first_match(EMOTION_STRATEGIES, raw).unwrap_or_else(|| DEFAULT_EMOTION.to_string());
    let title = first_match(TITLE_STRATEGIES, raw).unwrap_or_default();
    let description = first_match(DESCRIPTION_STRATEGIES, raw).unwrap_or_default();

    ScriptDraft {
        script,
        narration,
        image_prompts,
        emotion,
        title,
        description,
    }
}

/// Join the quoted text of every `Narrator: "…"` line into one
/// single-space-separated narration string.
#[must_use]
pub fn extract_narration(script: &str) -> String {
    let mut narration = String::new();
    for line in script.lines() {
        if let Some(rest) = line.strip_prefix("Narrator: \"") {
            let text = match rest.rfind('"') {
                Some(idx) => &rest[..idx],
                None => rest,
            };
            if !text.is_empty() {
                if !narration.is_empty() {
                    narration.push(' ');
                }
                narration.push_str(text);
            }
        }
    }
    narration
}

fn first_match<T>(strategies: &[fn(&str) -> Option<T>], raw: &str) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(raw))
}

/// Content between `<<NAME_START>>` and `<<NAME_END>>`, trimmed; `None` when
/// the markers are absent or enclose nothing.
fn marker_block(raw: &str, name: &str) -> Option<String> {
    let start = format!("<<{name}_START>>");
    let end = format!("<<{name}_END>>");
    let (_, tail) = raw.split_once(&start)?;
    let (body, _) = tail.split_once(&end)?;
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

/// First line carrying one of the given heading prefixes, with the prefix
/// stripped and surrounding quotes removed.
fn prefixed_line(raw: &str, prefixes: &[&str]) -> Option<String> {
    for line in raw.lines() {
        for prefix in prefixes {
            if let Some((_, value)) = line.split_once(prefix) {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// The numbered payload of a `"3. like this"` line, if it is one.
fn numbered_payload(line: &str) -> Option<&str> {
    let (number, payload) = line.trim_start().split_once(". ")?;
    if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        let payload = payload.trim();
        (!payload.is_empty()).then_some(payload)
    } else {
        None
    }
}

fn script_from_markers(raw: &str) -> Option<String> {
    marker_block(raw, "VIDEO_SCRIPT")
}

/// Legacy heading form: everything between `VIDEO SCRIPT:` and
/// `IMAGE PROMPTS:`.
fn script_from_legacy_headings(raw: &str) -> Option<String> {
    if !raw.contains("VIDEO SCRIPT:") {
        return None;
    }
    let (head, _) = raw.split_once("IMAGE PROMPTS:")?;
    let script = head.replace("VIDEO SCRIPT:", "");
    let script = script.trim();
    (!script.is_empty()).then(|| script.to_string())
}

/// Positional heuristic: treat numbered lines as prompts and keep the rest
/// as script text.
fn script_from_position(raw: &str) -> Option<String> {
    let script: Vec<&str> = raw
        .lines()
        .filter(|line| numbered_payload(line).is_none())
        .collect();
    let script = script.join("\n");
    let script = script.trim();
    (!script.is_empty()).then(|| script.to_string())
}

fn prompts_from_markers(raw: &str) -> Option<Vec<String>> {
    let body = marker_block(raw, "IMAGE_PROMPTS")?;
    let prompts: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    (!prompts.is_empty()).then_some(prompts)
}

/// Legacy heading form: every non-empty line after `IMAGE PROMPTS:`, with
/// `1. `-style numbering stripped.
fn prompts_from_legacy_heading(raw: &str) -> Option<Vec<String>> {
    let (_, tail) = raw.split_once("IMAGE PROMPTS:")?;
    let prompts: Vec<String> = tail
        .lines()
        .map(|line| numbered_payload(line).unwrap_or(line.trim()))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    (!prompts.is_empty()).then_some(prompts)
}

fn prompts_from_position(raw: &str) -> Option<Vec<String>> {
    let prompts: Vec<String> = raw
        .lines()
        .filter_map(numbered_payload)
        .map(str::to_string)
        .collect();
    (!prompts.is_empty()).then_some(prompts)
}

fn valid_emotion(candidate: &str) -> Option<String> {
    let candidate = candidate.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase();
    EMOTION_TAGS.contains(&candidate.as_str()).then_some(candidate)
}

fn emotion_from_markers(raw: &str) -> Option<String> {
    valid_emotion(&marker_block(raw, "EMOTION")?)
}

fn emotion_from_prefixes(raw: &str) -> Option<String> {
    let prefixes = ["Emotion:", "EMOTION:", "Emotional tone:", "Tone:"];
    for line in raw.lines() {
        for prefix in prefixes {
            if let Some((_, value)) = line.split_once(prefix) {
                if let Some(emotion) = valid_emotion(value) {
                    return Some(emotion);
                }
            }
        }
    }
    None
}

fn title_from_markers(raw: &str) -> Option<String> {
    marker_block(raw, "TITLE")
}

fn title_from_prefixes(raw: &str) -> Option<String> {
    prefixed_line(raw, &["Title:", "VIDEO TITLE:", "YouTube Title:"])
}

fn description_from_markers(raw: &str) -> Option<String> {
    marker_block(raw, "DESCRIPTION")
}

fn description_from_prefixes(raw: &str) -> Option<String> {
    prefixed_line(
        raw,
        &["Description:", "VIDEO DESCRIPTION:", "YouTube Description:"],
    )
}

/// Rewrap dialogue into `Narrator: "…"` form when the model ignored the
/// format, so narration stays extractable.
///
/// Section headers (`[…]`), direction notes (`(…`), and blank lines pass
/// through untouched; lines already in narrator form are kept as-is.
fn ensure_narrator_format(script: &str) -> String {
    let has_narrator_lines = script
        .lines()
        .any(|line| line.contains("Narrator:") && line.contains('"'));
    if has_narrator_lines {
        return script.to_string();
    }
    tracing::warn!("narrator format missing from script; rewrapping dialogue lines");

    let mut fixed = Vec::new();
    for line in script.lines() {
        let trimmed = line.trim();
        let structural = (trimmed.starts_with('[') && trimmed.ends_with(']'))
            || trimmed.starts_with('(')
            || trimmed.is_empty()
            || trimmed.chars().all(|c| "()[]{}".contains(c));
        if structural || line.starts_with("Narrator:") {
            fixed.push(line.to_string());
        } else if line.contains('"') {
            let quote_parts: Vec<&str> = line.split('"').collect();
            if quote_parts.len() >= 3 {
                fixed.push(format!("Narrator: \"{}\"", quote_parts[1]));
            } else {
                fixed.push(format!("Narrator: \"{trimmed}\""));
            }
        } else {
            fixed.push(format!("Narrator: \"{trimmed}\""));
        }
    }
    fixed.join("\n")
}

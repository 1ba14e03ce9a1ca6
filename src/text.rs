/// Greedy word wrap: words are joined while the line stays within `max_chars`.
/// A single word longer than the limit gets its own line.
pub fn wrap_label(text: &str, max_chars: usize) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        if current.chars().count() + word.chars().count() < max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Font size for a label on an arc of the given length, a quarter of the length
/// clamped to `[min, max]`.
pub fn label_font_size(arc_length: f64, min: f64, max: f64) -> f64 {
    (arc_length / 4.0).min(max).max(min)
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

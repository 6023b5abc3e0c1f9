//! Text helpers for building client-facing names.

/// Check if a character is considered part of a word (identifier).
///
/// Uses Unicode Standard Annex #31 rules for identifier characters.
#[inline]
pub fn is_word_character(c: char) -> bool {
    c != '_' && unicode_ident::is_xid_continue(c)
}

/// Split an identifier into words.
///
/// Separators (`-`, `_`, whitespace, punctuation) end a word, as do
/// lower-to-upper transitions and the last capital of an acronym:
/// `"HTTPServer_name"` splits into `["HTTP", "Server", "name"]`.
pub fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut start: Option<usize> = None;

    for (i, &(offset, c)) in chars.iter().enumerate() {
        if !is_word_character(c) {
            if let Some(begin) = start.take() {
                words.push(&s[begin..offset]);
            }
            continue;
        }

        let Some(begin) = start else {
            start = Some(offset);
            continue;
        };

        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|&(_, n)| n);
        let lower_to_upper = c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit());
        let acronym_end =
            c.is_uppercase() && prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase());

        if lower_to_upper || acronym_end {
            words.push(&s[begin..offset]);
            start = Some(offset);
        }
    }

    if let Some(begin) = start {
        words.push(&s[begin..]);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"get-widget_status"` -> `"GetWidgetStatus"`.
pub fn pascal_case(s: &str) -> String {
    split_words(s).into_iter().map(capitalize).collect()
}

/// `"Get_Widget"` -> `"getWidget"`, `"HTTPServer"` -> `"httpServer"`.
pub fn camel_case(s: &str) -> String {
    let mut words = split_words(s).into_iter();
    let Some(first) = words.next() else {
        return String::new();
    };
    let mut out = first.to_lowercase();
    for word in words {
        out.push_str(&capitalize(word));
    }
    out
}

/// Lowercase only the first character: `"WidgetBody"` -> `"widgetBody"`.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Best-effort English singular of a collection name.
pub fn singular(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    if lower.ends_with("ies") && s.len() > 3 {
        return format!("{}y", &s[..s.len() - 3]);
    }
    if ["sses", "xes", "ches", "shes", "zes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return s[..s.len() - 2].to_string();
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return s.to_string();
    }
    if lower.ends_with('s') && s.len() > 1 {
        return s[..s.len() - 1].to_string();
    }
    s.to_string()
}

//! Entity and character reference decoding

use std::borrow::Cow;

/// Decode predefined entities and numeric character references.
///
/// On failure returns the offending reference body (the text between `&` and `;`).
pub fn decode(input: &str) -> Result<Cow<'_, str>, String> {
    if !input.contains('&') {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();

        let Some(semi) = after.find(';') else {
            return Err(after.chars().take(16).collect());
        };
        let (entity, tail) = after.split_at(semi);
        match resolve(entity) {
            Some(ch) => result.push(ch),
            None => return Err(entity.to_string()),
        }
        rest = tail.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(Cow::Owned(result))
}

fn resolve(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric(entity),
    }
}

fn decode_numeric(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        if dec.is_empty() || !dec.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };

    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

/// True for characters allowed by the XML 1.0 `Char` production
pub const fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t'
            | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(decode("plain"), Ok(Cow::Borrowed("plain"))));
    }

    #[test]
    fn test_predefined_entities() {
        assert_eq!(
            decode("a &amp; b &lt;c&gt; &quot;d&quot; &apos;e&apos;").as_deref(),
            Ok("a & b <c> \"d\" 'e'")
        );
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode("&#65;&#x42;&#x20AC;").as_deref(), Ok("AB€"));
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(decode("&nbsp;"), Err("nbsp".to_string()));
    }

    #[test]
    fn test_unterminated_reference() {
        assert!(decode("fish & chips").is_err());
    }

    #[test]
    fn test_invalid_code_points() {
        assert!(decode("&#0;").is_err());
        assert!(decode("&#xD800;").is_err());
        assert!(decode("&#xZZ;").is_err());
        assert!(decode("&#x;").is_err());
        assert!(decode("&#;").is_err());
    }

    #[test]
    fn test_signed_references_are_rejected() {
        assert_eq!(decode("&#+65;"), Err("#+65".to_string()));
        assert_eq!(decode("&#x+41;"), Err("#x+41".to_string()));
        assert!(decode("&#-1;").is_err());
    }

    #[test]
    fn test_references_outside_char_range() {
        assert_eq!(decode("&#1;"), Err("#1".to_string()));
        assert!(decode("&#x1F;").is_err());
        assert!(decode("&#xFFFE;").is_err());
        assert!(decode("&#xFFFF;").is_err());
        assert_eq!(decode("&#9;&#xA;&#13;").as_deref(), Ok("\t\n\r"));
        assert_eq!(decode("&#x10FFFF;").as_deref(), Ok("\u{10FFFF}"));
    }

    #[test]
    fn test_xml_char_ranges() {
        assert!(is_xml_char('a'));
        assert!(is_xml_char('\t'));
        assert!(!is_xml_char('\u{1}'));
        assert!(!is_xml_char('\u{FFFE}'));
        assert!(is_xml_char('\u{1F600}'));
    }
}

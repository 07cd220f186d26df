//! Glyph info checks.

use fontdrasil::agl;

use crate::checks::CheckContext;
use crate::glyph::GlyphView;

/// The codepoint a `uniXXXX` name spells out.
fn codepoint_from_name(name: &str) -> Option<char> {
    let hex = name.strip_prefix("uni")?;
    if hex.len() != 4 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Advisory messages about the glyph's Unicode value.
///
/// `uniXXXX` names must spell out the glyph's codepoint. Any other name
/// is looked up in the Adobe Glyph List For New Fonts, whose answer (a
/// codepoint or none) must agree with the glyph.
pub fn unicode_value(glyph: &dyn GlyphView, cx: &CheckContext) -> Vec<String> {
    let mut messages = Vec::new();
    let unicode = glyph.unicode();
    if let Some(expected) = codepoint_from_name(glyph.name()) {
        if unicode != Some(expected) {
            messages.push("The Unicode value for this glyph does not match its name.".to_string());
        }
    } else if agl::char_for_agl_name(glyph.name()) != unicode {
        messages.push("The Unicode value for this glyph may not be correct.".to_string());
    }
    let Some(ch) = unicode else {
        return messages;
    };
    let mut others: Vec<&str> = cx
        .font
        .glyphs_for_unicode(ch)
        .into_iter()
        .filter(|name| *name != glyph.name())
        .collect();
    if !others.is_empty() {
        others.sort_unstable();
        messages.push(format!(
            "The Unicode for this glyph is also used by: {}.",
            others.join(" ")
        ));
    }
    messages
}

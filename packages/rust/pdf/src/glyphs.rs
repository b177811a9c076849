//! Character coverage for the built-in PDF fonts.
//!
//! `printpdf` writes text in the standard Type1 fonts with WinAnsiEncoding
//! (Windows-1252): Latin-1 plus a few typographic characters such as curly
//! quotes, dashes, the ellipsis, bullets and the euro sign. Characters
//! outside that set get an ASCII stand-in where one reads naturally, and
//! become `?` otherwise.

use std::borrow::Cow;

/// Characters Windows-1252 places in 0x80..=0x9F.
const WIN_ANSI_EXTRAS: [char; 27] = [
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

fn is_win_ansi(c: char) -> bool {
    if c.is_control() {
        return false;
    }
    (c as u32) <= 0xFF || WIN_ANSI_EXTRAS.contains(&c)
}

pub(crate) fn to_win_ansi(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_win_ansi) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c if is_win_ansi(c) => out.push(c),
            _ => out.push_str(substitute(c)),
        }
    }
    Cow::Owned(out)
}

fn substitute(c: char) -> &'static str {
    match c {
        '\u{201B}' | '\u{2032}' => "'",
        '\u{201F}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2212}' => "-",
        '\u{2015}' => "\u{2014}",
        '\u{2023}' | '\u{25CF}' | '\u{25E6}' | '\u{2043}' => "\u{2022}",
        '\u{2002}'..='\u{200A}' | '\u{202F}' => " ",
        '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",
        '\u{2192}' | '\u{21D2}' => "->",
        '\u{2190}' | '\u{21D0}' => "<-",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{2248}' => "~",
        '\u{2713}' | '\u{2714}' => "v",
        '\u{2717}' | '\u{2718}' => "x",
        _ => "?",
    }
}

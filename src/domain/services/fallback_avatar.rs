//! Deterministic placeholder avatars.
//!
//! Placeholders are a pure function of the username so the UI always has
//! something to draw before (or instead of) a resolved picture.

use base64::{Engine as _, engine::general_purpose};
use sha2::{Digest, Sha256};

use crate::domain::entities::Username;

const PALETTE: [&str; 10] = [
    "#d946ef", "#8b5cf6", "#6366f1", "#0ea5e9", "#14b8a6", "#22c55e", "#eab308", "#f97316",
    "#ef4444", "#ec4899",
];

const SIZE: u32 = 100;

/// Up to two uppercase initials taken from the `.`/`_` separated parts of the name.
#[must_use]
pub fn initials(username: &Username) -> String {
    let mut parts = username
        .as_str()
        .split(['.', '_'])
        .filter(|part| !part.is_empty());

    let Some(first) = parts.next() else {
        return "?".to_string();
    };

    let mut out: String = match parts.next() {
        Some(second) => first.chars().take(1).chain(second.chars().take(1)).collect(),
        None => first.chars().take(2).collect(),
    };
    out.make_ascii_uppercase();
    out
}

/// Background colour picked from a fixed palette by hashing the username.
#[must_use]
pub fn background_color(username: &Username) -> &'static str {
    let digest = Sha256::digest(username.as_str().as_bytes());
    PALETTE[usize::from(digest[0]) % PALETTE.len()]
}

/// Renders the placeholder as a standalone SVG document.
#[must_use]
pub fn svg(username: &Username) -> String {
    render(&initials(username), background_color(username))
}

/// Renders the placeholder as a `data:` URI usable directly as an image source.
#[must_use]
pub fn data_uri(username: &Username) -> String {
    encode(&svg(username))
}

/// Placeholder for input that is not a valid username at all.
#[must_use]
pub fn unknown_data_uri() -> String {
    encode(&render("?", PALETTE[0]))
}

fn render(text: &str, color: &str) -> String {
    let half = SIZE / 2;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{SIZE}" height="{SIZE}" viewBox="0 0 {SIZE} {SIZE}"><circle cx="{half}" cy="{half}" r="{half}" fill="{color}"/><text x="50%" y="50%" dy=".35em" text-anchor="middle" font-family="sans-serif" font-size="{font}" fill="#ffffff">{text}</text></svg>"##,
        font = SIZE * 2 / 5,
    )
}

fn encode(svg: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        general_purpose::STANDARD.encode(svg)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("alice", "AL" ; "single_part")]
    #[test_case("john.doe", "JD" ; "dot_separated")]
    #[test_case("ghost_user", "GU" ; "underscore_separated")]
    #[test_case("_x", "X" ; "leading_separator")]
    #[test_case("._.", "?" ; "no_letters")]
    fn test_initials(raw: &str, expected: &str) {
        let username = Username::parse(raw).unwrap();
        assert_eq!(initials(&username), expected);
    }

    #[test]
    fn test_is_deterministic() {
        let username = Username::parse("alice").unwrap();
        assert_eq!(data_uri(&username), data_uri(&username));
        assert_eq!(background_color(&username), background_color(&username));
    }

    #[test]
    fn test_svg_contains_initials_and_color() {
        let username = Username::parse("john.doe").unwrap();
        let doc = svg(&username);
        assert!(doc.contains(">JD</text>"));
        assert!(doc.contains(background_color(&username)));
    }

    #[test]
    fn test_data_uri_prefix() {
        let username = Username::parse("alice").unwrap();
        assert!(data_uri(&username).starts_with("data:image/svg+xml;base64,"));
    }
}

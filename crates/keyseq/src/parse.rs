use nom::{
    branch::alt,
    character::complete::{alphanumeric1, anychar, char, one_of},
    combinator::{map, map_opt, value},
    multi::many0,
    IResult,
};

use crate::key::{key_from_name, Key, KeyEvent, Modifiers};
use crate::sequence::KeySequence;
use crate::KeyError;

fn invalid(s: &str) -> KeyError {
    KeyError::InvalidSpec(s.to_string())
}

fn parse_bracket_modifier(input: &str) -> IResult<&str, Modifiers> {
    let (input, m) = alt((
        value(Modifiers::CTRL, one_of("Cc")),
        value(Modifiers::SHIFT, one_of("Ss")),
        value(Modifiers::ALT, one_of("Aa")),
        value(Modifiers::META, one_of("Mm")),
    ))(input)?;
    let (input, _) = char('-')(input)?;

    Ok((input, m))
}

fn parse_bracket_name(input: &str) -> IResult<&str, Key> {
    alt((map_opt(alphanumeric1, key_from_name), map(anychar, Key::Char)))(input)
}

/// Parse a single bracketed key, like `<C-s>` or `<CR>`.
pub(crate) fn parse_bracket(input: &str) -> IResult<&str, KeyEvent> {
    let (input, _) = char('<')(input)?;
    let (input, mods) = many0(parse_bracket_modifier)(input)?;
    let (input, key) = parse_bracket_name(input)?;
    let (input, _) = char('>')(input)?;

    let mods = mods.into_iter().fold(Modifiers::empty(), |acc, m| acc | m);

    Ok((input, KeyEvent::new(key, mods)))
}

fn parse_modifier_name(name: &str) -> Option<Modifiers> {
    let m = match name.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Modifiers::CTRL,
        "shift" => Modifiers::SHIFT,
        "alt" | "option" => Modifiers::ALT,
        "meta" | "cmd" | "super" => Modifiers::META,
        _ => return None,
    };

    Some(m)
}

/// Parse the `Modifier+Key` notation, like `Ctrl+s` or `Ctrl+Shift+Tab`.
fn parse_plus(s: &str) -> Result<KeyEvent, KeyError> {
    let (mods, key) = match s.strip_suffix("++") {
        Some(mods) => (mods, "+"),
        None => s.rsplit_once('+').ok_or_else(|| invalid(s))?,
    };

    if key.is_empty() {
        return Err(invalid(s));
    }

    let mut modifiers = Modifiers::empty();

    for name in mods.split('+') {
        modifiers |= parse_modifier_name(name).ok_or_else(|| invalid(s))?;
    }

    let key = key_from_name(key).ok_or_else(|| invalid(s))?;

    Ok(KeyEvent::new(key, modifiers))
}

/// Whether a token is written in `Modifier+Key` notation, rather than being a run of bare
/// characters that happens to contain a `+`, like `g+`.
fn is_plus_notation(tok: &str) -> bool {
    let mods = match tok.strip_suffix("++") {
        Some(mods) => mods,
        None => match tok.rsplit_once('+') {
            Some((mods, _)) => mods,
            None => return false,
        },
    };

    !mods.is_empty() && mods.split('+').all(|name| parse_modifier_name(name).is_some())
}

/// Parse a run of bare characters and bracketed keys, like `gg` or `<C-w>j`.
///
/// A `<` that isn't followed by any `>` is a literal character.
fn parse_contiguous(s: &str, out: &mut Vec<KeyEvent>) -> Result<(), KeyError> {
    let mut input = s;

    while let Some(c) = input.chars().next() {
        if c == '<' && input[1..].contains('>') {
            let (rest, ev) = parse_bracket(input).map_err(|_| invalid(s))?;

            out.push(ev);
            input = rest;
        } else {
            out.push(KeyEvent::char(c));
            input = &input[c.len_utf8()..];
        }
    }

    Ok(())
}

fn parse_token(tok: &str, out: &mut Vec<KeyEvent>) -> Result<(), KeyError> {
    let mut chars = tok.chars();

    match (chars.next(), chars.next()) {
        (None, _) => {
            return Ok(());
        },
        (Some(c), None) => {
            out.push(KeyEvent::char(c));
            return Ok(());
        },
        (Some(first), Some(_)) => {
            if first != '<' && is_plus_notation(tok) {
                out.push(parse_plus(tok)?);
                return Ok(());
            }

            if first.is_uppercase() {
                if let Some(key) = key_from_name(tok) {
                    out.push(KeyEvent::new(key, Modifiers::empty()));
                    return Ok(());
                }
            }

            return parse_contiguous(tok, out);
        },
    }
}

/// Parse a single key press from any of the supported notations:
///
/// - a bare character or key name: `a`, `Enter`, `esc`
/// - modifiers joined with `+`: `Ctrl+s`, `Ctrl+Shift+Tab`
/// - bracket notation: `<C-s>`, `<CR>`, `<S-Tab>`
pub fn parse_key(s: &str) -> Result<KeyEvent, KeyError> {
    let mut chars = s.chars();

    match (chars.next(), chars.next()) {
        (None, _) => return Err(KeyError::EmptySpec),
        (Some(c), None) => return Ok(KeyEvent::char(c)),
        _ => {},
    }

    if s.starts_with('<') {
        return match parse_bracket(s) {
            Ok(("", ev)) => Ok(ev),
            _ => Err(invalid(s)),
        };
    }

    if s.contains('+') {
        return parse_plus(s);
    }

    match key_from_name(s) {
        Some(key) => Ok(KeyEvent::new(key, Modifiers::empty())),
        None => Err(invalid(s)),
    }
}

/// Parse a sequence of key presses.
///
/// Keys may either be separated by whitespace (`g g`, `Ctrl+w j`), or written as a contiguous
/// run of characters and bracketed keys (`gg`, `<C-w>j`). Both styles can be mixed.
pub fn parse_sequence(text: &str) -> Result<KeySequence, KeyError> {
    if text.trim().is_empty() {
        return Err(KeyError::EmptySpec);
    }

    let mut events = Vec::new();

    for tok in text.split_whitespace() {
        parse_token(tok, &mut events)?;
    }

    Ok(KeySequence::from(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::NamedKey;

    macro_rules! key {
        ($c: literal) => {
            KeyEvent::char($c)
        };
        ($c: literal, $m: expr) => {
            KeyEvent::new(Key::Char($c), $m)
        };
        ($k: expr) => {
            KeyEvent::named($k)
        };
    }

    macro_rules! ctl {
        ($c: literal) => {
            KeyEvent::ctrl($c)
        };
    }

    macro_rules! seq {
        ( $( $k: expr ),* ) => {
            KeySequence::from(vec![ $( $k, )* ])
        };
    }

    #[test]
    fn test_bare() {
        assert_eq!(parse_key("a"), Ok(key!('a')));
        assert_eq!(parse_key("A"), Ok(key!('a', Modifiers::SHIFT)));
        assert_eq!(parse_key("<"), Ok(key!('<')));
        assert_eq!(parse_key("+"), Ok(key!('+')));
        assert_eq!(parse_key("Enter"), Ok(key!(NamedKey::Enter)));
        assert_eq!(parse_key("esc"), Ok(key!(NamedKey::Esc)));
        assert_eq!(parse_key("F5"), Ok(key!(NamedKey::F(5))));
        assert_eq!(parse_key("Space"), Ok(key!(' ')));
    }

    #[test]
    fn test_plus() {
        assert_eq!(parse_key("Ctrl+s"), Ok(ctl!('s')));
        assert_eq!(parse_key("ctrl+s"), Ok(ctl!('s')));
        assert_eq!(parse_key("Control+s"), Ok(ctl!('s')));
        assert_eq!(parse_key("Ctrl+S"), Ok(key!('S', Modifiers::CTRL)));
        assert_eq!(parse_key("Ctrl++"), Ok(ctl!('+')));
        assert_eq!(parse_key("Alt+Space"), Ok(key!(' ', Modifiers::ALT)));
        assert_eq!(parse_key("Cmd+k"), Ok(key!('k', Modifiers::META)));

        let ev = KeyEvent::new(Key::Named(NamedKey::Tab), Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(parse_key("Ctrl+Shift+Tab"), Ok(ev));
    }

    #[test]
    fn test_bracket() {
        assert_eq!(parse_key("<C-s>"), Ok(ctl!('s')));
        assert_eq!(parse_key("<c-s>"), Ok(ctl!('s')));
        assert_eq!(parse_key("<CR>"), Ok(key!(NamedKey::Enter)));
        assert_eq!(parse_key("<Esc>"), Ok(key!(NamedKey::Esc)));
        assert_eq!(parse_key("<lt>"), Ok(key!('<')));
        assert_eq!(parse_key("<Space>"), Ok(key!(' ')));
        assert_eq!(parse_key("<C-->"), Ok(ctl!('-')));
        assert_eq!(parse_key("<M->>"), Ok(key!('>', Modifiers::META)));
        assert_eq!(parse_key("<S-a>"), Ok(key!('A')));
        assert_eq!(parse_key("<A-a>"), Ok(key!('a', Modifiers::ALT)));

        let ev = KeyEvent::new(Key::Named(NamedKey::Tab), Modifiers::SHIFT);
        assert_eq!(parse_key("<S-Tab>"), Ok(ev));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(parse_key(""), Err(KeyError::EmptySpec));
        assert_eq!(parse_key("Hyper+s"), Err(KeyError::InvalidSpec("Hyper+s".into())));
        assert_eq!(parse_key("Ctrl+"), Err(KeyError::InvalidSpec("Ctrl+".into())));
        assert_eq!(parse_key("<Q-x>"), Err(KeyError::InvalidSpec("<Q-x>".into())));
        assert_eq!(parse_key("<C-s"), Err(KeyError::InvalidSpec("<C-s".into())));
        assert_eq!(parse_key("<Bogus>"), Err(KeyError::InvalidSpec("<Bogus>".into())));
        assert_eq!(parse_key("<C-s>x"), Err(KeyError::InvalidSpec("<C-s>x".into())));
        assert_eq!(parse_key("gg"), Err(KeyError::InvalidSpec("gg".into())));
    }

    #[test]
    fn test_round_trip() {
        let specs = [
            "a", "A", "Ctrl+s", "Ctrl+S", "<C-s>", "<CR>", "Enter", "<S-Tab>", "Ctrl+Shift+Tab",
            "Alt++", "<lt>", "<", "Space", "<C-Space>", "<M->>", "F12", "Meta+Alt+x", "-", ">",
        ];

        for spec in specs {
            let ev = parse_key(spec).unwrap();

            assert_eq!(parse_key(&ev.to_string()), Ok(ev), "bracket round trip of {spec:?}");
            assert_eq!(parse_key(&ev.to_human()), Ok(ev), "human round trip of {spec:?}");
        }

        assert_eq!(parse_key("Ctrl+s").unwrap().to_string(), "<C-s>");
    }

    #[test]
    fn test_sequence_spaced() {
        assert_eq!(parse_sequence("g g"), Ok(seq![key!('g'), key!('g')]));
        assert_eq!(parse_sequence("Ctrl+w j"), Ok(seq![ctl!('w'), key!('j')]));
        assert_eq!(parse_sequence("  Esc  :  "), Ok(seq![key!(NamedKey::Esc), key!(':')]));
        assert_eq!(parse_sequence("<leader>"), Err(KeyError::InvalidSpec("<leader>".into())));
    }

    #[test]
    fn test_sequence_contiguous() {
        assert_eq!(parse_sequence("gg"), Ok(seq![key!('g'), key!('g')]));
        assert_eq!(parse_sequence("<C-w>j"), Ok(seq![ctl!('w'), key!('j')]));
        assert_eq!(parse_sequence("<C-x>>"), Ok(seq![ctl!('x'), key!('>')]));
        assert_eq!(parse_sequence("up"), Ok(seq![key!('u'), key!('p')]));
        assert_eq!(parse_sequence("Up"), Ok(seq![key!(NamedKey::Up)]));
        assert_eq!(parse_sequence("Gg"), Ok(seq![key!('G'), key!('g')]));

        // A "+" only means modifiers when everything before it names one.
        assert_eq!(parse_sequence("g+"), Ok(seq![key!('g'), key!('+')]));
        assert_eq!(parse_sequence("z+"), Ok(seq![key!('z'), key!('+')]));
        assert_eq!(parse_sequence("<C-w>+"), Ok(seq![ctl!('w'), key!('+')]));
        assert_eq!(parse_sequence("g++"), Ok(seq![key!('g'), key!('+'), key!('+')]));
        assert_eq!(parse_sequence("Alt++ d+"), Ok(seq![key!('+', Modifiers::ALT), key!('d'), key!('+')]));
        assert_eq!(parse_sequence("Ctrl+"), Err(KeyError::InvalidSpec("Ctrl+".into())));
    }

    #[test]
    fn test_sequence_literal_lt() {
        assert_eq!(parse_sequence("a<b"), Ok(seq![key!('a'), key!('<'), key!('b')]));
        assert_eq!(parse_sequence("<<"), Ok(seq![key!('<'), key!('<')]));
        assert_eq!(parse_sequence("<> x"), Err(KeyError::InvalidSpec("<>".into())));
    }

    #[test]
    fn test_sequence_empty() {
        assert_eq!(parse_sequence(""), Err(KeyError::EmptySpec));
        assert_eq!(parse_sequence("   "), Err(KeyError::EmptySpec));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyCode),
    Resize { height: usize, width: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(u8),

    Escape,
    Backspace,

    Up,
    Down,
    Right,
    Left,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unterminated key name at byte {0}")]
    Unterminated(usize),

    #[error("unknown key name <{0}>")]
    UnknownKey(String),

    #[error("invalid resize <{0}>, expected <resize:HEIGHT,WIDTH>")]
    InvalidResize(String),

    #[error("non-ASCII character {0:?} in key script")]
    NonAscii(char),
}

/// Parse a key script into events.
///
/// Plain characters stand for themselves; special keys are written in angle
/// brackets, e.g. `3G<down>ihello<esc><resize:10,40>`. A literal `<` is
/// written `<lt>`.
pub fn parse_script(script: &str) -> Result<Vec<Event>, ScriptError> {
    let mut events = Vec::new();
    let mut rest = script;

    while let Some(ch) = rest.chars().next() {
        let offset = script.len() - rest.len();

        if ch == '<' {
            let end = rest.find('>').ok_or(ScriptError::Unterminated(offset))?;
            events.push(parse_named(&rest[1..end])?);
            rest = &rest[end + 1..];
            continue;
        }

        if !ch.is_ascii() {
            return Err(ScriptError::NonAscii(ch));
        }

        events.push(Event::Key(KeyCode::Char(ch as u8)));
        rest = &rest[1..];
    }

    Ok(events)
}

fn parse_named(name: &str) -> Result<Event, ScriptError> {
    if let Some(size) = name.strip_prefix("resize:") {
        let invalid = || ScriptError::InvalidResize(name.to_owned());

        let (height, width) = size.split_once(',').ok_or_else(invalid)?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        let width = width.trim().parse().map_err(|_| invalid())?;

        return Ok(Event::Resize { height, width });
    }

    let key_code = match name.to_ascii_lowercase().as_str() {
        "esc" => KeyCode::Escape,
        "bs" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "lt" => KeyCode::Char(b'<'),
        "space" => KeyCode::Char(b' '),
        _ => return Err(ScriptError::UnknownKey(name.to_owned())),
    };

    Ok(Event::Key(key_code))
}

use garden_core::Message;

/// Parse one line typed on stdin into a page [`Message`].
///
/// The verb comes first; the rest of the line is the plant name, which may
/// contain spaces.  `hue` takes the degrees as its last word.  Returns
/// `None` for blank or unrecognised lines.
pub fn parse_command(line: &str) -> Option<Message> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let plant = rest.trim();

    let named = |make: fn(String) -> Message| {
        (!plant.is_empty()).then(|| make(plant.to_string()))
    };

    match verb.to_ascii_lowercase().as_str() {
        "water" | "w" => named(Message::WaterRequested),
        "delete" => named(Message::DeleteModalOpened),
        "cancel" => named(Message::DeleteModalClosed),
        "confirm" => named(Message::DeleteConfirmed),
        "revive" => named(Message::ReviveRequested),
        "hue" => {
            let (name, degrees) = plant.rsplit_once(char::is_whitespace)?;
            let degrees = degrees.parse::<i32>().ok()?;
            let name = name.trim();
            (!name.is_empty()).then(|| Message::HueChanged(name.to_string(), degrees))
        }
        "show" | "ls" => Some(Message::Render),
        "quit" | "exit" => Some(Message::Shutdown),
        _ => None,
    }
}

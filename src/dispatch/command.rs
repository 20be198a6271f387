//! Private control commands carried in log lines

/// Lines starting with this are commands, not log text
pub const COMMAND_PREFIX: &str = "!loglib ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Re-run the config loader and re-propagate global flags
    LoadConf,
}

/// Recognize a command line; anything else is ordinary text
pub fn parse_command(line: &str) -> Option<Command> {
    match line.strip_prefix(COMMAND_PREFIX)? {
        "loadconf" => Some(Command::LoadConf),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(parse_command("!loglib loadconf"), Some(Command::LoadConf));
        assert_eq!(parse_command("!loglib reboot"), None);
        assert_eq!(parse_command("!loglib loadconf now"), None);
        assert_eq!(parse_command("!loglib  loadconf"), None);
        assert_eq!(parse_command("loadconf"), None);
    }
}

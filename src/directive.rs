const DIRECTIVE_PREFIX: &str = "SHELL: ";

// Only the first line is inspected; a backtick-quoted command anywhere else
// in the reply is treated as prose.
pub fn parse_directive(turn_text: &str) -> Option<&str> {
    let first_line = turn_text.lines().next()?.trim();
    let rest = first_line.strip_prefix(DIRECTIVE_PREFIX)?;
    let quoted = rest.strip_prefix('`')?;
    let command = quoted.strip_suffix('`')?;
    if command.contains('`') {
        return None;
    }
    Some(command)
}

use std::sync::LazyLock;

use regex::Regex;

/// User mentions (`<@U123>`), broadcasts (`<!here>`, `<!subteam^S1>`) and channel links (`<#C1>`).
/// The shapes are alternatives of a single pattern so every match of every shape is removed.
static NOTIFICATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<@.+?>)|(<!.+?>)|(<#.+?>)").expect("notification pattern must compile")
});

/// Strips markup that would notify people if the text were posted again.
pub fn sanitize(text: &str) -> String {
    NOTIFICATION_PATTERN.replace_all(text, "").into_owned()
}

pub fn sanitize_optional(text: Option<&str>) -> Option<String> {
    text.map(sanitize)
}

//! User-facing reply texts.

use transkh_core::{Command, Language};

pub const VOICE_PLACEHOLDER: &str = "Processing your voice message";
pub const TEXT_PLACEHOLDER: &str = "Processing your text...";

pub const VOICE_FAILURE: &str =
    "An error occurred while processing your voice message. Please try again later.";
pub const TEXT_FAILURE: &str =
    "An error occurred while processing your message. Please try again later.";

pub const WELCOME: &str = "Welcome to Transform KH Bot\n\
Send a voice message, and the bot will convert it to text, translate to Khmer, and generate Khmer speech for you.\n\
Commands: \n\
/help - help information\n";

pub const HELP: &str = "Send a voice message to get it transcribed and translated to Khmer.\n\
Or send a text message in Khmer to get it translated to English.";

pub fn command_reply(command: Command) -> &'static str {
    match command {
        Command::Start => WELCOME,
        Command::Help => HELP,
    }
}

pub fn voice_success(language: Language, transcript: &str, translation: &str) -> String {
    format!("Original ({}): {transcript}\n\nTranslated: {translation}", language.name())
}

pub fn text_success(original: &str, translation: &str) -> String {
    format!("Original (Khmer): {original}\nTranslated (English): {translation}")
}

/// English output from the service sometimes arrives as a stringified list
/// (`['hello']`); strip the wrapping.
pub fn clean_english(text: &str) -> String {
    text.trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '\''))
        .trim()
        .to_string()
}

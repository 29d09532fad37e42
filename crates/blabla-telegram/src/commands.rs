use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

use blabla_core::{
    api::BotApi,
    model::Message,
    router::{CommandRouter, Outcome},
    Result,
};

pub const WEATHER_REPLY: &str = "Winter Is Coming.";
pub const STYLEGUIDE_REPLY: &str =
    "A style guide is a document everyone agrees with and nobody has read.";
pub const ECHO_SUFFIX: &str = " blablabla...";
pub const STICKER_FILE_ID: &str = "CAADAgADegADECECEAACxyOkybkFAg";
pub const GIF_FILE_ID: &str = "CgADAgADjQADJ7MRSM0LdfDklYBfAg";

/// Commands recognized by exact match on the whole message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextCommand {
    Random,
    Weather,
    Styleguide,
    Stop,
    Crash,
    Sticker,
    Gif,
}

impl TextCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/random" => Some(Self::Random),
            "/weather" => Some(Self::Weather),
            "/styleguide" => Some(Self::Styleguide),
            "/stop" => Some(Self::Stop),
            "/crash" => Some(Self::Crash),
            "/sticker" => Some(Self::Sticker),
            "/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// The bot's fixed command table. Unknown text is echoed back.
pub struct CommandTable {
    rng: StdRng,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic `/random` replies.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl CommandRouter for CommandTable {
    async fn route(&mut self, message: &Message, api: &mut BotApi) -> Result<Outcome> {
        let Some(text) = message.text.as_deref() else {
            tracing::debug!(message_id = message.message_id.0, "non-text message ignored");
            return Ok(Outcome::Continue);
        };
        let chat = message.chat.id;

        let Some(command) = TextCommand::parse(text) else {
            api.send_text(chat, &format!("{text}{ECHO_SUFFIX}")).await?;
            return Ok(Outcome::Continue);
        };
        tracing::info!(?command, chat_id = chat.0, "command received");

        match command {
            TextCommand::Random => {
                let number: i32 = self.rng.gen_range(0..=i32::MAX);
                api.send_text(chat, &number.to_string()).await?;
            }
            TextCommand::Weather => {
                api.send_text(chat, WEATHER_REPLY).await?;
            }
            TextCommand::Styleguide => {
                api.send_text(chat, STYLEGUIDE_REPLY).await?;
            }
            TextCommand::Stop => return Ok(Outcome::Stop),
            TextCommand::Crash => return Ok(Outcome::Abort),
            TextCommand::Sticker => {
                api.send_sticker(chat, STICKER_FILE_ID).await?;
            }
            TextCommand::Gif => {
                api.send_document(chat, GIF_FILE_ID).await?;
            }
        }
        Ok(Outcome::Continue)
    }
}

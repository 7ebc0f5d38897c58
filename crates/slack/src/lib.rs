//! Slack integration for the translation bot
//!
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Events** (`events`) - envelope parsing, dispatcher and handlers
//! - **Web API** (`web`) - thread reads, thread replies and modal views
//! - **Block Kit** (`blocks`) - modal view rendering
//! - **Reacjilator** (`reacjilator`) - flag reaction to threaded translation
//! - **Modal runner** (`runner`) - the interactive translation dialog
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and subscribe to the `reaction_added` bot event
//! 3. Add a global shortcut with callback id `deepl-translation`
//! 4. Grant `channels:history`, `groups:history`, `chat:write` and `reactions:read`
//! 5. Set env vars: `POLYGLOT_SLACK_APP_TOKEN`, `POLYGLOT_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Socket Mode → EventDispatcher → ack (with next view) → Handlers
//!                                                          ↓
//!                    Slack Web API ← Reacjilator / ModalRunner → Translator
//! ```

pub mod blocks;
pub mod events;
pub mod reacjilator;
pub mod runner;
pub mod services;
pub mod socket;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{translation_dispatcher, EventDispatcher};
pub use services::TranslationServices;
pub use socket::{ReconnectPolicy, SocketModeRunner, WebSocketTransport};
pub use web::{SlackApi, SlackWebClient};

// LobbyScout - app/notify.rs
//
// Delivery of live lobby notifications to a Discord-style webhook.
//
// One message per lobby: an embed titled with the player name carrying two
// inline fields, the lobby short ID and the server's country. Delivery is
// best effort; a failure is returned to the caller and never retried.

use crate::core::model::LocatedLobby;
use crate::util::constants;
use crate::util::error::NotifyError;
use serde::Serialize;
use std::future::Future;

/// Sends a notification for a live lobby.
pub trait Notifier {
    fn notify(&self, lobby: &LocatedLobby) -> impl Future<Output = Result<(), NotifyError>>;
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookMessage {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl WebhookMessage {
    pub fn for_lobby(player_name: &str, lobby: &LocatedLobby) -> Self {
        Self {
            embeds: vec![Embed {
                title: player_name.to_string(),
                fields: vec![
                    EmbedField {
                        name: constants::LOBBY_ID_FIELD_NAME.to_string(),
                        value: lobby.event.lobby_id.clone(),
                        inline: true,
                    },
                    EmbedField {
                        name: constants::COUNTRY_FIELD_NAME.to_string(),
                        value: lobby.country.clone(),
                        inline: true,
                    },
                ],
            }],
        }
    }
}

/// Posts lobby embeds to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
    player_name: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            player_name: player_name.into(),
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, lobby: &LocatedLobby) -> Result<(), NotifyError> {
        let message = WebhookMessage::for_lobby(&self.player_name, lobby);
        let response = self.http.post(&self.url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(lobby_id = %lobby.event.lobby_id, "Webhook notification delivered");
        Ok(())
    }
}

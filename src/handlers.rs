//! Event handlers for the Discord bot.
//!
//! Each public function in this module handles one category of gateway event.
//! Handlers receive the shared [`BotContext`] for calling the Discord REST API
//! and the war API.

use tracing::{debug, error, info, warn};

use crate::bot::{BotContext, BotState};
use crate::commands::{self, Command};
use crate::format::{self, Reply};
use crate::http::{DiscordHttpClient, HttpError};
use crate::loadouts;
use crate::payloads::{Campaign, Dispatch, Faction, MajorOrder, WarStatus};
use crate::types::*;
use crate::war_api::{Endpoint, WarClient};

// ---------------------------------------------------------------------------
// READY handler
// ---------------------------------------------------------------------------

/// Called when the bot receives the READY event from the gateway.
///
/// Records the application id (unless one was configured) and registers slash
/// commands if they are not registered yet. A failed registration is retried
/// on the next READY.
pub async fn on_ready(ctx: &BotContext, state: &mut BotState, ready: ReadyEvent) {
    info!(user = %ready.user.tag(), guilds = ready.guilds.len(), "bot is ready!");

    let app_id = state
        .application_id
        .get_or_insert(ready.application.id)
        .clone();

    if !state.commands_registered {
        state.commands_registered = register_commands(&ctx.http, &app_id).await;
    }
}

/// Overwrite the global command set. Returns whether it succeeded.
pub async fn register_commands(http: &DiscordHttpClient, application_id: &str) -> bool {
    let cmds = commands::slash_commands();
    match http.bulk_overwrite_global_commands(application_id, &cmds).await {
        Ok(registered) => {
            info!(count = registered.len(), "registered global slash commands");
            true
        }
        Err(e) => {
            error!(error = %e, "failed to register global commands");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// INTERACTION_CREATE handler
// ---------------------------------------------------------------------------

/// Answer a slash command (or PING) with exactly one interaction response.
///
/// Commands that call the war API first acknowledge with a deferred response
/// and then fill it in by editing the original message, since Discord drops
/// initial responses that arrive after 3 seconds.
pub async fn on_interaction(ctx: &BotContext, interaction: &Interaction) -> Result<(), HttpError> {
    let response = match interaction.kind {
        InteractionType::Ping => InteractionResponse::pong(),
        InteractionType::ApplicationCommand => {
            let name = interaction.command_name().unwrap_or_default();
            let user = interaction
                .author()
                .map(|u| u.tag())
                .unwrap_or_else(|| "unknown".to_string());

            match Command::from_name(name) {
                Some(command) if command.fetches_war_data() => {
                    info!(command = %command, user = %user, "handling slash command (deferred)");
                    return respond_deferred(ctx, interaction, command).await;
                }
                Some(command) => {
                    info!(command = %command, user = %user, "handling slash command");
                    respond(&ctx.war, command).await.into_response()
                }
                None => {
                    warn!(command = name, user = %user, "unknown slash command");
                    format::unknown_command(name).into_response()
                }
            }
        }
        other => {
            debug!(kind = ?other, "ignoring non-command interaction");
            return Ok(());
        }
    };

    ctx.http
        .create_interaction_response(&interaction.id, &interaction.token, &response)
        .await
}

async fn respond_deferred(
    ctx: &BotContext,
    interaction: &Interaction,
    command: Command,
) -> Result<(), HttpError> {
    ctx.http
        .create_interaction_response(
            &interaction.id,
            &interaction.token,
            &InteractionResponse::deferred(),
        )
        .await?;

    let reply = respond(&ctx.war, command).await;
    ctx.http
        .edit_original_interaction_response(
            &interaction.application_id,
            &interaction.token,
            &reply.into_data(),
        )
        .await
}

/// Build the reply for one command, fetching whatever it needs.
///
/// Never fails: unavailable data turns into the command's fallback text.
pub async fn respond(war: &WarClient, command: Command) -> Reply {
    match command {
        Command::War => {
            let campaigns: Option<Vec<Campaign>> = war.fetch_list(Endpoint::Campaigns).await;
            // Without campaigns nothing can match, so skip the status call.
            let status: Option<WarStatus> = match campaigns.as_deref() {
                Some(list) if !list.is_empty() => war.fetch(Endpoint::Status).await,
                _ => None,
            };
            Reply::text(format::war_status(status.as_ref(), campaigns.as_deref()))
        }
        Command::Orders => {
            let orders: Option<Vec<MajorOrder>> = war.fetch_list(Endpoint::MajorOrders).await;
            Reply::text(format::major_order(orders.as_deref()))
        }
        Command::Dispatch => {
            let news: Option<Vec<Dispatch>> = war.fetch_list(Endpoint::News).await;
            Reply::text(format::latest_dispatch(news.as_deref()))
        }
        Command::Campaigns => {
            let campaigns: Option<Vec<Campaign>> = war.fetch_list(Endpoint::Campaigns).await;
            Reply::text(format::campaigns(campaigns.as_deref()))
        }
        Command::BugLoadout | Command::BotLoadout => match command.loadout_faction() {
            Some(faction) => loadout_reply(faction),
            None => Reply::text(format::NO_LOADOUTS),
        },
        Command::Help => Reply::text(format::help_text()),
    }
}

// The thread-local rng is not `Send`; keep it out of the async state machine.
fn loadout_reply(faction: Faction) -> Reply {
    let mut rng = rand::thread_rng();
    format::loadout(faction, loadouts::pick(faction, &mut rng))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, patch, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    async fn spawn_stub(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    fn war_api() -> Router {
        Router::new()
            .route(
                "/war/campaign",
                get(|| async { Json(json!([{ "name": "Malevelon Creek" }])) }),
            )
            .route(
                "/war/status",
                get(|| async {
                    Json(json!({
                        "planetStatus": [
                            { "planet": "Malevelon Creek", "owner": 3, "health": 1000000, "players": 4500 },
                            { "planet": "Hellmire", "owner": 2, "health": 500, "players": 10 }
                        ]
                    }))
                }),
            )
            .route(
                "/war/news",
                get(|| async {
                    Json(json!([{ "message": "Old news" }, { "message": "Breaking update" }]))
                }),
            )
            .route(
                "/war/major-orders",
                get(|| async {
                    Json(json!([{
                        "progress": [3],
                        "setting": {
                            "overrideTitle": "Hold the line",
                            "overrideBrief": "Defend.",
                            "tasks": [{ "values": [1, 2, 10] }],
                            "reward": { "amount": 45 }
                        }
                    }]))
                }),
            )
    }

    fn failing_war_api() -> Router {
        Router::new().fallback(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") })
    }

    fn war_client(base: &str) -> WarClient {
        WarClient::new(base, Duration::from_secs(5)).expect("client builds")
    }

    /// Records every call as `(kind, body)` where kind is "callback" or "edit".
    fn discord_stub(tx: mpsc::UnboundedSender<(&'static str, Value)>) -> Router {
        let edit_tx = tx.clone();
        Router::new()
            .route(
                "/interactions/{id}/{token}/callback",
                post(move |Json(body): Json<Value>| {
                    let tx = tx.clone();
                    async move {
                        let _ = tx.send(("callback", body));
                        StatusCode::NO_CONTENT
                    }
                }),
            )
            .route(
                "/webhooks/{app}/{token}/messages/@original",
                patch(move |Json(body): Json<Value>| {
                    let tx = edit_tx.clone();
                    async move {
                        let _ = tx.send(("edit", body.clone()));
                        Json(body)
                    }
                }),
            )
    }

    fn context(discord: String, war: String) -> BotContext {
        BotContext {
            http: DiscordHttpClient::with_base_url("tok", discord).expect("client builds"),
            war: war_client(&war),
        }
    }

    fn interaction(kind: u8, name: Option<&str>) -> Interaction {
        let mut value = json!({
            "id": "100",
            "application_id": "42",
            "type": kind,
            "token": "interaction-token",
            "member": { "user": { "id": "7", "username": "diver", "discriminator": "0" } }
        });
        if let Some(name) = name {
            value["data"] = json!({ "id": "1", "name": name, "type": 1 });
        }
        serde_json::from_value(value).expect("valid interaction")
    }

    // -- respond() ---------------------------------------------------------

    #[tokio::test]
    async fn war_lists_only_campaign_planets() {
        let base = spawn_stub(war_api()).await;
        let reply = respond(&war_client(&base), Command::War).await;
        let Reply::Text(text) = reply else {
            panic!("expected text reply");
        };
        assert!(text.contains("Planet Malevelon Creek | Owner Bugs | Health 1,000,000 | Players 4,500"));
        assert!(!text.contains("Hellmire"));
    }

    #[tokio::test]
    async fn dispatch_shows_latest_message() {
        let base = spawn_stub(war_api()).await;
        let Reply::Text(text) = respond(&war_client(&base), Command::Dispatch).await else {
            panic!("expected text reply");
        };
        assert!(text.contains("Breaking update"));
        assert!(!text.contains("Old news"));
    }

    #[tokio::test]
    async fn orders_include_tasks_and_reward() {
        let base = spawn_stub(war_api()).await;
        let Reply::Text(text) = respond(&war_client(&base), Command::Orders).await else {
            panic!("expected text reply");
        };
        assert!(text.contains("Hold the line"));
        assert!(text.contains("• Task 1: 3/10"));
        assert!(text.contains("Warbond Medals: 45"));
    }

    #[tokio::test]
    async fn unavailable_api_yields_fallbacks() {
        let base = spawn_stub(failing_war_api()).await;
        let war = war_client(&base);
        assert_eq!(respond(&war, Command::War).await, Reply::text(format::NO_WAR_STATUS));
        assert_eq!(respond(&war, Command::Orders).await, Reply::text(format::NO_MAJOR_ORDERS));
        assert_eq!(respond(&war, Command::Dispatch).await, Reply::text(format::NO_DISPATCHES));
        assert_eq!(respond(&war, Command::Campaigns).await, Reply::text(format::NO_CAMPAIGNS));
    }

    #[tokio::test]
    async fn loadouts_and_help_need_no_network() {
        // Nothing listens here; these commands must not fetch.
        let war = war_client("http://127.0.0.1:9");
        match respond(&war, Command::BugLoadout).await {
            Reply::Embed(embed) => assert_eq!(embed.color, Some(0xFFB800)),
            other => panic!("expected embed, got {:?}", other),
        }
        match respond(&war, Command::BotLoadout).await {
            Reply::Embed(embed) => assert_eq!(embed.color, Some(0xE53935)),
            other => panic!("expected embed, got {:?}", other),
        }
        let Reply::Text(help) = respond(&war, Command::Help).await else {
            panic!("expected text reply");
        };
        assert!(help.contains("/loadout-bots"));
    }

    // -- on_interaction() --------------------------------------------------

    #[tokio::test]
    async fn local_command_gets_exactly_one_reply() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(failing_war_api()).await,
        );

        on_interaction(&ctx, &interaction(2, Some("help")))
            .await
            .expect("reply sent");

        let (kind, body) = rx.recv().await.expect("one callback");
        assert_eq!(kind, "callback");
        assert_eq!(body["type"], 4);
        assert!(body["data"]["content"]
            .as_str()
            .is_some_and(|c| c.contains("/war")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn war_api_command_defers_then_edits() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(war_api()).await,
        );

        on_interaction(&ctx, &interaction(2, Some("campaigns")))
            .await
            .expect("reply sent");

        let (kind, body) = rx.recv().await.expect("deferral");
        assert_eq!(kind, "callback");
        assert_eq!(body, json!({ "type": 5 }));

        let (kind, body) = rx.recv().await.expect("edit");
        assert_eq!(kind, "edit");
        assert!(body["content"]
            .as_str()
            .is_some_and(|c| c.contains("• Malevelon Creek")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_war_api_is_acknowledged_before_fetching() {
        let release = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::clone(&release);
        let slow_api = Router::new()
            .route(
                "/war/campaign",
                get(move || {
                    let gate = Arc::clone(&gate);
                    async move {
                        gate.notified().await;
                        Json(json!([{ "name": "Malevelon Creek" }]))
                    }
                }),
            );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(slow_api).await,
        ));

        let task = tokio::spawn({
            let ctx = Arc::clone(&ctx);
            async move { on_interaction(&ctx, &interaction(2, Some("war"))).await }
        });

        // The deferral must land while the war API is still stalled.
        let (kind, body) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("deferral sent within Discord's window")
            .expect("deferral");
        assert_eq!(kind, "callback");
        assert_eq!(body["type"], 5);

        release.notify_one();
        task.await.expect("task joins").expect("edit sent");

        let (kind, body) = rx.recv().await.expect("edit");
        assert_eq!(kind, "edit");
        assert_eq!(body["content"], format::NO_WAR_STATUS);
    }

    #[tokio::test]
    async fn one_bad_planet_does_not_blank_the_war_reply() {
        let app = Router::new()
            .route(
                "/war/campaign",
                get(|| async { Json(json!(["Malevelon Creek", "Hellmire"])) }),
            )
            .route(
                "/war/status",
                get(|| async {
                    Json(json!({
                        "planetStatus": [
                            { "owner": 2 },
                            { "planet": "Hellmire", "owner": 4, "health": 7.5 },
                            { "planet": "Malevelon Creek", "owner": 3, "health": 10, "players": 2 }
                        ]
                    }))
                }),
            );
        let base = spawn_stub(app).await;
        let Reply::Text(text) = respond(&war_client(&base), Command::War).await else {
            panic!("expected text reply");
        };
        assert!(text.contains("Planet Malevelon Creek | Owner Bugs | Health 10 | Players 2"));
        assert!(!text.contains("Hellmire"));
    }

    #[tokio::test]
    async fn unknown_command_is_answered_ephemerally() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(failing_war_api()).await,
        );

        on_interaction(&ctx, &interaction(2, Some("greet")))
            .await
            .expect("reply sent");

        let (_, body) = rx.recv().await.expect("one callback");
        assert_eq!(body["data"]["flags"], EPHEMERAL);
        assert!(body["data"]["content"]
            .as_str()
            .is_some_and(|c| c.starts_with("Unknown command")));
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(failing_war_api()).await,
        );

        on_interaction(&ctx, &interaction(1, None)).await.expect("pong sent");
        let (_, body) = rx.recv().await.expect("one callback");
        assert_eq!(body, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn component_interactions_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = context(
            spawn_stub(discord_stub(tx)).await,
            spawn_stub(failing_war_api()).await,
        );

        on_interaction(&ctx, &interaction(3, None)).await.expect("no error");
        assert!(rx.try_recv().is_err());
    }

    // -- on_ready() --------------------------------------------------------

    fn ready(app_id: &str) -> ReadyEvent {
        serde_json::from_value(json!({
            "v": 10,
            "user": { "id": "9", "username": "warbot", "discriminator": "0", "bot": true },
            "session_id": "abc",
            "resume_gateway_url": "wss://resume.discord.gg",
            "guilds": [],
            "application": { "id": app_id, "flags": 0 }
        }))
        .expect("valid READY")
    }

    #[tokio::test]
    async fn ready_registers_commands_once() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let app = Router::new().route(
            "/applications/{app}/commands",
            put(
                move |axum::extract::Path(app): axum::extract::Path<String>,
                      Json(body): Json<Value>| {
                    let tx = tx.clone();
                    async move {
                        let _ = tx.send(app);
                        Json(body)
                    }
                },
            ),
        );
        let ctx = context(spawn_stub(app).await, "http://127.0.0.1:9".to_string());
        let mut state = BotState::default();

        on_ready(&ctx, &mut state, ready("77")).await;
        assert!(state.commands_registered);
        assert_eq!(state.application_id.as_deref(), Some("77"));
        assert_eq!(rx.recv().await.as_deref(), Some("77"));

        on_ready(&ctx, &mut state, ready("77")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn configured_application_id_wins_and_failure_retries() {
        let app = Router::new().route(
            "/applications/{app}/commands",
            put(|| async { (StatusCode::UNAUTHORIZED, "401: Unauthorized") }),
        );
        let ctx = context(spawn_stub(app).await, "http://127.0.0.1:9".to_string());
        let mut state = BotState {
            application_id: Some("55".to_string()),
            ..Default::default()
        };

        on_ready(&ctx, &mut state, ready("77")).await;
        assert!(!state.commands_registered);
        assert_eq!(state.application_id.as_deref(), Some("55"));
    }
}

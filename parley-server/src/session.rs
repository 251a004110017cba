//! Per-connection session state machine.
//!
//! States: Connecting -> Authenticating -> Active -> Closed.
//!
//! No transition returns to an earlier state; Closed is terminal. Any
//! stream error, wherever it happens, lands in the teardown path:
//! registry removal, departure announcement, socket release.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use parley_core::command::{self, Command};
use parley_core::{ChatMessage, FrameBuffer};

use crate::error::ServerError;
use crate::registry::ActivateError;
use crate::wire::{self, SharedWriter};
use crate::ServerContext;

/// System persona for login prompts.
const LOGIN_BOT: &str = "LoginBot";
/// System persona for account-creation prompts.
const CREATOR_BOT: &str = "CreatorBot";
/// System persona for arrival and departure announcements.
const ANNOUNCER: &str = "Announcer";

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, registered under the transient id.
    Connecting,
    /// Driving the login-or-create flow.
    Authenticating,
    /// Authenticated, in the chat loop.
    Active,
    /// Torn down. Terminal.
    Closed,
}

/// The server-side state and task bound to one client connection.
pub struct Session {
    /// Transient numeric id, replaced by the display name on login.
    identity: String,
    state: SessionState,
    reader: OwnedReadHalf,
    writer: SharedWriter,
    frame: FrameBuffer,
    ctx: Arc<ServerContext>,
}

impl Session {
    /// Wrap an accepted connection. `id` is the fresh transient id.
    pub fn new(id: u64, stream: TcpStream, ctx: Arc<ServerContext>) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            identity: id.to_string(),
            state: SessionState::Connecting,
            reader,
            writer: Arc::new(Mutex::new(writer)),
            frame: FrameBuffer::new(),
            ctx,
        }
    }

    /// Drive the session to completion. Never propagates an error.
    pub async fn run(mut self) {
        self.ctx.registry.insert(&self.identity, self.writer.clone()).await;
        self.state = SessionState::Authenticating;

        if let Err(e) = self.drive().await {
            tracing::debug!(client = %self.identity, error = %e, "session ended");
        }
        self.close().await;
    }

    async fn drive(&mut self) -> Result<(), ServerError> {
        let name = self.authenticate().await?;
        self.state = SessionState::Active;

        self.replay_history(&name).await;
        self.ctx
            .router
            .broadcast(ChatMessage::broadcast(
                format!("[{name}] has entered the chat."),
                ANNOUNCER,
            ))
            .await;

        self.chat_loop(&name).await
    }

    /// Loop within Authenticating until a login or account creation
    /// succeeds. There is no retry limit.
    async fn authenticate(&mut self) -> Result<String, ServerError> {
        loop {
            let candidate = if self.login_option().await? {
                self.create_account().await?
            } else {
                self.login().await?
            };
            let Some(name) = candidate else { continue };

            // The availability check and the rename share the registry's
            // critical section; a concurrent claim on the same name loses
            // here and re-prompts.
            match self.ctx.registry.activate(&self.identity, &name).await {
                Ok(()) => {
                    tracing::info!(client = %self.identity, name = %name, "client authenticated");
                    self.identity = name.clone();
                    return Ok(name);
                }
                Err(ActivateError::NameTaken) => {
                    self.prompt(LOGIN_BOT, "Name already exists.").await?;
                }
                Err(ActivateError::SessionGone) => return Err(ServerError::ConnectionClosed),
            }
        }
    }

    /// Present the login-or-create choice. Returns true for creation.
    /// Anything but the literal tokens `1` and `2` reads again.
    async fn login_option(&mut self) -> Result<bool, ServerError> {
        self.prompt(LOGIN_BOT, "You need to log in or create an account.").await?;
        self.prompt(LOGIN_BOT, "1: Login").await?;
        self.prompt(LOGIN_BOT, "2: Create Account").await?;

        loop {
            match self.read_line().await?.trim().parse::<u32>() {
                Ok(1) => return Ok(false),
                Ok(2) => return Ok(true),
                _ => {}
            }
        }
    }

    /// One account-creation attempt. `None` re-enters the menu.
    async fn create_account(&mut self) -> Result<Option<String>, ServerError> {
        self.prompt(CREATOR_BOT, "Create username: ").await?;
        let name = self.read_line().await?;

        if !command::valid_name(&name) {
            self.prompt(CREATOR_BOT, "Invalid syntax. Only letters and numbers!").await?;
            return Ok(None);
        }
        if self.ctx.registry.is_online(&name).await || self.ctx.store.find_account(&name).await {
            self.prompt(CREATOR_BOT, "Name already exists.").await?;
            return Ok(None);
        }

        self.prompt(CREATOR_BOT, "Create password:").await?;
        let password = Zeroizing::new(self.read_line().await?);
        if !command::valid_password(&password) {
            self.prompt(
                CREATOR_BOT,
                "Password must be between 4 and 8 digits long and include at least one numeric digit.",
            )
            .await?;
            return Ok(None);
        }

        if !self.ctx.store.create_account(&name, &password).await {
            self.prompt(CREATOR_BOT, "Name already exists.").await?;
            return Ok(None);
        }
        Ok(Some(name))
    }

    /// One login attempt. `None` re-enters the menu; a wrong password is
    /// silent, an unknown name gets explicit feedback.
    async fn login(&mut self) -> Result<Option<String>, ServerError> {
        self.prompt(LOGIN_BOT, "Enter username: ").await?;
        let name = self.read_line().await?;

        if !self.ctx.store.find_account(&name).await {
            self.prompt(LOGIN_BOT, "Invalid username.").await?;
            return Ok(None);
        }

        self.prompt(LOGIN_BOT, "Enter password: ").await?;
        let password = Zeroizing::new(self.read_line().await?);
        if !self.ctx.store.verify_credentials(&name, &password).await {
            return Ok(None);
        }
        Ok(Some(name))
    }

    /// Replay today's history addressed to this name or broadcast.
    async fn replay_history(&self, name: &str) {
        for record in self.ctx.store.history_for_recipient(name).await {
            let msg = if record.target == name {
                ChatMessage::at(
                    record.content,
                    format!("(from) {}", record.sender),
                    record.target,
                    record.time,
                )
            } else {
                ChatMessage::at(record.content, record.sender, record.target, record.time)
            };
            if wire::write_line(&self.writer, &msg.assemble()).await.is_err() {
                break;
            }
        }
    }

    /// The Active loop: read, classify, dispatch. Ends on stream error,
    /// an explicit quit, or external close.
    async fn chat_loop(&mut self, name: &str) -> Result<(), ServerError> {
        loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                // Decode/stream failures in the chat loop are treated as
                // a closed connection.
                Err(_) => return Ok(()),
            };

            match command::classify(&line) {
                Command::Quit => return Ok(()),
                Command::Broadcast(text) => {
                    self.ctx
                        .router
                        .broadcast(ChatMessage::broadcast(text, name))
                        .await;
                }
                Command::Whisper { target, content } => {
                    self.handle_whisper(name, target, content).await?;
                }
            }
        }
    }

    /// Whisper dispatch plus the sender's echo.
    ///
    /// A whisper without content, or to a name that is neither online nor
    /// a known account, is dropped without feedback.
    async fn handle_whisper(
        &self,
        name: &str,
        target: &str,
        content: Option<&str>,
    ) -> Result<(), ServerError> {
        let Some(content) = content else {
            return Ok(());
        };
        let known = self.ctx.registry.is_online(target).await
            || self.ctx.store.find_account(target).await;
        if !known {
            return Ok(());
        }

        let delivered = self
            .ctx
            .router
            .whisper(ChatMessage::to(content, name, target))
            .await;

        let mut echo = ChatMessage::broadcast(content, format!("To {target}"));
        if !self.ctx.registry.is_online(target).await || !delivered {
            echo.add_fix("(offline)");
        }
        wire::write_line(&self.writer, &echo.assemble()).await
    }

    /// Teardown: remove from the registry, announce departure if the
    /// session ever reached Active, release the socket.
    async fn close(&mut self) {
        let was_active = self.state == SessionState::Active;
        self.state = SessionState::Closed;

        if self.ctx.registry.remove(&self.identity).await {
            tracing::info!(client = %self.identity, "client disconnected, removing from registry");
            if was_active {
                self.ctx
                    .router
                    .broadcast(ChatMessage::broadcast(
                        format!("({}) has left the chat.", self.identity),
                        ANNOUNCER,
                    ))
                    .await;
            }
        }
    }

    /// Direct system line to this connection only (never routed or
    /// persisted).
    async fn prompt(&self, persona: &str, text: &str) -> Result<(), ServerError> {
        let line = ChatMessage::broadcast(text, persona).assemble();
        wire::write_line(&self.writer, &line).await
    }

    /// Read the next framed message from this connection.
    async fn read_line(&mut self) -> Result<String, ServerError> {
        loop {
            if let Some(payload) = self.frame.next_frame()? {
                // Lossy like the legacy peers: obfuscated payloads are
                // not guaranteed to be valid UTF-8.
                return Ok(String::from_utf8_lossy(&payload).into_owned());
            }
            let n = self.reader.read(self.frame.writable()).await?;
            if n == 0 {
                return Err(ServerError::ConnectionClosed);
            }
            self.frame.advance(n)?;
        }
    }
}

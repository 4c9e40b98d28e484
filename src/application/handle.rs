use tokio::sync::{mpsc, oneshot, watch};

use crate::auth::AuthProvider;
use crate::domain::{EntryId, LedgerEntry, NewEntry};

use super::{AppError, LedgerService, LedgerSnapshot, RefreshReport};

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, AppError>>;

enum Command {
    BindUser { uid: String, reply: Reply<()> },
    AddEntry { fields: NewEntry, reply: Reply<LedgerEntry> },
    DeleteEntry { id: EntryId, reply: Reply<Option<LedgerEntry>> },
    Refresh { reply: Reply<RefreshReport> },
}

/// Cloneable handle to a [`LedgerService`] running on its own task.
///
/// The task is the single owner of the cached entries: commands are applied
/// one at a time in arrival order, each store call completing before the next
/// command starts. After every command the task publishes a fresh
/// [`LedgerSnapshot`], so observers always see entries and summary together.
#[derive(Clone)]
pub struct LedgerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<LedgerSnapshot>,
}

impl LedgerHandle {
    /// Move `service` onto a new task. Must be called within a tokio runtime.
    pub fn spawn(service: LedgerService) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (publisher, snapshots) = watch::channel(service.snapshot());
        tokio::spawn(run(service, receiver, publisher));
        Self {
            commands,
            snapshots,
        }
    }

    pub async fn bind_user(&self, uid: impl Into<String>) -> Result<(), AppError> {
        let uid = uid.into();
        self.request(|reply| Command::BindUser { uid, reply }).await
    }

    pub async fn bind_authenticated(&self, auth: &dyn AuthProvider) -> Result<(), AppError> {
        let user = auth.authenticated_user()?;
        self.bind_user(user.uid).await
    }

    pub async fn add_entry(&self, fields: NewEntry) -> Result<LedgerEntry, AppError> {
        self.request(|reply| Command::AddEntry { fields, reply }).await
    }

    pub async fn delete_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, AppError> {
        self.request(|reply| Command::DeleteEntry { id, reply }).await
    }

    pub async fn refresh(&self) -> Result<RefreshReport, AppError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.snapshots.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| AppError::TaskStopped)?;
        response.await.map_err(|_| AppError::TaskStopped)?
    }
}

async fn run(
    mut service: LedgerService,
    mut commands: mpsc::Receiver<Command>,
    publisher: watch::Sender<LedgerSnapshot>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::BindUser { uid, reply } => {
                let result = service.bind_user(&uid);
                let _ = reply.send(result);
            }
            Command::AddEntry { fields, reply } => {
                let result = service.add_entry(fields).await;
                publish(&service, &publisher, result.is_ok());
                let _ = reply.send(result);
            }
            Command::DeleteEntry { id, reply } => {
                let result = service.delete_entry(id).await;
                publish(&service, &publisher, result.is_ok());
                let _ = reply.send(result);
            }
            Command::Refresh { reply } => {
                let result = service.refresh().await;
                publish(&service, &publisher, result.is_ok());
                let _ = reply.send(result);
            }
        }
    }
    tracing::debug!("ledger task stopped");
}

/// Publish before replying so a caller that awaited the command reads the
/// state it produced.
fn publish(service: &LedgerService, publisher: &watch::Sender<LedgerSnapshot>, changed: bool) {
    if changed {
        publisher.send_replace(service.snapshot());
    }
}

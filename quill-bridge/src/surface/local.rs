//! In-process rendering surface.
//!
//! Runs an [`EmbeddedRuntime`] on its own task. The host never touches the
//! runtime directly: documents and statements travel over the command
//! queue, messages come back over the event queue.

use super::{RenderingSurface, SurfaceError, SurfaceEvent};
use quill_core::runtime::EmbeddedRuntime;
use quill_core::runtime::observer::SizeModel;
use tokio::sync::{mpsc, oneshot};

const EVENT_QUEUE_DEPTH: usize = 1024;

type UserAction = Box<dyn FnOnce(&mut EmbeddedRuntime) + Send>;

/// Work for the document task.
enum SurfaceCommand {
    Load(String),
    Inject(String),
    /// Something the user does inside the document (select, type).
    User(UserAction),
}

pub struct LocalSurface {
    /// Unbounded: commands are only lost once the document task is gone.
    cmd_tx: mpsc::UnboundedSender<SurfaceCommand>,
}

impl std::fmt::Debug for LocalSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSurface")
            .field("closed", &self.cmd_tx.is_closed())
            .finish()
    }
}

impl LocalSurface {
    /// Start the document task. Must be called from inside a tokio runtime.
    ///
    /// The task ends when the surface is dropped or the event receiver goes
    /// away.
    pub fn spawn(namespace: &str, size_model: SizeModel) -> (Self, mpsc::Receiver<SurfaceEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let namespace = namespace.to_string();

        tokio::spawn(async move {
            tracing::debug!(namespace = %namespace, "document task started");
            let mut runtime: Option<EmbeddedRuntime> = None;

            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    SurfaceCommand::Load(document) => {
                        match EmbeddedRuntime::load(&document, &namespace, size_model) {
                            Ok(loaded) => {
                                runtime = Some(loaded);
                                if event_tx.send(SurfaceEvent::LoadEnd).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "document failed to load"),
                        }
                    }
                    SurfaceCommand::Inject(script) => match runtime.as_mut() {
                        Some(rt) => {
                            if let Err(e) = rt.execute(&script) {
                                tracing::warn!(error = %e, script = %script, "statement rejected");
                            }
                        }
                        None => tracing::debug!("statement dropped: no document loaded"),
                    },
                    SurfaceCommand::User(action) => match runtime.as_mut() {
                        Some(rt) => action(rt),
                        None => tracing::debug!("user action dropped: no document loaded"),
                    },
                }

                let Some(rt) = runtime.as_mut() else {
                    continue;
                };
                let mut closed = false;
                for message in rt.drain_messages() {
                    if event_tx.send(SurfaceEvent::Message(message)).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
            tracing::debug!(namespace = %namespace, "document task ended");
        });

        (Self { cmd_tx }, event_rx)
    }

    /// Run `action` against the live document as if the user did it, and
    /// hand back its result. Messages it causes are posted as usual.
    pub async fn with_runtime<R, F>(&self, action: F) -> Result<R, SurfaceError>
    where
        R: Send + 'static,
        F: FnOnce(&mut EmbeddedRuntime) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let action: UserAction = Box::new(move |rt| {
            let _ = reply_tx.send(action(rt));
        });
        self.submit(SurfaceCommand::User(action))?;
        // The action is dropped unrun when nothing is loaded.
        reply_rx.await.map_err(|_| SurfaceError::NotLoaded)
    }

    /// Current markup of the editable root.
    pub async fn inner_html(&self) -> Result<String, SurfaceError> {
        self.with_runtime(|rt| rt.inner_html()).await
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    fn submit(&self, cmd: SurfaceCommand) -> Result<(), SurfaceError> {
        self.cmd_tx.send(cmd).map_err(|_| SurfaceError::Closed)
    }
}

impl RenderingSurface for LocalSurface {
    fn load(&mut self, document: String) -> Result<(), SurfaceError> {
        self.submit(SurfaceCommand::Load(document))
    }

    fn inject(&mut self, script: String) -> Result<(), SurfaceError> {
        self.submit(SurfaceCommand::Inject(script))
    }
}

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

type Spawn = Box<dyn FnOnce(CancellationToken) -> JoinHandle<()> + Send>;

/// Collects background loops, starts them together and stops them in the
/// order they were added. Each loop gets its own child token of the runner's
/// root token.
pub struct TaskRunner {
    root: CancellationToken,
    tasks: Vec<(&'static str, Spawn)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(CancellationToken) -> JoinHandle<()> + Send + 'static,
    {
        self.tasks.push((name, Box::new(task)));
    }

    pub fn start_all(self) -> RunningTasks {
        let tasks = self
            .tasks
            .into_iter()
            .map(|(name, spawn)| {
                let token = self.root.child_token();
                let handle = spawn(token.clone());
                info!(task = name, "task started");
                RunningTask { name, token, handle }
            })
            .collect();
        RunningTasks {
            root: self.root,
            tasks,
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

struct RunningTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct RunningTasks {
    root: CancellationToken,
    tasks: Vec<RunningTask>,
}

impl RunningTasks {
    /// Cancels everything at once; `stop_all` still has to be awaited.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Stops each task in turn and waits for it to finish before moving on.
    pub async fn stop_all(self) {
        for task in self.tasks {
            task.token.cancel();
            match task.handle.await {
                Ok(()) => info!(task = task.name, "task stopped"),
                Err(err) => warn!(task = task.name, %err, "task ended abnormally"),
            }
        }
        self.root.cancel();
    }
}

//! Scripted engine doubles shared by the unit tests.

use async_trait::async_trait;
use rai_local_ai::{
    ChatCompletion, ChatMessage, EngineFactory, InferenceEngine, LoadProgress, LocalAIError,
    ProgressCallback, SamplingParams,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// What the engine answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Fail,
}

/// Behavior and call log shared by every engine a [`ScriptedFactory`] builds.
pub struct Script {
    pub creates: AtomicUsize,
    pub reloads: AtomicUsize,
    pub fail_load: AtomicBool,
    pub reply: Mutex<Reply>,
    pub last_messages: Mutex<Vec<ChatMessage>>,
    /// Hold every completion until a permit is added to `release`.
    pub hold: AtomicBool,
    pub release: Semaphore,
    /// Notified when a completion starts.
    pub entered: Notify,
    /// Hold every reload after its first progress report until a permit is
    /// added to `reload_release`.
    pub hold_reload: AtomicBool,
    pub reload_release: Semaphore,
    /// Notified when a reload reaches its hold point.
    pub reload_entered: Notify,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            creates: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
            fail_load: AtomicBool::new(false),
            reply: Mutex::new(Reply::Text(
                "That sounds like a lot to carry. What feels heaviest today?".to_string(),
            )),
            last_messages: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
            release: Semaphore::new(0),
            entered: Notify::new(),
            hold_reload: AtomicBool::new(false),
            reload_release: Semaphore::new(0),
            reload_entered: Notify::new(),
        })
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }
}

pub struct ScriptedEngine {
    script: Arc<Script>,
    progress: Option<ProgressCallback>,
    loaded: Option<String>,
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    async fn reload(&mut self, model_id: &str) -> Result<(), LocalAIError> {
        self.script.reloads.fetch_add(1, Ordering::SeqCst);
        if let Some(callback) = &self.progress {
            callback(LoadProgress::new(0.25, "Fetching param cache[1/2]"));
        }
        self.script.reload_entered.notify_one();
        if self.script.hold_reload.load(Ordering::SeqCst) {
            self.script.reload_release.acquire().await.unwrap().forget();
        }
        tokio::task::yield_now().await;
        if self.script.fail_load.load(Ordering::SeqCst) {
            return Err(LocalAIError::DownloadFailed("connection reset".to_string()));
        }
        if let Some(callback) = &self.progress {
            callback(LoadProgress::new(1.0, "Fetching param cache[2/2]"));
        }
        self.loaded = Some(model_id.to_string());
        Ok(())
    }

    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        _params: &SamplingParams,
    ) -> Result<ChatCompletion, LocalAIError> {
        if self.loaded.is_none() {
            return Err(LocalAIError::NoModelLoaded);
        }
        *self.script.last_messages.lock().unwrap() = messages.to_vec();
        self.script.entered.notify_one();
        if self.script.hold.load(Ordering::SeqCst) {
            self.script.release.acquire().await.unwrap().forget();
        }

        let reply = self.script.reply.lock().unwrap().clone();
        match reply {
            Reply::Text(text) => Ok(ChatCompletion::from_text(text)),
            Reply::Empty => Ok(ChatCompletion::default()),
            Reply::Fail => Err(LocalAIError::Api("500: out of memory".to_string())),
        }
    }
}

pub struct ScriptedFactory {
    pub script: Arc<Script>,
}

impl ScriptedFactory {
    pub fn new() -> (Arc<Self>, Arc<Script>) {
        let script = Script::new();
        (
            Arc::new(Self {
                script: script.clone(),
            }),
            script,
        )
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self) -> Box<dyn InferenceEngine> {
        self.script.creates.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedEngine {
            script: self.script.clone(),
            progress: None,
            loaded: None,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

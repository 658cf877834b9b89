use crate::api::models::ActiveReport;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Commands represent side effects that apps want to perform.
/// They are returned from the update() function and executed by the runtime.
pub enum Command<Msg> {
    /// Do nothing
    None,

    /// Execute multiple commands in sequence
    Batch(Vec<Command<Msg>>),

    /// Perform an async operation and send the result as a message
    Perform(Pin<Box<dyn Future<Output = Msg> + Send>>),

    /// Switch to a different app
    Navigate(AppTarget),

    /// Show a toast notification
    Notify(Notice),

    /// Quit the application
    Quit,
}

/// Where a navigation command lands, with the target app's parameters.
#[derive(Debug, Clone)]
pub enum AppTarget {
    ProjectSelect,
    ReportEditor(EditorParams),
}

/// Startup parameters of the report editor.
#[derive(Debug, Clone)]
pub struct EditorParams {
    pub project: String,
    pub report: ActiveReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast shown by the runtime until its time-to-live expires.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn ttl(&self) -> Duration {
        match self.level {
            NoticeLevel::Info | NoticeLevel::Success => Duration::from_secs(4),
            NoticeLevel::Warning => Duration::from_secs(6),
            NoticeLevel::Error => Duration::from_secs(8),
        }
    }
}

impl<Msg> Command<Msg> {
    /// Helper to create a command that performs an async operation
    pub fn perform<F, T>(future: F, to_msg: impl Fn(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        Msg: Send + 'static,
    {
        Command::Perform(Box::pin(async move {
            let result = future.await;
            to_msg(result)
        }))
    }

    /// Helper to navigate to another app
    pub fn navigate(target: AppTarget) -> Self {
        Command::Navigate(target)
    }

    /// Helper to batch multiple commands
    pub fn batch(commands: Vec<Command<Msg>>) -> Self {
        Command::Batch(commands)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Command::Notify(Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        })
    }

    pub fn success(text: impl Into<String>) -> Self {
        Command::Notify(Notice {
            level: NoticeLevel::Success,
            text: text.into(),
        })
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Command::Notify(Notice {
            level: NoticeLevel::Warning,
            text: text.into(),
        })
    }

    pub fn error(text: impl Into<String>) -> Self {
        Command::Notify(Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        })
    }
}

impl<Msg> Default for Command<Msg> {
    fn default() -> Self {
        Command::None
    }
}

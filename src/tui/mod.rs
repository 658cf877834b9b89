pub mod app;
pub mod apps;
pub mod command;
pub mod modal;
pub mod resource;
pub mod runtime;
pub mod subscription;
pub mod theme;
pub mod widgets;

pub use app::{App, KeyResponse};
pub use command::{AppTarget, Command, EditorParams};
pub use modal::ConfirmModal;
pub use resource::Resource;
pub use runtime::{Runtime, RuntimeExit, init_terminal, restore_terminal};
pub use subscription::Subscription;
pub use theme::Theme;
pub use widgets::{ListState, TextInputState};

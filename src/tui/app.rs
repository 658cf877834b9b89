use super::command::Command;
use super::subscription::Subscription;
use super::theme::Theme;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;

/// Outcome of offering a key press to the app before the subscriptions run.
///
/// `Consumed` lets focused inputs and open modals swallow keys that would
/// otherwise trigger a global binding.
pub enum KeyResponse<Msg> {
    /// Not interested; check the key subscriptions.
    Ignored,
    /// Handled internally, no message to dispatch.
    Consumed,
    /// Handled, dispatch this message.
    Msg(Msg),
}

/// The trait every TUI app implements.
///
/// Follows the Elm architecture:
/// - State: the app's current state
/// - Msg: events that can happen
/// - update: handles messages and returns commands for the runtime to run
/// - view: renders the current state
/// - subscriptions: the global keys the app wants to receive
pub trait App: Sized + Send + 'static {
    /// The app's state type
    type State: Send + 'static;

    /// The app's message type
    type Msg: Send + 'static;

    /// Parameters handed over on navigation
    type Params;

    /// Build the initial state, optionally kicking off a command
    fn init(params: Self::Params) -> (Self::State, Command<Self::Msg>);

    /// Update the state based on a message and return a command
    fn update(state: &mut Self::State, msg: Self::Msg) -> Command<Self::Msg>;

    /// Render the current state
    fn view(state: &mut Self::State, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Declare the global key bindings this app wants
    fn subscriptions(state: &Self::State) -> Vec<Subscription<Self::Msg>>;

    /// First shot at a key press, for focused inputs and open modals.
    fn on_key(_state: &mut Self::State, _key: KeyEvent) -> KeyResponse<Self::Msg> {
        KeyResponse::Ignored
    }

    /// Return the app's title for the header bar
    fn title() -> &'static str;

    /// Return optional status text (dynamic, styled based on state)
    fn status(_state: &Self::State, _theme: &Theme) -> Option<Line<'static>> {
        None
    }

    /// Veto or warn about quitting. An `Err` message is shown once; a second
    /// quit request goes through regardless (the warning is advisory).
    fn can_exit(_state: &Self::State) -> Result<(), String> {
        Ok(())
    }
}

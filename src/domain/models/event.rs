use tui_textarea::Input;

use super::InstagramResult;
use super::NaveenaError;
use super::TextResult;
use super::ViewMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
    Manual,
    Realtime,
}

/// Completions delivered back to the orchestrator's loop. Every variant
/// carries the generation of the flow invocation that produced it.
#[derive(Debug)]
pub enum Event {
    DebounceElapsed(u64),
    TextAnalyzed {
        generation: u64,
        mode: TextMode,
        input: String,
        result: Result<TextResult, NaveenaError>,
    },
    InstagramPhase {
        generation: u64,
        message: String,
    },
    InstagramAnalyzed {
        generation: u64,
        reference: String,
        result: Result<InstagramResult, NaveenaError>,
    },
}

/// Everything the terminal loop reacts to: orchestrator completions plus
/// keyboard input already mapped to dashboard actions.
pub enum UiEvent {
    Orchestrator(Event),
    KeyboardCharInput(Input),
    KeyboardPaste(String),
    KeyboardCTRLC(),
    KeyboardCTRLL(),
    KeyboardCTRLO(),
    KeyboardCTRLT(),
    KeyboardCTRLX(),
    KeyboardEnter(),
    KeyboardEsc(),
    KeyboardTab(),
    KeyboardView(ViewMode),
    UISelectDown(),
    UISelectUp(),
    UITick(),
}

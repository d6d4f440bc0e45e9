#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub message: String,
}

impl LoadingState {
    pub fn idle() -> LoadingState {
        return LoadingState::default();
    }

    pub fn pending(message: &str) -> LoadingState {
        return LoadingState {
            is_loading: true,
            message: message.to_string(),
        };
    }
}

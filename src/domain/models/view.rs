use strum::EnumIter;
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, strum::Display)]
pub enum ViewMode {
    #[default]
    Dashboard,
    Text,
    Instagram,
}

impl ViewMode {
    pub fn index(&self) -> usize {
        return ViewMode::iter().position(|e| return e == *self).unwrap_or(0);
    }

    pub fn next(&self) -> ViewMode {
        let modes = ViewMode::iter().collect::<Vec<ViewMode>>();
        return modes[(self.index() + 1) % modes.len()];
    }

    pub fn titles() -> Vec<String> {
        return ViewMode::iter().map(|e| return e.to_string()).collect();
    }
}

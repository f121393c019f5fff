/// Counter application state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterState {
    pub count: i64,
    /// Value `Reset` returns to
    pub start: i64,
    pub finished: bool,
}

impl CounterState {
    pub fn new(start: i64) -> Self {
        Self {
            count: start,
            start,
            finished: false,
        }
    }

    /// Copy of this state with the count limited to `-limit..=limit`.
    pub fn clamped(self, limit: i64) -> Self {
        let limit = limit.abs();
        Self {
            count: self.count.clamp(-limit, limit),
            ..self
        }
    }
}

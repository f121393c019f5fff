/// Actions understood by the counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Add(i64),
    Reset,
    /// Leaves the state untouched; shows up on the indistinct view only
    Refresh,
    /// Marks the run as complete so observers can stop
    Finish,
}

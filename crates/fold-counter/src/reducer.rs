use crate::actions::CounterAction;
use crate::state::CounterState;

/// Reducer - pure function that produces new state from current state + action
pub fn reduce(state: &CounterState, action: &CounterAction) -> CounterState {
    let mut next = state.clone();
    match action {
        CounterAction::Increment => next.count += 1,
        CounterAction::Decrement => next.count -= 1,
        CounterAction::Add(amount) => next.count += amount,
        CounterAction::Reset => next.count = state.start,
        CounterAction::Refresh => {}
        CounterAction::Finish => next.finished = true,
    }
    next
}

#![allow(dead_code)]

use casn::AtomicArray;
use rand::Rng;
use todc_utils::linearizability::history::ProcessId;
use todc_utils::{Action, History, Specification, WGLChecker};
use tracing::{debug, trace};

cfg_if::cfg_if! {
    if #[cfg(feature = "shuttle")] {
        pub(crate) use shuttle::sync::{Arc, Mutex};
        pub(crate) use shuttle::thread;
    } else {
        pub(crate) use std::sync::{Arc, Mutex};
        pub(crate) use std::thread;
    }
}

/// An operation on an `AtomicArray<i32>`, with its arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Invocation {
    Get {
        index: usize,
    },
    Set {
        index: usize,
        value: i32,
    },
    Cas {
        index: usize,
        expected: i32,
        update: i32,
    },
    Cas2 {
        index1: usize,
        expected1: i32,
        update1: i32,
        index2: usize,
        expected2: i32,
        update2: i32,
    },
}

/// What an [Invocation] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Return {
    Value(i32),
    Done,
    Swapped(bool),
}

impl Invocation {
    /// Pick an operation over `size` slots with arguments in `0..=max_value`.
    pub fn random<R: Rng>(rng: &mut R, size: usize, max_value: i32) -> Self {
        let kind: u8 = rng.gen_range(0..4);
        let (a, b) = (rng.gen_range(0..size), rng.gen_range(0..size));
        let mut value = || rng.gen_range(0..=max_value);
        match kind {
            0 => Invocation::Get { index: a },
            1 => Invocation::Set {
                index: a,
                value: value(),
            },
            2 => Invocation::Cas {
                index: a,
                expected: value(),
                update: value(),
            },
            _ => Invocation::Cas2 {
                index1: a,
                expected1: value(),
                update1: value(),
                index2: b,
                expected2: value(),
                update2: value(),
            },
        }
    }

    /// Run this operation against the concurrent array.
    pub fn perform(&self, array: &AtomicArray<i32>) -> Return {
        match *self {
            Invocation::Get { index } => Return::Value(array.get(index).unwrap()),
            Invocation::Set { index, value } => {
                array.set(index, value).unwrap();
                Return::Done
            }
            Invocation::Cas {
                index,
                expected,
                update,
            } => Return::Swapped(array.cas(index, expected, update).unwrap()),
            Invocation::Cas2 {
                index1,
                expected1,
                update1,
                index2,
                expected2,
                update2,
            } => Return::Swapped(
                array
                    .cas2(index1, expected1, update1, index2, expected2, update2)
                    .unwrap(),
            ),
        }
    }

    /// Run this operation against plain values, one operation at a time.
    pub fn apply(&self, values: &mut [i32]) -> Return {
        match *self {
            Invocation::Get { index } => Return::Value(values[index]),
            Invocation::Set { index, value } => {
                values[index] = value;
                Return::Done
            }
            Invocation::Cas {
                index,
                expected,
                update,
            } => {
                if values[index] != expected {
                    return Return::Swapped(false);
                }
                values[index] = update;
                Return::Swapped(true)
            }
            Invocation::Cas2 {
                index1,
                expected1,
                update1,
                index2,
                expected2,
                update2,
            } => {
                if values[index1] != expected1 || values[index2] != expected2 {
                    return Return::Swapped(false);
                }
                values[index1] = update1;
                values[index2] = update2;
                Return::Swapped(true)
            }
        }
    }
}

/// The number of slots in the arrays whose histories are checked.
pub const NUM_SLOTS: usize = 5;

/// An operation together with what it returned. Calls are recorded before the return value is
/// known, as `None`.
pub type ArrayOperation = (Invocation, Option<Return>);

/// The sequential behaviour of an array of [NUM_SLOTS] slots starting out as zeroes.
pub struct ArraySpecification;

impl Specification for ArraySpecification {
    type State = [i32; NUM_SLOTS];
    type Operation = ArrayOperation;

    fn init() -> Self::State {
        [0; NUM_SLOTS]
    }

    fn apply(operation: &ArrayOperation, state: &Self::State) -> (bool, Self::State) {
        let (invocation, returned) = operation;
        let returned: Return = returned.expect("Cannot apply an operation with unknown result");
        let mut next: Self::State = *state;
        if invocation.apply(&mut next) == returned {
            (true, next)
        } else {
            (false, *state)
        }
    }
}

/// An array that records every call and response made on it, in real-time order.
pub struct RecordingArray {
    actions: Mutex<Vec<(ProcessId, Action<ArrayOperation>)>>,
    array: AtomicArray<i32>,
}

impl RecordingArray {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(vec![]),
            array: AtomicArray::new(NUM_SLOTS, 0),
        }
    }

    fn record(&self, process: ProcessId, action: Action<ArrayOperation>) {
        let mut actions = self.actions.lock().unwrap();
        actions.push((process, action));
    }

    pub fn perform(&self, process: ProcessId, invocation: Invocation) {
        self.record(process, Action::Call((invocation, None)));
        let returned: Return = invocation.perform(&self.array);
        trace!("process {process}: {invocation:?} returned {returned:?}");
        self.record(process, Action::Response((invocation, Some(returned))));
    }

    pub fn history(&self) -> History<ArrayOperation> {
        History::from_actions(self.actions.lock().unwrap().clone())
    }
}

/// Run every plan on its own thread against a fresh zeroed array and record the history.
pub(crate) fn record_history(plans: Vec<Vec<Invocation>>) -> History<ArrayOperation> {
    let array: Arc<RecordingArray> = Arc::new(RecordingArray::new());

    let join_handles: Vec<thread::JoinHandle<()>> = plans
        .into_iter()
        .enumerate()
        .map(|(process, plan)| {
            let array: Arc<RecordingArray> = array.clone();
            thread::spawn(move || {
                for invocation in plan {
                    array.perform(process, invocation);
                }
            })
        })
        .collect();
    join_handles
        .into_iter()
        .for_each(|join_handle| join_handle.join().expect("A thread panicked"));

    array.history()
}

/// Asserts that a recorded history of array operations is linearizable.
///
/// # Panics
///
/// Panics if no sequential ordering of the history explains every returned value.
pub(crate) fn assert_linearizable(history: History<ArrayOperation>) {
    debug!("{history:?}");
    assert!(WGLChecker::<ArraySpecification>::is_linearizable(history));
}

/// On five zeroed slots, thread A swaps slots 0 and 1 from 0 to 1 together while thread B reads
/// slot 0, tries to swap slot 1 back from 1 to 0 and reads slot 1.
pub(crate) fn two_slot_scenario() {
    let plans: Vec<Vec<Invocation>> = vec![
        vec![Invocation::Cas2 {
            index1: 0,
            expected1: 0,
            update1: 1,
            index2: 1,
            expected2: 0,
            update2: 1,
        }],
        vec![
            Invocation::Get { index: 0 },
            Invocation::Cas {
                index: 1,
                expected: 1,
                update: 0,
            },
            Invocation::Get { index: 1 },
        ],
    ];
    assert_linearizable(record_history(plans));
}

/// Every thread repeatedly increments two distinct slots together with `cas2`, retrying until it
/// gets through. No increment may be lost.
pub(crate) fn paired_increments<const NUM_THREADS: usize, const NUM_TARGETS: usize>(
    num_increments: usize,
) {
    let array: Arc<AtomicArray<usize>> = Arc::new(AtomicArray::new(NUM_TARGETS, 0));

    let join_handles: Vec<thread::JoinHandle<()>> = (0..NUM_THREADS)
        .map(|t| {
            let array: Arc<AtomicArray<usize>> = array.clone();
            thread::spawn(move || {
                for n in 0..num_increments {
                    let i: usize = (t + n) % NUM_TARGETS;
                    let j: usize = (i + 1 + n % (NUM_TARGETS - 1)) % NUM_TARGETS;
                    loop {
                        let v_i: usize = array.get(i).unwrap();
                        let v_j: usize = array.get(j).unwrap();
                        if array.cas2(i, v_i, v_i + 1, j, v_j, v_j + 1).unwrap() {
                            break;
                        }
                    }
                }
            })
        })
        .collect();
    join_handles
        .into_iter()
        .for_each(|join_handle| join_handle.join().expect("A thread panicked"));

    let sum: usize = (0..NUM_TARGETS).map(|i| array.get(i).unwrap()).sum();
    assert_eq!(sum, 2 * NUM_THREADS * num_increments);
}

/// Writers move slots 0 and 1 forward together with `cas2`, so they always hold the same value.
/// A reader checks that a `cas2` expecting them to differ never succeeds and that a `cas2`
/// expecting them to be equal only fails once they have moved on.
pub(crate) fn pair_stays_equal<const NUM_WRITERS: usize>(num_steps: usize) {
    let array: Arc<AtomicArray<usize>> = Arc::new(AtomicArray::new(3, 0));

    let mut join_handles: Vec<thread::JoinHandle<()>> = (0..NUM_WRITERS)
        .map(|_| {
            let array: Arc<AtomicArray<usize>> = array.clone();
            thread::spawn(move || {
                for _ in 0..num_steps {
                    loop {
                        let value: usize = array.get(0).unwrap();
                        if array.cas2(0, value, value + 1, 1, value, value + 1).unwrap() {
                            break;
                        }
                    }
                }
            })
        })
        .collect();

    let reader_array: Arc<AtomicArray<usize>> = array.clone();
    join_handles.push(thread::spawn(move || {
        let array = reader_array;
        let mut last_seen: usize = 0;
        for _ in 0..num_steps {
            let value: usize = array.get(0).unwrap();
            assert!(value >= last_seen);
            last_seen = value;
            assert!(!array.cas2(0, value, value, 1, value + 1, value).unwrap());
            if !array.cas2(0, value, value, 1, value, value).unwrap() {
                assert!(array.get(1).unwrap() > value);
            }
        }
    }));

    join_handles
        .into_iter()
        .for_each(|join_handle| join_handle.join().expect("A thread panicked"));
    assert_eq!(array.get(0).unwrap(), NUM_WRITERS * num_steps);
    assert_eq!(array.get(1).unwrap(), NUM_WRITERS * num_steps);
    assert_eq!(array.get(2).unwrap(), 0);
}

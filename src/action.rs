//! What a mock does when an expectation matches a call.
//!
//! Attach an action with [`Expectations::will`](crate::Expectations::will).
//! Expectations without one answer with the mockery's default action,
//! [`ReturnDefaultValue`] unless configured otherwise.

use std::{
    fmt::{self, Formatter},
    marker::PhantomData,
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    invocation::Invocation,
    proxy::Imposteriser,
    value::{Arg, Synthesis, Value},
};

/// The answer to a matched invocation.
pub trait Action: fmt::Display + Send + Sync {
    fn invoke(&self, invocation: &Invocation) -> Result<Value>;
}

impl<A: Action + ?Sized> Action for Arc<A> {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        (**self).invoke(invocation)
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        (**self).invoke(invocation)
    }
}

/// Returns the same value every time.
pub struct ReturnValue(Value);

impl Action for ReturnValue {
    fn invoke(&self, _: &Invocation) -> Result<Value> {
        Ok(self.0.clone())
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "return {:?}", self.0)
    }
}

/// Creates a [`ReturnValue`] action.
pub fn returns<T: Arg>(value: T) -> ReturnValue {
    ReturnValue(value.into_value())
}

/// Fails the invocation with [`Error::Action`].
pub struct Fail(String);

impl Action for Fail {
    fn invoke(&self, _: &Invocation) -> Result<Value> {
        Err(Error::Action {
            message: self.0.clone(),
        })
    }
}

impl fmt::Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "fail with {:?}", self.0)
    }
}

/// Creates a [`Fail`] action.
pub fn fails(message: impl Into<String>) -> Fail {
    Fail(message.into())
}

/// Answers with a closure over the invocation.
pub struct Answer<F, T> {
    answer: F,
    _returns: PhantomData<fn() -> T>,
}

impl<T, F> Action for Answer<F, T>
where
    T: Arg,
    F: Fn(&Invocation) -> T + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        Ok((self.answer)(invocation).into_value())
    }
}

impl<F, T> fmt::Display for Answer<F, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("answer with a closure")
    }
}

/// Creates an [`Answer`] action.
///
/// ```
/// use mockery::{action, Invocation};
///
/// let double = action::answer(|invocation: &Invocation| {
///     invocation.argument::<i32>(0).unwrap_or_default() * 2
/// });
/// ```
pub fn answer<T, F>(answer: F) -> Answer<F, T>
where
    T: Arg,
    F: Fn(&Invocation) -> T + Send + Sync,
{
    Answer {
        answer,
        _returns: PhantomData,
    }
}

/// Performs every action in order and answers with the last one.
pub struct DoAll(Vec<Box<dyn Action>>);

impl Action for DoAll {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        let mut last = Value::Unit;
        for action in &self.0 {
            last = action.invoke(invocation)?;
        }
        Ok(last)
    }
}

impl fmt::Display for DoAll {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.0, ", and ")
    }
}

/// Creates a [`DoAll`] action.
pub fn do_all(actions: impl IntoIterator<Item = Box<dyn Action>>) -> DoAll {
    DoAll(actions.into_iter().collect())
}

/// Performs a different action on each call, failing once they run
/// out.
pub struct OnConsecutiveCalls {
    actions: Vec<Box<dyn Action>>,
    next: Mutex<usize>,
}

impl Action for OnConsecutiveCalls {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        let index = {
            let mut next = self.next.lock();
            let index = *next;
            *next += 1;
            index
        };

        match self.actions.get(index) {
            Some(action) => action.invoke(invocation),
            None => Err(Error::Action {
                message: format!(
                    "no more actions available for {} after {} calls",
                    invocation,
                    self.actions.len()
                ),
            }),
        }
    }
}

impl fmt::Display for OnConsecutiveCalls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.actions, ", then ")
    }
}

/// Creates an [`OnConsecutiveCalls`] action.
pub fn on_consecutive_calls(
    actions: impl IntoIterator<Item = Box<dyn Action>>,
) -> OnConsecutiveCalls {
    OnConsecutiveCalls {
        actions: actions.into_iter().collect(),
        next: Mutex::new(0),
    }
}

/// Returns each value in turn, one per call.
pub fn returns_each<T: Arg>(values: impl IntoIterator<Item = T>) -> OnConsecutiveCalls {
    on_consecutive_calls(
        values
            .into_iter()
            .map(|value| Box::new(returns(value)) as Box<dyn Action>),
    )
}

/// Blocks the calling thread before answering with `()`.
pub struct Sleep(Duration);

impl Action for Sleep {
    fn invoke(&self, _: &Invocation) -> Result<Value> {
        std::thread::sleep(self.0);
        Ok(Value::Unit)
    }
}

impl fmt::Display for Sleep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "sleep for {:?}", self.0)
    }
}

/// Creates a [`Sleep`] action.
pub fn sleep(duration: Duration) -> Sleep {
    Sleep(duration)
}

/// Records the arguments of the latest call so a test can inspect
/// them afterwards.
///
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RememberParameters {
    remembered: Arc<Mutex<Option<Vec<Value>>>>,
}

impl RememberParameters {
    pub fn new() -> Self {
        RememberParameters::default()
    }

    /// The argument at `index` of the latest call, if there was one
    /// and it has type `T`.
    pub fn get<T: Arg>(&self, index: usize) -> Option<T> {
        self.remembered
            .lock()
            .as_ref()
            .and_then(|arguments| arguments.get(index))
            .and_then(T::from_value)
    }

    pub fn is_empty(&self) -> bool {
        self.remembered.lock().is_none()
    }
}

impl Action for RememberParameters {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        *self.remembered.lock() = Some(invocation.arguments().to_vec());
        Ok(Value::Unit)
    }
}

impl fmt::Display for RememberParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("remember the parameters")
    }
}

/// Answers with a default value of the method's return type: zero,
/// `false`, empty text and collections, `None`, or an inert imposter.
pub struct ReturnDefaultValue {
    imposteriser: Arc<dyn Imposteriser>,
}

impl ReturnDefaultValue {
    pub fn new(imposteriser: Arc<dyn Imposteriser>) -> Self {
        ReturnDefaultValue { imposteriser }
    }
}

impl Action for ReturnDefaultValue {
    fn invoke(&self, invocation: &Invocation) -> Result<Value> {
        let returns = invocation.method().return_type();
        returns
            .stand_in(&Synthesis::default_value(&self.imposteriser))
            .ok_or_else(|| Error::Action {
                message: format!(
                    "no default value of {} to return from {}",
                    returns, invocation
                ),
            })
    }
}

impl fmt::Display for ReturnDefaultValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("return a default value")
    }
}

fn write_joined(
    f: &mut Formatter<'_>,
    actions: &[Box<dyn Action>],
    separator: &str,
) -> fmt::Result {
    let mut actions = actions.iter();
    if let Some(first) = actions.next() {
        write!(f, "{}", first)?;
    }
    actions.try_for_each(|action| write!(f, "{}{}", separator, action))
}

//! The seam between generated (or hand-written) imposters and the
//! mockery.

use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use crate::{
    error::{Error, Result},
    invocation::{Invocation, MethodSig, MockRef},
    value::{Arg, Args, Synthesis, TypeDesc, Value},
};

/// Receives every call made on an imposter.
pub trait Invokable: Send + Sync {
    fn invoke(&self, invocation: Invocation) -> Result<Value>;
}

/// Handle an imposter uses to forward its calls.
///
/// An imposter is an object implementing the mocked trait whose
/// methods do nothing but forward to [`Proxy::call`]:
///
/// ```
/// use std::sync::Arc;
/// use mockery::{Proxy, Shared};
///
/// pub trait Turtle: Send + Sync {
///     fn forward(&self, distance: i32);
///     fn heading(&self) -> i32;
/// }
///
/// impl Shared for dyn Turtle {}
///
/// struct TurtleImposter(Proxy);
///
/// impl Turtle for TurtleImposter {
///     fn forward(&self, distance: i32) {
///         self.0.call("forward", (distance,))
///     }
///
///     fn heading(&self) -> i32 {
///         self.0.call("heading", ())
///     }
/// }
///
/// let mockery = mockery::Mockery::builder()
///     .imposter(|proxy| Arc::new(TurtleImposter(proxy)) as Arc<dyn Turtle>)
///     .build();
/// let turtle: Arc<dyn Turtle> = mockery.mock();
/// ```
#[derive(Clone)]
pub struct Proxy {
    target: MockRef,
    handler: Arc<dyn Invokable>,
}

impl Proxy {
    pub fn new(target: MockRef, handler: Arc<dyn Invokable>) -> Self {
        Proxy { target, handler }
    }

    /// A proxy that answers every call with a default value.
    pub(crate) fn inert(imposteriser: Arc<dyn Imposteriser>, ty: &TypeDesc) -> Self {
        Proxy {
            target: MockRef::new(usize::MAX, format!("<{}>", ty.name())),
            handler: Arc::new(Inert { imposteriser }),
        }
    }

    pub fn target(&self) -> &MockRef {
        &self.target
    }

    /// Forwards a call and converts its answer.
    ///
    /// # Panics
    ///
    /// If the call is unexpected, the action failed, or the answer is
    /// not an `R`. Use [`try_call`](Proxy::try_call) for the error
    /// instead.
    #[track_caller]
    pub fn call<A: Args, R: Arg>(&self, method: &'static str, args: A) -> R {
        match self.try_call(method, args) {
            Ok(returned) => returned,
            Err(e) => panic!("mockery: {}", e),
        }
    }

    pub fn try_call<A: Args, R: Arg>(&self, method: &'static str, args: A) -> Result<R> {
        let invocation = Invocation::new(
            self.target.clone(),
            MethodSig::of::<A, R>(method),
            args.into_values(),
        );
        let returned = self.handler.invoke(invocation)?;
        R::from_value(&returned).ok_or_else(|| Error::ReturnType {
            expected: any::type_name::<R>(),
            found: format!("{:?}", returned),
        })
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("target", &self.target)
            .finish()
    }
}

struct Inert {
    imposteriser: Arc<dyn Imposteriser>,
}

impl Invokable for Inert {
    fn invoke(&self, invocation: Invocation) -> Result<Value> {
        let returns = invocation.method().return_type();
        returns
            .stand_in(&Synthesis::default_value(&self.imposteriser))
            .ok_or_else(|| Error::Imposteriser {
                ty: returns.name(),
                reason: "no default value can be synthesised".to_string(),
            })
    }
}

/// Creates objects of a requested type that forward every call to a
/// [`Proxy`].
pub trait Imposteriser: Send + Sync {
    fn can_imposterise(&self, ty: &TypeDesc) -> bool;

    /// Creates an object of type `ty`. `auxiliary` names extra types
    /// the object should also implement.
    fn imposterise(&self, proxy: Proxy, ty: &TypeDesc, auxiliary: &[TypeDesc]) -> Result<Value>;
}

type Factory = Arc<dyn Fn(Proxy) -> Value + Send + Sync>;

/// An [`Imposteriser`] backed by registered factories, one per type.
#[derive(Clone, Default)]
pub struct Imposters {
    factories: HashMap<TypeId, Factory>,
}

impl Imposters {
    pub fn new() -> Self {
        Imposters::default()
    }

    /// Registers the factory for imposters of `T`, replacing any
    /// earlier one.
    pub fn register<T: Arg>(&mut self, factory: impl Fn(Proxy) -> T + Send + Sync + 'static) {
        self.factories.insert(
            TypeId::of::<T>(),
            Arc::new(move |proxy: Proxy| factory(proxy).into_value()),
        );
    }
}

impl Imposteriser for Imposters {
    fn can_imposterise(&self, ty: &TypeDesc) -> bool {
        self.factories.contains_key(&ty.id())
    }

    fn imposterise(&self, proxy: Proxy, ty: &TypeDesc, auxiliary: &[TypeDesc]) -> Result<Value> {
        if !auxiliary.is_empty() {
            return Err(Error::Imposteriser {
                ty: ty.name(),
                reason: format!("auxiliary types are not supported: {:?}", auxiliary),
            });
        }

        let factory = self.factories.get(&ty.id()).ok_or_else(|| Error::Imposteriser {
            ty: ty.name(),
            reason: "no imposter was registered for it".to_string(),
        })?;
        Ok(factory(proxy))
    }
}

impl fmt::Debug for Imposters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Imposters")
            .field("registered", &self.factories.len())
            .finish()
    }
}

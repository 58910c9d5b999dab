use std::{
    fmt::{self, Formatter},
    sync::Arc,
};

use crate::value::{Arg, Args, TypeDesc, Value};

/// Identifies one mock object within its mockery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MockRef {
    id: usize,
    name: Arc<str>,
}

impl MockRef {
    pub(crate) fn new(id: usize, name: impl Into<Arc<str>>) -> Self {
        MockRef {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The signature of a mocked method.
///
/// Two signatures are the same method when their names and parameter
/// types agree.
#[derive(Debug, Clone)]
pub struct MethodSig {
    name: &'static str,
    parameters: Vec<TypeDesc>,
    returns: TypeDesc,
}

impl MethodSig {
    pub fn of<A: Args, R: Arg>(name: &'static str) -> Self {
        MethodSig {
            name,
            parameters: A::parameter_types(),
            returns: R::type_desc(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[TypeDesc] {
        &self.parameters
    }

    pub fn return_type(&self) -> &TypeDesc {
        &self.returns
    }

    pub(crate) fn same_method(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.parameters == other.parameters
    }
}

/// One call on a mock: the receiver, the method and its arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    target: MockRef,
    method: MethodSig,
    arguments: Vec<Value>,
}

impl Invocation {
    pub fn new(target: MockRef, method: MethodSig, arguments: Vec<Value>) -> Self {
        Invocation {
            target,
            method,
            arguments,
        }
    }

    pub fn target(&self) -> &MockRef {
        &self.target
    }

    pub fn method(&self) -> &MethodSig {
        &self.method
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// The argument at `index`, if it has type `T`.
    pub fn argument<T: Arg>(&self, index: usize) -> Option<T> {
        self.arguments.get(index).and_then(T::from_value)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.target, self.method.name)?;
        let mut arguments = self.arguments.iter();
        if let Some(first) = arguments.next() {
            write!(f, "{:?}", first)?;
        }
        arguments.try_for_each(|argument| write!(f, ", {:?}", argument))?;
        f.write_str(")")
    }
}

//! Erased argument and return values.
//!
//! Every argument that crosses a [`Proxy`](crate::Proxy) is turned
//! into a [`Value`] so expectations over different methods can live in
//! one list. Shared objects (`Arc<_>`) keep their identity; everything
//! else is compared by value.

use std::{
    any::{self, Any, TypeId},
    fmt::{self, Formatter},
    sync::Arc,
};

use paste::paste;

use crate::proxy::{Imposteriser, Proxy};

/// The erased form of one argument or return value.
#[derive(Clone)]
pub enum Value {
    /// `()`
    Unit,
    /// A primitive, compared by value.
    Scalar(Scalar),
    /// Owned text, compared by value.
    Text(String),
    /// A value behind an `Arc`, compared by identity.
    Object(Object),
    /// An `Option<T>`.
    Option(Option<Box<Value>>),
    /// A `Vec<T>`.
    List(Vec<Value>),
    /// A `Result<T, E>`.
    Outcome(Result<Box<Value>, Box<Value>>),
    /// A plain value type registered through [`value_type!`](crate::value_type).
    Other(Arc<dyn DynValue>),
}

impl Value {
    /// Wraps a plain value type.
    pub fn other<T: DynValue>(value: T) -> Self {
        Value::Other(Arc::new(value))
    }

    /// Returns the wrapped value type if this is one of type `T`.
    pub fn downcast_other<T: DynValue>(&self) -> Option<&T> {
        match self {
            Value::Other(other) => DynValue::as_any(&**other).downcast_ref(),
            _ => None,
        }
    }

    /// Returns the scalar inside, if any.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Whether this value is looked up by identity rather than by
    /// equality.
    pub fn has_identity(&self) -> bool {
        matches!(self, Value::Object(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.addr == b.addr,
            (Value::Option(a), Value::Option(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Outcome(a), Value::Outcome(b)) => a == b,
            (Value::Other(a), Value::Other(b)) => DynValue::dyn_eq(&**a, &**b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Scalar(scalar) => write!(f, "{:?}", scalar),
            Value::Text(text) => write!(f, "{:?}", text),
            Value::Object(object) => write!(f, "{:?}", object),
            Value::Option(None) => f.write_str("None"),
            Value::Option(Some(value)) => write!(f, "Some({:?})", value),
            Value::List(values) => f.debug_list().entries(values).finish(),
            Value::Outcome(Ok(value)) => write!(f, "Ok({:?})", value),
            Value::Outcome(Err(value)) => write!(f, "Err({:?})", value),
            Value::Other(other) => write!(f, "{:?}", other),
        }
    }
}

/// A primitive argument.
///
/// Floats compare by their bits, so a literal `NaN` matches `NaN` and
/// `0.0` does not match `-0.0`.
#[derive(Clone, Copy)]
pub enum Scalar {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    ISize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    USize(usize),
    F32(f32),
    F64(f64),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Scalar::F32(a), Scalar::F32(b)) => a.to_bits() == b.to_bits(),
            (Scalar::F64(a), Scalar::F64(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Char(a), Scalar::Char(b)) => a == b,
            (Scalar::I8(a), Scalar::I8(b)) => a == b,
            (Scalar::I16(a), Scalar::I16(b)) => a == b,
            (Scalar::I32(a), Scalar::I32(b)) => a == b,
            (Scalar::I64(a), Scalar::I64(b)) => a == b,
            (Scalar::ISize(a), Scalar::ISize(b)) => a == b,
            (Scalar::U8(a), Scalar::U8(b)) => a == b,
            (Scalar::U16(a), Scalar::U16(b)) => a == b,
            (Scalar::U32(a), Scalar::U32(b)) => a == b,
            (Scalar::U64(a), Scalar::U64(b)) => a == b,
            (Scalar::USize(a), Scalar::USize(b)) => a == b,
            _ => false,
        }
    }
}

/// How a scalar collision can be re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Boolean(bool),
    Character(char),
    /// An integral value inside the `i8` range.
    Byte(i8),
    Unhandled,
}

impl Scalar {
    pub(crate) fn category(&self) -> Category {
        match *self {
            Scalar::Bool(b) => Category::Boolean(b),
            Scalar::Char(c) => Category::Character(c),
            Scalar::F32(_) | Scalar::F64(_) => Category::Unhandled,
            _ => self
                .integral()
                .and_then(|i| i8::try_from(i).ok())
                .map_or(Category::Unhandled, Category::Byte),
        }
    }

    fn integral(&self) -> Option<i128> {
        Some(match *self {
            Scalar::I8(v) => v.into(),
            Scalar::I16(v) => v.into(),
            Scalar::I32(v) => v.into(),
            Scalar::I64(v) => v.into(),
            Scalar::ISize(v) => i128::try_from(v).ok()?,
            Scalar::U8(v) => v.into(),
            Scalar::U16(v) => v.into(),
            Scalar::U32(v) => v.into(),
            Scalar::U64(v) => v.into(),
            Scalar::USize(v) => i128::try_from(v).ok()?,
            _ => return None,
        })
    }

    /// Whether this is an unsigned integer.
    pub(crate) fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Scalar::U8(_) | Scalar::U16(_) | Scalar::U32(_) | Scalar::U64(_) | Scalar::USize(_)
        )
    }

    /// The same integral type holding `value`.
    pub(crate) fn with_byte(&self, value: i8) -> Option<Scalar> {
        let wide = i64::from(value);
        Some(match *self {
            Scalar::I8(_) => Scalar::I8(value),
            Scalar::I16(_) => Scalar::I16(value.into()),
            Scalar::I32(_) => Scalar::I32(value.into()),
            Scalar::I64(_) => Scalar::I64(wide),
            Scalar::ISize(_) => Scalar::ISize(value.into()),
            Scalar::U8(_) => Scalar::U8(u8::try_from(wide).ok()?),
            Scalar::U16(_) => Scalar::U16(u16::try_from(wide).ok()?),
            Scalar::U32(_) => Scalar::U32(u32::try_from(wide).ok()?),
            Scalar::U64(_) => Scalar::U64(u64::try_from(wide).ok()?),
            Scalar::USize(_) => Scalar::USize(usize::try_from(wide).ok()?),
            _ => return None,
        })
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{:?}", v),
            Scalar::Char(v) => write!(f, "{:?}", v),
            Scalar::I8(v) => write!(f, "{:?}", v),
            Scalar::I16(v) => write!(f, "{:?}", v),
            Scalar::I32(v) => write!(f, "{:?}", v),
            Scalar::I64(v) => write!(f, "{:?}", v),
            Scalar::ISize(v) => write!(f, "{:?}", v),
            Scalar::U8(v) => write!(f, "{:?}", v),
            Scalar::U16(v) => write!(f, "{:?}", v),
            Scalar::U32(v) => write!(f, "{:?}", v),
            Scalar::U64(v) => write!(f, "{:?}", v),
            Scalar::USize(v) => write!(f, "{:?}", v),
            Scalar::F32(v) => write!(f, "{:?}", v),
            Scalar::F64(v) => write!(f, "{:?}", v),
        }
    }
}

/// A shared value, identified by the address it points to.
#[derive(Clone)]
pub struct Object {
    addr: usize,
    type_name: &'static str,
    // keeps the pointee alive so the address is never reused while
    // this value exists
    handle: Arc<dyn Any + Send + Sync>,
}

impl Object {
    pub fn new<T: ?Sized + Send + Sync + 'static>(shared: Arc<T>) -> Self {
        Object {
            addr: Arc::as_ptr(&shared) as *const () as usize,
            type_name: any::type_name::<T>(),
            handle: Arc::new(shared),
        }
    }

    /// The address of the shared value.
    pub fn addr(&self) -> usize {
        self.addr
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the `Arc<T>` this object was created from.
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.handle.downcast_ref::<Arc<T>>().cloned()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}@{:#x}>", self.type_name, self.addr)
    }
}

/// Object-safe equality for plain value types.
pub trait DynValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynValue) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynValue) -> bool {
        DynValue::as_any(other)
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// What kind of type a [`TypeDesc`] describes.
///
/// The kind decides how a stand-in is synthesised for a `with(..)`
/// clause and how its placeholder is matched back to a real argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Unit,
    Bool,
    Char,
    Integer { signed: bool, bits: u32 },
    Float { bits: u32 },
    Text,
    /// `Arc<[T]>`; stands in as a fresh zero-length array.
    Array,
    /// `Arc<dyn Trait>`; stands in as an inert imposter.
    Interface,
    /// A concrete type behind an `Arc`.
    Concrete,
    /// A plain value type.
    Value,
    /// `Option`, `Vec` or `Result`.
    Composite,
}

/// Runtime description of a parameter or return type.
#[derive(Clone)]
pub struct TypeDesc {
    name: &'static str,
    id: TypeId,
    kind: TypeKind,
    stand_in: fn(&Synthesis<'_>) -> Option<Value>,
}

impl TypeDesc {
    pub fn of<T: Arg>() -> Self {
        TypeDesc {
            name: any::type_name::<T>(),
            id: TypeId::of::<T>(),
            kind: T::kind(),
            stand_in: T::stand_in,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Synthesises a stand-in of this type.
    pub fn stand_in(&self, synthesis: &Synthesis<'_>) -> Option<Value> {
        (self.stand_in)(synthesis)
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Context handed to stand-in synthesis.
pub struct Synthesis<'a> {
    imposteriser: &'a Arc<dyn Imposteriser>,
    position: Option<usize>,
}

impl<'a> Synthesis<'a> {
    /// Synthesis of the placeholder for the `with(..)` clause at
    /// `position`.
    pub(crate) fn placeholder(imposteriser: &'a Arc<dyn Imposteriser>, position: usize) -> Self {
        Synthesis {
            imposteriser,
            position: Some(position),
        }
    }

    /// Synthesis of a default return value.
    pub(crate) fn default_value(imposteriser: &'a Arc<dyn Imposteriser>) -> Self {
        Synthesis {
            imposteriser,
            position: None,
        }
    }

    /// The position of the placeholder being synthesised, if this is a
    /// placeholder rather than a default return value.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Creates an inert imposter of `T` whose methods all return
    /// default values.
    pub fn imposterise<T: Arg>(&self) -> Option<T> {
        let ty = T::type_desc();
        if !self.imposteriser.can_imposterise(&ty) {
            return None;
        }
        let proxy = Proxy::inert(self.imposteriser.clone(), &ty);
        let value = self.imposteriser.imposterise(proxy, &ty, &[]).ok()?;
        T::from_value(&value)
    }
}

/// A type that can be passed to or returned from a mocked method.
///
/// Implemented for the primitives, `String`, `Option`, `Vec`,
/// `Result`, and `Arc<T>` for any `T: ?Sized + Shared`. Use
/// [`value_type!`](crate::value_type) for plain value types.
pub trait Arg: Clone + Send + Sync + 'static {
    fn kind() -> TypeKind;
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;

    /// Builds a placeholder (for `with(..)`) or a default return value.
    fn stand_in(synthesis: &Synthesis<'_>) -> Option<Value>;

    fn type_desc() -> TypeDesc {
        TypeDesc::of::<Self>()
    }
}

impl Arg for () {
    fn kind() -> TypeKind {
        TypeKind::Unit
    }

    fn into_value(self) -> Value {
        Value::Unit
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Unit => Some(()),
            _ => None,
        }
    }

    fn stand_in(_: &Synthesis<'_>) -> Option<Value> {
        Some(Value::Unit)
    }
}

macro_rules! scalar_arg {
    ($($ty:ty => $variant:ident: $kind:expr, $zero:expr;)+) => {$(
        impl Arg for $ty {
            fn kind() -> TypeKind {
                $kind
            }

            fn into_value(self) -> Value {
                Value::Scalar(Scalar::$variant(self))
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Scalar(Scalar::$variant(v)) => Some(*v),
                    _ => None,
                }
            }

            fn stand_in(_: &Synthesis<'_>) -> Option<Value> {
                Some(Value::Scalar(Scalar::$variant($zero)))
            }
        }
    )+};
}

scalar_arg! {
    bool => Bool: TypeKind::Bool, false;
    char => Char: TypeKind::Char, '\0';
    i8 => I8: TypeKind::Integer { signed: true, bits: 8 }, 0;
    i16 => I16: TypeKind::Integer { signed: true, bits: 16 }, 0;
    i32 => I32: TypeKind::Integer { signed: true, bits: 32 }, 0;
    i64 => I64: TypeKind::Integer { signed: true, bits: 64 }, 0;
    isize => ISize: TypeKind::Integer { signed: true, bits: isize::BITS }, 0;
    u8 => U8: TypeKind::Integer { signed: false, bits: 8 }, 0;
    u16 => U16: TypeKind::Integer { signed: false, bits: 16 }, 0;
    u32 => U32: TypeKind::Integer { signed: false, bits: 32 }, 0;
    u64 => U64: TypeKind::Integer { signed: false, bits: 64 }, 0;
    usize => USize: TypeKind::Integer { signed: false, bits: usize::BITS }, 0;
    f32 => F32: TypeKind::Float { bits: 32 }, 0.0;
    f64 => F64: TypeKind::Float { bits: 64 }, 0.0;
}

impl Arg for String {
    fn kind() -> TypeKind {
        TypeKind::Text
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn stand_in(synthesis: &Synthesis<'_>) -> Option<Value> {
        // placeholders must never equal text a test would pass
        let text = match synthesis.position() {
            Some(position) => format!("\u{0}placeholder#{}", position),
            None => String::new(),
        };
        Some(Value::Text(text))
    }
}

impl<T: Arg> Arg for Option<T> {
    fn kind() -> TypeKind {
        TypeKind::Composite
    }

    fn into_value(self) -> Value {
        Value::Option(self.map(|v| Box::new(v.into_value())))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Option(None) => Some(None),
            Value::Option(Some(inner)) => T::from_value(inner).map(Some),
            _ => None,
        }
    }

    fn stand_in(_: &Synthesis<'_>) -> Option<Value> {
        Some(Value::Option(None))
    }
}

impl<T: Arg> Arg for Vec<T> {
    fn kind() -> TypeKind {
        TypeKind::Composite
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Arg::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(values) => values.iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn stand_in(_: &Synthesis<'_>) -> Option<Value> {
        Some(Value::List(vec![]))
    }
}

impl<T: Arg, E: Arg> Arg for Result<T, E> {
    fn kind() -> TypeKind {
        TypeKind::Composite
    }

    fn into_value(self) -> Value {
        Value::Outcome(
            self.map(|ok| Box::new(ok.into_value()))
                .map_err(|err| Box::new(err.into_value())),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Outcome(Ok(ok)) => T::from_value(ok).map(Ok),
            Value::Outcome(Err(err)) => E::from_value(err).map(Err),
            _ => None,
        }
    }

    fn stand_in(synthesis: &Synthesis<'_>) -> Option<Value> {
        T::stand_in(synthesis).map(|ok| Value::Outcome(Ok(Box::new(ok))))
    }
}

/// A type passed around behind an `Arc` and matched by identity.
///
/// Trait objects only need an empty impl; their stand-ins come from
/// the [`Imposteriser`]:
///
/// ```
/// use mockery::Shared;
///
/// pub trait Pen: Send + Sync {
///     fn draw(&self);
/// }
///
/// impl Shared for dyn Pen {}
/// ```
///
/// Concrete types override [`stand_in`](Shared::stand_in) instead.
pub trait Shared: Send + Sync + 'static {
    fn shape() -> TypeKind {
        TypeKind::Interface
    }

    fn stand_in(synthesis: &Synthesis<'_>) -> Option<Arc<Self>> {
        synthesis.imposterise::<Arc<Self>>()
    }
}

impl<T: Arg> Shared for [T] {
    fn shape() -> TypeKind {
        TypeKind::Array
    }

    fn stand_in(_: &Synthesis<'_>) -> Option<Arc<Self>> {
        // every zero-length Arc<[T]> is its own allocation
        Some(Arc::from(Vec::new()))
    }
}

impl Shared for str {
    fn shape() -> TypeKind {
        TypeKind::Concrete
    }

    fn stand_in(_: &Synthesis<'_>) -> Option<Arc<Self>> {
        Some(Arc::from(""))
    }
}

impl<T: ?Sized + Shared> Arg for Arc<T> {
    fn kind() -> TypeKind {
        T::shape()
    }

    fn into_value(self) -> Value {
        Value::Object(Object::new(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => object.downcast::<T>(),
            _ => None,
        }
    }

    fn stand_in(synthesis: &Synthesis<'_>) -> Option<Value> {
        T::stand_in(synthesis).map(|shared| Value::Object(Object::new(shared)))
    }
}

/// Implements [`Arg`] for plain value types.
///
/// The types must be `Clone + PartialEq + Debug + Default + Send +
/// Sync + 'static`. They are matched by equality and their placeholders
/// are their `Default` values, so a `with(..)` clause on one of them
/// cannot be mixed with an equal literal in the same call.
///
/// ```
/// #[derive(Clone, Debug, Default, PartialEq)]
/// pub struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// mockery::value_type!(Point);
/// ```
#[macro_export]
macro_rules! value_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Arg for $ty {
            fn kind() -> $crate::TypeKind {
                $crate::TypeKind::Value
            }

            fn into_value(self) -> $crate::Value {
                $crate::Value::other(self)
            }

            fn from_value(value: &$crate::Value) -> ::std::option::Option<Self> {
                value.downcast_other::<Self>().cloned()
            }

            fn stand_in(_: &$crate::Synthesis<'_>) -> ::std::option::Option<$crate::Value> {
                ::std::option::Option::Some($crate::Value::other(
                    <$ty as ::std::default::Default>::default(),
                ))
            }
        }
    )+};
}

/// The arguments of one method call.
///
/// Implemented for tuples of up to ten [`Arg`]s. Single arguments are
/// wrapped in a one element tuple; don't forget the trailing comma.
pub trait Args {
    fn parameter_types() -> Vec<TypeDesc>;
    fn into_values(self) -> Vec<Value>;
}

impl Args for () {
    fn parameter_types() -> Vec<TypeDesc> {
        vec![]
    }

    fn into_values(self) -> Vec<Value> {
        vec![]
    }
}

// (a,b,c) => tuple!(b,c)
macro_rules! peel {
    ($idx:tt) => ();
    ($idx:tt, $($other:tt),+) => (tuple! { $($other),+ })
}

// implement Args for tuples of Args
macro_rules! tuple {
    ($($idx:tt),+) => (
        paste! {
            impl<$([<A $idx>]: Arg),+> Args for ($([<A $idx>],)+) {
                fn parameter_types() -> Vec<TypeDesc> {
                    vec![$([<A $idx>]::type_desc()),+]
                }

                fn into_values(self) -> Vec<Value> {
                    let ($([<a $idx>],)+) = self;
                    vec![$([<a $idx>].into_value()),+]
                }
            }
        }
        peel! { $($idx),+ }
    )
}

tuple! { 9, 8, 7, 6, 5, 4, 3, 2, 1, 0 }

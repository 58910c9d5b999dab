use std::collections::{BTreeSet, HashMap};

use crate::value::{Category, Scalar, Value};

/// Primitive values a `with(..)` placeholder must no longer take.
#[derive(Debug, Default, Clone)]
pub(crate) struct ForbiddenValues {
    booleans: BTreeSet<bool>,
    characters: BTreeSet<char>,
    bytes: BTreeSet<i8>,
}

impl ForbiddenValues {
    pub fn forbid(&mut self, category: Category) {
        match category {
            Category::Boolean(b) => {
                self.booleans.insert(b);
            }
            Category::Character(c) => {
                self.characters.insert(c);
            }
            Category::Byte(b) => {
                self.bytes.insert(b);
            }
            Category::Unhandled => {}
        }
    }

    pub fn extend(&mut self, other: &ForbiddenValues) {
        self.booleans.extend(&other.booleans);
        self.characters.extend(&other.characters);
        self.bytes.extend(&other.bytes);
    }

    pub fn contains(&self, category: Category) -> bool {
        match category {
            Category::Boolean(b) => self.booleans.contains(&b),
            Category::Character(c) => self.characters.contains(&c),
            Category::Byte(b) => self.bytes.contains(&b),
            Category::Unhandled => false,
        }
    }

    /// The least value of `like`'s type that is neither forbidden nor
    /// `taken`, scanning upwards from the least value of the type (or
    /// `i8::MIN` for wider integers).
    pub fn least_unused(&self, like: &Scalar, taken: &[Category]) -> Option<Scalar> {
        let free = |category: Category| !self.contains(category) && !taken.contains(&category);

        match like.category() {
            Category::Boolean(_) => [false, true]
                .into_iter()
                .find(|&b| free(Category::Boolean(b)))
                .map(Scalar::Bool),
            Category::Character(_) => (0..=u32::from(u16::MAX))
                .filter_map(char::from_u32)
                .find(|&c| free(Category::Character(c)))
                .map(Scalar::Char),
            Category::Byte(_) => {
                let least = if like.is_unsigned() { 0 } else { i8::MIN };
                (least..=i8::MAX)
                    .find(|&b| free(Category::Byte(b)))
                    .and_then(|b| like.with_byte(b))
            }
            Category::Unhandled => None,
        }
    }
}

/// A `with(..)` collision and how to get past it on the next pass.
#[derive(Debug)]
pub(crate) struct Collision {
    pub ordinal: usize,
    pub forbidden: ForbiddenValues,
    pub replacements: Vec<(usize, Value)>,
}

/// The placeholders handed out by `with(..)`, by position, plus what
/// each expectation may no longer use. Survives across passes.
#[derive(Debug, Default)]
pub(crate) struct Placeholders {
    values: Vec<Option<Value>>,
    forbidden: Vec<ForbiddenValues>,
}

impl Placeholders {
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position).and_then(Option::as_ref)
    }

    pub fn supply(&mut self, position: usize, value: Value) {
        if self.values.len() <= position {
            self.values.resize(position + 1, None);
        }
        self.values[position] = Some(value);
    }

    pub fn forbidden(&self, ordinal: usize) -> ForbiddenValues {
        self.forbidden.get(ordinal).cloned().unwrap_or_default()
    }

    pub fn apply(&mut self, collision: Collision) {
        if self.forbidden.len() <= collision.ordinal {
            self.forbidden.resize_with(collision.ordinal + 1, ForbiddenValues::default);
        }
        self.forbidden[collision.ordinal].extend(&collision.forbidden);

        for (position, value) in collision.replacements {
            self.supply(position, value);
        }
    }
}

/// Finds which `with(..)` clause an argument came from: by identity
/// for shared values, by equality for everything else.
pub(crate) struct PlaceholderIndex {
    by_identity: HashMap<usize, usize>,
    by_value: Vec<(Value, usize)>,
}

impl PlaceholderIndex {
    pub fn new<'a>(placeholders: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut index = PlaceholderIndex {
            by_identity: HashMap::new(),
            by_value: vec![],
        };

        for (slot, placeholder) in placeholders.into_iter().enumerate() {
            match placeholder {
                Value::Object(object) => {
                    index.by_identity.insert(object.addr(), slot);
                }
                value => index.by_value.push((value.clone(), slot)),
            }
        }
        index
    }

    pub fn lookup(&self, argument: &Value) -> Option<usize> {
        match argument {
            Value::Object(object) => self.by_identity.get(&object.addr()).copied(),
            argument => self
                .by_value
                .iter()
                .find(|(placeholder, _)| placeholder == argument)
                .map(|(_, slot)| *slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_flip() {
        let mut forbidden = ForbiddenValues::default();
        forbidden.forbid(Category::Boolean(false));
        assert!(matches!(
            forbidden.least_unused(&Scalar::Bool(false), &[]),
            Some(Scalar::Bool(true))
        ));

        forbidden.forbid(Category::Boolean(true));
        assert!(forbidden.least_unused(&Scalar::Bool(false), &[]).is_none());
    }

    #[test]
    fn integers_scan_up_from_the_byte_minimum() {
        let mut forbidden = ForbiddenValues::default();
        forbidden.forbid(Category::Byte(0));
        assert!(matches!(
            forbidden.least_unused(&Scalar::I32(0), &[]),
            Some(Scalar::I32(-128))
        ));
        assert!(matches!(
            forbidden.least_unused(&Scalar::U16(0), &[Category::Byte(1)]),
            Some(Scalar::U16(2))
        ));
    }

    #[test]
    fn pointer_sized_integers_scan_like_the_others() {
        let mut forbidden = ForbiddenValues::default();
        forbidden.forbid(Category::Byte(0));
        assert!(matches!(
            forbidden.least_unused(&Scalar::USize(0), &[]),
            Some(Scalar::USize(1))
        ));
        assert!(matches!(
            forbidden.least_unused(&Scalar::ISize(0), &[]),
            Some(Scalar::ISize(-128))
        ));
    }

    #[test]
    fn wide_values_are_unhandled() {
        let forbidden = ForbiddenValues::default();
        assert!(forbidden.least_unused(&Scalar::I64(1 << 40), &[]).is_none());
        assert!(forbidden.least_unused(&Scalar::F64(0.0), &[]).is_none());
    }

    #[test]
    fn looks_up_shared_values_by_identity() {
        let a: std::sync::Arc<str> = "same".into();
        let b: std::sync::Arc<str> = "same".into();
        let placeholders = [
            crate::Arg::into_value(a.clone()),
            crate::Arg::into_value(3_i32),
        ];
        let index = PlaceholderIndex::new(&placeholders);

        assert_eq!(index.lookup(&crate::Arg::into_value(a)), Some(0));
        assert_eq!(index.lookup(&crate::Arg::into_value(b)), None);
        assert_eq!(index.lookup(&crate::Arg::into_value(3_i32)), Some(1));
        assert_eq!(index.lookup(&crate::Arg::into_value(3_i64)), None);
    }
}

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{
    placeholder::{Collision, ForbiddenValues, PlaceholderIndex},
    Pass,
};
use crate::{
    error::{Error, Result},
    invocation::Invocation,
    matcher::{AllParameters, Literal, ParameterMatcher},
    proxy::{Imposteriser, Invokable},
    value::{Category, Synthesis, Value},
};

/// A `with(..)` clause waiting for the call it was passed to.
pub(crate) struct WithSlot {
    pub position: usize,
    pub placeholder: Value,
    pub matcher: Box<dyn ParameterMatcher>,
}

/// Handler behind a capturing stand-in: records the first call made on
/// it as the method and parameters of one expectation.
pub(crate) struct Capture {
    pass: Weak<Mutex<Pass>>,
    ordinal: usize,
    imposteriser: Arc<dyn Imposteriser>,
}

impl Capture {
    pub fn new(
        pass: Weak<Mutex<Pass>>,
        ordinal: usize,
        imposteriser: Arc<dyn Imposteriser>,
    ) -> Self {
        Capture {
            pass,
            ordinal,
            imposteriser,
        }
    }
}

impl Invokable for Capture {
    fn invoke(&self, invocation: Invocation) -> Result<Value> {
        let pass = self.pass.upgrade().ok_or_else(|| {
            Error::build(format!(
                "{} was called on a stand-in after its specification finished",
                invocation
            ))
        })?;
        pass.lock().capture(self.ordinal, &invocation);
        drop(pass);

        // reply with something inert so the specification can carry on
        let returns = invocation.method().return_type();
        returns
            .stand_in(&Synthesis::default_value(&self.imposteriser))
            .ok_or_else(|| Error::Imposteriser {
                ty: returns.name(),
                reason: "no value can be returned from a capturing stand-in".to_string(),
            })
    }
}

pub(crate) enum Unresolved {
    Collision(Collision),
    Ambiguous(String),
}

/// Works out one matcher per argument of a captured call.
///
/// With no `with(..)` clauses every argument is a literal; with one per
/// argument they are used in order. Otherwise each argument is looked
/// up among the placeholders the clauses handed out, and anything not
/// found is a literal.
pub(crate) fn resolve_parameters(
    ordinal: usize,
    withs: Vec<WithSlot>,
    arguments: &[Value],
    forbidden: &ForbiddenValues,
) -> Result<AllParameters, Unresolved> {
    if withs.len() > arguments.len() {
        return Err(Unresolved::Ambiguous(format!(
            "{} with() clauses were given for a call with {} arguments",
            withs.len(),
            arguments.len()
        )));
    }

    if withs.len() == arguments.len() {
        return Ok(AllParameters::new(
            withs.into_iter().map(|with| with.matcher).collect(),
        ));
    }

    if withs.is_empty() {
        return Ok(AllParameters::new(
            arguments
                .iter()
                .map(|argument| {
                    Box::new(Literal::new(argument.clone())) as Box<dyn ParameterMatcher>
                })
                .collect(),
        ));
    }

    if let Some(collision) = find_collision(ordinal, &withs, arguments, forbidden)? {
        return Err(Unresolved::Collision(collision));
    }

    let index = PlaceholderIndex::new(withs.iter().map(|with| &with.placeholder));
    let slots: Vec<_> = arguments.iter().map(|argument| index.lookup(argument)).collect();

    for (slot, with) in withs.iter().enumerate() {
        let uses = slots.iter().filter(|&&used| used == Some(slot)).count();
        if uses != 1 {
            return Err(Unresolved::Ambiguous(format!(
                "the placeholder {:?} from with() clause #{} reached the call {} times",
                with.placeholder, with.position, uses
            )));
        }
    }

    let mut matchers: Vec<_> = withs.into_iter().map(|with| Some(with.matcher)).collect();
    Ok(AllParameters::new(
        arguments
            .iter()
            .zip(slots)
            .map(|(argument, slot)| {
                slot.and_then(|slot| matchers[slot].take())
                    .unwrap_or_else(|| {
                        Box::new(Literal::new(argument.clone())) as Box<dyn ParameterMatcher>
                    })
            })
            .collect(),
    ))
}

/// Finds placeholders that cannot be told apart from each other or
/// from a literal argument, and picks new values for them.
fn find_collision(
    ordinal: usize,
    withs: &[WithSlot],
    arguments: &[Value],
    forbidden: &ForbiddenValues,
) -> Result<Option<Collision>, Unresolved> {
    let mut newly_forbidden = ForbiddenValues::default();
    let mut moving = vec![];
    let mut seen: Vec<&Value> = vec![];

    for with in withs {
        let value = &with.placeholder;
        if value.has_identity() || seen.contains(&value) {
            continue;
        }
        seen.push(value);

        let holders: Vec<usize> = (0..withs.len())
            .filter(|&slot| &withs[slot].placeholder == value)
            .collect();
        let occurrences = arguments.iter().filter(|&argument| argument == value).count();
        if holders.len() <= 1 && occurrences <= 1 {
            continue;
        }

        let scalar = match value.as_scalar() {
            Some(scalar) if scalar.category() != Category::Unhandled => *scalar,
            _ => {
                return Err(Unresolved::Ambiguous(format!(
                    "the placeholder {:?} from with() clause #{} cannot be told apart from an equal argument",
                    value, with.position
                )))
            }
        };
        newly_forbidden.forbid(scalar.category());

        // more arguments than placeholders hold the value: a literal
        // shares it, so every placeholder must move
        let movers = if occurrences > holders.len() {
            &holders[..]
        } else {
            &holders[1..]
        };
        moving.extend(movers.iter().map(|&slot| (slot, scalar)));
    }

    if moving.is_empty() {
        return Ok(None);
    }

    for argument in arguments {
        let literal = !withs.iter().any(|with| &with.placeholder == argument);
        if let (true, Some(scalar)) = (literal, argument.as_scalar()) {
            newly_forbidden.forbid(scalar.category());
        }
    }

    let mut all_forbidden = forbidden.clone();
    all_forbidden.extend(&newly_forbidden);

    let mut taken: Vec<Category> = (0..withs.len())
        .filter(|slot| !moving.iter().any(|(mover, _)| mover == slot))
        .filter_map(|slot| withs[slot].placeholder.as_scalar())
        .map(|scalar| scalar.category())
        .collect();

    let mut replacements = vec![];
    for (slot, like) in moving {
        let replacement = all_forbidden.least_unused(&like, &taken).ok_or_else(|| {
            Unresolved::Ambiguous(format!(
                "no unused value is left for the placeholder of with() clause #{}",
                withs[slot].position
            ))
        })?;
        taken.push(replacement.category());
        replacements.push((withs[slot].position, Value::Scalar(replacement)));
    }

    Ok(Some(Collision {
        ordinal,
        forbidden: newly_forbidden,
        replacements,
    }))
}

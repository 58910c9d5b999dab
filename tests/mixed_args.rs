mod common;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use common::{Point, Turtle};
use mockery::{
    matcher::{any, eq, same},
    pattern, Error,
};

fn rejects(call: impl FnOnce()) -> bool {
    panic::catch_unwind(AssertUnwindSafe(call)).is_err()
}

#[test]
fn matchers_and_literals_in_one_call() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.jump(e.with(pattern!(i32 => x if *x > 0))?, 7);
            Ok(())
        })
        .unwrap();

    turtle.jump(1, 7);
    turtle.jump(50, 7);
    assert!(rejects(|| turtle.jump(1, 8)));
    assert!(rejects(|| turtle.jump(-1, 7)));
}

#[test]
fn literal_equal_to_the_first_placeholder() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    // the placeholder for x starts out as 0, the same as the literal
    mockery
        .checking(|e| {
            e.allowing(&turtle)?.jump(e.with(eq(5))?, 0);
            Ok(())
        })
        .unwrap();

    turtle.jump(5, 0);
    assert!(rejects(|| turtle.jump(0, 0)));
    assert!(rejects(|| turtle.jump(5, 5)));
}

#[test]
fn colliding_booleans_are_told_apart() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?
                .flash(e.with(eq(true))?, e.with(eq(false))?, "x".to_string());
            Ok(())
        })
        .unwrap();

    turtle.flash(true, false, "x".to_string());
    assert!(rejects(|| turtle.flash(true, true, "x".to_string())));
    assert!(rejects(|| turtle.flash(false, false, "x".to_string())));
    assert!(rejects(|| turtle.flash(false, true, "x".to_string())));
    assert!(rejects(|| turtle.flash(true, false, "y".to_string())));
}

#[test]
fn both_booleans_by_matcher() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?
                .flash(e.with(eq(false))?, e.with(eq(true))?, e.with(any())?);
            Ok(())
        })
        .unwrap();

    assert!(rejects(|| turtle.flash(true, true, "a".to_string())));
    assert!(rejects(|| turtle.flash(false, false, "a".to_string())));
    assert!(rejects(|| turtle.flash(true, false, "a".to_string())));
    turtle.flash(false, true, "a".to_string());
}

#[test]
fn boolean_placeholder_next_to_an_equal_literal() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.flash(e.with(any())?, false, "x".to_string());
            Ok(())
        })
        .unwrap();

    turtle.flash(true, false, "x".to_string());
    turtle.flash(false, false, "x".to_string());
    assert!(rejects(|| turtle.flash(false, true, "x".to_string())));
}

#[test]
fn byte_range_integers_collide_and_move() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.speed(e.with(eq(3))?, 0);
            e.allowing(&turtle)?.jump(0, e.with(pattern!(i32 => 10..=20))?);
            Ok(())
        })
        .unwrap();

    turtle.speed(3, 0);
    turtle.jump(0, 15);
    assert!(rejects(|| turtle.speed(0, 0)));
    assert!(rejects(|| turtle.jump(15, 0)));
}

#[test]
fn three_booleans_with_room_to_move() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.blink(e.with(eq(true))?, false, false);
            Ok(())
        })
        .unwrap();

    turtle.blink(true, false, false);
    assert!(rejects(|| turtle.blink(false, false, false)));
    assert!(rejects(|| turtle.blink(true, true, false)));
}

#[test]
fn no_boolean_left_is_ambiguous() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    // both placeholders start out equal to the literal, and only one
    // other boolean exists
    let shared = mockery.checking(|e| {
        e.allowing(&turtle)?.blink(e.with(any())?, e.with(any())?, false);
        Ok(())
    });
    assert!(matches!(shared, Err(Error::AmbiguousSpecification { .. })));

    let exhausted = mockery.checking(|e| {
        e.allowing(&turtle)?.blink(e.with(eq(true))?, e.with(eq(false))?, true);
        Ok(())
    });
    assert!(matches!(exhausted, Err(Error::AmbiguousSpecification { .. })));
}

#[test]
fn floats_cannot_be_told_apart() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.resize(e.with(any())?, 2.5);
            e.allowing(&turtle)?.resize(e.with(any())?, e.with(any())?);
            Ok(())
        })
        .unwrap();

    let ambiguous = mockery.checking(|e| {
        e.allowing(&turtle)?.resize(e.with(any())?, 0.0);
        Ok(())
    });
    assert!(matches!(ambiguous, Err(Error::AmbiguousSpecification { .. })));
}

#[test]
fn float_literals_compare_by_bits() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.resize(f64::NAN, 1.0);
            e.allowing(&turtle)?.resize(0.0, 0.0);
            Ok(())
        })
        .unwrap();

    turtle.resize(f64::NAN, 1.0);
    turtle.resize(0.0, 0.0);
    assert!(rejects(|| turtle.resize(-0.0, 0.0)));
}

#[test]
fn pattern_alternatives() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.turn(e.with(pattern!(i32 => 0 | 90 | 180 | 270))?);
            Ok(())
        })
        .unwrap();

    turtle.turn(90);
    turtle.turn(270);
    assert!(rejects(|| turtle.turn(45)));
}

#[test]
fn value_types_equal_to_their_placeholder_are_ambiguous() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.travel(e.with(any())?, Point { x: 1, y: 1 });
            Ok(())
        })
        .unwrap();

    let ambiguous = mockery.checking(|e| {
        e.allowing(&turtle)?.travel(e.with(any())?, Point::default());
        Ok(())
    });
    assert!(matches!(ambiguous, Err(Error::AmbiguousSpecification { .. })));
}

#[test]
fn more_with_clauses_than_arguments() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let result = mockery.checking(|e| {
        let stand_in = e.one_of(&turtle)?;
        let distance = e.with(any())?;
        e.with::<i32, _>(any())?;
        stand_in.forward(distance);
        Ok(())
    });
    assert!(matches!(result, Err(Error::AmbiguousSpecification { .. })));
}

#[test]
fn one_placeholder_passed_twice_never_settles() {
    let mockery = common::builder().max_passes(3).build();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let result = mockery.checking(|e| {
        let stand_in = e.one_of(&turtle)?;
        let x = e.with(any())?;
        stand_in.jump(x, x);
        Ok(())
    });

    match result {
        Err(Error::Build { message }) => assert!(message.contains("did not settle after 3 passes")),
        other => panic!("expected a build error, got {:?}", other),
    }
}

#[test]
fn one_placeholder_passed_twice_is_ambiguous() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let result = mockery.checking(|e| {
        let stand_in = e.one_of(&turtle)?;
        let x = e.with(any())?;
        stand_in.jump(x, x);
        Ok(())
    });
    assert!(matches!(result, Err(Error::AmbiguousSpecification { .. })));
}

#[test]
fn text_placeholders_never_collide_with_literals() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.flash(true, true, e.with(eq("hi".to_string()))?);
            e.one_of(&turtle)?.flash(e.with(eq(true))?, true, String::new());
            Ok(())
        })
        .unwrap();

    turtle.flash(true, true, "hi".to_string());
    turtle.flash(true, true, String::new());
    mockery.assert_is_satisfied();
}

#[test]
fn value_types_match_by_equality() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.goto(Point { x: 1, y: 2 });
            e.one_of(&turtle)?.goto(e.with(pattern!(Point => Point { x, .. } if *x > 10))?);
            Ok(())
        })
        .unwrap();

    turtle.goto(Point { x: 1, y: 2 });
    turtle.goto(Point { x: 11, y: 0 });
    mockery.assert_is_satisfied();
}

#[test]
fn shared_arguments_match_by_identity() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let leader: Arc<dyn Turtle> = mockery.mock_named("leader");
    let impostor: Arc<dyn Turtle> = mockery.mock_named("impostor");

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.follow(e.with(same(&leader))?);
            e.allowing(&turtle)?.follow(impostor.clone());
            Ok(())
        })
        .unwrap();

    turtle.follow(impostor.clone());
    turtle.follow(leader.clone());
    assert!(rejects(|| turtle.follow(leader.clone())));
}

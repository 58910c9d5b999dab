mod common;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use common::{Pen, Turtle};
use mockery::{
    action::returns,
    matcher::{any, eq, param},
    Error, MockRef,
};

#[test]
fn satisfied_by_the_expected_call() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.forward(e.with(eq(10))?);
            Ok(())
        })
        .unwrap();

    turtle.forward(10);
    mockery.assert_is_satisfied();
}

#[test]
fn literal_arguments_match_by_equality() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.jump(3, 4);
            Ok(())
        })
        .unwrap();

    turtle.jump(3, 4);
    mockery.assert_is_satisfied();
}

#[test]
fn reports_what_was_never_called() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.pen_down();
            Ok(())
        })
        .unwrap();

    match mockery.check_satisfied() {
        Err(Error::Unsatisfied { shortfalls }) => {
            assert_eq!(shortfalls.len(), 1);
            assert_eq!(shortfalls[0].remaining, 1);
            assert_eq!(
                shortfalls[0].expectation,
                "expected once, never invoked: turtle.pen_down()"
            );
        }
        other => panic!("expected unsatisfied expectations, got {:?}", other),
    }
}

#[test]
#[should_panic(expected = "not all expectations were satisfied")]
fn asserting_unsatisfied_panics() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.pen_up();
            Ok(())
        })
        .unwrap();

    mockery.assert_is_satisfied();
}

#[test]
#[should_panic(expected = "unexpected invocation: turtle.forward(3)")]
fn unexpected_call_panics_in_the_caller() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.forward(e.with(eq(10))?);
            Ok(())
        })
        .unwrap();

    turtle.forward(3);
}

#[test]
fn unexpected_call_is_reported_again_on_check() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.forward(e.with(eq(10))?);
            Ok(())
        })
        .unwrap();

    let caught = panic::catch_unwind(AssertUnwindSafe(|| turtle.forward(3)));
    assert!(caught.is_err());

    // a later, valid call does not hide the failure
    turtle.forward(10);

    match mockery.check_satisfied() {
        Err(Error::UnexpectedInvocation { invocation, report }) => {
            assert_eq!(invocation, "turtle.forward(3)");
            assert!(report.contains("✗ expected once, never invoked: turtle.forward(10)"));
            assert!(report.contains("Argument did not match."));
        }
        other => panic!("expected an unexpected invocation, got {:?}", other),
    }
}

#[test]
fn report_without_expectations() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let caught = panic::catch_unwind(AssertUnwindSafe(|| turtle.pen_up()));
    assert!(caught.is_err());

    match mockery.check_satisfied() {
        Err(Error::UnexpectedInvocation { report, .. }) => {
            assert_eq!(report, "no expectations have been specified");
        }
        other => panic!("expected an unexpected invocation, got {:?}", other),
    }
}

#[test]
fn allowing_a_mock_allows_every_method() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?;
            Ok(())
        })
        .unwrap();

    turtle.pen_up();
    turtle.forward(1);
    assert_eq!(turtle.heading(), 0);
    assert_eq!(turtle.label("x".to_string()), "");
    assert_eq!(turtle.pen().colour(), '\0');
    mockery.assert_is_satisfied();
}

#[test]
fn will_sets_the_return_value() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.allowing(&turtle)?.heading();
            e.will(returns(270));
            Ok(())
        })
        .unwrap();

    assert_eq!(turtle.heading(), 270);
    assert_eq!(turtle.heading(), 270);
}

#[test]
fn returns_a_mock_from_a_mock() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let pen: Arc<dyn Pen> = mockery.mock();

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.pen();
            e.will(returns(pen.clone()));
            e.one_of(&pen)?.draw(e.with(any())?);
            e.will(returns(true));
            Ok(())
        })
        .unwrap();

    assert!(turtle.pen().draw(12));
    mockery.assert_is_satisfied();
}

#[test]
#[should_panic(expected = "unexpected invocation: turtle.pen_up()")]
fn never_forbids_the_call() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    mockery
        .checking(|e| {
            e.never(&turtle)?.pen_up();
            Ok(())
        })
        .unwrap();

    mockery.assert_is_satisfied();
    turtle.pen_up();
}

#[test]
fn names_mocks_after_their_type() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let other: Arc<dyn Turtle> = mockery.mock_named("leonardo");

    mockery
        .checking(|e| {
            e.one_of(&turtle)?.pen_up();
            e.one_of(&other)?.pen_up();
            Ok(())
        })
        .unwrap();

    turtle.pen_up();
    match mockery.check_satisfied() {
        Err(Error::Unsatisfied { shortfalls }) => {
            assert_eq!(shortfalls.len(), 1);
            assert!(shortfalls[0].expectation.ends_with("leonardo.pen_up()"));
        }
        other => panic!("expected unsatisfied expectations, got {:?}", other),
    }
}

#[test]
fn mock_names_are_unique() {
    let mockery = common::mockery();
    let _first: Arc<dyn Turtle> = mockery.mock();

    let second = mockery.try_mock::<Arc<dyn Turtle>>();
    assert!(matches!(
        second,
        Err(Error::DuplicateMockName { name }) if name == "turtle"
    ));

    let named = mockery.try_mock_named::<Arc<dyn Turtle>>("donatello");
    assert!(named.is_ok());
}

#[test]
fn unknown_types_cannot_be_mocked() {
    trait Unknown: Send + Sync {}
    impl mockery::Shared for dyn Unknown {}

    let mockery = common::mockery();
    let created = mockery.try_mock::<Arc<dyn Unknown>>();
    assert!(matches!(created, Err(Error::Imposteriser { .. })));
}

#[test]
fn expectations_need_a_mock_of_the_same_mockery() {
    let mockery = common::mockery();
    let stranger: Arc<dyn Turtle> = common::mockery().mock();

    let result = mockery.checking(|e| {
        e.one_of(&stranger)?.pen_up();
        Ok(())
    });

    assert!(matches!(result, Err(Error::Build { .. })));
}

#[test]
fn a_stand_in_captures_only_one_call() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let result = mockery.checking(|e| {
        let stand_in = e.one_of(&turtle)?;
        stand_in.pen_up();
        stand_in.pen_down();
        Ok(())
    });

    match result {
        Err(Error::Build { message }) => assert!(message.contains("already captured")),
        other => panic!("expected a build error, got {:?}", other),
    }
}

#[test]
fn with_must_be_passed_to_a_call() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let outside = mockery.checking(|e| {
        e.with::<i32, _>(any())?;
        Ok(())
    });
    assert!(matches!(outside, Err(Error::Build { .. })));

    let uncalled = mockery.checking(|e| {
        let _stand_in = e.one_of(&turtle)?;
        e.with::<i32, _>(any())?;
        Ok(())
    });
    assert!(matches!(uncalled, Err(Error::Build { .. })));
}

#[test]
fn failed_specifications_add_nothing() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();

    let result = mockery.checking(|e| {
        e.one_of(&turtle)?.pen_up();
        "not a number".parse::<i32>()?;
        Ok(())
    });

    assert!(matches!(result, Err(Error::Specification { .. })));
    mockery.assert_is_satisfied();
}

#[test]
fn any_mock_by_method_name() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let other: Arc<dyn Turtle> = mockery.mock_named("raphael");

    mockery
        .checking(|e| {
            e.exactly(2).of_any().method("pen_.*").with_no_arguments();
            Ok(())
        })
        .unwrap();

    turtle.pen_up();
    other.pen_down();
    mockery.assert_is_satisfied();
}

#[test]
fn matching_mocks_with_arguments() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let other: Arc<dyn Turtle> = mockery.mock_named("raphael");

    mockery
        .checking(|e| {
            e.allowing(&other)?;
            e.one_of(&turtle)?.pen_up();
            e.at_least(1)
                .of_matching(|mock: &MockRef| mock.name() == "turtle")
                .method("forward|turn")
                .with_args([param::<i32>(eq(90))]);
            Ok(())
        })
        .unwrap();

    other.turn(90);
    turtle.turn(90);
    turtle.forward(90);
    turtle.pen_up();

    let caught = panic::catch_unwind(AssertUnwindSafe(|| turtle.turn(45)));
    assert!(caught.is_err());
}

#[test]
#[should_panic(expected = "no longer exists")]
fn mocks_outliving_their_mockery_panic() {
    let turtle: Arc<dyn Turtle> = common::mockery().mock();
    turtle.pen_up();
}

#[test]
fn ignoring_a_whole_mock() {
    let mockery = common::mockery();
    let turtle: Arc<dyn Turtle> = mockery.mock();
    let pen: Arc<dyn Pen> = mockery.mock();

    mockery
        .checking(|e| {
            e.ignoring(&pen)?;
            e.one_of(&turtle)?
                .label(e.with(mockery::from_fn!(|text: &String| text.starts_with('n')))?);
            Ok(())
        })
        .unwrap();

    pen.draw(3);
    assert_eq!(pen.colour(), '\0');
    assert_eq!(turtle.label("north".to_string()), "");
    mockery.assert_is_satisfied();
}

#![allow(dead_code)]

use std::sync::Arc;

use mockery::{Mockery, MockeryBuilder, Proxy, Shared};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

mockery::value_type!(Point);

pub trait Turtle: Send + Sync {
    fn forward(&self, distance: i32);
    fn turn(&self, degrees: i32);
    fn pen_up(&self);
    fn pen_down(&self);
    fn heading(&self) -> i32;
    fn jump(&self, x: i32, y: i32);
    fn flash(&self, on: bool, twice: bool, message: String);
    fn speed(&self, level: u8, boost: u8);
    fn label(&self, text: String) -> String;
    fn goto(&self, point: Point);
    fn follow(&self, leader: Arc<dyn Turtle>);
    fn pen(&self) -> Arc<dyn Pen>;
    fn blink(&self, first: bool, second: bool, third: bool);
    fn resize(&self, width: f64, height: f64);
    fn travel(&self, from: Point, to: Point);
}

impl Shared for dyn Turtle {}

pub trait Pen: Send + Sync {
    fn colour(&self) -> char;
    fn draw(&self, length: i32) -> bool;
}

impl Shared for dyn Pen {}

pub struct TurtleImposter(pub Proxy);

impl Turtle for TurtleImposter {
    fn forward(&self, distance: i32) {
        self.0.call("forward", (distance,))
    }

    fn turn(&self, degrees: i32) {
        self.0.call("turn", (degrees,))
    }

    fn pen_up(&self) {
        self.0.call("pen_up", ())
    }

    fn pen_down(&self) {
        self.0.call("pen_down", ())
    }

    fn heading(&self) -> i32 {
        self.0.call("heading", ())
    }

    fn jump(&self, x: i32, y: i32) {
        self.0.call("jump", (x, y))
    }

    fn flash(&self, on: bool, twice: bool, message: String) {
        self.0.call("flash", (on, twice, message))
    }

    fn speed(&self, level: u8, boost: u8) {
        self.0.call("speed", (level, boost))
    }

    fn label(&self, text: String) -> String {
        self.0.call("label", (text,))
    }

    fn goto(&self, point: Point) {
        self.0.call("goto", (point,))
    }

    fn follow(&self, leader: Arc<dyn Turtle>) {
        self.0.call("follow", (leader,))
    }

    fn pen(&self) -> Arc<dyn Pen> {
        self.0.call("pen", ())
    }

    fn blink(&self, first: bool, second: bool, third: bool) {
        self.0.call("blink", (first, second, third))
    }

    fn resize(&self, width: f64, height: f64) {
        self.0.call("resize", (width, height))
    }

    fn travel(&self, from: Point, to: Point) {
        self.0.call("travel", (from, to))
    }
}

pub struct PenImposter(pub Proxy);

impl Pen for PenImposter {
    fn colour(&self) -> char {
        self.0.call("colour", ())
    }

    fn draw(&self, length: i32) -> bool {
        self.0.call("draw", (length,))
    }
}

pub fn builder() -> MockeryBuilder {
    Mockery::builder()
        .imposter(|proxy| Arc::new(TurtleImposter(proxy)) as Arc<dyn Turtle>)
        .imposter(|proxy| Arc::new(PenImposter(proxy)) as Arc<dyn Pen>)
}

pub fn mockery() -> Mockery {
    builder().build()
}

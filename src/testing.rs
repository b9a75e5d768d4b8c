//! Test harness — application root and deployment unit wiring for
//! isolated pattern tests. Pure setup, no logic.

use crate::core::app::{App, Stack};

/// Create an app and a stack named "TestStack".
pub fn test_app() -> (App, Stack) {
    let app = App::new();
    let stack = Stack::new(&app, "TestStack");
    (app, stack)
}

/// Create an app and a "TestStack" with the given context values.
pub fn test_app_with_context(context: &[(&str, &str)]) -> (App, Stack) {
    let mut app = App::new();
    for (key, value) in context {
        app.set_context(*key, *value);
    }
    let stack = Stack::new(&app, "TestStack");
    (app, stack)
}

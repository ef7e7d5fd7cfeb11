use expect_test::Expect;
use std::fmt;

/// Approximate number of characters that can fit on a single screen
const COMMON_SCREEN_CHARS_WIDTH: usize = 60;

/// Asserts that the [`fmt::Debug`] representation of `actual` is equal to the
/// given expected snapshot. Uses [`make_snapshot`] to make the
/// snapshot fit into a common width of a single screen.
#[track_caller]
pub fn assert_eq<T: fmt::Debug>(actual: T, expected: &Expect) {
    expected.assert_eq(&make_snapshot(actual))
}

/// Formats `actual` to string using [`fmt::Debug`] implementation of `actual`.
/// If its width exceeds approximately a single-screen amount of characters,
/// it will be pretty-formatted with the `#` formatting specifier.
pub fn make_snapshot<T: fmt::Debug>(actual: T) -> String {
    let terse = format!("{actual:?}");

    let Some(width) = terse.lines().map(str::len).max() else {
        return terse;
    };

    if width >= COMMON_SCREEN_CHARS_WIDTH {
        return format!("{actual:#?}");
    }

    terse
}

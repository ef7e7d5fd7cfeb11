use expect_test::Expect;

const SET: char = '#';
const UNSET: char = '.';

/// Renders a 2D mask as text, one line per row, where `#` is a set pixel
/// and `.` is an unset one. Every row, including the last, ends with a newline.
pub fn render_mask(width: u32, height: u32, is_set: impl Fn(u32, u32) -> bool) -> String {
    let mut output = String::with_capacity(((width + 1) * height) as usize);

    for y in 0..height {
        output.extend((0..width).map(|x| if is_set(x, y) { SET } else { UNSET }));
        output.push('\n');
    }

    output
}

/// Asserts that the mask rendered with [`render_mask`] matches the snapshot
#[track_caller]
pub fn assert_mask_eq(
    width: u32,
    height: u32,
    is_set: impl Fn(u32, u32) -> bool,
    expected: &Expect,
) {
    expected.assert_eq(&render_mask(width, height, is_set))
}

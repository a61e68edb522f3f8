//! Cell coercion and display formatting: numeric coercion with the
//! silent-zero policy, per-column alignment inference, and truncation.

/// Marker appended to cell values cut down by [`truncate`].
pub const ELLIPSIS: &str = "...";

/// Display alignment of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Coerces a cell to a number. Null cells and parse failures coerce to
/// exactly `0`; aggregates rely on this and never see an error.
pub fn to_number(cell: Option<&str>) -> f64 {
    cell.and_then(|value| value.trim().parse().ok()).unwrap_or(0.0)
}

/// Infers column alignment from its values: right-aligned when every
/// non-null value parses as a number (numeric convention), left otherwise.
/// A single non-numeric value flips the whole column to the left.
pub fn infer_alignment(values: &[Option<&str>]) -> Alignment {
    let numeric = values
        .iter()
        .flatten()
        .all(|value| value.parse::<f64>().is_ok());
    if numeric {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

/// Truncates a cell to `max_width` characters, replacing the cut tail with
/// [`ELLIPSIS`]. Null cells are treated as empty. When `max_width` is smaller
/// than the ellipsis itself, the ellipsis is cut down instead so the result
/// never exceeds `max_width`.
pub fn truncate(cell: Option<&str>, max_width: usize) -> String {
    let value = cell.unwrap_or("");
    if value.chars().count() <= max_width {
        return value.to_owned();
    }
    if max_width <= ELLIPSIS.len() {
        ELLIPSIS.chars().take(max_width).collect()
    } else {
        value
            .chars()
            .take(max_width - ELLIPSIS.len())
            .chain(ELLIPSIS.chars())
            .collect()
    }
}

/// Pads `value` to `width` characters on the side given by `alignment`.
pub fn pad(value: &str, width: usize, alignment: Alignment) -> String {
    match alignment {
        Alignment::Left => format!("{value:<width$}"),
        Alignment::Right => format!("{value:>width$}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_number_never_fails() {
        assert_eq!(to_number(Some("3.14")), 3.14);
        assert_eq!(to_number(Some("abc")), 0.0);
        assert_eq!(to_number(Some("")), 0.0);
        assert_eq!(to_number(None), 0.0);
    }

    #[test]
    fn alignment_right_for_all_numeric() {
        assert_eq!(
            infer_alignment(&[Some("1"), Some("2.5"), None]),
            Alignment::Right
        );
    }

    #[test]
    fn alignment_flips_left_on_single_text_value() {
        assert_eq!(
            infer_alignment(&[Some("1"), Some("Alice")]),
            Alignment::Left
        );
    }

    #[test]
    fn truncate_over_width() {
        assert_eq!(truncate(Some("hello world"), 8), "hello...");
    }

    #[test]
    fn truncate_under_width_unchanged() {
        assert_eq!(truncate(Some("hi"), 8), "hi");
    }

    #[test]
    fn truncate_null_is_empty() {
        assert_eq!(truncate(None, 8), "");
    }

    #[test]
    fn truncate_clamps_at_tiny_widths() {
        // Width below the ellipsis length must not panic or overflow;
        // the ellipsis itself is cut down instead.
        assert_eq!(truncate(Some("hello"), 2), "..");
        assert_eq!(truncate(Some("hello"), 0), "");
    }

    #[test]
    fn pad_respects_alignment() {
        assert_eq!(pad("ab", 4, Alignment::Left), "ab  ");
        assert_eq!(pad("ab", 4, Alignment::Right), "  ab");
    }
}

use serde::{Deserialize, Serialize};

/// Extent of the printable area: the smallest bounding box covering every
/// stored cell. `{0, 0}` for an empty sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

impl Size {
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert_eq!(Size::default(), Size::new(0, 0));
    }
}

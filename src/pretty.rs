//! Diagnostic pretty-printing protocol for expression trees.
//!
//! Every node in an expression tree implements
//! [`Cursor::render_into`](crate::Cursor::render_into) against one shared
//! [`PrettyFormat`], so a whole tree can be rendered for diagnostics in one
//! of three modes: a terse algebraic string (each leaf operand gets a
//! sequential one-letter symbol), a dump of every operand's shape, or a
//! synthesized type description. Rendering has no effect on evaluation.

/// Rendering mode for expression dumps. The modes are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatMode {
    /// Render each leaf operand as a generated one-letter symbol, e.g.
    /// `(A + B)`.
    Terse,
    /// Render each leaf operand as its shape, e.g. `(2 x 3 + 2 x 3)`.
    Shapes,
    /// Render each leaf operand as a synthesized type description, e.g.
    /// `FixedMatrix<f64, 2, 3>`.
    TypeInfo,
}

/// Shared formatter state threaded through one expression rendering.
///
/// Holds the selected mode and the operand-symbol counter for terse mode.
/// Symbols are assigned in first-use order across the whole expression, so
/// the same formatter instance must be passed to every node of one tree.
#[derive(Clone, Debug)]
pub struct PrettyFormat {
    mode: FormatMode,
    next_operand: u8,
}

impl PrettyFormat {
    /// Create a formatter in the given mode.
    pub fn new(mode: FormatMode) -> Self {
        Self {
            mode,
            next_operand: 0,
        }
    }

    /// Shorthand for `PrettyFormat::new(FormatMode::Terse)`.
    pub fn terse() -> Self {
        Self::new(FormatMode::Terse)
    }

    /// Shorthand for `PrettyFormat::new(FormatMode::Shapes)`.
    pub fn shapes() -> Self {
        Self::new(FormatMode::Shapes)
    }

    /// Shorthand for `PrettyFormat::new(FormatMode::TypeInfo)`.
    pub fn type_info() -> Self {
        Self::new(FormatMode::TypeInfo)
    }

    /// The selected rendering mode.
    #[inline]
    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    /// Next sequential operand symbol: `A`, `B`, ..., cycling after `Z`.
    pub fn next_operand_symbol(&mut self) -> char {
        let symbol = (b'A' + self.next_operand) as char;
        self.next_operand = (self.next_operand + 1) % 26;
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_in_first_use_order() {
        let mut format = PrettyFormat::terse();
        assert_eq!(format.next_operand_symbol(), 'A');
        assert_eq!(format.next_operand_symbol(), 'B');
        assert_eq!(format.next_operand_symbol(), 'C');
    }

    #[test]
    fn test_symbols_cycle_after_z() {
        let mut format = PrettyFormat::terse();
        for _ in 0..26 {
            format.next_operand_symbol();
        }
        assert_eq!(format.next_operand_symbol(), 'A');
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(PrettyFormat::shapes().mode(), FormatMode::Shapes);
        assert_eq!(PrettyFormat::type_info().mode(), FormatMode::TypeInfo);
    }
}

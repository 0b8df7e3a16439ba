//! Character, block, and page format values.
//!
//! Formats are plain value structs. Each has a companion *patch* type whose
//! fields are all optional; applying a patch overwrites only the fields the
//! patch carries. Format-update commands store the replaced values returned
//! by the document's setters so they can restore them on undo.

/// RGB color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Black (the default text color).
    pub const BLACK: Color = Color(0, 0, 0);
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Align to the leading edge.
    #[default]
    Left,
    /// Center between margins.
    Center,
    /// Align to the trailing edge.
    Right,
    /// Stretch lines to both margins.
    Justify,
}

/// Character-level format applied to a run of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharFormat {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Font family name, `None` for the document default.
    pub font_family: Option<String>,
    /// Font size in points, `None` for the document default.
    pub font_size: Option<u16>,
    /// Text color, `None` for the document default.
    pub color: Option<Color>,
}

/// Partial update of a [`CharFormat`]. Unset fields leave the target untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharFormatPatch {
    /// New bold flag, if any.
    pub bold: Option<bool>,
    /// New italic flag, if any.
    pub italic: Option<bool>,
    /// New underline flag, if any.
    pub underline: Option<bool>,
    /// New font family, if any (`Some(None)` resets to the document default).
    pub font_family: Option<Option<String>>,
    /// New font size, if any (`Some(None)` resets to the document default).
    pub font_size: Option<Option<u16>>,
    /// New color, if any (`Some(None)` resets to the document default).
    pub color: Option<Option<Color>>,
}

impl CharFormatPatch {
    /// A patch that toggles bold.
    pub fn bold(on: bool) -> Self {
        Self {
            bold: Some(on),
            ..Self::default()
        }
    }

    /// A patch that toggles italic.
    pub fn italic(on: bool) -> Self {
        Self {
            italic: Some(on),
            ..Self::default()
        }
    }

    /// Apply this patch to a format value in place.
    pub fn apply_to(&self, format: &mut CharFormat) {
        if let Some(bold) = self.bold {
            format.bold = bold;
        }
        if let Some(italic) = self.italic {
            format.italic = italic;
        }
        if let Some(underline) = self.underline {
            format.underline = underline;
        }
        if let Some(ref family) = self.font_family {
            format.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            format.font_size = size;
        }
        if let Some(color) = self.color {
            format.color = color;
        }
    }

    /// Fold `later` into this patch so applying the result equals applying
    /// `self` then `later`. Fields set in `later` win.
    pub fn absorb(&mut self, later: &CharFormatPatch) {
        if later.bold.is_some() {
            self.bold = later.bold;
        }
        if later.italic.is_some() {
            self.italic = later.italic;
        }
        if later.underline.is_some() {
            self.underline = later.underline;
        }
        if later.font_family.is_some() {
            self.font_family = later.font_family.clone();
        }
        if later.font_size.is_some() {
            self.font_size = later.font_size;
        }
        if later.color.is_some() {
            self.color = later.color;
        }
    }
}

/// Paragraph-level format of a text block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockFormat {
    /// Paragraph alignment.
    pub alignment: Alignment,
    /// First-line and left indent, in twentieths of a point.
    pub indent: u32,
    /// Extra space above the paragraph, in twentieths of a point.
    pub space_above: u32,
    /// Extra space below the paragraph, in twentieths of a point.
    pub space_below: u32,
}

/// Partial update of a [`BlockFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFormatPatch {
    /// New alignment, if any.
    pub alignment: Option<Alignment>,
    /// New indent, if any.
    pub indent: Option<u32>,
    /// New space above, if any.
    pub space_above: Option<u32>,
    /// New space below, if any.
    pub space_below: Option<u32>,
}

impl BlockFormatPatch {
    /// A patch that only changes the alignment.
    pub fn alignment(alignment: Alignment) -> Self {
        Self {
            alignment: Some(alignment),
            ..Self::default()
        }
    }

    /// Apply this patch to a format value in place.
    pub fn apply_to(&self, format: &mut BlockFormat) {
        if let Some(alignment) = self.alignment {
            format.alignment = alignment;
        }
        if let Some(indent) = self.indent {
            format.indent = indent;
        }
        if let Some(space_above) = self.space_above {
            format.space_above = space_above;
        }
        if let Some(space_below) = self.space_below {
            format.space_below = space_below;
        }
    }

    /// Fold `later` into this patch; fields set in `later` win.
    pub fn absorb(&mut self, later: &BlockFormatPatch) {
        if later.alignment.is_some() {
            self.alignment = later.alignment;
        }
        if later.indent.is_some() {
            self.indent = later.indent;
        }
        if later.space_above.is_some() {
            self.space_above = later.space_above;
        }
        if later.space_below.is_some() {
            self.space_below = later.space_below;
        }
    }
}

/// Page geometry of the whole document, in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFormat {
    /// Page width.
    pub width: u32,
    /// Page height.
    pub height: u32,
    /// Uniform page margin.
    pub margin: u32,
}

impl Default for PageFormat {
    fn default() -> Self {
        // A4 portrait with 2cm margins.
        Self {
            width: 11906,
            height: 16838,
            margin: 1134,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_char_patch_only_touches_set_fields() {
        let mut format = CharFormat {
            italic: true,
            font_size: Some(12),
            ..CharFormat::default()
        };
        CharFormatPatch::bold(true).apply_to(&mut format);
        assert!(format.bold);
        assert!(format.italic);
        assert_eq!(format.font_size, Some(12));
    }

    #[test]
    fn test_char_patch_absorb_later_wins() {
        let mut first = CharFormatPatch::bold(true);
        first.font_size = Some(Some(10));
        let second = CharFormatPatch {
            bold: Some(false),
            color: Some(Some(Color::BLACK)),
            ..CharFormatPatch::default()
        };
        first.absorb(&second);
        assert_eq!(first.bold, Some(false));
        assert_eq!(first.font_size, Some(Some(10)));
        assert_eq!(first.color, Some(Some(Color::BLACK)));
    }

    #[test]
    fn test_block_patch_apply_and_absorb() {
        let mut format = BlockFormat::default();
        let mut patch = BlockFormatPatch::alignment(Alignment::Center);
        patch.absorb(&BlockFormatPatch {
            indent: Some(240),
            ..BlockFormatPatch::default()
        });
        patch.apply_to(&mut format);
        assert_eq!(format.alignment, Alignment::Center);
        assert_eq!(format.indent, 240);
        assert_eq!(format.space_above, 0);
    }
}

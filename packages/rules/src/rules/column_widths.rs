use super::StructureRule;
use crate::diagnostic::Diagnostic;
use funnel_model::Section;

/// Warn when a section's column widths do not add up to roughly 100%
pub struct ColumnWidthsRule {
    /// Allowed deviation from 100, in percentage points
    pub tolerance: f64,
}

impl Default for ColumnWidthsRule {
    fn default() -> Self {
        Self { tolerance: 1.0 }
    }
}

impl StructureRule for ColumnWidthsRule {
    fn name(&self) -> &'static str {
        "column-widths"
    }

    fn description(&self) -> &'static str {
        "Column widths within a section should sum to 100%"
    }

    fn check_section(&self, section: &Section) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for column in &section.columns {
            if !(0.0..=100.0).contains(&column.width) {
                diagnostics.push(
                    Diagnostic::warning(
                        self.name(),
                        format!("Column '{}' has width {}%", column.id, column.width),
                    )
                    .with_target(column.id.clone()),
                );
            }
        }

        let total = section.total_width();
        if !section.columns.is_empty() && (total - 100.0).abs() > self.tolerance {
            diagnostics.push(
                Diagnostic::warning(
                    self.name(),
                    format!("Columns of section '{}' add up to {:.2}%", section.id, total),
                )
                .with_target(section.id.clone())
                .with_suggestion("Adjust column widths or re-apply the section layout"),
            );
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_model::{Column, SectionLayout};

    #[test]
    fn test_template_widths_pass() {
        let mut section = Section::new("s", SectionLayout::ThreeColumn);
        for (i, width) in SectionLayout::ThreeColumn.column_widths().into_iter().enumerate() {
            section.columns.push(Column::new(format!("c{}", i), width));
        }
        assert!(ColumnWidthsRule::default().check_section(&section).is_empty());
    }

    #[test]
    fn test_short_sections_warn() {
        let mut section = Section::new("s", SectionLayout::Custom);
        section.columns.push(Column::new("a", 40.0));
        section.columns.push(Column::new("b", 40.0));

        let diagnostics = ColumnWidthsRule::default().check_section(&section);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }
}
